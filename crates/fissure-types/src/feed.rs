//! Raw world-state feed schema.
//!
//! The upstream feed is a large JSON document. Only two arrays matter here:
//! `ActiveMissions` (normal and Steel Path fissures) and `VoidStorms`
//! (Railjack fissures). Each record is mostly free-form, so the fields the
//! engine depends on are modelled explicitly and everything else is kept in
//! [`RawMission::extra`].
//!
//! Marker fields are presence tests: a record that carries `Hard` at all is a
//! Steel Path record, whatever the value.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// The subset of the world-state document the fissure engine consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    /// Normal and Steel Path fissure records.
    #[serde(rename = "ActiveMissions")]
    pub active_missions: Vec<RawMission>,
    /// Void storm records.
    #[serde(rename = "VoidStorms")]
    pub void_storms: Vec<RawMission>,
}

impl WorldState {
    /// All raw records in feed order: active missions, then void storms.
    pub fn missions(&self) -> impl Iterator<Item = &RawMission> {
        self.active_missions.iter().chain(self.void_storms.iter())
    }

    /// Total number of raw records.
    pub fn len(&self) -> usize {
        self.active_missions
            .len()
            .saturating_add(self.void_storms.len())
    }

    /// Whether the feed carries no records at all.
    pub fn is_empty(&self) -> bool {
        self.active_missions.is_empty() && self.void_storms.is_empty()
    }
}

/// A single raw mission record from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMission {
    /// Raw node identifier, e.g. `SolNode23` or `CrewBattleNode519`.
    #[serde(rename = "Node")]
    pub node: String,

    /// Expiry as a Mongo extended-JSON date.
    #[serde(rename = "Expiry", default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<MongoDate>,

    /// Era code for normal and Steel Path records, e.g. `VoidT2`.
    #[serde(rename = "Modifier", default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,

    /// Era code for void storms. Its presence marks a void storm.
    #[serde(
        rename = "ActiveMissionTier",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub active_mission_tier: Option<serde_json::Value>,

    /// Steel Path marker. Any value, `null` included, counts.
    #[serde(
        rename = "Hard",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub hard: Option<serde_json::Value>,

    /// Every other field on the record.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RawMission {
    /// Whether the record carries the void storm marker.
    pub const fn has_active_mission_tier(&self) -> bool {
        self.active_mission_tier.is_some()
    }

    /// Whether the record carries the Steel Path marker.
    pub const fn has_hard_marker(&self) -> bool {
        self.hard.is_some()
    }

    /// The raw `$numberLong` text of the expiry, if present.
    pub fn expiry_millis(&self) -> Option<&str> {
        self.expiry.as_ref().map(|d| d.date.number_long.as_str())
    }

    /// Look up a string field by its feed name.
    ///
    /// Used to read the era code, whose field name depends on the category.
    pub fn string_field(&self, name: &str) -> Option<&str> {
        match name {
            "Node" => Some(self.node.as_str()),
            "Modifier" => self.modifier.as_deref(),
            "ActiveMissionTier" => self
                .active_mission_tier
                .as_ref()
                .and_then(serde_json::Value::as_str),
            other => self.extra.get(other).and_then(serde_json::Value::as_str),
        }
    }
}

/// Deserialize a field that only matters for being there. A present `null`
/// stays `Some(Value::Null)`; an absent field falls back to `default`.
fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Mongo extended-JSON date: `{"$date": {"$numberLong": "1700000000000"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoDate {
    /// The wrapped epoch value.
    #[serde(rename = "$date")]
    pub date: NumberLong,
}

/// Mongo extended-JSON 64-bit integer, carried as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLong {
    /// Milliseconds since the Unix epoch, UTC.
    #[serde(rename = "$numberLong")]
    pub number_long: String,
}

impl MongoDate {
    /// Build a date from epoch milliseconds.
    pub fn from_millis(millis: i64) -> Self {
        Self {
            date: NumberLong {
                number_long: millis.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Version": 19,
        "ActiveMissions": [
            {
                "_id": {"$oid": "65a1"},
                "Region": 3,
                "Seed": 24150,
                "Activation": {"$date": {"$numberLong": "1700000000000"}},
                "Expiry": {"$date": {"$numberLong": "1700003600000"}},
                "Node": "SolNode23",
                "MissionType": "MT_EXTERMINATION",
                "Modifier": "VoidT1",
                "Hard": true
            },
            {
                "Expiry": {"$date": {"$numberLong": "1700004000000"}},
                "Node": "SolNode64",
                "Modifier": "VoidT3"
            }
        ],
        "VoidStorms": [
            {
                "Node": "CrewBattleNode519",
                "Expiry": {"$date": {"$numberLong": "1700005000000"}},
                "ActiveMissionTier": "VoidT4"
            }
        ],
        "Sorties": []
    }"#;

    #[test]
    fn parses_world_state_sample() {
        let state: WorldState = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(state.len(), 3);
        assert_eq!(state.active_missions.len(), 2);
        assert_eq!(state.void_storms.len(), 1);

        let first = &state.active_missions[0];
        assert_eq!(first.node, "SolNode23");
        assert!(first.has_hard_marker());
        assert!(!first.has_active_mission_tier());
        assert_eq!(first.expiry_millis(), Some("1700003600000"));
        assert_eq!(first.string_field("Modifier"), Some("VoidT1"));
        assert_eq!(first.string_field("MissionType"), Some("MT_EXTERMINATION"));

        let storm = &state.void_storms[0];
        assert!(storm.has_active_mission_tier());
        assert_eq!(storm.string_field("ActiveMissionTier"), Some("VoidT4"));
        assert_eq!(storm.string_field("Modifier"), None);
    }

    #[test]
    fn missions_iterates_active_then_void_storms() {
        let state: WorldState = serde_json::from_str(SAMPLE).unwrap();
        let nodes: Vec<&str> = state.missions().map(|m| m.node.as_str()).collect();
        assert_eq!(nodes, vec!["SolNode23", "SolNode64", "CrewBattleNode519"]);
    }

    #[test]
    fn record_without_expiry_still_parses() {
        let raw: RawMission =
            serde_json::from_str(r#"{"Node": "SolNode1", "Modifier": "VoidT2"}"#).unwrap();
        assert_eq!(raw.expiry_millis(), None);
    }

    #[test]
    fn hard_marker_is_presence_based() {
        let raw: RawMission =
            serde_json::from_str(r#"{"Node": "SolNode1", "Hard": false}"#).unwrap();
        assert!(raw.has_hard_marker());
    }

    #[test]
    fn odd_hard_values_still_count_as_markers() {
        for value in ["1", "null", r#""yes""#, "{}"] {
            let record = format!(r#"{{"Node": "SolNode10", "Hard": {value}}}"#);
            let json = format!(r#"{{"ActiveMissions": [{record}], "VoidStorms": []}}"#);
            let state: WorldState = serde_json::from_str(&json).unwrap();
            assert!(state.active_missions[0].has_hard_marker(), "Hard: {value}");
        }
    }

    #[test]
    fn absent_hard_is_not_a_marker() {
        let raw: RawMission =
            serde_json::from_str(r#"{"Node": "SolNode1", "Modifier": "VoidT1"}"#).unwrap();
        assert!(!raw.has_hard_marker());
        assert!(!raw.has_active_mission_tier());
    }

    #[test]
    fn null_active_mission_tier_is_a_marker_without_era() {
        let raw: RawMission =
            serde_json::from_str(r#"{"Node": "CrewBattleNode519", "ActiveMissionTier": null}"#)
                .unwrap();
        assert!(raw.has_active_mission_tier());
        assert_eq!(raw.string_field("ActiveMissionTier"), None);
    }

    #[test]
    fn feed_without_mission_arrays_is_rejected() {
        let result = serde_json::from_str::<WorldState>(r#"{"Version": 19}"#);
        assert!(result.is_err());
    }
}
