//! Static reference data and the node resolver.
//!
//! Reference data is an injected, read-only mapping loaded once at startup
//! from a JSON document:
//!
//! - `nodes` -- raw node id to display name, planet, mission type, tileset
//!   and enemy faction
//! - `era_key` -- per category, the raw field that carries the era code
//! - `era` -- raw era code (`VoidT1`) to [`Era`]
//! - `tier` -- mission type to tier ranking
//! - `mission_overrides` -- raw node id to mission type, for nodes whose
//!   declared type is ambiguous
//! - `sort_order` -- era to display rank
//!
//! [`ReferenceData::resolve`] is the node resolver: a pure lookup with no
//! side effects.

use std::collections::BTreeMap;
use std::path::Path;

use fissure_types::{Category, Era};
use serde::{Deserialize, Serialize};

use crate::error::FissureError;

/// Tileset reported for nodes that declare none (Railjack nodes, mostly).
pub const DEFAULT_TILESET: &str = "Space";

/// Errors that can occur when loading reference data.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// Failed to read the reference file from disk.
    #[error("failed to read reference data: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse the JSON content.
    #[error("failed to parse reference data: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The document parsed but is not usable.
    #[error("invalid reference data: {reason}")]
    Invalid {
        /// What is wrong with the document.
        reason: String,
    },
}

/// One entry of the node table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Display name of the node.
    pub node: String,
    /// Planet or region.
    pub planet: String,
    /// Declared mission type.
    #[serde(rename = "type")]
    pub mission_type: String,
    /// Tileset, absent for nodes without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tileset: Option<String>,
    /// Enemy faction.
    pub enemy: String,
}

/// A raw node id resolved against the node table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    /// Mission type after overrides.
    pub mission_type: String,
    /// Display name of the node.
    pub node: String,
    /// Planet or region.
    pub planet: String,
    /// Tileset, [`DEFAULT_TILESET`] when the node declares none.
    pub tileset: String,
    /// Enemy faction.
    pub enemy: String,
}

/// The full static lookup set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Node table keyed by raw node id.
    pub nodes: BTreeMap<String, NodeRecord>,

    /// Raw field carrying the era code, per category.
    #[serde(default = "default_era_keys")]
    pub era_key: BTreeMap<Category, String>,

    /// Raw era code to era.
    #[serde(default = "default_era_codes")]
    pub era: BTreeMap<String, Era>,

    /// Mission type to tier (1 to 5).
    pub tier: BTreeMap<String, u8>,

    /// Raw node id to mission type, overriding the node's declared type.
    #[serde(default)]
    pub mission_overrides: BTreeMap<String, String>,

    /// Era display rank. Lower ranks sort first.
    #[serde(default = "default_sort_order")]
    pub sort_order: BTreeMap<Era, u32>,
}

impl ReferenceData {
    /// Load and validate reference data from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::Io`] if the file cannot be read,
    /// [`ReferenceError::Json`] if it is not valid JSON, or
    /// [`ReferenceError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ReferenceError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate reference data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::Json`] or [`ReferenceError::Invalid`].
    pub fn parse(json: &str) -> Result<Self, ReferenceError> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    /// Check the invariants the engine relies on.
    ///
    /// Every era needs a sort rank, every category needs an era key, and
    /// every tier must lie in `1..=5`.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::Invalid`] naming the first violation.
    pub fn validate(&self) -> Result<(), ReferenceError> {
        if let Some(era) = Era::ALL.iter().find(|e| !self.sort_order.contains_key(*e)) {
            return Err(ReferenceError::Invalid {
                reason: format!("missing sort rank for era {era}"),
            });
        }
        if let Some(category) = Category::ALL.iter().find(|c| !self.era_key.contains_key(*c)) {
            return Err(ReferenceError::Invalid {
                reason: format!("missing era key for category {category}"),
            });
        }
        if let Some((mission, tier)) = self.tier.iter().find(|(_, t)| !(1..=5).contains(*t)) {
            return Err(ReferenceError::Invalid {
                reason: format!("tier {tier} for {mission} is outside 1..=5"),
            });
        }
        Ok(())
    }

    /// Resolve a raw node id.
    ///
    /// # Errors
    ///
    /// Returns [`FissureError::UnknownLocation`] if the id is not in the
    /// node table.
    pub fn resolve(&self, raw_location_id: &str) -> Result<ResolvedNode, FissureError> {
        let record = self
            .nodes
            .get(raw_location_id)
            .ok_or_else(|| FissureError::UnknownLocation(raw_location_id.to_owned()))?;

        let mission_type = self
            .mission_overrides
            .get(raw_location_id)
            .unwrap_or(&record.mission_type)
            .clone();

        Ok(ResolvedNode {
            mission_type,
            node: record.node.clone(),
            planet: record.planet.clone(),
            tileset: record
                .tileset
                .clone()
                .unwrap_or_else(|| DEFAULT_TILESET.to_owned()),
            enemy: record.enemy.clone(),
        })
    }

    /// The raw field name carrying the era code for a category.
    pub fn era_key(&self, category: Category) -> Option<&str> {
        self.era_key.get(&category).map(String::as_str)
    }

    /// Map a raw era code to an era.
    pub fn era_for_code(&self, code: &str) -> Option<Era> {
        self.era.get(code).copied()
    }

    /// Tier ranking of a mission type.
    pub fn tier_for(&self, mission_type: &str) -> Option<u8> {
        self.tier.get(mission_type).copied()
    }

    /// Display rank of an era. Validated data always has one; anything
    /// missing sorts last.
    pub fn era_rank(&self, era: Era) -> u32 {
        self.sort_order.get(&era).copied().unwrap_or(u32::MAX)
    }
}

fn default_era_keys() -> BTreeMap<Category, String> {
    BTreeMap::from([
        (Category::VoidStorms, "ActiveMissionTier".to_owned()),
        (Category::SteelPath, "Modifier".to_owned()),
        (Category::Normal, "Modifier".to_owned()),
    ])
}

fn default_era_codes() -> BTreeMap<String, Era> {
    BTreeMap::from([
        ("VoidT1".to_owned(), Era::Lith),
        ("VoidT2".to_owned(), Era::Meso),
        ("VoidT3".to_owned(), Era::Neo),
        ("VoidT4".to_owned(), Era::Axi),
        ("VoidT5".to_owned(), Era::Requiem),
    ])
}

fn default_sort_order() -> BTreeMap<Era, u32> {
    BTreeMap::from([
        (Era::Lith, 0),
        (Era::Meso, 1),
        (Era::Neo, 2),
        (Era::Axi, 3),
        (Era::Requiem, 4),
    ])
}

/// Small reference set shared by the unit tests of this crate.
#[cfg(test)]
pub(crate) const TEST_REFERENCE_JSON: &str = r#"{
    "nodes": {
        "SolNode1": {"node": "Galatea", "planet": "Neptune", "type": "Capture", "tileset": "Corpus Ship", "enemy": "Corpus"},
        "SolNode10": {"node": "Thebe", "planet": "Jupiter", "type": "Sabotage", "tileset": "Corpus Gas City", "enemy": "Corpus"},
        "SolNode30": {"node": "Olympus", "planet": "Mars", "type": "Disruption", "tileset": "Grineer Settlement", "enemy": "Grineer"},
        "SolNode89": {"node": "Mot", "planet": "Void", "type": "Survival", "tileset": "Orokin Tower", "enemy": "Orokin"},
        "ClanNode2": {"node": "Coba", "planet": "Earth", "type": "Dark Sector Defense", "tileset": "Grineer Forest", "enemy": "Grineer"},
        "CrewBattleNode519": {"node": "Korm's Belt", "planet": "Earth Proxima", "type": "Skirmish", "enemy": "Grineer"},
        "CrewBattleNode501": {"node": "Bendar Cluster", "planet": "Saturn Proxima", "type": "Volatile", "enemy": "Grineer"}
    },
    "tier": {
        "Capture": 1,
        "Skirmish": 1,
        "Sabotage": 2,
        "Volatile": 2,
        "Survival": 3,
        "Defense": 4,
        "Disruption": 4
    },
    "mission_overrides": {
        "ClanNode2": "Defense"
    }
}"#;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn test_reference() -> ReferenceData {
    ReferenceData::parse(TEST_REFERENCE_JSON).unwrap()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_node() {
        let data = test_reference();
        let resolved = data.resolve("SolNode10").unwrap();
        assert_eq!(resolved.node, "Thebe");
        assert_eq!(resolved.planet, "Jupiter");
        assert_eq!(resolved.mission_type, "Sabotage");
        assert_eq!(resolved.tileset, "Corpus Gas City");
        assert_eq!(resolved.enemy, "Corpus");
    }

    #[test]
    fn unknown_node_is_rejected() {
        let data = test_reference();
        assert_eq!(
            data.resolve("SolNode9999"),
            Err(FissureError::UnknownLocation("SolNode9999".to_owned()))
        );
    }

    #[test]
    fn override_replaces_declared_mission_type() {
        let data = test_reference();
        let resolved = data.resolve("ClanNode2").unwrap();
        assert_eq!(resolved.mission_type, "Defense");
    }

    #[test]
    fn missing_tileset_defaults_to_space() {
        let data = test_reference();
        let resolved = data.resolve("CrewBattleNode519").unwrap();
        assert_eq!(resolved.tileset, DEFAULT_TILESET);
    }

    #[test]
    fn defaults_fill_era_tables() {
        let data = test_reference();
        assert_eq!(data.era_key(Category::VoidStorms), Some("ActiveMissionTier"));
        assert_eq!(data.era_key(Category::Normal), Some("Modifier"));
        assert_eq!(data.era_for_code("VoidT4"), Some(Era::Axi));
        assert_eq!(data.era_for_code("VoidT6"), None);
        assert!(data.era_rank(Era::Lith) < data.era_rank(Era::Meso));
        assert!(data.era_rank(Era::Axi) < data.era_rank(Era::Requiem));
    }

    #[test]
    fn incomplete_sort_order_is_rejected() {
        let json = r#"{
            "nodes": {},
            "tier": {},
            "sort_order": {"Lith": 0, "Meso": 1}
        }"#;
        let result = ReferenceData::parse(json);
        assert!(matches!(result, Err(ReferenceError::Invalid { .. })));
    }

    #[test]
    fn out_of_range_tier_is_rejected() {
        let json = r#"{"nodes": {}, "tier": {"Excavation": 9}}"#;
        let result = ReferenceData::parse(json);
        assert!(matches!(result, Err(ReferenceError::Invalid { .. })));
    }

    #[test]
    fn custom_sort_order_is_honoured() {
        let json = r#"{
            "nodes": {},
            "tier": {},
            "sort_order": {"Requiem": 0, "Axi": 1, "Neo": 2, "Meso": 3, "Lith": 4}
        }"#;
        let data = ReferenceData::parse(json).unwrap();
        assert!(data.era_rank(Era::Requiem) < data.era_rank(Era::Lith));
    }

    #[test]
    fn load_project_reference_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("data")
            .join("reference.json");
        if path.exists() {
            let data = ReferenceData::from_file(&path);
            assert!(data.is_ok(), "Failed to load project reference data: {data:?}");
        }
    }
}
