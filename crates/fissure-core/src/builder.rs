//! Entity builder: raw feed record to normalized [`Fissure`].
//!
//! This is the ingestion boundary. Every optional field the engine needs is
//! checked here, so the rest of the crate only ever sees complete fissures.

use chrono::{DateTime, Utc};
use fissure_types::{Category, Era, Fissure, RawMission};

use crate::classify::classify;
use crate::error::FissureError;
use crate::reference::ReferenceData;

/// Builds fissures against a fixed reference data set.
#[derive(Debug, Clone, Copy)]
pub struct EntityBuilder<'a> {
    reference: &'a ReferenceData,
}

impl<'a> EntityBuilder<'a> {
    /// Create a builder over the given reference data.
    pub const fn new(reference: &'a ReferenceData) -> Self {
        Self { reference }
    }

    /// Build one fissure from a raw record.
    ///
    /// # Errors
    ///
    /// - [`FissureError::UnknownLocation`] if the node is not in the node table.
    /// - [`FissureError::MalformedEntry`] if the expiry is missing or invalid,
    ///   the era field is missing, the era code is unknown, or the mission
    ///   type has no tier.
    pub fn build(&self, raw: &RawMission) -> Result<Fissure, FissureError> {
        let category = classify(raw);
        let resolved = self.reference.resolve(&raw.node)?;
        let expiry = parse_expiry(raw)?;
        let era = self.era_of(raw, category)?;
        let tier = self
            .reference
            .tier_for(&resolved.mission_type)
            .ok_or_else(|| {
                FissureError::malformed(
                    &raw.node,
                    format!("no tier for mission type {}", resolved.mission_type),
                )
            })?;

        Ok(Fissure {
            location: resolved.node,
            mission_type: resolved.mission_type,
            planet: resolved.planet,
            tileset: resolved.tileset,
            enemy: resolved.enemy,
            era,
            tier,
            expiry,
            category,
        })
    }

    /// Read the era code from the field the category names and map it.
    fn era_of(&self, raw: &RawMission, category: Category) -> Result<Era, FissureError> {
        let field = self.reference.era_key(category).ok_or_else(|| {
            FissureError::malformed(&raw.node, format!("no era key for category {category}"))
        })?;
        let code = raw
            .string_field(field)
            .ok_or_else(|| FissureError::malformed(&raw.node, format!("missing {field}")))?;
        self.reference
            .era_for_code(code)
            .ok_or_else(|| FissureError::malformed(&raw.node, format!("unknown era code {code}")))
    }
}

/// Convert the record's epoch-millisecond expiry to a UTC instant.
///
/// # Errors
///
/// Returns [`FissureError::MalformedEntry`] if the expiry is absent, not an
/// integer, or outside the representable range.
pub fn parse_expiry(raw: &RawMission) -> Result<DateTime<Utc>, FissureError> {
    let text = raw
        .expiry_millis()
        .ok_or_else(|| FissureError::malformed(&raw.node, "missing Expiry"))?;
    let millis: i64 = text.trim().parse().map_err(|e| {
        FissureError::malformed(&raw.node, format!("invalid expiry {text:?}: {e}"))
    })?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| FissureError::malformed(&raw.node, format!("expiry {millis} out of range")))
}
