//! Normalized entity structs produced by the fissure engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Category, Era};

/// A single timed mission modifier, normalized from a raw feed record.
///
/// Fissures are plain values: two fissures are the same fissure when every
/// field is equal. The registry relies on this when diffing consecutive
/// polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Fissure {
    /// Display name of the node the fissure is on.
    pub location: String,
    /// Mission type after node overrides are applied.
    pub mission_type: String,
    /// Planet (or region) the node belongs to.
    pub planet: String,
    /// Tileset of the node, `"Space"` when the node declares none.
    pub tileset: String,
    /// Enemy faction on the node.
    pub enemy: String,
    /// Relic era of the fissure.
    pub era: Era,
    /// Mission tier ranking, 1 (best) to 5.
    pub tier: u8,
    /// Absolute expiry instant.
    pub expiry: DateTime<Utc>,
    /// Category the fissure was classified into.
    pub category: Category,
}

/// One poll's worth of newly appeared fissures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UpdateLogEntry {
    /// When the poll that produced this entry was applied.
    pub timestamp: DateTime<Utc>,
    /// Fissures present in that poll but absent from the one before it.
    pub added: Vec<Fissure>,
}
