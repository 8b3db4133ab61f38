//! Category classification of raw feed records.
//!
//! Marker fields are not mutually exclusive in the raw format, so the checks
//! run in a fixed order and the first match wins:
//!
//! 1. `ActiveMissionTier` present -- [`Category::VoidStorms`]
//! 2. `Hard` present -- [`Category::SteelPath`]
//! 3. otherwise -- [`Category::Normal`]

use fissure_types::{Category, RawMission};

/// Assign a raw record to exactly one category.
pub const fn classify(raw: &RawMission) -> Category {
    if raw.has_active_mission_tier() {
        Category::VoidStorms
    } else if raw.has_hard_marker() {
        Category::SteelPath
    } else {
        Category::Normal
    }
}
