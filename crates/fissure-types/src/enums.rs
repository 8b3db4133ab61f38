//! Enumeration types for the fissure tracker.
//!
//! [`Era`] is the relic era attached to every fissure and [`Category`] is the
//! top-level grouping a fissure is classified into. Category names accepted
//! from users go through [`Category::from_alias`] before they reach the
//! registry.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Eras
// ---------------------------------------------------------------------------

/// The relic era of a fissure.
///
/// The derived ordering exists only so eras can key a `BTreeMap`. Display
/// ordering always goes through the era ranking table in the reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Era {
    /// Lith relics.
    Lith,
    /// Meso relics.
    Meso,
    /// Neo relics.
    Neo,
    /// Axi relics.
    Axi,
    /// Requiem relics.
    Requiem,
}

impl Era {
    /// Every recognized era.
    pub const ALL: [Self; 5] = [Self::Lith, Self::Meso, Self::Neo, Self::Axi, Self::Requiem];

    /// The display name of the era.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lith => "Lith",
            Self::Meso => "Meso",
            Self::Neo => "Neo",
            Self::Axi => "Axi",
            Self::Requiem => "Requiem",
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name a known era.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEra(pub String);

impl fmt::Display for UnknownEra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown era: {}", self.0)
    }
}

impl std::error::Error for UnknownEra {}

impl FromStr for Era {
    type Err = UnknownEra;

    /// Parse an era name case-insensitively (`"lith"`, `"Lith"`, `"LITH"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|era| era.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownEra(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// The top-level grouping of a fissure, decided by marker fields on the raw
/// feed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Category {
    /// Railjack void storms (raw record carries `ActiveMissionTier`).
    VoidStorms,
    /// Steel Path fissures (raw record carries `Hard`).
    SteelPath,
    /// Regular star-chart fissures.
    Normal,
}

/// Alias table, keyed by normalized alias text.
const CATEGORY_ALIASES: &[(&str, Category)] = &[
    ("normal", Category::Normal),
    ("n", Category::Normal),
    ("regular", Category::Normal),
    ("fissure", Category::Normal),
    ("fissures", Category::Normal),
    ("normal fissures", Category::Normal),
    ("nf", Category::Normal),
    ("steel path", Category::SteelPath),
    ("steelpath", Category::SteelPath),
    ("sp", Category::SteelPath),
    ("steel", Category::SteelPath),
    ("hard", Category::SteelPath),
    ("hard mode", Category::SteelPath),
    ("sp fissures", Category::SteelPath),
    ("void storms", Category::VoidStorms),
    ("void storm", Category::VoidStorms),
    ("voidstorms", Category::VoidStorms),
    ("voidstorm", Category::VoidStorms),
    ("vs", Category::VoidStorms),
    ("storm", Category::VoidStorms),
    ("storms", Category::VoidStorms),
    ("railjack", Category::VoidStorms),
    ("rj", Category::VoidStorms),
];

/// Eras that appear in void storms. Requiem never rotates into Railjack.
const VOID_STORM_ERAS: [Era; 4] = [Era::Lith, Era::Meso, Era::Neo, Era::Axi];

impl Category {
    /// Every category, in the order they are reported.
    pub const ALL: [Self; 3] = [Self::VoidStorms, Self::SteelPath, Self::Normal];

    /// The canonical display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::VoidStorms => "Void Storms",
            Self::SteelPath => "Steel Path",
            Self::Normal => "Normal",
        }
    }

    /// The eras a reset schedule covers when the caller gives no explicit list.
    pub const fn default_eras(self) -> &'static [Era] {
        match self {
            Self::VoidStorms => &VOID_STORM_ERAS,
            Self::SteelPath | Self::Normal => &Era::ALL,
        }
    }

    /// Resolve a user-supplied category name or alias.
    ///
    /// Matching ignores case, surrounding whitespace, and treats `-` and `_`
    /// as spaces, so `"Steel-Path"`, `"steel_path"` and `"SP"` all resolve to
    /// [`Category::SteelPath`].
    pub fn from_alias(input: &str) -> Option<Self> {
        let normalized = normalize_alias(input);
        CATEGORY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, category)| *category)
    }

    /// All accepted aliases for this category.
    pub fn aliases(self) -> impl Iterator<Item = &'static str> {
        CATEGORY_ALIASES
            .iter()
            .filter(move |(_, category)| *category == self)
            .map(|(alias, _)| *alias)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize_alias(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
