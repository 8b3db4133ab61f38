//! Attribute predicates over fissures.
//!
//! A [`FissureFilter`] is a conjunction of predicates. Each attribute
//! predicate accepts a set of values (any one of which matches). On top of
//! the attribute predicates a filter may restrict eras and cap the tier.
//! Tier capping is inclusive: a ceiling of 3 keeps tiers 1, 2 and 3.

use core::fmt;
use core::str::FromStr;
use std::collections::{BTreeMap, BTreeSet};

use fissure_types::{Era, Fissure};

use crate::error::FissureError;

/// A fissure attribute that predicates and templates can refer to by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FissureAttribute {
    /// Display node name (`node`, `location`).
    Location,
    /// Mission type (`mission`, `mission_type`).
    MissionType,
    /// Planet (`planet`).
    Planet,
    /// Tileset (`tileset`).
    Tileset,
    /// Enemy faction (`enemy`, `faction`).
    Enemy,
    /// Era name (`era`).
    Era,
    /// Tier as a decimal string (`tier`).
    Tier,
    /// Category display name (`category`).
    Category,
}

impl FissureAttribute {
    /// Canonical attribute name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Location => "node",
            Self::MissionType => "mission",
            Self::Planet => "planet",
            Self::Tileset => "tileset",
            Self::Enemy => "enemy",
            Self::Era => "era",
            Self::Tier => "tier",
            Self::Category => "category",
        }
    }

    /// The attribute's value on a fissure, as text.
    pub fn value(self, fissure: &Fissure) -> String {
        match self {
            Self::Location => fissure.location.clone(),
            Self::MissionType => fissure.mission_type.clone(),
            Self::Planet => fissure.planet.clone(),
            Self::Tileset => fissure.tileset.clone(),
            Self::Enemy => fissure.enemy.clone(),
            Self::Era => fissure.era.name().to_owned(),
            Self::Tier => fissure.tier.to_string(),
            Self::Category => fissure.category.name().to_owned(),
        }
    }
}

impl fmt::Display for FissureAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FissureAttribute {
    type Err = FissureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "node" | "location" => Ok(Self::Location),
            "mission" | "mission_type" => Ok(Self::MissionType),
            "planet" => Ok(Self::Planet),
            "tileset" => Ok(Self::Tileset),
            "enemy" | "faction" => Ok(Self::Enemy),
            "era" => Ok(Self::Era),
            "tier" => Ok(Self::Tier),
            "category" => Ok(Self::Category),
            _ => Err(FissureError::InvalidAttribute(s.to_owned())),
        }
    }
}

/// A conjunction of predicates over fissures.
///
/// The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FissureFilter {
    attributes: BTreeMap<FissureAttribute, BTreeSet<String>>,
    eras: Option<BTreeSet<Era>>,
    max_tier: Option<u8>,
}

impl FissureFilter {
    /// A filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept fissures whose `attribute` equals any of `values`.
    ///
    /// Comparison ignores ASCII case. Calling this again for the same
    /// attribute widens the accepted set.
    #[must_use]
    pub fn with_attribute<I, S>(mut self, attribute: FissureAttribute, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .entry(attribute)
            .or_default()
            .extend(values.into_iter().map(|v| v.into().to_lowercase()));
        self
    }

    /// Like [`with_attribute`](Self::with_attribute) with the attribute
    /// given by name.
    ///
    /// # Errors
    ///
    /// Returns [`FissureError::InvalidAttribute`] if the name is unknown.
    pub fn with_named_attribute<I, S>(self, name: &str, values: I) -> Result<Self, FissureError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attribute: FissureAttribute = name.parse()?;
        Ok(self.with_attribute(attribute, values))
    }

    /// Keep only fissures of the given eras.
    #[must_use]
    pub fn with_eras<I>(mut self, eras: I) -> Self
    where
        I: IntoIterator<Item = Era>,
    {
        self.eras.get_or_insert_with(BTreeSet::new).extend(eras);
        self
    }

    /// Keep only fissures with `tier <= max_tier`.
    #[must_use]
    pub const fn with_max_tier(mut self, max_tier: u8) -> Self {
        self.max_tier = Some(max_tier);
        self
    }

    /// Whether a fissure satisfies every predicate.
    pub fn matches(&self, fissure: &Fissure) -> bool {
        if let Some(eras) = &self.eras {
            if !eras.contains(&fissure.era) {
                return false;
            }
        }
        if let Some(max_tier) = self.max_tier {
            if fissure.tier > max_tier {
                return false;
            }
        }
        self.attributes.iter().all(|(attribute, accepted)| {
            accepted.contains(&attribute.value(fissure).to_lowercase())
        })
    }
}
