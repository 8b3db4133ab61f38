//! Per-era reset scheduling.
//!
//! A category's fissures rotate out era by era. Each era group resets when
//! its *last* remaining fissure expires, and the reset is reported a margin
//! early to absorb propagation lag upstream. The margin defaults to
//! [`RESET_MARGIN_SECS`] and can be set per category through
//! [`ResetScheduler::with_margin`]. The category-wide "next reset" is the
//! earliest of those per-era resets.
//!
//! All computations are restricted to an explicit era scope. Without one,
//! [`Category::default_eras`] applies (void storms never carry Requiem).
//! Eras in scope with no fissures are simply absent from the results.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use fissure_types::{Category, Era, Fissure};
use serde::Serialize;

/// Default safety margin subtracted from the last expiry of an era group.
pub const RESET_MARGIN_SECS: i64 = 180;

/// How far ahead of an era group's last expiry a refetch is suggested.
pub const REFRESH_LEAD_SECS: i64 = 200;

/// Derives reset times from one category's fissures.
#[derive(Debug, Clone)]
pub struct ResetScheduler<'a> {
    fissures: &'a [Fissure],
    eras: Vec<Era>,
    margin_secs: i64,
}

/// Everything the scheduler derives, bundled for callers that want it all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetSchedule {
    /// Category the schedule belongs to.
    pub category: Category,
    /// Era scope the schedule was computed over, in order.
    pub eras: Vec<Era>,
    /// Earliest expiry per era.
    pub soonest: BTreeMap<Era, DateTime<Utc>>,
    /// Latest expiry per era minus the reset margin.
    pub resets: BTreeMap<Era, DateTime<Utc>>,
    /// Earliest per-era reset, with its era.
    pub next_reset: Option<(Era, DateTime<Utc>)>,
}

impl<'a> ResetScheduler<'a> {
    /// Schedule over an explicit era scope.
    pub fn new(fissures: &'a [Fissure], eras: &[Era]) -> Self {
        Self {
            fissures,
            eras: eras.to_vec(),
            margin_secs: RESET_MARGIN_SECS,
        }
    }

    /// Schedule over the category's default era scope.
    pub fn for_category(category: Category, fissures: &'a [Fissure]) -> Self {
        Self::new(fissures, category.default_eras())
    }

    /// Report resets `secs` before the last expiry instead of the default.
    #[must_use]
    pub const fn with_margin(mut self, secs: i64) -> Self {
        self.margin_secs = secs;
        self
    }

    fn in_scope(&self) -> impl Iterator<Item = &'a Fissure> + '_ {
        self.fissures
            .iter()
            .filter(|fissure| self.eras.contains(&fissure.era))
    }

    /// Earliest expiry among the fissures of each era in scope.
    pub fn soonest_expiry_per_era(&self) -> BTreeMap<Era, DateTime<Utc>> {
        let mut soonest: BTreeMap<Era, DateTime<Utc>> = BTreeMap::new();
        for fissure in self.in_scope() {
            soonest
                .entry(fissure.era)
                .and_modify(|current| *current = (*current).min(fissure.expiry))
                .or_insert(fissure.expiry);
        }
        soonest
    }

    /// Latest expiry among the fissures of each era in scope.
    fn latest_expiry_per_era(&self) -> BTreeMap<Era, DateTime<Utc>> {
        let mut latest: BTreeMap<Era, DateTime<Utc>> = BTreeMap::new();
        for fissure in self.in_scope() {
            latest
                .entry(fissure.era)
                .and_modify(|current| *current = (*current).max(fissure.expiry))
                .or_insert(fissure.expiry);
        }
        latest
    }

    /// Reset time of each era in scope: its latest expiry minus the margin.
    pub fn last_expiry_per_era(&self) -> BTreeMap<Era, DateTime<Utc>> {
        self.latest_expiry_per_era()
            .into_iter()
            .map(|(era, latest)| (era, shift_back(latest, self.margin_secs)))
            .collect()
    }

    /// The earliest per-era reset. Ties go to the era listed first in scope.
    pub fn next_category_reset(&self) -> Option<(Era, DateTime<Utc>)> {
        let resets = self.last_expiry_per_era();
        earliest_in_scope(&self.eras, &resets)
    }

    /// The single earliest expiry across every era in scope.
    pub fn soonest_expiry(&self) -> Option<DateTime<Utc>> {
        self.in_scope().map(|fissure| fissure.expiry).min()
    }

    /// Earliest moment a refetch is likely to see an era rotate:
    /// the minimum over eras of latest expiry minus [`REFRESH_LEAD_SECS`].
    pub fn refresh_hint(&self) -> Option<DateTime<Utc>> {
        self.latest_expiry_per_era()
            .into_values()
            .map(|latest| shift_back(latest, REFRESH_LEAD_SECS))
            .min()
    }

    /// Compute every schedule value at once.
    pub fn schedule(&self, category: Category) -> ResetSchedule {
        let resets = self.last_expiry_per_era();
        let next_reset = earliest_in_scope(&self.eras, &resets);
        ResetSchedule {
            category,
            eras: self.eras.clone(),
            soonest: self.soonest_expiry_per_era(),
            resets,
            next_reset,
        }
    }
}

fn earliest_in_scope(
    eras: &[Era],
    resets: &BTreeMap<Era, DateTime<Utc>>,
) -> Option<(Era, DateTime<Utc>)> {
    let mut best: Option<(Era, DateTime<Utc>)> = None;
    for era in eras {
        if let Some(&at) = resets.get(era) {
            if best.is_none_or(|(_, current)| at < current) {
                best = Some((*era, at));
            }
        }
    }
    best
}

fn shift_back(instant: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    instant
        .checked_sub_signed(TimeDelta::seconds(secs))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
