//! The fissure registry: current snapshot, change log, and query surface.
//!
//! The registry is rebuilt wholesale from each feed poll. A rebuild builds a
//! complete [`RegistrySnapshot`] off to the side and only swaps it in once
//! every record has been built, so a failed poll leaves the previous state
//! (snapshot, `last_update`, and log) exactly as it was.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fissure_types::{Category, Era, Fissure, UpdateLogEntry, WorldState};
use serde::Deserialize;
use tracing::{debug, info};

use crate::builder::{EntityBuilder, parse_expiry};
use crate::error::FissureError;
use crate::query::FissureFilter;
use crate::reference::ReferenceData;
use crate::schedule::{RESET_MARGIN_SECS, ResetSchedule, ResetScheduler};

/// Registry behavior knobs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistryConfig {
    /// Number of non-empty diffs retained in the update log.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Drop records whose expiry is strictly before the rebuild time.
    #[serde(default)]
    pub skip_expired: bool,
    /// Reset margin in seconds per category. Categories not listed use
    /// [`RESET_MARGIN_SECS`].
    #[serde(default)]
    pub reset_margin_secs: BTreeMap<Category, i64>,
}

const fn default_history_capacity() -> usize {
    10
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            skip_expired: false,
            reset_margin_secs: BTreeMap::new(),
        }
    }
}

impl RegistryConfig {
    /// Reset margin for a category.
    pub fn reset_margin(&self, category: Category) -> i64 {
        self.reset_margin_secs
            .get(&category)
            .copied()
            .unwrap_or(RESET_MARGIN_SECS)
    }
}

/// An immutable view of every category's fissures at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    categories: BTreeMap<Category, Vec<Fissure>>,
}

impl RegistrySnapshot {
    /// Fissures in a category, sorted by era rank then expiry.
    pub fn category(&self, category: Category) -> &[Fissure] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every fissure, category by category.
    pub fn iter(&self) -> impl Iterator<Item = &Fissure> {
        Category::ALL
            .into_iter()
            .flat_map(|category| self.category(category).iter())
    }

    /// Total fissure count.
    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Whether the snapshot holds no fissures.
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }
}

/// Owns the current snapshot and the bounded log of additions.
#[derive(Debug)]
pub struct FissureRegistry {
    reference: ReferenceData,
    config: RegistryConfig,
    snapshot: Arc<RegistrySnapshot>,
    last_update: Option<DateTime<Utc>>,
    log: VecDeque<UpdateLogEntry>,
}

impl FissureRegistry {
    /// Create an empty registry.
    pub fn new(reference: ReferenceData, config: RegistryConfig) -> Self {
        Self {
            reference,
            log: VecDeque::with_capacity(config.history_capacity),
            config,
            snapshot: Arc::new(RegistrySnapshot::default()),
            last_update: None,
        }
    }

    /// Replace the registry contents with the fissures in `feed`.
    ///
    /// Returns the fissures that were not present in the previous snapshot,
    /// each listed once. The first rebuild always returns an empty list.
    ///
    /// # Errors
    ///
    /// Any record that fails to build aborts the whole rebuild with the
    /// builder's error; the registry is left untouched.
    pub fn rebuild(
        &mut self,
        feed: &WorldState,
        now: DateTime<Utc>,
    ) -> Result<Vec<Fissure>, FissureError> {
        let builder = EntityBuilder::new(&self.reference);
        let mut categories: BTreeMap<Category, Vec<Fissure>> = BTreeMap::new();
        let mut skipped: usize = 0;

        for raw in feed.missions() {
            if self.config.skip_expired && parse_expiry(raw)? < now {
                skipped = skipped.saturating_add(1);
                continue;
            }
            let fissure = builder.build(raw)?;
            categories.entry(fissure.category).or_default().push(fissure);
        }

        for fissures in categories.values_mut() {
            fissures.sort_by_key(|f| (self.reference.era_rank(f.era), f.expiry));
        }
        let snapshot = RegistrySnapshot { categories };

        let added = if self.last_update.is_none() {
            Vec::new()
        } else {
            let mut seen: HashSet<&Fissure> = self.snapshot.iter().collect();
            snapshot
                .iter()
                .filter(|fissure| seen.insert(*fissure))
                .cloned()
                .collect()
        };

        info!(
            void_storms = snapshot.category(Category::VoidStorms).len(),
            steel_path = snapshot.category(Category::SteelPath).len(),
            normal = snapshot.category(Category::Normal).len(),
            skipped,
            added = added.len(),
            "registry rebuilt"
        );

        if !added.is_empty() {
            self.append_log(UpdateLogEntry {
                timestamp: now,
                added: added.clone(),
            });
        }
        self.last_update = Some(now);
        self.snapshot = Arc::new(snapshot);

        Ok(added)
    }

    fn append_log(&mut self, entry: UpdateLogEntry) {
        if self.config.history_capacity == 0 {
            return;
        }
        while self.log.len() >= self.config.history_capacity {
            if let Some(evicted) = self.log.pop_front() {
                debug!(timestamp = %evicted.timestamp, "update log entry evicted");
            }
        }
        debug!(
            timestamp = %entry.timestamp,
            added = entry.added.len(),
            "update log entry appended"
        );
        self.log.push_back(entry);
    }

    /// Fissures of a category that satisfy `filter`, in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`FissureError::InvalidCategory`] if `category` is not a
    /// recognized category name or alias.
    pub fn query(
        &self,
        category: &str,
        filter: &FissureFilter,
    ) -> Result<Vec<Fissure>, FissureError> {
        let category = resolve_category(category)?;
        Ok(self
            .snapshot
            .category(category)
            .iter()
            .filter(|fissure| filter.matches(fissure))
            .cloned()
            .collect())
    }

    /// The last update time and every logged addition strictly newer than
    /// `since`, oldest first.
    pub fn changes_since(&self, since: DateTime<Utc>) -> (Option<DateTime<Utc>>, Vec<Fissure>) {
        let changes = self
            .log
            .iter()
            .filter(|entry| entry.timestamp > since)
            .flat_map(|entry| entry.added.iter().cloned())
            .collect();
        (self.last_update, changes)
    }

    /// Reset schedule for a category.
    ///
    /// `eras` overrides the category's default era scope. The reset margin
    /// comes from [`RegistryConfig::reset_margin`].
    ///
    /// # Errors
    ///
    /// Returns [`FissureError::InvalidCategory`] for unknown category names.
    pub fn reset_schedule(
        &self,
        category: &str,
        eras: Option<&[Era]>,
    ) -> Result<ResetSchedule, FissureError> {
        let category = resolve_category(category)?;
        let fissures = self.snapshot.category(category);
        let scheduler = eras.map_or_else(
            || ResetScheduler::for_category(category, fissures),
            |eras| ResetScheduler::new(fissures, eras),
        );
        Ok(scheduler
            .with_margin(self.config.reset_margin(category))
            .schedule(category))
    }

    /// Earliest refresh hint across all categories, if any fissures exist.
    pub fn next_refresh_hint(&self) -> Option<DateTime<Utc>> {
        Category::ALL
            .into_iter()
            .filter_map(|category| {
                ResetScheduler::for_category(category, self.snapshot.category(category))
                    .refresh_hint()
            })
            .min()
    }

    /// The current snapshot. Holding it keeps a consistent view across
    /// subsequent rebuilds.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// When the last successful rebuild happened.
    pub const fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// The retained update log, oldest first.
    pub const fn history(&self) -> &VecDeque<UpdateLogEntry> {
        &self.log
    }

    /// Total number of fissures in the current snapshot.
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// Whether the current snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

/// Resolve a category name or alias.
///
/// # Errors
///
/// Returns [`FissureError::InvalidCategory`] if nothing matches.
pub fn resolve_category(name: &str) -> Result<Category, FissureError> {
    Category::from_alias(name).ok_or_else(|| FissureError::InvalidCategory(name.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeDelta;

    use fissure_types::RawMission;

    use super::*;
    use crate::builder::fixtures::{normal, steel_path, void_storm};
    use crate::reference::test_reference;

    const T_MS: i64 = 1_700_000_000_000;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(T_MS).unwrap()
    }

    fn later(secs: i64) -> DateTime<Utc> {
        now().checked_add_signed(TimeDelta::seconds(secs)).unwrap()
    }

    fn feed(active: Vec<RawMission>, storms: Vec<RawMission>) -> WorldState {
        WorldState {
            active_missions: active,
            void_storms: storms,
        }
    }

    fn registry() -> FissureRegistry {
        FissureRegistry::new(test_reference(), RegistryConfig::default())
    }

    fn base_feed() -> WorldState {
        feed(
            vec![
                normal("SolNode10", "VoidT1", T_MS + 600_000),
                steel_path("SolNode30", "VoidT3", T_MS + 1_200_000),
            ],
            vec![void_storm("CrewBattleNode519", "VoidT4", T_MS)],
        )
    }

    #[test]
    fn query_partitions_by_category() {
        let mut registry = registry();
        registry.rebuild(&base_feed(), now()).unwrap();

        let normal = registry.query("Normal", &FissureFilter::new()).unwrap();
        assert_eq!(normal.len(), 1);
        assert_eq!(normal[0].era, Era::Lith);
        assert_eq!(normal[0].location, "Thebe");

        let storms = registry.query("rj", &FissureFilter::new()).unwrap();
        assert_eq!(storms.len(), 1);
        assert_eq!(storms[0].era, Era::Axi);

        let schedule = registry.reset_schedule("void storms", None).unwrap();
        assert_eq!(schedule.soonest, BTreeMap::from([(Era::Axi, now())]));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn first_rebuild_has_empty_diff() {
        let mut registry = registry();
        let added = registry.rebuild(&base_feed(), now()).unwrap();
        assert!(added.is_empty());
        assert!(registry.history().is_empty());
        assert_eq!(registry.last_update(), Some(now()));
    }

    #[test]
    fn second_rebuild_reports_new_fissures_only() {
        let mut registry = registry();
        registry.rebuild(&base_feed(), now()).unwrap();

        let mut next = base_feed();
        next.active_missions.push(normal("SolNode1", "VoidT2", T_MS + 900_000));
        let added = registry.rebuild(&next, later(60)).unwrap();

        assert_eq!(added.len(), 1);
        assert_eq!(added[0].location, "Galatea");
        assert_eq!(registry.history().len(), 1);

        let (last, changes) = registry.changes_since(now());
        assert_eq!(last, Some(later(60)));
        assert_eq!(changes, added);
    }

    #[test]
    fn unchanged_feed_logs_nothing_but_updates_timestamp() {
        let mut registry = registry();
        registry.rebuild(&base_feed(), now()).unwrap();
        let added = registry.rebuild(&base_feed(), later(60)).unwrap();
        assert!(added.is_empty());
        assert!(registry.history().is_empty());
        assert_eq!(registry.last_update(), Some(later(60)));
    }

    #[test]
    fn changed_expiry_counts_as_new() {
        let mut registry = registry();
        registry.rebuild(&base_feed(), now()).unwrap();
        let next = feed(
            vec![
                normal("SolNode10", "VoidT1", T_MS + 700_000),
                steel_path("SolNode30", "VoidT3", T_MS + 1_200_000),
            ],
            vec![void_storm("CrewBattleNode519", "VoidT4", T_MS)],
        );
        let added = registry.rebuild(&next, later(60)).unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].expiry, later(700));
    }

    #[test]
    fn collections_sort_by_era_rank_then_expiry() {
        let mut registry = registry();
        let unsorted = feed(
            vec![
                normal("SolNode30", "VoidT5", T_MS + 100_000),
                normal("SolNode10", "VoidT2", T_MS + 900_000),
                normal("SolNode1", "VoidT2", T_MS + 300_000),
                normal("SolNode89", "VoidT1", T_MS + 999_000),
            ],
            vec![],
        );
        registry.rebuild(&unsorted, now()).unwrap();
        let fissures = registry.query("n", &FissureFilter::new()).unwrap();
        let order: Vec<(Era, &str)> = fissures
            .iter()
            .map(|f| (f.era, f.location.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Era::Lith, "Mot"),
                (Era::Meso, "Galatea"),
                (Era::Meso, "Thebe"),
                (Era::Requiem, "Olympus"),
            ]
        );
    }

    #[test]
    fn failed_rebuild_leaves_state_untouched() {
        let mut registry = registry();
        registry.rebuild(&base_feed(), now()).unwrap();
        let before = registry.snapshot();

        let mut bad = base_feed();
        bad.active_missions.push(normal("SolNode404", "VoidT1", T_MS));
        let result = registry.rebuild(&bad, later(60));

        assert_eq!(
            result,
            Err(FissureError::UnknownLocation("SolNode404".to_owned()))
        );
        assert!(Arc::ptr_eq(&before, &registry.snapshot()));
        assert_eq!(registry.last_update(), Some(now()));
        assert!(registry.history().is_empty());
    }

    #[test]
    fn log_is_bounded() {
        let mut registry = FissureRegistry::new(
            test_reference(),
            RegistryConfig {
                history_capacity: 2,
                ..RegistryConfig::default()
            },
        );
        registry.rebuild(&feed(vec![], vec![]), now()).unwrap();
        for step in 1..=3_i64 {
            let expiry = T_MS + step * 1_000_000;
            registry
                .rebuild(&feed(vec![normal("SolNode10", "VoidT1", expiry)], vec![]), later(step))
                .unwrap();
        }

        assert_eq!(registry.history().len(), 2);
        let (_, changes) = registry.changes_since(now());
        let expiries: Vec<i64> = changes
            .iter()
            .map(|f| f.expiry.timestamp_millis())
            .collect();
        assert_eq!(expiries, vec![T_MS + 2_000_000, T_MS + 3_000_000]);
    }

    #[test]
    fn changes_since_is_strictly_newer() {
        let mut registry = registry();
        registry.rebuild(&feed(vec![], vec![]), now()).unwrap();
        registry
            .rebuild(&feed(vec![normal("SolNode10", "VoidT1", T_MS)], vec![]), later(10))
            .unwrap();
        assert!(registry.changes_since(later(10)).1.is_empty());
        assert_eq!(registry.changes_since(later(9)).1.len(), 1);
    }

    #[test]
    fn changes_since_before_any_rebuild() {
        let registry = registry();
        assert_eq!(registry.changes_since(now()), (None, vec![]));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let registry = registry();
        assert_eq!(
            registry.query("weekly", &FissureFilter::new()),
            Err(FissureError::InvalidCategory("weekly".to_owned()))
        );
        assert_eq!(
            registry.reset_schedule("weekly", None),
            Err(FissureError::InvalidCategory("weekly".to_owned()))
        );
    }

    #[test]
    fn skip_expired_drops_stale_records() {
        let mut registry = FissureRegistry::new(
            test_reference(),
            RegistryConfig {
                skip_expired: true,
                ..RegistryConfig::default()
            },
        );
        let stale = feed(
            vec![
                normal("SolNode10", "VoidT1", T_MS - 1),
                normal("SolNode1", "VoidT1", T_MS + 60_000),
            ],
            vec![],
        );
        registry.rebuild(&stale, now()).unwrap();
        assert_eq!(registry.len(), 1);
        let normal = registry.snapshot().category(Category::Normal).to_vec();
        assert_eq!(normal[0].location, "Galatea");
    }

    #[test]
    fn skip_expired_keeps_record_expiring_now() {
        let mut registry = FissureRegistry::new(
            test_reference(),
            RegistryConfig {
                skip_expired: true,
                ..RegistryConfig::default()
            },
        );
        let current = feed(vec![normal("SolNode10", "VoidT1", T_MS)], vec![]);
        registry.rebuild(&current, now()).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn identical_new_records_are_reported_once() {
        let mut registry = registry();
        registry.rebuild(&base_feed(), now()).unwrap();

        let mut next = base_feed();
        next.active_missions.push(normal("SolNode1", "VoidT2", T_MS + 900_000));
        next.active_missions.push(normal("SolNode1", "VoidT2", T_MS + 900_000));
        let added = registry.rebuild(&next, later(60)).unwrap();

        assert_eq!(added.len(), 1);
        assert_eq!(added[0].location, "Galatea");
        assert_eq!(registry.query("normal", &FissureFilter::new()).unwrap().len(), 3);
        assert_eq!(registry.changes_since(now()).1.len(), 1);
    }

    #[test]
    fn rebuild_sorts_by_configured_era_rank() {
        let mut reference = test_reference();
        reference.sort_order = BTreeMap::from([
            (Era::Requiem, 0),
            (Era::Axi, 1),
            (Era::Neo, 2),
            (Era::Meso, 3),
            (Era::Lith, 4),
        ]);
        let mut registry = FissureRegistry::new(reference, RegistryConfig::default());
        let unsorted = feed(
            vec![
                normal("SolNode10", "VoidT1", T_MS + 100_000),
                normal("SolNode89", "VoidT5", T_MS + 900_000),
            ],
            vec![],
        );
        registry.rebuild(&unsorted, now()).unwrap();
        let eras: Vec<Era> = registry
            .query("normal", &FissureFilter::new())
            .unwrap()
            .iter()
            .map(|f| f.era)
            .collect();
        assert_eq!(eras, vec![Era::Requiem, Era::Lith]);
    }

    #[test]
    fn reset_margin_is_per_category() {
        let mut registry = FissureRegistry::new(
            test_reference(),
            RegistryConfig {
                reset_margin_secs: BTreeMap::from([(Category::VoidStorms, 1920)]),
                ..RegistryConfig::default()
            },
        );
        let current = feed(
            vec![normal("SolNode10", "VoidT1", T_MS + 3_600_000)],
            vec![void_storm("CrewBattleNode519", "VoidT4", T_MS + 3_600_000)],
        );
        registry.rebuild(&current, now()).unwrap();

        let storms = registry.reset_schedule("void storms", None).unwrap();
        assert_eq!(storms.next_reset, Some((Era::Axi, later(3600 - 1920))));
        let normal = registry.reset_schedule("normal", None).unwrap();
        assert_eq!(normal.next_reset, Some((Era::Lith, later(3600 - 180))));
    }

    #[test]
    fn reset_schedule_honours_explicit_eras() {
        let mut registry = registry();
        registry.rebuild(&base_feed(), now()).unwrap();
        let schedule = registry
            .reset_schedule("steel path", Some(&[Era::Lith][..]))
            .unwrap();
        assert!(schedule.resets.is_empty());
        assert_eq!(schedule.next_reset, None);

        let schedule = registry.reset_schedule("sp", None).unwrap();
        assert_eq!(schedule.next_reset, Some((Era::Neo, later(1200 - 180))));
    }

    #[test]
    fn refresh_hint_spans_categories() {
        let mut registry = registry();
        assert_eq!(registry.next_refresh_hint(), None);
        registry.rebuild(&base_feed(), now()).unwrap();
        assert_eq!(registry.next_refresh_hint(), Some(later(-200)));
    }
}
