//! Feed polling loop.
//!
//! [`run_poller`] drives the registry: fetch the world state, rebuild, hand
//! the result to a [`PollCallback`], then sleep until the next poll. The
//! sleep follows the registry's refresh hint, clamped between the configured
//! minimum and maximum intervals, so polls cluster around era rotations
//! instead of firing on a fixed beat.
//!
//! A failed fetch or rebuild is logged and reported to the callback; the
//! loop keeps going with the previous snapshot intact.

use core::future::Future;
use core::time::Duration;

use chrono::{DateTime, Utc};
use fissure_types::{Fissure, WorldState};
use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::error::FissureError;
use crate::registry::FissureRegistry;

/// A source of world-state documents.
///
/// The engine implements this over HTTP; tests use canned feeds.
pub trait FeedSource {
    /// Fetch the current world state.
    ///
    /// # Errors
    ///
    /// Returns [`FissureError::FeedUnavailable`] if no document could be
    /// obtained.
    fn fetch(&mut self) -> impl Future<Output = Result<WorldState, FissureError>> + Send;
}

/// Callback invoked after each poll.
pub trait PollCallback: Send {
    /// Called after a successful rebuild with the newly appeared fissures.
    fn on_rebuild(&mut self, registry: &FissureRegistry, added: &[Fissure]);

    /// Called when a fetch or rebuild fails.
    fn on_error(&mut self, _error: &FissureError) {}
}

/// A no-op poll callback for testing.
pub struct NoOpCallback;

impl PollCallback for NoOpCallback {
    fn on_rebuild(&mut self, _registry: &FissureRegistry, _added: &[Fissure]) {}
}

/// Timing bounds for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Shortest wait between polls.
    pub min_interval: Duration,
    /// Longest wait between polls, also used when there is no hint.
    pub max_interval: Duration,
    /// Stop after this many polls. `None` polls until shutdown.
    pub max_polls: Option<u64>,
}

impl PollSchedule {
    /// Derive poll bounds from the feed configuration.
    pub fn from_feed_config(config: &FeedConfig) -> Self {
        let max_secs = config.poll_interval_secs.max(config.min_poll_interval_secs);
        Self {
            min_interval: Duration::from_secs(config.min_poll_interval_secs),
            max_interval: Duration::from_secs(max_secs),
            max_polls: None,
        }
    }

    /// How long to wait before the next poll.
    pub fn next_delay(&self, hint: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
        let Some(hint) = hint else {
            return self.max_interval;
        };
        let until_hint = hint
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO);
        until_hint.clamp(self.min_interval, self.max_interval.max(self.min_interval))
    }
}

/// Why the poll loop stopped, and how it went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Total polls attempted.
    pub polls: u64,
    /// Polls whose fetch or rebuild failed.
    pub failures: u64,
    /// Whether the loop stopped because of the shutdown signal.
    pub shutdown: bool,
}

/// Poll until `shutdown` resolves or the poll budget is exhausted.
pub async fn run_poller<S, C, F>(
    registry: &mut FissureRegistry,
    source: &mut S,
    callback: &mut C,
    schedule: PollSchedule,
    shutdown: F,
) -> PollOutcome
where
    S: FeedSource,
    C: PollCallback,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut outcome = PollOutcome {
        polls: 0,
        failures: 0,
        shutdown: false,
    };

    info!(
        min_interval_secs = schedule.min_interval.as_secs(),
        max_interval_secs = schedule.max_interval.as_secs(),
        max_polls = schedule.max_polls,
        "Poller starting"
    );

    loop {
        let result = tokio::select! {
            () = &mut shutdown => {
                outcome.shutdown = true;
                break;
            }
            result = source.fetch() => result,
        };
        outcome.polls = outcome.polls.saturating_add(1);

        match result.and_then(|feed| registry.rebuild(&feed, Utc::now())) {
            Ok(added) => callback.on_rebuild(registry, &added),
            Err(error) => {
                outcome.failures = outcome.failures.saturating_add(1);
                warn!(%error, poll = outcome.polls, "poll failed, keeping previous snapshot");
                callback.on_error(&error);
            }
        }

        if schedule.max_polls.is_some_and(|max| outcome.polls >= max) {
            break;
        }

        let delay = schedule.next_delay(registry.next_refresh_hint(), Utc::now());
        info!(delay_secs = delay.as_secs(), "Next poll scheduled");
        tokio::select! {
            () = &mut shutdown => {
                outcome.shutdown = true;
                break;
            }
            () = tokio::time::sleep(delay) => {}
        }
    }

    info!(
        polls = outcome.polls,
        failures = outcome.failures,
        shutdown = outcome.shutdown,
        "Poller stopped"
    );
    outcome
}
