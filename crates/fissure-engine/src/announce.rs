//! Poll callback that announces new fissures and upcoming resets.
//!
//! Newly appeared fissures are rendered through the configured field specs
//! and logged one line per fissure. After every rebuild the next reset of
//! each category is logged alongside it.

use chrono::{DateTime, Utc};
use fissure_core::format::{EraEmojiMap, RenderedField, format_fields, format_relative_time};
use fissure_core::poll::PollCallback;
use fissure_core::{DisplayMode, FieldSpec, FissureError, FissureRegistry};
use fissure_types::{Category, Fissure};
use tracing::{info, warn};

/// Logs additions and reset times after each poll.
pub struct AnnounceCallback {
    specs: Vec<FieldSpec>,
    mode: DisplayMode,
    emoji: EraEmojiMap,
    consecutive_failures: u32,
}

impl AnnounceCallback {
    /// Create a callback rendering with the given field specs.
    pub const fn new(specs: Vec<FieldSpec>, mode: DisplayMode, emoji: EraEmojiMap) -> Self {
        Self {
            specs,
            mode,
            emoji,
            consecutive_failures: 0,
        }
    }

    /// Render each fissure as one `name: value | name: value` line.
    pub fn render_lines(&self, fissures: &[Fissure], now: DateTime<Utc>) -> Vec<String> {
        let fields = format_fields(fissures, &self.specs, self.mode, &self.emoji, now);
        (0..fissures.len())
            .map(|row| join_row(&fields, row))
            .collect()
    }

    /// One line per category describing its next reset.
    pub fn reset_lines(&self, registry: &FissureRegistry, now: DateTime<Utc>) -> Vec<String> {
        Category::ALL
            .into_iter()
            .filter_map(|category| {
                let schedule = registry.reset_schedule(category.name(), None).ok()?;
                let (era, at) = schedule.next_reset?;
                Some(format!(
                    "{category}: {era} resets {}",
                    format_relative_time(at, self.mode, now)
                ))
            })
            .collect()
    }
}

fn join_row(fields: &[RenderedField], row: usize) -> String {
    fields
        .iter()
        .filter_map(|field| {
            field
                .values
                .get(row)
                .map(|value| format!("{}: {value}", field.name))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

impl PollCallback for AnnounceCallback {
    fn on_rebuild(&mut self, registry: &FissureRegistry, added: &[Fissure]) {
        if self.consecutive_failures > 0 {
            info!(
                failures = self.consecutive_failures,
                "feed recovered"
            );
            self.consecutive_failures = 0;
        }

        let now = Utc::now();
        for (fissure, line) in added.iter().zip(self.render_lines(added, now)) {
            info!(category = %fissure.category, "new fissure: {line}");
        }
        for line in self.reset_lines(registry, now) {
            info!("{line}");
        }
    }

    fn on_error(&mut self, error: &FissureError) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures > 1 {
            warn!(
                %error,
                failures = self.consecutive_failures,
                "feed still failing"
            );
        }
    }
}
