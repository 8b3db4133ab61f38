//! Fissure engine binary.
//!
//! This is the main entry point that wires together configuration, reference
//! data, the fissure registry, and the HTTP feed source, then polls the
//! world-state feed until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `fissure-config.yaml` (or `FISSURE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Load reference data
//! 4. Create the registry, feed source, and announce callback
//! 5. Run the poll loop until Ctrl-C
//! 6. Log the result

mod announce;
mod error;
mod feed;

use std::path::{Path, PathBuf};

use fissure_core::FissureRegistry;
use fissure_core::config::FissureConfig;
use fissure_core::poll::{self, PollSchedule};
use fissure_core::reference::ReferenceData;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::announce::AnnounceCallback;
use crate::error::EngineError;
use crate::feed::HttpFeedSource;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "fissure-config.yaml";

/// Application entry point for the fissure engine.
///
/// # Errors
///
/// Returns an error if any initialization step fails. Poll failures are
/// logged and never end the process.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = config_path();
    let (config, config_found) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("fissure-engine starting");
    if config_found {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        feed_url = config.feed.url,
        poll_interval_secs = config.feed.poll_interval_secs,
        history_capacity = config.registry.history_capacity,
        skip_expired = config.registry.skip_expired,
        "Configuration resolved"
    );

    // 3. Load reference data.
    let reference = ReferenceData::from_file(&config.reference.path).map_err(EngineError::from)?;
    info!(
        path = %config.reference.path.display(),
        nodes = reference.nodes.len(),
        mission_types = reference.tier.len(),
        "Reference data loaded"
    );

    // 4. Assemble the registry, feed source, and callback.
    let specs = config.display.field_specs().map_err(EngineError::from)?;
    let mut callback = AnnounceCallback::new(
        specs,
        config.display.mode,
        config.display.emoji().clone(),
    );
    let mut registry = FissureRegistry::new(reference, config.registry.clone());
    let mut source = HttpFeedSource::new(&config.feed)?;
    let schedule = PollSchedule::from_feed_config(&config.feed);

    // 5. Poll until interrupted.
    let outcome = poll::run_poller(
        &mut registry,
        &mut source,
        &mut callback,
        schedule,
        shutdown_signal(),
    )
    .await;

    // 6. Log results.
    info!(
        polls = outcome.polls,
        failures = outcome.failures,
        fissures = registry.len(),
        last_update = ?registry.last_update(),
        "fissure-engine shutdown complete"
    );

    Ok(())
}

/// Config path from `FISSURE_CONFIG`, or the default.
fn config_path() -> PathBuf {
    std::env::var_os("FISSURE_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the configuration, falling back to defaults when the file is absent.
///
/// Environment overrides apply either way. The flag reports whether the
/// file was found.
fn load_config(path: &Path) -> Result<(FissureConfig, bool), EngineError> {
    if path.exists() {
        let config = FissureConfig::from_file(path)?;
        Ok((config, true))
    } else {
        let mut config = FissureConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed the engine runs
/// until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
