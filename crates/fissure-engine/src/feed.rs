//! HTTP world-state feed source.
//!
//! Fetches the world-state document with `reqwest`. Each fetch makes up to
//! `max_retries` attempts with exponential backoff (1 s, 2 s, 4 s, ...)
//! capped at `max_backoff_secs`. Only after the last attempt fails does the
//! poller see a [`FissureError::FeedUnavailable`].

use std::time::Duration;

use fissure_core::FissureError;
use fissure_core::config::FeedConfig;
use fissure_core::poll::FeedSource;
use fissure_types::WorldState;
use tracing::{debug, warn};

use crate::error::EngineError;

/// Fetches world state over HTTP.
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
    max_backoff: Duration,
}

impl HttpFeedSource {
    /// Create a feed source from the feed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &FeedConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| EngineError::Http {
                message: format!("failed to build client: {e}"),
            })?;
        Ok(Self {
            client,
            url: config.url.clone(),
            max_retries: config.max_retries.max(1),
            max_backoff: Duration::from_secs(config.max_backoff_secs),
        })
    }

    /// Make a single request.
    async fn fetch_once(&self) -> Result<WorldState, FissureError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FissureError::FeedUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(FissureError::FeedUnavailable(format!(
                "feed returned {status}: {error_body}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FissureError::FeedUnavailable(format!("failed to read body: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| FissureError::FeedUnavailable(format!("feed parse failed: {e}")))
    }
}

impl FeedSource for HttpFeedSource {
    async fn fetch(&mut self) -> Result<WorldState, FissureError> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            debug!(attempt, url = %self.url, "fetching world state");
            match self.fetch_once().await {
                Ok(state) => return Ok(state),
                Err(error) if attempt >= self.max_retries => return Err(error),
                Err(error) => {
                    let wait = backoff(attempt, self.max_backoff);
                    warn!(
                        %error,
                        attempt,
                        max_retries = self.max_retries,
                        wait_secs = wait.as_secs(),
                        "feed fetch failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

/// Wait after the given (1-based) failed attempt: `2^(attempt - 1)` seconds,
/// capped at `max`.
pub fn backoff(attempt: u32, max: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let secs = 1_u64.checked_shl(exponent).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(max)
}
