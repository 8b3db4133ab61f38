//! Error types for the fissure engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup.

/// Top-level error for the fissure engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: fissure_core::config::ConfigError,
    },

    /// Reference data loading failed.
    #[error("reference data error: {source}")]
    Reference {
        /// The underlying reference data error.
        #[from]
        source: fissure_core::reference::ReferenceError,
    },

    /// A configured value was rejected (bad field template, for example).
    #[error("fissure error: {source}")]
    Fissure {
        /// The underlying fissure error.
        #[from]
        source: fissure_core::FissureError,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {message}")]
    Http {
        /// Description of the HTTP client failure.
        message: String,
    },
}
