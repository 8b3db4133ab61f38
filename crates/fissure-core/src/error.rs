//! Error types for the `fissure-core` crate.
//!
//! Everything the engine can reject at runtime is a [`FissureError`].
//! Loading-time failures live next to their loaders
//! ([`ReferenceError`](crate::reference::ReferenceError),
//! [`ConfigError`](crate::config::ConfigError)).

/// Errors produced while building, querying, or rendering fissures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FissureError {
    /// The raw node id is not in the reference node table.
    #[error("unknown location: {0}")]
    UnknownLocation(String),

    /// A raw record is missing a required field or a lookup on it missed.
    #[error("malformed entry at {node}: {reason}")]
    MalformedEntry {
        /// Raw node id of the offending record.
        node: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A category name or alias was not recognized.
    #[error("invalid category: {0}")]
    InvalidCategory(String),

    /// The world-state feed could not be obtained.
    #[error("feed unavailable: {0}")]
    FeedUnavailable(String),

    /// A field template referenced an unknown placeholder.
    #[error("invalid field template: {0}")]
    InvalidTemplate(String),

    /// A filter referenced an unknown fissure attribute.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),
}

impl FissureError {
    /// Shorthand for a [`FissureError::MalformedEntry`].
    pub fn malformed(node: &str, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            node: node.to_owned(),
            reason: reason.into(),
        }
    }
}
