//! Fissure classification, registry, and reset scheduling.
//!
//! This crate turns raw world-state documents into categorized, sorted
//! fissure collections and derives when each category next rotates.
//!
//! # Modules
//!
//! - [`builder`] -- Raw record to [`Fissure`] conversion at the ingestion
//!   boundary.
//! - [`classify`] -- Marker-based category classification.
//! - [`config`] -- Configuration loading from `fissure-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`FissureError`], the error type shared by every
//!   registry operation.
//! - [`format`] -- Relative-time rendering and field templates.
//! - [`poll`] -- [`FeedSource`] trait and the [`run_poller`] loop.
//! - [`query`] -- Attribute predicates over fissures.
//! - [`reference`] -- Static node, era and tier tables.
//! - [`registry`] -- [`FissureRegistry`], the snapshot and change log.
//! - [`schedule`] -- Per-era reset scheduling.
//!
//! [`Fissure`]: fissure_types::Fissure
//! [`FissureError`]: error::FissureError
//! [`FeedSource`]: poll::FeedSource
//! [`run_poller`]: poll::run_poller
//! [`FissureRegistry`]: registry::FissureRegistry

pub mod builder;
pub mod classify;
pub mod config;
pub mod error;
pub mod format;
pub mod poll;
pub mod query;
pub mod reference;
pub mod registry;
pub mod schedule;

pub use error::FissureError;
pub use format::{DisplayMode, FieldSpec, format_fields, format_relative_time};
pub use query::{FissureAttribute, FissureFilter};
pub use reference::ReferenceData;
pub use registry::{FissureRegistry, RegistryConfig};
pub use schedule::{ResetSchedule, ResetScheduler};
