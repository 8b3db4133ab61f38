//! Shared type definitions for the fissure tracker.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries. Normalized entities flow downstream to `TypeScript` via
//! `ts-rs` for renderers that consume the raw fissure lists.
//!
//! # Modules
//!
//! - [`enums`] -- [`Era`] and [`Category`], including category alias resolution
//! - [`structs`] -- [`Fissure`] and [`UpdateLogEntry`]
//! - [`feed`] -- Raw world-state feed schema ([`WorldState`], [`RawMission`])

pub mod enums;
pub mod feed;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Category, Era, UnknownEra};
pub use feed::{MongoDate, NumberLong, RawMission, WorldState};
pub use structs::{Fissure, UpdateLogEntry};

#[cfg(test)]
mod tests {
    //! Binding generation for exported types.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. The files are written to the `bindings/`
        // directory relative to the crate root.
        use ts_rs::TS;

        let _ = crate::enums::Era::export_all();
        let _ = crate::enums::Category::export_all();
        let _ = crate::structs::Fissure::export_all();
        let _ = crate::structs::UpdateLogEntry::export_all();
    }
}
