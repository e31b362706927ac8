//! Shared type definitions for the Rival play-record tracker.
//!
//! This crate is the single source of truth for the domain types used by
//! the data layer and its callers. Types that cross the API boundary
//! derive `ts-rs` so the web front end gets matching `TypeScript`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for account, chart, and song keys
//! - [`enums`] -- Clear ranks, score grades, and range constants
//! - [`structs`] -- Accounts, charts, play records, and read models
//! - [`filter`] -- Filter builder and pagination
//! - [`error`] -- Validation errors for caller-supplied values

pub mod enums;
pub mod error;
pub mod filter;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ClearRank, MAX_LEVEL, MAX_SCORE, MIN_LEVEL, ScoreGrade, validate_level};
pub use error::ValidationError;
pub use filter::{DEFAULT_PAGE_SIZE, Page, PlayFilter};
pub use ids::{AccountIdx, ChartIdx, SongIdx};
pub use structs::{
    Account, AccountSummary, Chart, CompareRow, ImportSummary, NewPlayRecord, PlayRecord,
    RankingEntry, SideResult, Song, VolforceEntry, validate_batch,
};

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        // Writes the TypeScript files to `bindings/` relative to the crate.
        use ts_rs::TS;

        let _ = crate::ids::AccountIdx::export_all();
        let _ = crate::ids::ChartIdx::export_all();
        let _ = crate::ids::SongIdx::export_all();

        let _ = crate::structs::Song::export_all();
        let _ = crate::structs::Chart::export_all();
        let _ = crate::structs::Account::export_all();
        let _ = crate::structs::AccountSummary::export_all();
        let _ = crate::structs::PlayRecord::export_all();
        let _ = crate::structs::NewPlayRecord::export_all();
        let _ = crate::structs::ImportSummary::export_all();
        let _ = crate::structs::SideResult::export_all();
        let _ = crate::structs::CompareRow::export_all();
        let _ = crate::structs::RankingEntry::export_all();
        let _ = crate::structs::VolforceEntry::export_all();
    }
}
