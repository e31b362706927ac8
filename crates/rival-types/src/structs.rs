//! Core entity structs: accounts, charts, play records, and read models.
//!
//! A [`PlayRecord`] is immutable once written. The set of records sharing
//! an account's [`Account::current_snapshot_at`] timestamp is that
//! account's current snapshot; every other record is history.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ClearRank, MAX_SCORE};
use crate::error::ValidationError;
use crate::ids::{AccountIdx, ChartIdx, SongIdx};

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

/// A song. Its title is the target of keyword search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Song {
    /// Song index.
    pub idx: SongIdx,
    /// Song title.
    pub title: String,
}

/// One difficulty of a song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Chart {
    /// Chart index.
    pub idx: ChartIdx,
    /// The song this chart belongs to.
    pub song_idx: SongIdx,
    /// Difficulty level (1-20).
    pub level: i16,
    /// Difficulty type tag (`NOV`, `ADV`, `EXH`, `MXM`, ...).
    pub chart_type: String,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// A player account.
///
/// `current_snapshot_at` is the version marker: it names the batch of
/// play records that is current. It is `None` until the first import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Account {
    /// Account index.
    pub idx: AccountIdx,
    /// External player id from the game network.
    pub sdvx_id: String,
    /// Name shown on leaderboards.
    pub display_name: String,
    /// Whether the player hides their profile from others.
    pub is_hidden: bool,
    /// Skill analyzer tier.
    pub skill_level: i16,
    /// Total rating (sum of the best chart contributions).
    #[ts(as = "String")]
    pub vf: Decimal,
    /// Timestamp of the current batch.
    pub current_snapshot_at: Option<DateTime<Utc>>,
}

/// The account columns shown next to a leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AccountSummary {
    /// Account index.
    pub idx: AccountIdx,
    /// External player id.
    pub sdvx_id: String,
    /// Name shown on leaderboards.
    pub display_name: String,
    /// Whether the player hides their profile from others.
    pub is_hidden: bool,
    /// Skill analyzer tier.
    pub skill_level: i16,
    /// Total rating.
    #[ts(as = "String")]
    pub vf: Decimal,
    /// Timestamp of the current batch.
    pub current_snapshot_at: Option<DateTime<Utc>>,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        Self {
            idx: account.idx,
            sdvx_id: account.sdvx_id,
            display_name: account.display_name,
            is_hidden: account.is_hidden,
            skill_level: account.skill_level,
            vf: account.vf,
            current_snapshot_at: account.current_snapshot_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Play records
// ---------------------------------------------------------------------------

/// One stored play result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayRecord {
    /// Owning account.
    pub account_idx: AccountIdx,
    /// Chart played.
    pub chart_idx: ChartIdx,
    /// Score (0-10,000,000).
    pub score: i32,
    /// Clear rank.
    #[ts(as = "i16")]
    pub rank: ClearRank,
    /// Rating contribution of this chart.
    #[ts(as = "String")]
    pub chart_vf: Decimal,
    /// Timestamp of the batch this record was imported in.
    pub inserted_at: DateTime<Utc>,
}

/// Decimal places kept for `chart_vf` (the column is `NUMERIC(10, 3)`).
const CHART_VF_SCALE: u32 = 3;

/// Exclusive upper bound on a stored `chart_vf`: `NUMERIC(10, 3)` leaves
/// seven integer digits.
const CHART_VF_LIMIT: i64 = 10_000_000;

/// A play result submitted for import, before it is tagged with a batch
/// timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewPlayRecord {
    /// Chart played.
    pub chart_idx: ChartIdx,
    /// Score (0-10,000,000).
    pub score: i32,
    /// Clear rank.
    #[ts(as = "i16")]
    pub rank: ClearRank,
    /// Rating contribution of this chart.
    #[ts(as = "String")]
    pub chart_vf: Decimal,
}

impl NewPlayRecord {
    /// Check the record's values against their domains.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0..=MAX_SCORE).contains(&self.score) {
            return Err(ValidationError::ScoreOutOfRange {
                chart_idx: self.chart_idx,
                score: self.score,
            });
        }
        if self.chart_vf.is_sign_negative() && !self.chart_vf.is_zero() {
            return Err(ValidationError::NegativeChartVf {
                chart_idx: self.chart_idx,
            });
        }
        if self.normalized_chart_vf() >= Decimal::from(CHART_VF_LIMIT) {
            return Err(ValidationError::ChartVfOutOfRange {
                chart_idx: self.chart_idx,
                chart_vf: self.chart_vf,
            });
        }
        Ok(())
    }

    /// `chart_vf` rounded half away from zero to three places, as it will
    /// be stored.
    pub fn normalized_chart_vf(&self) -> Decimal {
        self.chart_vf
            .round_dp_with_strategy(CHART_VF_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Tag this record with its account and batch timestamp.
    pub const fn into_record(self, account_idx: AccountIdx, inserted_at: DateTime<Utc>) -> PlayRecord {
        PlayRecord {
            account_idx,
            chart_idx: self.chart_idx,
            score: self.score,
            rank: self.rank,
            chart_vf: self.chart_vf,
            inserted_at,
        }
    }
}

/// Validate a whole import batch.
///
/// Each record must be valid on its own and no chart may appear twice,
/// since a snapshot holds at most one current record per chart.
pub fn validate_batch(records: &[NewPlayRecord]) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for record in records {
        record.validate()?;
        if !seen.insert(record.chart_idx) {
            return Err(ValidationError::DuplicateChart {
                chart_idx: record.chart_idx,
            });
        }
    }
    Ok(())
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ImportSummary {
    /// The account whose snapshot advanced.
    pub account_idx: AccountIdx,
    /// The new version marker.
    pub inserted_at: DateTime<Utc>,
    /// Number of records in the new batch.
    pub count: u32,
}

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// Score and rank of one side of a comparison row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SideResult {
    /// Score.
    pub score: i32,
    /// Clear rank.
    #[ts(as = "i16")]
    pub rank: ClearRank,
}

impl From<&PlayRecord> for SideResult {
    fn from(record: &PlayRecord) -> Self {
        Self {
            score: record.score,
            rank: record.rank,
        }
    }
}

/// One chart of a head-to-head comparison.
///
/// At least one side is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CompareRow {
    /// Chart compared.
    pub chart_idx: ChartIdx,
    /// The requesting player's current result.
    pub left: Option<SideResult>,
    /// The rival's current result.
    pub right: Option<SideResult>,
}

/// A leaderboard row: one account's current record on a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RankingEntry {
    /// The current record.
    pub record: PlayRecord,
    /// Who holds it.
    pub account: AccountSummary,
}

/// A current record joined with its chart and song, used to list the
/// charts that make up a player's rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VolforceEntry {
    /// Chart played.
    pub chart_idx: ChartIdx,
    /// Song title.
    pub title: String,
    /// Chart level.
    pub level: i16,
    /// Chart type tag.
    pub chart_type: String,
    /// Score.
    pub score: i32,
    /// Clear rank.
    #[ts(as = "i16")]
    pub rank: ClearRank,
    /// Rating contribution.
    #[ts(as = "String")]
    pub chart_vf: Decimal,
}
