//! Validation errors for caller-supplied values.
//!
//! Every value that crosses into the data layer from outside (filter
//! codes, import batches, pagination) is checked before a query is built.
//! A [`ValidationError`] means the request itself was malformed.

use rust_decimal::Decimal;

use crate::ids::ChartIdx;

/// A caller-supplied value lies outside its domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A clear-rank code that does not name any [`ClearRank`](crate::ClearRank).
    #[error("unknown clear rank code: {0}")]
    UnknownClearRank(i16),

    /// A score-grade code that does not name any [`ScoreGrade`](crate::ScoreGrade).
    #[error("unknown score grade code: {0}")]
    UnknownScoreGrade(i16),

    /// A chart level outside `1..=20`.
    #[error("chart level out of range: {0}")]
    LevelOutOfRange(i16),

    /// A score outside `0..=10_000_000`.
    #[error("score {score} out of range for chart {chart_idx}")]
    ScoreOutOfRange {
        /// The chart the record belongs to.
        chart_idx: ChartIdx,
        /// The rejected score.
        score: i32,
    },

    /// A negative per-chart rating contribution.
    #[error("negative chart VF for chart {chart_idx}")]
    NegativeChartVf {
        /// The chart the record belongs to.
        chart_idx: ChartIdx,
    },

    /// A rating contribution too large for the stored `NUMERIC(10, 3)`.
    #[error("chart VF {chart_vf} out of range for chart {chart_idx}")]
    ChartVfOutOfRange {
        /// The chart the record belongs to.
        chart_idx: ChartIdx,
        /// The rejected value.
        chart_vf: Decimal,
    },

    /// The same chart appears twice in one import batch.
    #[error("chart {chart_idx} appears more than once in the batch")]
    DuplicateChart {
        /// The repeated chart.
        chart_idx: ChartIdx,
    },

    /// Page numbers start at 1.
    #[error("page must be at least 1, got {0}")]
    InvalidPage(u32),

    /// Page size must be positive.
    #[error("page size must be at least 1, got {0}")]
    InvalidPageSize(u32),
}
