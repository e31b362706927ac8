//! Enumeration types for clear ranks and score grades.
//!
//! Both travel as small integer codes: in the `playdata.rank` column, in
//! import batches, and in filter requests. Conversions from raw codes are
//! fallible so an unknown code is rejected before any query runs.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Highest attainable score on any chart.
pub const MAX_SCORE: i32 = 10_000_000;

/// Lowest chart difficulty level.
pub const MIN_LEVEL: i16 = 1;

/// Highest chart difficulty level.
pub const MAX_LEVEL: i16 = 20;

/// Check that a chart level lies in `MIN_LEVEL..=MAX_LEVEL`.
pub const fn validate_level(level: i16) -> Result<i16, ValidationError> {
    if level < MIN_LEVEL || level > MAX_LEVEL {
        return Err(ValidationError::LevelOutOfRange(level));
    }
    Ok(level)
}

// ---------------------------------------------------------------------------
// Clear rank
// ---------------------------------------------------------------------------

/// How a chart was cleared.
///
/// Stored as its code (1-5) in `playdata.rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum ClearRank {
    /// Played but failed the gauge.
    Played,
    /// Cleared on the effective gauge.
    Complete,
    /// Cleared on the excessive gauge.
    ExcessiveComplete,
    /// Full combo.
    UltimateChain,
    /// Perfect score.
    PerfectUltimateChain,
}

impl ClearRank {
    /// All ranks in code order.
    pub const ALL: [Self; 5] = [
        Self::Played,
        Self::Complete,
        Self::ExcessiveComplete,
        Self::UltimateChain,
        Self::PerfectUltimateChain,
    ];

    /// The integer code stored in the database.
    pub const fn code(self) -> i16 {
        match self {
            Self::Played => 1,
            Self::Complete => 2,
            Self::ExcessiveComplete => 3,
            Self::UltimateChain => 4,
            Self::PerfectUltimateChain => 5,
        }
    }
}

impl TryFrom<i16> for ClearRank {
    type Error = ValidationError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Played),
            2 => Ok(Self::Complete),
            3 => Ok(Self::ExcessiveComplete),
            4 => Ok(Self::UltimateChain),
            5 => Ok(Self::PerfectUltimateChain),
            other => Err(ValidationError::UnknownClearRank(other)),
        }
    }
}

impl From<ClearRank> for i16 {
    fn from(rank: ClearRank) -> Self {
        rank.code()
    }
}

// ---------------------------------------------------------------------------
// Score grade
// ---------------------------------------------------------------------------

/// Letter grade bucket a score falls into.
///
/// Grades are not stored; a grade filter becomes a set of score ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
#[allow(clippy::upper_case_acronyms)]
pub enum ScoreGrade {
    /// Below 6,500,000.
    D,
    /// 6,500,000 and up.
    C,
    /// 7,000,000 and up.
    B,
    /// 8,700,000 and up.
    A,
    /// 9,000,000 and up.
    APlus,
    /// 9,300,000 and up.
    AA,
    /// 9,500,000 and up.
    AAPlus,
    /// 9,700,000 and up.
    AAA,
    /// 9,800,000 and up.
    AAAPlus,
    /// 9,900,000 and up.
    S,
}

impl ScoreGrade {
    /// All grades, lowest first.
    pub const ALL: [Self; 10] = [
        Self::D,
        Self::C,
        Self::B,
        Self::A,
        Self::APlus,
        Self::AA,
        Self::AAPlus,
        Self::AAA,
        Self::AAAPlus,
        Self::S,
    ];

    /// The integer code used in filter requests (0-9).
    pub const fn code(self) -> i16 {
        match self {
            Self::D => 0,
            Self::C => 1,
            Self::B => 2,
            Self::A => 3,
            Self::APlus => 4,
            Self::AA => 5,
            Self::AAPlus => 6,
            Self::AAA => 7,
            Self::AAAPlus => 8,
            Self::S => 9,
        }
    }

    /// Inclusive score range `(low, high)` covered by this grade.
    pub const fn score_range(self) -> (i32, i32) {
        match self {
            Self::D => (0, 6_499_999),
            Self::C => (6_500_000, 6_999_999),
            Self::B => (7_000_000, 8_699_999),
            Self::A => (8_700_000, 8_999_999),
            Self::APlus => (9_000_000, 9_299_999),
            Self::AA => (9_300_000, 9_499_999),
            Self::AAPlus => (9_500_000, 9_699_999),
            Self::AAA => (9_700_000, 9_799_999),
            Self::AAAPlus => (9_800_000, 9_899_999),
            Self::S => (9_900_000, MAX_SCORE),
        }
    }
}

impl TryFrom<i16> for ScoreGrade {
    type Error = ValidationError;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|grade| grade.code() == code)
            .ok_or(ValidationError::UnknownScoreGrade(code))
    }
}

impl From<ScoreGrade> for i16 {
    fn from(grade: ScoreGrade) -> Self {
        grade.code()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clear_rank_codes_round_trip() {
        for rank in ClearRank::ALL {
            assert_eq!(ClearRank::try_from(rank.code()).unwrap(), rank);
        }
    }

    #[test]
    fn unknown_clear_rank_is_rejected() {
        assert_eq!(
            ClearRank::try_from(0_i16),
            Err(ValidationError::UnknownClearRank(0))
        );
        assert_eq!(
            ClearRank::try_from(6_i16),
            Err(ValidationError::UnknownClearRank(6))
        );
    }

    #[test]
    fn clear_rank_serializes_as_code() {
        assert_eq!(serde_json::to_string(&ClearRank::Complete).unwrap(), "2");
        let parsed: ClearRank = serde_json::from_str("5").unwrap();
        assert_eq!(parsed, ClearRank::PerfectUltimateChain);
        assert!(serde_json::from_str::<ClearRank>("9").is_err());
    }

    #[test]
    fn grade_ranges_tile_the_score_space() {
        let mut expected_low = 0;
        for grade in ScoreGrade::ALL {
            let (low, high) = grade.score_range();
            assert_eq!(low, expected_low, "{grade:?} leaves a gap");
            assert!(high >= low);
            expected_low = high + 1;
        }
        assert_eq!(expected_low, MAX_SCORE + 1);
    }

    #[test]
    fn unknown_grade_is_rejected() {
        assert_eq!(
            ScoreGrade::try_from(10_i16),
            Err(ValidationError::UnknownScoreGrade(10))
        );
    }

    #[test]
    fn level_bounds() {
        assert!(validate_level(1).is_ok());
        assert!(validate_level(20).is_ok());
        assert_eq!(validate_level(0), Err(ValidationError::LevelOutOfRange(0)));
        assert_eq!(
            validate_level(21),
            Err(ValidationError::LevelOutOfRange(21))
        );
    }
}
