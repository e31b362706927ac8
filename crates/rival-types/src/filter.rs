//! Filter and pagination parameters for play-record queries.
//!
//! [`PlayFilter`] is a conjunction of independently optional predicates.
//! An empty dimension is skipped, never treated as "match nothing".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::{ClearRank, ScoreGrade, validate_level};
use crate::error::ValidationError;

/// Default number of rows per comparison page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Restrictions applied to an account's current snapshot.
///
/// Build with the `with_*` methods; each validates its input. Values are
/// deduplicated and kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayFilter {
    clear_ranks: BTreeSet<ClearRank>,
    score_grades: BTreeSet<ScoreGrade>,
    levels: BTreeSet<i16>,
    title_keyword: Option<String>,
}

impl PlayFilter {
    /// A filter with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from raw request values.
    ///
    /// Empty slices and a blank keyword leave that dimension unconstrained.
    pub fn from_codes(
        clear_ranks: &[i16],
        score_grades: &[i16],
        levels: &[i16],
        title_keyword: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self::new()
            .with_clear_ranks(clear_ranks)?
            .with_score_grades(score_grades)?
            .with_levels(levels)?
            .with_title_keyword(title_keyword))
    }

    /// Restrict to rows whose clear rank is one of `codes`.
    pub fn with_clear_ranks(mut self, codes: &[i16]) -> Result<Self, ValidationError> {
        for &code in codes {
            self.clear_ranks.insert(ClearRank::try_from(code)?);
        }
        Ok(self)
    }

    /// Restrict to rows whose score falls in one of the grades in `codes`.
    pub fn with_score_grades(mut self, codes: &[i16]) -> Result<Self, ValidationError> {
        for &code in codes {
            self.score_grades.insert(ScoreGrade::try_from(code)?);
        }
        Ok(self)
    }

    /// Restrict to charts whose level is one of `levels`.
    pub fn with_levels(mut self, levels: &[i16]) -> Result<Self, ValidationError> {
        for &level in levels {
            self.levels.insert(validate_level(level)?);
        }
        Ok(self)
    }

    /// Restrict to charts whose song title contains `keyword`
    /// (case-insensitive), matched as given. An empty keyword clears the
    /// restriction.
    #[must_use]
    pub fn with_title_keyword(mut self, keyword: &str) -> Self {
        self.title_keyword = (!keyword.is_empty()).then(|| keyword.to_owned());
        self
    }

    /// Clear ranks to match, empty when unconstrained.
    pub const fn clear_ranks(&self) -> &BTreeSet<ClearRank> {
        &self.clear_ranks
    }

    /// Score grades to match, empty when unconstrained.
    pub const fn score_grades(&self) -> &BTreeSet<ScoreGrade> {
        &self.score_grades
    }

    /// Chart levels to match, empty when unconstrained.
    pub const fn levels(&self) -> &BTreeSet<i16> {
        &self.levels
    }

    /// Title keyword, if any.
    pub fn title_keyword(&self) -> Option<&str> {
        self.title_keyword.as_deref()
    }
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    number: u32,
    size: u32,
}

impl Page {
    /// Validate and build a page request.
    pub const fn new(number: u32, size: u32) -> Result<Self, ValidationError> {
        if number == 0 {
            return Err(ValidationError::InvalidPage(number));
        }
        if size == 0 {
            return Err(ValidationError::InvalidPageSize(size));
        }
        Ok(Self { number, size })
    }

    /// The 1-based page number.
    pub const fn number(self) -> u32 {
        self.number
    }

    /// Rows per page.
    pub const fn size(self) -> u32 {
        self.size
    }

    /// Rows to skip: `(number - 1) * size`, saturating.
    pub const fn offset(self) -> usize {
        let skipped_pages = self.number.saturating_sub(1) as usize;
        skipped_pages.saturating_mul(self.size as usize)
    }
}
