//! Head-to-head comparison of two accounts' current snapshots.
//!
//! Each side is resolved against its own account's marker, then the two
//! snapshots are merged in memory on chart id:
//!
//! ```text
//! left:  [1, 2]        right: [2, 3]
//!          \  \               /  /
//! rows:  [1: (L, -)] [2: (L, R)] [3: (-, R)]
//! ```
//!
//! Pagination is applied to the merged, ordered rows.

use std::cmp::Ordering;

use futures::future::try_join;
use rival_types::{AccountIdx, CompareRow, Page, PlayRecord, SideResult};
use sqlx::PgPool;

use crate::error::DbError;
use crate::snapshot_store::SnapshotStore;

/// Compares two accounts chart by chart.
pub struct ComparisonEngine<'a> {
    pool: &'a PgPool,
}

impl<'a> ComparisonEngine<'a> {
    /// Create a new comparison engine bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return one page of the merged comparison between `left` and
    /// `right`, ordered by chart id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if either account does not exist.
    pub async fn compare(
        &self,
        left: AccountIdx,
        right: AccountIdx,
        page: Page,
    ) -> Result<Vec<CompareRow>, DbError> {
        let store = SnapshotStore::new(self.pool);
        let (left_records, right_records) =
            try_join(store.get_current(left), store.get_current(right)).await?;

        let merged = merge_by_chart(&left_records, &right_records);
        tracing::debug!(
            %left,
            %right,
            total = merged.len(),
            page = page.number(),
            "Compared current snapshots"
        );
        Ok(paginate(merged, page))
    }
}

/// Full outer merge of two snapshots on chart id, ascending.
///
/// A chart present on only one side gets `None` on the other. Inputs need
/// not be sorted.
pub fn merge_by_chart(left: &[PlayRecord], right: &[PlayRecord]) -> Vec<CompareRow> {
    let mut left_sorted: Vec<&PlayRecord> = left.iter().collect();
    left_sorted.sort_by_key(|r| r.chart_idx);
    let mut right_sorted: Vec<&PlayRecord> = right.iter().collect();
    right_sorted.sort_by_key(|r| r.chart_idx);

    let mut lhs = left_sorted.into_iter().peekable();
    let mut rhs = right_sorted.into_iter().peekable();
    let mut rows = Vec::with_capacity(left.len().max(right.len()));

    loop {
        let row = match (lhs.peek().copied(), rhs.peek().copied()) {
            (None, None) => break,
            (Some(l), None) => {
                lhs.next();
                left_only(l)
            }
            (None, Some(r)) => {
                rhs.next();
                right_only(r)
            }
            (Some(l), Some(r)) => match l.chart_idx.cmp(&r.chart_idx) {
                Ordering::Less => {
                    lhs.next();
                    left_only(l)
                }
                Ordering::Greater => {
                    rhs.next();
                    right_only(r)
                }
                Ordering::Equal => {
                    lhs.next();
                    rhs.next();
                    CompareRow {
                        chart_idx: l.chart_idx,
                        left: Some(SideResult::from(l)),
                        right: Some(SideResult::from(r)),
                    }
                }
            },
        };
        rows.push(row);
    }

    rows
}

/// Slice `rows` to the requested page. A page past the end is empty.
pub fn paginate(rows: Vec<CompareRow>, page: Page) -> Vec<CompareRow> {
    rows.into_iter()
        .skip(page.offset())
        .take(page.size() as usize)
        .collect()
}

fn left_only(record: &PlayRecord) -> CompareRow {
    CompareRow {
        chart_idx: record.chart_idx,
        left: Some(SideResult::from(record)),
        right: None,
    }
}

fn right_only(record: &PlayRecord) -> CompareRow {
    CompareRow {
        chart_idx: record.chart_idx,
        left: None,
        right: Some(SideResult::from(record)),
    }
}
