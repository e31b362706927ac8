//! Filtered reads over an account's current snapshot.
//!
//! Every query here is scoped to the rows whose `inserted_at` equals the
//! account's version marker, except [`QueryEngine::latest_per_chart`],
//! which looks across all batches. An account without a marker has an
//! empty current snapshot, so its filtered reads are empty rather than
//! `NotFound`.

use chrono::{DateTime, Utc};
use rival_types::{
    AccountIdx, ChartIdx, ClearRank, PlayFilter, PlayRecord, VolforceEntry, validate_level,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::account_store::AccountStore;
use crate::error::DbError;
use crate::snapshot_store::PlaydataRow;

/// Default number of rows in a VF breakdown.
pub const DEFAULT_VOLFORCE_LIMIT: u32 = 50;

/// Read-only queries over the `playdata` table.
pub struct QueryEngine<'a> {
    pool: &'a PgPool,
}

impl<'a> QueryEngine<'a> {
    /// Create a new query engine bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Return the current-snapshot rows matching every constraint in
    /// `filter`, ordered by chart.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn get_filtered(
        &self,
        account_idx: AccountIdx,
        filter: &PlayFilter,
    ) -> Result<Vec<PlayRecord>, DbError> {
        let Some(marker) = AccountStore::new(self.pool).marker(account_idx).await? else {
            return Ok(Vec::new());
        };

        let mut query = filtered_query(account_idx, marker, filter);
        let rows = query
            .build_query_as::<PlaydataRow>()
            .fetch_all(self.pool)
            .await?;

        tracing::debug!(%account_idx, ?filter, count = rows.len(), "Filtered current snapshot");
        rows.into_iter().map(PlaydataRow::into_record).collect()
    }

    /// Return the current-snapshot rows on charts of `level`, best score
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Validation`] if `level` is out of range and
    /// [`DbError::NotFound`] if the account does not exist.
    pub async fn get_by_level(
        &self,
        account_idx: AccountIdx,
        level: i16,
    ) -> Result<Vec<PlayRecord>, DbError> {
        let level = validate_level(level)?;
        let Some(marker) = AccountStore::new(self.pool).marker(account_idx).await? else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, PlaydataRow>(
            r"SELECT p.account_idx, p.chart_idx, p.score, p.rank, p.chart_vf, p.inserted_at
              FROM playdata p
              JOIN chart c ON c.idx = p.chart_idx
              WHERE p.account_idx = $1 AND p.inserted_at = $2 AND c.level = $3
              ORDER BY p.score DESC, p.chart_idx ASC",
        )
        .bind(account_idx.into_inner())
        .bind(marker)
        .bind(level)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PlaydataRow::into_record).collect()
    }

    /// Return the account's current record for one chart, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn get_one(
        &self,
        account_idx: AccountIdx,
        chart_idx: ChartIdx,
    ) -> Result<Option<PlayRecord>, DbError> {
        let Some(marker) = AccountStore::new(self.pool).marker(account_idx).await? else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, PlaydataRow>(
            r"SELECT account_idx, chart_idx, score, rank, chart_vf, inserted_at
              FROM playdata
              WHERE account_idx = $1 AND inserted_at = $2 AND chart_idx = $3",
        )
        .bind(account_idx.into_inner())
        .bind(marker)
        .bind(chart_idx.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(PlaydataRow::into_record).transpose()
    }

    /// Return the current-snapshot rows with the highest `chart_vf`,
    /// joined with the chart and song they belong to.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn top_volforce(
        &self,
        account_idx: AccountIdx,
        limit: u32,
    ) -> Result<Vec<VolforceEntry>, DbError> {
        let Some(marker) = AccountStore::new(self.pool).marker(account_idx).await? else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, VolforceRow>(
            r"SELECT p.chart_idx, s.title, c.level, c.type AS chart_type,
                     p.score, p.rank, p.chart_vf
              FROM playdata p
              JOIN chart c ON c.idx = p.chart_idx
              JOIN song s ON s.idx = c.song_idx
              WHERE p.account_idx = $1 AND p.inserted_at = $2
              ORDER BY p.chart_vf DESC, p.chart_idx ASC
              LIMIT $3",
        )
        .bind(account_idx.into_inner())
        .bind(marker)
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(VolforceRow::into_entry).collect()
    }

    /// Return, for every chart the account has ever played, the most
    /// recently inserted row across all batches, ordered by chart.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn latest_per_chart(
        &self,
        account_idx: AccountIdx,
    ) -> Result<Vec<PlayRecord>, DbError> {
        AccountStore::new(self.pool).ensure_exists(account_idx).await?;

        let rows = sqlx::query_as::<_, PlaydataRow>(
            r"SELECT DISTINCT ON (chart_idx)
                     account_idx, chart_idx, score, rank, chart_vf, inserted_at
              FROM playdata
              WHERE account_idx = $1
              ORDER BY chart_idx ASC, inserted_at DESC",
        )
        .bind(account_idx.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PlaydataRow::into_record).collect()
    }
}

/// Build the `SELECT` for [`QueryEngine::get_filtered`].
///
/// Unconstrained dimensions add no clause, and the `chart`/`song` joins
/// are only added when a level or title constraint needs them.
fn filtered_query(
    account_idx: AccountIdx,
    marker: DateTime<Utc>,
    filter: &PlayFilter,
) -> QueryBuilder<'static, Postgres> {
    let needs_song = filter.title_keyword().is_some();
    let needs_chart = needs_song || !filter.levels().is_empty();

    let mut query = QueryBuilder::new(
        "SELECT p.account_idx, p.chart_idx, p.score, p.rank, p.chart_vf, p.inserted_at \
         FROM playdata p",
    );
    if needs_chart {
        query.push(" JOIN chart c ON c.idx = p.chart_idx");
    }
    if needs_song {
        query.push(" JOIN song s ON s.idx = c.song_idx");
    }

    query.push(" WHERE p.account_idx = ");
    query.push_bind(account_idx.into_inner());
    query.push(" AND p.inserted_at = ");
    query.push_bind(marker);

    if !filter.clear_ranks().is_empty() {
        let codes: Vec<i16> = filter.clear_ranks().iter().map(|r| r.code()).collect();
        query.push(" AND p.rank = ANY(");
        query.push_bind(codes);
        query.push(")");
    }

    if !filter.score_grades().is_empty() {
        query.push(" AND (");
        for (i, grade) in filter.score_grades().iter().enumerate() {
            if i > 0 {
                query.push(" OR ");
            }
            let (low, high) = grade.score_range();
            query.push("p.score BETWEEN ");
            query.push_bind(low);
            query.push(" AND ");
            query.push_bind(high);
        }
        query.push(")");
    }

    if !filter.levels().is_empty() {
        let levels: Vec<i16> = filter.levels().iter().copied().collect();
        query.push(" AND c.level = ANY(");
        query.push_bind(levels);
        query.push(")");
    }

    if let Some(keyword) = filter.title_keyword() {
        query.push(" AND s.title ILIKE ");
        query.push_bind(format!("%{}%", escape_like(keyword)));
    }

    query.push(" ORDER BY p.chart_idx ASC");
    query
}

/// Escape `LIKE` wildcards so the keyword matches literally.
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for ch in keyword.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// A current-snapshot row joined with its chart and song.
#[derive(Debug, Clone, sqlx::FromRow)]
struct VolforceRow {
    chart_idx: i32,
    title: String,
    level: i16,
    chart_type: String,
    score: i32,
    rank: i16,
    chart_vf: Decimal,
}

impl VolforceRow {
    fn into_entry(self) -> Result<VolforceEntry, DbError> {
        let rank = ClearRank::try_from(self.rank)
            .map_err(|e| DbError::InvalidRow(format!("playdata(chart {}): {e}", self.chart_idx)))?;
        Ok(VolforceEntry {
            chart_idx: ChartIdx::new(self.chart_idx),
            title: self.title,
            level: self.level,
            chart_type: self.chart_type,
            score: self.score,
            rank,
            chart_vf: self.chart_vf,
        })
    }
}
