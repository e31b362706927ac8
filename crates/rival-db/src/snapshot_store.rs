//! Append-only play-record storage and the snapshot versioning protocol.
//!
//! Every import writes a new batch of `playdata` rows sharing one fresh
//! `inserted_at` timestamp, then points `account.current_snapshot_at` at
//! that timestamp. Both happen in one transaction, with the account row
//! locked, and the marker update is the last statement. Rows are never
//! updated or deleted, so older batches stay queryable as history.
//!
//! ```text
//! import_snapshot(A, batch)
//!   BEGIN
//!   SELECT current_snapshot_at FROM account WHERE idx = A FOR UPDATE
//!   check every chart exists
//!   INSERT INTO playdata ... (chunked UNNEST, inserted_at = T)
//!   UPDATE account SET current_snapshot_at = T
//!   COMMIT
//! ```
//!
//! A reader resolves "current" by equality against the marker. A batch is
//! complete before its marker becomes visible, so a reader sees either the
//! old batch or the new one, never a mix.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use rival_types::{
    AccountIdx, AccountSummary, ChartIdx, ClearRank, ImportSummary, NewPlayRecord, PlayRecord,
    RankingEntry, validate_batch,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::account_store::AccountStore;
use crate::catalogue::{CatalogueStore, missing_charts};
use crate::error::DbError;

/// Default number of rows per `INSERT` statement inside an import.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default length of the personal-best ladder.
pub const DEFAULT_HISTORY_LIMIT: u32 = 5;

/// Operations on the `playdata` table that define and read snapshots.
pub struct SnapshotStore<'a> {
    pool: &'a PgPool,
    chunk_size: usize,
}

impl<'a> SnapshotStore<'a> {
    /// Create a new snapshot store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the number of rows written per `INSERT` statement.
    #[must_use]
    pub const fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Import a batch as the account's new current snapshot.
    ///
    /// All rows get one fresh timestamp, and the account's marker moves to
    /// it in the same transaction. An empty batch still advances the
    /// marker, leaving the account with an empty current snapshot.
    /// Concurrent imports for the same account serialize on the account
    /// row lock. If the returned future is dropped mid-transaction the
    /// transaction rolls back.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Validation`] if the batch is malformed (checked
    /// before any I/O), [`DbError::NotFound`] if the account or a chart
    /// does not exist, and [`DbError::Postgres`] if the transaction fails.
    /// On any error the previous snapshot is untouched.
    pub async fn import_snapshot(
        &self,
        account_idx: AccountIdx,
        records: &[NewPlayRecord],
    ) -> Result<ImportedSnapshot, DbError> {
        validate_batch(records)?;

        let mut tx = self.pool.begin().await?;

        let previous = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            r"SELECT current_snapshot_at
              FROM account
              WHERE idx = $1 AND deleted_at IS NULL
              FOR UPDATE",
        )
        .bind(account_idx.into_inner())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::account_not_found(account_idx))?;

        let charts: Vec<ChartIdx> = records.iter().map(|r| r.chart_idx).collect();
        if let Some(missing) = missing_charts(&mut *tx, &charts).await?.first() {
            return Err(DbError::chart_not_found(missing));
        }

        let inserted_at = next_marker(Utc::now(), previous)?;

        // Round before writing so the returned batch equals what a later
        // read yields.
        let normalized: Vec<NewPlayRecord> = records
            .iter()
            .cloned()
            .map(|mut record| {
                record.chart_vf = record.normalized_chart_vf();
                record
            })
            .collect();

        for chunk in normalized.chunks(self.chunk_size.max(1)) {
            let len = chunk.len();
            let mut chart_idxs = Vec::with_capacity(len);
            let mut scores = Vec::with_capacity(len);
            let mut ranks = Vec::with_capacity(len);
            let mut chart_vfs: Vec<Decimal> = Vec::with_capacity(len);

            for record in chunk {
                chart_idxs.push(record.chart_idx.into_inner());
                scores.push(record.score);
                ranks.push(record.rank.code());
                chart_vfs.push(record.chart_vf);
            }

            sqlx::query(
                r"INSERT INTO playdata (account_idx, chart_idx, score, rank, chart_vf, inserted_at)
                  SELECT $1, t.chart_idx, t.score, t.rank, t.chart_vf, $2
                  FROM UNNEST($3::INTEGER[], $4::INTEGER[], $5::SMALLINT[], $6::NUMERIC[])
                       AS t(chart_idx, score, rank, chart_vf)",
            )
            .bind(account_idx.into_inner())
            .bind(inserted_at)
            .bind(&chart_idxs)
            .bind(&scores)
            .bind(&ranks)
            .bind(&chart_vfs)
            .execute(&mut *tx)
            .await?;
        }

        // The marker moves last: until this commits, readers keep seeing
        // the previous batch.
        sqlx::query(
            r"UPDATE account
              SET current_snapshot_at = $2
              WHERE idx = $1",
        )
        .bind(account_idx.into_inner())
        .bind(inserted_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut stored: Vec<PlayRecord> = normalized
            .into_iter()
            .map(|r| r.into_record(account_idx, inserted_at))
            .collect();
        stored.sort_by_key(|r| r.chart_idx);

        tracing::info!(
            %account_idx,
            count = stored.len(),
            %inserted_at,
            previous = ?previous,
            "Imported play-record snapshot"
        );

        Ok(ImportedSnapshot {
            account_idx,
            inserted_at,
            records: stored,
        })
    }

    /// Return the account's current snapshot, ordered by chart.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn get_current(&self, account_idx: AccountIdx) -> Result<Vec<PlayRecord>, DbError> {
        self.get_current_versioned(account_idx)
            .await
            .map(|(_, records)| records)
    }

    /// Return the current snapshot together with the marker it was read at
    /// (`None` before the first import).
    ///
    /// Reads the marker, then the rows carrying exactly that timestamp.
    /// Batches are immutable, so the rows for a marker value never change
    /// even if a newer import commits in between.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn get_current_versioned(
        &self,
        account_idx: AccountIdx,
    ) -> Result<(Option<DateTime<Utc>>, Vec<PlayRecord>), DbError> {
        let Some(marker) = AccountStore::new(self.pool).marker(account_idx).await? else {
            return Ok((None, Vec::new()));
        };

        let rows = sqlx::query_as::<_, PlaydataRow>(
            r"SELECT account_idx, chart_idx, score, rank, chart_vf, inserted_at
              FROM playdata
              WHERE account_idx = $1 AND inserted_at = $2
              ORDER BY chart_idx",
        )
        .bind(account_idx.into_inner())
        .bind(marker)
        .fetch_all(self.pool)
        .await?;

        tracing::debug!(%account_idx, count = rows.len(), "Loaded current snapshot");
        let records = rows
            .into_iter()
            .map(PlaydataRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((Some(marker), records))
    }

    /// Return the personal-best ladder for one chart: every score the
    /// account ever recorded on it across all batches, distinct by score,
    /// highest first, at most `limit` entries.
    ///
    /// When the same score appears in several batches the earliest row is
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account or chart does not exist.
    pub async fn get_history(
        &self,
        account_idx: AccountIdx,
        chart_idx: ChartIdx,
        limit: u32,
    ) -> Result<Vec<PlayRecord>, DbError> {
        AccountStore::new(self.pool).ensure_exists(account_idx).await?;
        CatalogueStore::new(self.pool).ensure_chart(chart_idx).await?;

        let rows = sqlx::query_as::<_, PlaydataRow>(
            r"SELECT DISTINCT ON (score) account_idx, chart_idx, score, rank, chart_vf, inserted_at
              FROM playdata
              WHERE account_idx = $1 AND chart_idx = $2
              ORDER BY score DESC, inserted_at ASC
              LIMIT $3",
        )
        .bind(account_idx.into_inner())
        .bind(chart_idx.into_inner())
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PlaydataRow::into_record).collect()
    }

    /// Return the leaderboard for one chart.
    ///
    /// Each live account contributes the record from its own current
    /// snapshot, if it has one for this chart. Accounts without a current
    /// record are left out. Ordered by score descending, then account.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the chart does not exist.
    pub async fn get_ranking(&self, chart_idx: ChartIdx) -> Result<Vec<RankingEntry>, DbError> {
        CatalogueStore::new(self.pool).ensure_chart(chart_idx).await?;

        let rows = sqlx::query_as::<_, RankingRow>(
            r"SELECT p.account_idx, p.chart_idx, p.score, p.rank, p.chart_vf, p.inserted_at,
                     a.sdvx_id, a.display_name, a.is_hidden, a.skill_level, a.vf,
                     a.current_snapshot_at
              FROM playdata p
              JOIN account a
                ON a.idx = p.account_idx
               AND p.inserted_at = a.current_snapshot_at
              WHERE p.chart_idx = $1 AND a.deleted_at IS NULL
              ORDER BY p.score DESC, p.account_idx ASC",
        )
        .bind(chart_idx.into_inner())
        .fetch_all(self.pool)
        .await?;

        tracing::debug!(%chart_idx, entries = rows.len(), "Loaded chart ranking");
        rows.into_iter().map(RankingRow::into_entry).collect()
    }
}

/// Pick the marker for a new batch.
///
/// Truncates `now` to the microsecond precision `TIMESTAMPTZ` stores, and
/// forces it strictly past `previous` so consecutive batches of one
/// account never share a timestamp, even if the clock stalls or steps
/// backwards.
///
/// # Errors
///
/// Returns [`DbError::InvalidRow`] if `previous` is at the end of the
/// representable range.
pub fn next_marker(
    now: DateTime<Utc>,
    previous: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>, DbError> {
    let now = now.trunc_subsecs(6);
    match previous {
        Some(previous) if now <= previous => previous
            .checked_add_signed(TimeDelta::microseconds(1))
            .ok_or_else(|| DbError::InvalidRow(format!("marker overflow after {previous}"))),
        _ => Ok(now),
    }
}

/// A batch that has been committed as an account's current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSnapshot {
    /// The account imported into.
    pub account_idx: AccountIdx,
    /// The new version marker.
    pub inserted_at: DateTime<Utc>,
    /// The stored records, ordered by chart as `get_current` returns them.
    pub records: Vec<PlayRecord>,
}

impl ImportedSnapshot {
    /// Summarize the import for reporting.
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            account_idx: self.account_idx,
            inserted_at: self.inserted_at,
            count: u32::try_from(self.records.len()).unwrap_or(u32::MAX),
        }
    }
}

/// A row from the `playdata` table.
///
/// Uses runtime types rather than compile-time checked types to
/// avoid requiring a live database during builds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlaydataRow {
    /// Owning account.
    pub account_idx: i32,
    /// Chart played.
    pub chart_idx: i32,
    /// Score.
    pub score: i32,
    /// Clear rank code.
    pub rank: i16,
    /// Rating contribution.
    pub chart_vf: Decimal,
    /// Batch timestamp.
    pub inserted_at: DateTime<Utc>,
}

impl PlaydataRow {
    /// Convert into the domain type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidRow`] if the stored rank code is unknown.
    pub fn into_record(self) -> Result<PlayRecord, DbError> {
        let rank = ClearRank::try_from(self.rank).map_err(|e| {
            DbError::InvalidRow(format!(
                "playdata({}, {}, {}): {e}",
                self.account_idx, self.chart_idx, self.inserted_at
            ))
        })?;
        Ok(PlayRecord {
            account_idx: AccountIdx::new(self.account_idx),
            chart_idx: ChartIdx::new(self.chart_idx),
            score: self.score,
            rank,
            chart_vf: self.chart_vf,
            inserted_at: self.inserted_at,
        })
    }
}

/// A `playdata` row joined with its account for the leaderboard.
#[derive(Debug, Clone, sqlx::FromRow)]
struct RankingRow {
    #[sqlx(flatten)]
    record: PlaydataRow,
    sdvx_id: String,
    display_name: String,
    is_hidden: bool,
    skill_level: i16,
    vf: Decimal,
    current_snapshot_at: Option<DateTime<Utc>>,
}

impl RankingRow {
    fn into_entry(self) -> Result<RankingEntry, DbError> {
        let account = AccountSummary {
            idx: AccountIdx::new(self.record.account_idx),
            sdvx_id: self.sdvx_id,
            display_name: self.display_name,
            is_hidden: self.is_hidden,
            skill_level: self.skill_level,
            vf: self.vf,
            current_snapshot_at: self.current_snapshot_at,
        };
        Ok(RankingEntry {
            record: self.record.into_record()?,
            account,
        })
    }
}
