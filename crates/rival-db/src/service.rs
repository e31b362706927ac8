//! The public operation surface over store and cache.
//!
//! [`PlaydataService`] owns one Postgres pool and one [`SnapshotCache`]
//! and ties the cache contract to the import path: every successful
//! import is followed, inside the same call, by either a cache refresh
//! with the new batch or an invalidation. Every cache write, from an
//! import or from a read-through miss, is followed by a marker re-read;
//! if the marker moved while the write was in flight the entry is
//! dropped. Reads that have nothing to do with the cache delegate
//! straight to the stores.

use chrono::{DateTime, Utc};
use rival_types::{
    Account, AccountIdx, ChartIdx, CompareRow, ImportSummary, NewPlayRecord, Page, PlayFilter,
    PlayRecord, RankingEntry, VolforceEntry,
};

use crate::account_store::AccountStore;
use crate::comparison::ComparisonEngine;
use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::query_engine::{DEFAULT_VOLFORCE_LIMIT, QueryEngine};
use crate::snapshot_cache::SnapshotCache;
use crate::snapshot_store::{DEFAULT_CHUNK_SIZE, DEFAULT_HISTORY_LIMIT, SnapshotStore};

/// Tunables for [`PlaydataService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Rows per `INSERT` statement during an import.
    pub chunk_size: usize,
    /// Length of the personal-best ladder.
    pub history_limit: u32,
    /// Rows per comparison page.
    pub compare_page_size: u32,
    /// Rows in a VF breakdown.
    pub volforce_limit: u32,
    /// Refresh the cache with the new batch after an import (otherwise
    /// only invalidate).
    pub cache_on_import: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            history_limit: DEFAULT_HISTORY_LIMIT,
            compare_page_size: rival_types::DEFAULT_PAGE_SIZE,
            volforce_limit: DEFAULT_VOLFORCE_LIMIT,
            cache_on_import: true,
        }
    }
}

/// Store plus cache, exposed as the operations callers use.
#[derive(Clone)]
pub struct PlaydataService {
    pg: PostgresPool,
    cache: SnapshotCache,
    settings: ServiceSettings,
}

impl PlaydataService {
    /// Build a service over connected backends.
    pub const fn new(pg: PostgresPool, cache: SnapshotCache, settings: ServiceSettings) -> Self {
        Self {
            pg,
            cache,
            settings,
        }
    }

    /// The snapshot cache.
    pub const fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Import a batch as the account's new current snapshot and bring the
    /// cache in line with it.
    ///
    /// With `cache_on_import` the cache is overwritten with the new batch;
    /// if that write fails, or a later import has already moved the marker
    /// by the time it lands, the entry is invalidated instead. Without it
    /// the entry is only invalidated.
    ///
    /// # Errors
    ///
    /// Returns the import's error if the batch was not committed. If the
    /// batch was committed but the cache could be neither refreshed nor
    /// invalidated, returns that cache error: the stored snapshot is new
    /// but the cached one may be stale.
    pub async fn import(
        &self,
        account_idx: AccountIdx,
        records: &[NewPlayRecord],
    ) -> Result<ImportSummary, DbError> {
        let imported = SnapshotStore::new(self.pg.pool())
            .with_chunk_size(self.settings.chunk_size)
            .import_snapshot(account_idx, records)
            .await?;

        if self.settings.cache_on_import {
            match self.cache.set_current(account_idx, &imported.records).await {
                Ok(()) => {
                    self.settle_cache(account_idx, Some(imported.inserted_at))
                        .await
                        .inspect_err(|e| {
                            tracing::error!(
                                %account_idx,
                                error = %e,
                                "Failed to drop superseded snapshot after import"
                            );
                        })?;
                }
                Err(e) => {
                    tracing::warn!(
                        %account_idx,
                        error = %e,
                        "Failed to refresh snapshot cache after import, invalidating"
                    );
                    self.invalidate_after_import(account_idx).await?;
                }
            }
        } else {
            self.invalidate_after_import(account_idx).await?;
        }

        Ok(imported.summary())
    }

    async fn invalidate_after_import(&self, account_idx: AccountIdx) -> Result<(), DbError> {
        self.cache.invalidate(account_idx).await.inspect_err(|e| {
            tracing::error!(
                %account_idx,
                error = %e,
                "Failed to invalidate snapshot cache after import, cached snapshot may be stale"
            );
        })
    }

    /// Re-read the marker after a cache write made at `written_at` and
    /// drop the entry if the marker has moved since. If the marker cannot
    /// be read the entry is dropped as well.
    async fn settle_cache(
        &self,
        account_idx: AccountIdx,
        written_at: Option<DateTime<Utc>>,
    ) -> Result<(), DbError> {
        match AccountStore::new(self.pg.pool()).marker(account_idx).await {
            Ok(current) => self
                .cache
                .discard_if_superseded(account_idx, written_at, current)
                .await
                .map(|_| ()),
            Err(e) => {
                tracing::warn!(
                    %account_idx,
                    error = %e,
                    "Failed to re-read marker after cache write, invalidating"
                );
                self.cache.invalidate(account_idx).await
            }
        }
    }

    /// Return the account's current snapshot, from the cache when present.
    ///
    /// On a miss the snapshot is read from Postgres and written back to
    /// the cache, unless an import moved the marker in the meantime.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist, and
    /// any cache error as is (an unreachable cache is not a miss).
    pub async fn current(&self, account_idx: AccountIdx) -> Result<Vec<PlayRecord>, DbError> {
        if let Some(records) = self.cache.get_current(account_idx).await? {
            return Ok(records);
        }
        let (marker, records) = SnapshotStore::new(self.pg.pool())
            .get_current_versioned(account_idx)
            .await?;
        self.cache.set_current(account_idx, &records).await?;
        self.settle_cache(account_idx, marker).await?;
        Ok(records)
    }

    /// Return the current snapshot straight from Postgres.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn current_uncached(
        &self,
        account_idx: AccountIdx,
    ) -> Result<Vec<PlayRecord>, DbError> {
        SnapshotStore::new(self.pg.pool())
            .get_current(account_idx)
            .await
    }

    /// Drop the account's cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the cache delete fails.
    pub async fn invalidate(&self, account_idx: AccountIdx) -> Result<(), DbError> {
        self.cache.invalidate(account_idx).await
    }

    /// See [`QueryEngine::get_filtered`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn filtered(
        &self,
        account_idx: AccountIdx,
        filter: &PlayFilter,
    ) -> Result<Vec<PlayRecord>, DbError> {
        QueryEngine::new(self.pg.pool())
            .get_filtered(account_idx, filter)
            .await
    }

    /// See [`QueryEngine::get_by_level`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Validation`] or [`DbError::NotFound`].
    pub async fn by_level(
        &self,
        account_idx: AccountIdx,
        level: i16,
    ) -> Result<Vec<PlayRecord>, DbError> {
        QueryEngine::new(self.pg.pool())
            .get_by_level(account_idx, level)
            .await
    }

    /// See [`QueryEngine::get_one`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn one(
        &self,
        account_idx: AccountIdx,
        chart_idx: ChartIdx,
    ) -> Result<Option<PlayRecord>, DbError> {
        QueryEngine::new(self.pg.pool())
            .get_one(account_idx, chart_idx)
            .await
    }

    /// Personal-best ladder of the configured length.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account or chart does not exist.
    pub async fn history(
        &self,
        account_idx: AccountIdx,
        chart_idx: ChartIdx,
    ) -> Result<Vec<PlayRecord>, DbError> {
        SnapshotStore::new(self.pg.pool())
            .get_history(account_idx, chart_idx, self.settings.history_limit)
            .await
    }

    /// See [`SnapshotStore::get_ranking`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the chart does not exist.
    pub async fn ranking(&self, chart_idx: ChartIdx) -> Result<Vec<RankingEntry>, DbError> {
        SnapshotStore::new(self.pg.pool())
            .get_ranking(chart_idx)
            .await
    }

    /// One page of the comparison, using the configured page size.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Validation`] if `page_number` is zero and
    /// [`DbError::NotFound`] if either account does not exist.
    pub async fn compare(
        &self,
        left: AccountIdx,
        right: AccountIdx,
        page_number: u32,
    ) -> Result<Vec<CompareRow>, DbError> {
        let page = Page::new(page_number, self.settings.compare_page_size)?;
        ComparisonEngine::new(self.pg.pool())
            .compare(left, right, page)
            .await
    }

    /// The configured number of top-rated current records.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn volforce(&self, account_idx: AccountIdx) -> Result<Vec<VolforceEntry>, DbError> {
        QueryEngine::new(self.pg.pool())
            .top_volforce(account_idx, self.settings.volforce_limit)
            .await
    }

    /// See [`QueryEngine::latest_per_chart`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn latest_per_chart(
        &self,
        account_idx: AccountIdx,
    ) -> Result<Vec<PlayRecord>, DbError> {
        QueryEngine::new(self.pg.pool())
            .latest_per_chart(account_idx)
            .await
    }

    /// See [`AccountStore::get`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn account(&self, account_idx: AccountIdx) -> Result<Account, DbError> {
        AccountStore::new(self.pg.pool()).get(account_idx).await
    }

    /// See [`AccountStore::find_by_sdvx_id`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no live account has this id.
    pub async fn account_by_sdvx_id(&self, sdvx_id: &str) -> Result<Account, DbError> {
        AccountStore::new(self.pg.pool())
            .find_by_sdvx_id(sdvx_id)
            .await
    }

    /// See [`AccountStore::toggle_hidden`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn toggle_hidden(&self, account_idx: AccountIdx) -> Result<bool, DbError> {
        AccountStore::new(self.pg.pool())
            .toggle_hidden(account_idx)
            .await
    }
}
