//! Read-through cache of each account's current snapshot.
//!
//! The cache stores the full current-snapshot array of one account as a
//! JSON string under the account's textual index. It never calls the
//! store itself: on a miss the caller decides whether to fall back to
//! [`SnapshotStore::get_current`](crate::SnapshotStore::get_current) and
//! repopulate. Entries never expire; an import must be followed by
//! [`SnapshotCache::invalidate`] or [`SnapshotCache::set_current`].
//!
//! Writes are not ordered against imports, so a writer can land a batch
//! that a newer import has already superseded. Every writer therefore
//! re-reads the marker after its write and calls
//! [`SnapshotCache::discard_if_superseded`].

use chrono::{DateTime, Utc};
use rival_types::{AccountIdx, PlayRecord};

use crate::error::DbError;
use crate::kv::CacheBackend;

/// Snapshot cache over an injected key-value backend.
#[derive(Clone)]
pub struct SnapshotCache {
    backend: CacheBackend,
}

impl SnapshotCache {
    /// Create a cache over `backend`.
    pub fn new(backend: impl Into<CacheBackend>) -> Self {
        Self {
            backend: backend.into(),
        }
    }

    /// The cache key for an account.
    pub fn key(account_idx: AccountIdx) -> String {
        account_idx.to_string()
    }

    /// Return the cached current snapshot, or `Ok(None)` on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the backend read fails and
    /// [`DbError::Serialization`] if the cached payload is corrupt. Neither
    /// is reported as a miss.
    pub async fn get_current(
        &self,
        account_idx: AccountIdx,
    ) -> Result<Option<Vec<PlayRecord>>, DbError> {
        let key = Self::key(account_idx);
        let Some(payload) = self.backend.get(&key).await? else {
            tracing::debug!(%account_idx, "Snapshot cache miss");
            return Ok(None);
        };
        let records: Vec<PlayRecord> = serde_json::from_str(&payload)?;
        tracing::debug!(%account_idx, count = records.len(), "Snapshot cache hit");
        Ok(Some(records))
    }

    /// Store `records` as the account's cached snapshot, replacing any
    /// previous entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if serialization or the backend write fails.
    pub async fn set_current(
        &self,
        account_idx: AccountIdx,
        records: &[PlayRecord],
    ) -> Result<(), DbError> {
        let payload = serde_json::to_string(records)?;
        self.backend.set(&Self::key(account_idx), &payload).await?;
        tracing::debug!(%account_idx, count = records.len(), "Snapshot cached");
        Ok(())
    }

    /// Drop the account's cached snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the backend delete fails.
    pub async fn invalidate(&self, account_idx: AccountIdx) -> Result<(), DbError> {
        self.backend.delete(&Self::key(account_idx)).await?;
        tracing::debug!(%account_idx, "Snapshot cache invalidated");
        Ok(())
    }

    /// Drop the entry written at marker `written_at` unless it is still the
    /// account's `current` marker. Returns whether the entry was dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the backend delete fails.
    pub async fn discard_if_superseded(
        &self,
        account_idx: AccountIdx,
        written_at: Option<DateTime<Utc>>,
        current: Option<DateTime<Utc>>,
    ) -> Result<bool, DbError> {
        if written_at == current {
            return Ok(false);
        }
        tracing::debug!(
            %account_idx,
            written_at = ?written_at,
            current = ?current,
            "Cached snapshot superseded during write"
        );
        self.invalidate(account_idx).await?;
        Ok(true)
    }

    /// Name of the underlying backend.
    pub const fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
