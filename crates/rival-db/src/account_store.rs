//! Account reads and the version marker.
//!
//! Registration and soft deletion happen elsewhere; this module only
//! reads live accounts (`deleted_at IS NULL`) and flips the hidden flag.
//! The version marker column `current_snapshot_at` is written solely by
//! [`SnapshotStore::import_snapshot`](crate::SnapshotStore::import_snapshot).

use chrono::{DateTime, Utc};
use rival_types::{Account, AccountIdx};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `account` table.
pub struct AccountStore<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountStore<'a> {
    /// Create a new account store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a live account.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist or was
    /// deleted, [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, account_idx: AccountIdx) -> Result<Account, DbError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"SELECT idx, sdvx_id, display_name, is_hidden, skill_level, vf, current_snapshot_at
              FROM account
              WHERE idx = $1 AND deleted_at IS NULL",
        )
        .bind(account_idx.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(Account::from)
            .ok_or_else(|| DbError::account_not_found(account_idx))
    }

    /// Look up a live account by its external player id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if no live account has this id.
    pub async fn find_by_sdvx_id(&self, sdvx_id: &str) -> Result<Account, DbError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"SELECT idx, sdvx_id, display_name, is_hidden, skill_level, vf, current_snapshot_at
              FROM account
              WHERE sdvx_id = $1 AND deleted_at IS NULL",
        )
        .bind(sdvx_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Account::from)
            .ok_or_else(|| DbError::account_not_found(sdvx_id))
    }

    /// Return the account's version marker, `None` before the first import.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn marker(&self, account_idx: AccountIdx) -> Result<Option<DateTime<Utc>>, DbError> {
        let marker = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            r"SELECT current_snapshot_at
              FROM account
              WHERE idx = $1 AND deleted_at IS NULL",
        )
        .bind(account_idx.into_inner())
        .fetch_optional(self.pool)
        .await?;

        marker.ok_or_else(|| DbError::account_not_found(account_idx))
    }

    /// Fail with [`DbError::NotFound`] unless the account is live.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] or [`DbError::Postgres`].
    pub async fn ensure_exists(&self, account_idx: AccountIdx) -> Result<(), DbError> {
        self.marker(account_idx).await.map(|_| ())
    }

    /// Flip the hidden flag and return its new value.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] if the account does not exist.
    pub async fn toggle_hidden(&self, account_idx: AccountIdx) -> Result<bool, DbError> {
        let hidden = sqlx::query_scalar::<_, bool>(
            r"UPDATE account
              SET is_hidden = NOT is_hidden
              WHERE idx = $1 AND deleted_at IS NULL
              RETURNING is_hidden",
        )
        .bind(account_idx.into_inner())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::account_not_found(account_idx))?;

        tracing::info!(%account_idx, hidden, "Toggled account visibility");
        Ok(hidden)
    }
}

/// A row from the `account` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct AccountRow {
    /// Account index.
    pub idx: i32,
    /// External player id.
    pub sdvx_id: String,
    /// Leaderboard name.
    pub display_name: String,
    /// Hidden flag.
    pub is_hidden: bool,
    /// Skill analyzer tier.
    pub skill_level: i16,
    /// Total rating.
    pub vf: Decimal,
    /// Version marker.
    pub current_snapshot_at: Option<DateTime<Utc>>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            idx: AccountIdx::new(row.idx),
            sdvx_id: row.sdvx_id,
            display_name: row.display_name,
            is_hidden: row.is_hidden,
            skill_level: row.skill_level,
            vf: row.vf,
            current_snapshot_at: row.current_snapshot_at,
        }
    }
}
