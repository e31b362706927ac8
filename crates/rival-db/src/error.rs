//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] and [`fred`] errors. [`DbError::kind`] folds the variants into
//! the three classes callers branch on: not found, invalid request, and
//! infrastructure failure.

use rival_types::ValidationError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A referenced account or chart does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of entity (`account`, `chart`).
        entity: &'static str,
        /// The key that was looked up.
        key: String,
    },

    /// A caller-supplied value was rejected before querying.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row holds a value the domain types cannot represent.
    #[error("invalid stored row: {0}")]
    InvalidRow(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`DbError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The referenced entity does not exist.
    NotFound,
    /// The request was malformed.
    Validation,
    /// Store or cache I/O failed; the outcome is unknown.
    Infrastructure,
}

impl DbError {
    /// Shorthand for a missing account.
    pub fn account_not_found(key: impl ToString) -> Self {
        Self::NotFound {
            entity: "account",
            key: key.to_string(),
        }
    }

    /// Shorthand for a missing chart.
    pub fn chart_not_found(key: impl ToString) -> Self {
        Self::NotFound {
            entity: "chart",
            key: key.to_string(),
        }
    }

    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Postgres(_)
            | Self::Migration(_)
            | Self::Dragonfly(_)
            | Self::Serialization(_)
            | Self::InvalidRow(_)
            | Self::Config(_) => ErrorKind::Infrastructure,
        }
    }
}
