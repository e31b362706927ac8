//! Error types for the importer binary.

use std::path::PathBuf;

use rival_db::{DbError, ErrorKind};

use crate::config::ConfigError;

/// Top-level error for the importer binary.
#[derive(Debug, thiserror::Error)]
pub enum ImporterError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A store or cache operation failed.
    #[error("{source}")]
    Db {
        /// The underlying data-layer error.
        #[from]
        source: DbError,
    },

    /// A batch file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Input {
        /// File that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Input or output JSON was malformed.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

impl ImporterError {
    /// Process exit code for this error.
    ///
    /// `2` for bad input (missing entity or rejected value), `1` for
    /// everything else.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Db { source } => match source.kind() {
                ErrorKind::NotFound | ErrorKind::Validation => 2,
                ErrorKind::Infrastructure => 1,
            },
            Self::Json { .. } => 2,
            Self::Config { .. } | Self::Input { .. } => 1,
        }
    }
}
