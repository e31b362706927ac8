//! Data layer for Rival play records (`PostgreSQL` + `Dragonfly`).
//!
//! `PostgreSQL` holds every play record ever imported, append-only, and
//! each account's version marker. `Dragonfly` holds a read-through copy
//! of each account's current snapshot. This crate provides the interface
//! to both stores and keeps them consistent on import.
//!
//! # Architecture
//!
//! ```text
//! PlaydataService
//!     |
//!     +-- import --------> SnapshotStore (one transaction, marker last)
//!     |                        then SnapshotCache set / invalidate
//!     |
//!     +-- current -------> SnapshotCache --miss--> SnapshotStore
//!     |
//!     +-- filtered reads -> QueryEngine     (rows at the marker)
//!     +-- compare -------> ComparisonEngine (two markers, merged)
//!     +-- history/ranking -> SnapshotStore
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) connection
//! - [`kv`] -- Cache backends (`Dragonfly` or in-process)
//! - [`account_store`] -- Account reads and the version marker
//! - [`catalogue`] -- Chart existence checks
//! - [`snapshot_store`] -- Batch import, current snapshot, history, ranking
//! - [`query_engine`] -- Filtered reads over the current snapshot
//! - [`comparison`] -- Chart-by-chart merge of two accounts
//! - [`snapshot_cache`] -- Cached current snapshots
//! - [`service`] -- Store and cache composed into one surface
//! - [`error`] -- Shared error types

pub mod account_store;
pub mod catalogue;
pub mod comparison;
pub mod dragonfly;
pub mod error;
pub mod kv;
pub mod postgres;
pub mod query_engine;
pub mod service;
pub mod snapshot_cache;
pub mod snapshot_store;

// Re-export primary types for convenience.
pub use account_store::AccountStore;
pub use catalogue::CatalogueStore;
pub use comparison::{ComparisonEngine, merge_by_chart, paginate};
pub use dragonfly::DragonflyPool;
pub use error::{DbError, ErrorKind};
pub use kv::{CacheBackend, MemoryStore};
pub use postgres::{PostgresConfig, PostgresPool};
pub use query_engine::{DEFAULT_VOLFORCE_LIMIT, QueryEngine};
pub use service::{PlaydataService, ServiceSettings};
pub use snapshot_cache::SnapshotCache;
pub use snapshot_store::{
    DEFAULT_CHUNK_SIZE, DEFAULT_HISTORY_LIMIT, ImportedSnapshot, PlaydataRow, SnapshotStore,
    next_marker,
};
