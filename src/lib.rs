//! # ordercache - persistence and reference resolution for an order data model
//!
//! Customers, orders (with their line items) and keyword tags, kept in
//! memory by an [`EntityStore`] and cached on disk.
//!
//! ordercache provides:
//! - Typed entity records with three naming views (full, foreign, cache)
//! - Lazy scalar and key-array references resolved after bulk load
//! - JSON snapshot caching with bundled-default fallback
//! - Chunked bulk import of customers into SQLite
//! - Add/remove notifications for an attached UI layer

pub mod model;
pub mod reference;
pub mod cache;
pub mod store;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use model::{Customer, Entity, EntityKey, EntityKind, Keyword, Order, Position, Shared, View};
pub use reference::{LazyKeys, LazyRef, RefStatus, ResolveStats, Resolver};
pub use cache::{BulkStep, ImportReport, SnapshotCache, SqlCache};
pub use store::{AnyEntity, Collection, EntityStore, StoreEvent, StoreStats};
pub use config::{CustomerSource, OrdercacheConfig};

/// Result type alias for ordercache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ordercache operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid {kind} record: {reason}")]
    InvalidRecord { kind: EntityKind, reason: String },

    #[error("Bulk import aborted at {step}: {source}")]
    BulkImport {
        step: BulkStep,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: EntityKey },

    #[error("SQLite cache is not available")]
    DatabaseUnavailable,
}
