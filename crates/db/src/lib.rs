//! Record store for SHELF.
//!
//! Records live in tables addressed by their string id. Tables preserve
//! insertion order, which callers rely on as the natural catalog order.
//! The [`Table`] trait is the only surface the application sees, so the
//! in-memory backing can be swapped without touching callers.

mod memory;
pub mod snapshot;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryTable;

/// A record addressable by a stable, unique id.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} record '{id}' not found")]
    NotFound { table: &'static str, id: String },

    #[error("{table} record '{id}' already exists")]
    Duplicate { table: &'static str, id: String },

    #[error("{table} record '{id}' cannot be replaced by record '{replacement}'")]
    IdMismatch {
        table: &'static str,
        id: String,
        replacement: String,
    },

    #[error("failed to read snapshot {path}: {source}")]
    SnapshotIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot {path}: {source}")]
    SnapshotFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD over one kind of record.
#[async_trait]
pub trait Table<T: Record>: Send + Sync {
    /// Table name used in errors and logs.
    fn name(&self) -> &'static str;

    /// All records in insertion order.
    async fn list(&self) -> Vec<T>;

    async fn get(&self, id: &str) -> StoreResult<T>;

    /// First record (in insertion order) matching the predicate.
    async fn find(&self, predicate: &(dyn for<'a> Fn(&'a T) -> bool + Send + Sync)) -> Option<T>;

    /// Append a record; rejects an id that is already present.
    async fn insert(&self, record: T) -> StoreResult<T>;

    /// Replace the record stored under `id`, keeping its position.
    ///
    /// The replacement must carry the same id.
    async fn replace(&self, id: &str, record: T) -> StoreResult<T>;

    /// Remove and return the record stored under `id`.
    async fn remove(&self, id: &str) -> StoreResult<T>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
