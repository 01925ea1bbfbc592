//! Persistence
//!
//! A [`DocumentStore`] holds JSON documents in named collections. Two
//! backends: SQLite for real use and memory for tests and demos.
//! Repositories add the typed, per-entity view on top.

pub mod database;
pub mod memory;
pub mod repository;

pub use database::Database;
pub use memory::MemoryStore;
pub use repository::{HistoryRepository, KnowledgeRepository, TaskRepository};

use serde_json::Value;
use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::types::{HubError, Result};

/// Ordered document collections addressed by id
pub trait DocumentStore: Send + Sync {
    /// All documents in insertion order
    fn list(&self, collection: &str) -> Result<Vec<Value>>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Fails if the id is already taken
    fn insert(&self, collection: &str, id: &str, doc: &Value) -> Result<()>;

    /// Returns false when no document has this id
    fn update(&self, collection: &str, id: &str, doc: &Value) -> Result<bool>;

    /// Returns false when no document has this id
    fn delete(&self, collection: &str, id: &str) -> Result<bool>;
}

pub type SharedStore = Arc<dyn DocumentStore>;

/// Open the configured backend
pub fn open_store(config: &StorageConfig) -> Result<SharedStore> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::Sqlite => {
            let path = config.path.as_ref().ok_or_else(|| {
                HubError::Config("storage.path is required for the sqlite backend".to_string())
            })?;
            Ok(Arc::new(Database::open(path)?))
        }
    }
}
