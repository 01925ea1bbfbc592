//! In-memory document store for tests and demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde_json::Value;

use super::DocumentStore;
use crate::types::{HubError, Result};

struct Entry {
    /// Insertion order; kept across updates
    seq: u64,
    doc: Value,
}

/// Collections held in memory. Listing order is insertion order.
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, HashMap<String, Entry>>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn list(&self, collection: &str) -> Result<Vec<Value>> {
        let Some(entries) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut ordered: Vec<&Entry> = entries.values().collect();
        ordered.sort_by_key(|e| e.seq);
        Ok(ordered.into_iter().map(|e| e.doc.clone()).collect())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|entries| entries.get(id).map(|e| e.doc.clone())))
    }

    fn insert(&self, collection: &str, id: &str, doc: &Value) -> Result<()> {
        let mut entries = self.collections.entry(collection.to_string()).or_default();
        if entries.contains_key(id) {
            return Err(HubError::Storage(format!(
                "Document {}/{} already exists",
                collection, id
            )));
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            id.to_string(),
            Entry {
                seq,
                doc: doc.clone(),
            },
        );
        Ok(())
    }

    fn update(&self, collection: &str, id: &str, doc: &Value) -> Result<bool> {
        let Some(mut entries) = self.collections.get_mut(collection) else {
            return Ok(false);
        };
        Ok(match entries.get_mut(id) {
            Some(entry) => {
                entry.doc = doc.clone();
                true
            }
            None => false,
        })
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self
            .collections
            .get_mut(collection)
            .is_some_and(|mut entries| entries.remove(id).is_some()))
    }
}
