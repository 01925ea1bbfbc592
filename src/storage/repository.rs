//! Typed repositories over a [`DocumentStore`].
//!
//! Repositories own entity bookkeeping: task ids and timestamps, resource
//! ordering and history notifications. Documents that no longer deserialize
//! are skipped with a warning when listing.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use super::SharedStore;
use crate::constants::storage as collections;
use crate::types::{
    AnalysisHistoryItem, HubError, KnowledgeResource, Result, Task, TaskStatus, log_filter_warn,
    now_millis,
};

fn to_doc<T: Serialize>(entity: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(entity)?)
}

fn list_typed<T: DeserializeOwned>(store: &SharedStore, collection: &str) -> Result<Vec<T>> {
    Ok(store
        .list(collection)?
        .into_iter()
        .filter_map(|doc| {
            log_filter_warn(
                serde_json::from_value::<T>(doc),
                &format!("Skipping unreadable {} document", collection),
            )
        })
        .collect())
}

fn get_typed<T: DeserializeOwned>(
    store: &SharedStore,
    collection: &str,
    kind: &'static str,
    id: &str,
) -> Result<T> {
    let doc = store
        .get(collection, id)?
        .ok_or_else(|| HubError::not_found(kind, id))?;
    Ok(serde_json::from_value(doc)?)
}

// =============================================================================
// Tasks
// =============================================================================

/// Kanban tasks. Ids and timestamps are assigned here; caller values are
/// overwritten.
#[derive(Clone)]
pub struct TaskRepository {
    store: SharedStore,
}

impl TaskRepository {
    const KIND: &'static str = "Task";

    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Tasks in creation order
    pub fn list(&self) -> Result<Vec<Task>> {
        list_typed(&self.store, collections::TASKS)
    }

    pub fn get(&self, id: &str) -> Result<Task> {
        get_typed(&self.store, collections::TASKS, Self::KIND, id)
    }

    /// Persist a new task under a fresh id.
    pub fn create(&self, mut task: Task) -> Result<Task> {
        let now = now_millis();
        task.id = Uuid::new_v4().to_string();
        task.created_at = now;
        task.updated_at = now;

        self.store
            .insert(collections::TASKS, &task.id, &to_doc(&task)?)?;
        debug!("Created task {}", task.id);
        Ok(task)
    }

    /// Replace a stored task. `createdAt` is kept from the stored copy and
    /// `updatedAt` never moves backwards.
    pub fn update(&self, mut task: Task) -> Result<Task> {
        let stored = self.get(&task.id)?;
        task.created_at = stored.created_at;
        task.updated_at = now_millis().max(stored.updated_at);

        if !self
            .store
            .update(collections::TASKS, &task.id, &to_doc(&task)?)?
        {
            return Err(HubError::not_found(Self::KIND, task.id));
        }
        Ok(task)
    }

    /// Move a task to another kanban column
    pub fn update_status(&self, id: &str, status: TaskStatus) -> Result<Task> {
        let mut task = self.get(id)?;
        task.status = status;
        self.update(task)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        if !self.store.delete(collections::TASKS, id)? {
            return Err(HubError::not_found(Self::KIND, id));
        }
        Ok(())
    }
}

// =============================================================================
// Knowledge Resources
// =============================================================================

/// Knowledge hub resources. Ids come from the mapper.
#[derive(Clone)]
pub struct KnowledgeRepository {
    store: SharedStore,
}

impl KnowledgeRepository {
    const KIND: &'static str = "Resource";

    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Newest first
    pub fn list(&self) -> Result<Vec<KnowledgeResource>> {
        let mut resources: Vec<KnowledgeResource> =
            list_typed(&self.store, collections::KNOWLEDGE)?;
        resources.reverse();
        Ok(resources)
    }

    pub fn get(&self, id: &str) -> Result<KnowledgeResource> {
        get_typed(&self.store, collections::KNOWLEDGE, Self::KIND, id)
    }

    pub fn insert(&self, resource: &KnowledgeResource) -> Result<()> {
        self.store
            .insert(collections::KNOWLEDGE, &resource.id, &to_doc(resource)?)
    }

    pub fn update(&self, resource: &KnowledgeResource) -> Result<()> {
        if !self
            .store
            .update(collections::KNOWLEDGE, &resource.id, &to_doc(resource)?)?
        {
            return Err(HubError::not_found(Self::KIND, resource.id.clone()));
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        if !self.store.delete(collections::KNOWLEDGE, id)? {
            return Err(HubError::not_found(Self::KIND, id));
        }
        Ok(())
    }
}

// =============================================================================
// Video Analysis History
// =============================================================================

/// Append-only video analysis history with change notification
pub struct HistoryRepository {
    store: SharedStore,
    updates: watch::Sender<Vec<AnalysisHistoryItem>>,
}

impl HistoryRepository {
    pub fn new(store: SharedStore) -> Result<Self> {
        let initial = Self::load(&store)?;
        let (updates, _) = watch::channel(initial);
        Ok(Self { store, updates })
    }

    fn load(store: &SharedStore) -> Result<Vec<AnalysisHistoryItem>> {
        let mut items: Vec<AnalysisHistoryItem> = list_typed(store, collections::ANALYSIS_HISTORY)?;
        // Reverse first so equal timestamps stay newest-inserted first under the stable sort
        items.reverse();
        items.sort_by(|a, b| b.analyzed_at.cmp(&a.analyzed_at));
        Ok(items)
    }

    /// Newest first by `analyzedAt`
    pub fn list(&self) -> Result<Vec<AnalysisHistoryItem>> {
        Self::load(&self.store)
    }

    pub fn get(&self, id: &str) -> Result<AnalysisHistoryItem> {
        get_typed(&self.store, collections::ANALYSIS_HISTORY, "Analysis", id)
    }

    /// Store an entry and push the refreshed list to subscribers.
    pub fn append(&self, item: &AnalysisHistoryItem) -> Result<()> {
        self.store
            .insert(collections::ANALYSIS_HISTORY, &item.id, &to_doc(item)?)?;
        let list = Self::load(&self.store)?;
        self.updates.send_replace(list);
        Ok(())
    }

    /// Receiver holding the full newest-first list, updated on every append
    pub fn subscribe(&self) -> watch::Receiver<Vec<AnalysisHistoryItem>> {
        self.updates.subscribe()
    }
}
