// Task store: in-memory collection persisted as a single blob

use crate::blob;
use crate::error::BlobError;
use crate::filter::Filter;
use crate::models::{NewTask, Priority, Task, TaskPatch};
use crate::record::Record;
use crate::storage::BlobStorage;
use tracing::{debug, error, info, warn};

/// Insertion-ordered task collection backed by blob storage
///
/// Every mutation rewrites the whole collection under [`Task::storage_key`].
/// Writes are suppressed until [`TaskStore::load`] has run so an early
/// mutation can never clobber persisted tasks with an empty set.
pub struct TaskStore {
    storage: Box<dyn BlobStorage>,
    tasks: Vec<Task>,
    loaded: bool,
}

impl TaskStore {
    /// Create an unloaded store; call [`TaskStore::load`] before use
    pub fn new<S: BlobStorage + 'static>(storage: S) -> Self {
        Self {
            storage: Box::new(storage),
            tasks: Vec::new(),
            loaded: false,
        }
    }

    /// Create a store and load the persisted collection
    pub fn open<S: BlobStorage + 'static>(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Replace the in-memory collection with the persisted one
    ///
    /// A missing or unreadable blob yields an empty collection.
    pub fn load(&mut self) {
        self.tasks = match self.read_collection() {
            Ok(tasks) => {
                info!(key = Task::storage_key(), count = tasks.len(), "Loaded tasks");
                tasks
            }
            Err(e) => {
                warn!(key = Task::storage_key(), error = %e, "Discarding unreadable task blob");
                Vec::new()
            }
        };
        self.loaded = true;
    }

    fn read_collection(&self) -> Result<Vec<Task>, BlobError> {
        match self.storage.get(Task::storage_key())? {
            Some(raw) => blob::decode_collection(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// Write the whole collection; failures are logged and in-memory state stays authoritative
    fn persist(&mut self) {
        if !self.loaded {
            debug!(key = Task::storage_key(), "Initial load pending, not persisting");
            return;
        }

        let result = blob::encode_collection(&self.tasks)
            .and_then(|raw| self.storage.set(Task::storage_key(), &raw));

        if let Err(e) = result {
            error!(key = Task::storage_key(), error = %e, "Failed to persist tasks");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn storage(&self) -> &dyn BlobStorage {
        self.storage.as_ref()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new task with a fresh id and creation time
    pub fn add(&mut self, data: NewTask) -> Task {
        let task = data.into_task();
        debug!(id = %task.id, title = %task.title, "add: appending task");

        self.tasks.push(task.clone());
        self.persist();
        task
    }

    /// Merge `patch` into the task with `id`; returns false if there is no such task
    pub fn update(&mut self, id: &str, patch: &TaskPatch) -> bool {
        let Some(task) = self.find_mut(id) else {
            debug!(id, "update: task not found");
            return false;
        };

        patch.apply_to(task);
        self.persist();
        true
    }

    /// Flip the completed flag; returns false if there is no such task
    pub fn toggle_complete(&mut self, id: &str) -> bool {
        let Some(task) = self.find_mut(id) else {
            debug!(id, "toggle_complete: task not found");
            return false;
        };

        task.completed = !task.completed;
        debug!(id, completed = task.completed, "toggle_complete: flipped");
        self.persist();
        true
    }

    /// Remove the task; returns false if there is no such task
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);

        if self.tasks.len() == before {
            debug!(id, "delete: task not found");
            return false;
        }

        self.persist();
        true
    }

    /// Remove every task
    pub fn clear(&mut self) {
        debug!(count = self.tasks.len(), "clear: removing all tasks");
        self.tasks.clear();
        self.persist();
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn by_priority(&self, priority: Priority) -> Vec<&Task> {
        Filter::Priority(priority).apply(&self.tasks)
    }

    pub fn completed_only(&self) -> Vec<&Task> {
        Filter::Completed.apply(&self.tasks)
    }

    pub fn incomplete_only(&self) -> Vec<&Task> {
        Filter::Pending.apply(&self.tasks)
    }
}
