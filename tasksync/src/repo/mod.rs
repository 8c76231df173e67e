//! Local task repository: the in-memory task list plus its durable cache.
//!
//! [`TaskRepository`] is a plain data holder. It never talks to the network
//! and never decides anything about sync; the
//! [`SyncCoordinator`](crate::sync::SyncCoordinator) drives it. The list
//! lives behind a short-lived lock that is never held across an `.await`,
//! so every method is an atomic step with respect to interleaved async
//! operations.

pub mod store;

use std::sync::Arc;

use parking_lot::Mutex;
use tasksync_proto::codec::{self, CodecError};
use tasksync_proto::task::{Task, TaskId};

pub use store::{FileStore, InMemoryStore};

/// Namespace key under which the whole task collection is cached.
pub const STORAGE_KEY: &str = "tasks_v1";

/// Errors from the durable key-value cache.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading the stored value failed.
    #[error("failed to read cache entry {key}: {source}")]
    Read {
        /// Cache key.
        key: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the value failed.
    #[error("failed to write cache entry {key}: {source}")]
    Write {
        /// Cache key.
        key: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The stored value is not a task collection.
    #[error("cache entry {key} is corrupt: {source}")]
    Corrupt {
        /// Cache key.
        key: String,
        /// Decoding error.
        source: CodecError,
    },

    /// The collection could not be serialized.
    #[error("failed to encode tasks: {0}")]
    Encode(#[from] CodecError),
}

/// Durable string storage addressed by key.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the backing storage fails.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the backing storage fails.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// The in-memory task list and its durable cache.
pub struct TaskRepository {
    tasks: Mutex<Vec<Task>>,
    store: Arc<dyn KeyValueStore>,
}

impl TaskRepository {
    /// Creates an empty repository backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            store,
        }
    }

    /// Reads the cached collection into memory and returns it.
    ///
    /// A missing cache entry is an empty collection. Records written by
    /// older schema versions get defaults for `id`, `createdAt` and `tags`,
    /// and a missing `orderIndex` becomes the record's position.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the entry cannot be read or is not a JSON
    /// array. The in-memory list is left unchanged in that case.
    pub fn load(&self) -> Result<Vec<Task>, StoreError> {
        let Some(text) = self.store.get(STORAGE_KEY)? else {
            self.replace_all(Vec::new());
            return Ok(Vec::new());
        };
        let batch = codec::decode_records(&text).map_err(|source| StoreError::Corrupt {
            key: STORAGE_KEY.to_string(),
            source,
        })?;
        if batch.skipped > 0 {
            tracing::warn!(skipped = batch.skipped, "ignored non-record entries in task cache");
        }
        let tasks: Vec<Task> = batch
            .records
            .into_iter()
            .enumerate()
            .map(|(position, record)| record.into_cached_task(position))
            .collect();
        self.replace_all(tasks.clone());
        Ok(tasks)
    }

    /// Replaces the whole in-memory collection.
    pub fn replace_all(&self, tasks: Vec<Task>) {
        *self.tasks.lock() = tasks;
    }

    /// Writes the current collection to the durable cache.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or the write fails.
    pub fn persist(&self) -> Result<(), StoreError> {
        let text = codec::encode_tasks(&self.tasks.lock())?;
        self.store.set(STORAGE_KEY, &text)
    }

    /// Returns a copy of the collection in its underlying order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Returns a copy of the task with exactly this id.
    #[must_use]
    pub fn find(&self, id: &TaskId) -> Option<Task> {
        self.tasks.lock().iter().find(|t| t.id == *id).cloned()
    }

    /// Appends a task at the end of the collection.
    pub fn push(&self, task: Task) {
        self.tasks.lock().push(task);
    }

    /// Appends tasks in order.
    pub fn extend(&self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks.lock().extend(tasks);
    }

    /// Replaces the task with the same id in place.
    ///
    /// Returns `false` (and changes nothing) if no task has that id.
    pub fn replace(&self, task: Task) -> bool {
        let mut tasks = self.tasks.lock();
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }

    /// Removes and returns the task with this id.
    pub fn remove(&self, id: &TaskId) -> Option<Task> {
        let mut tasks = self.tasks.lock();
        let index = tasks.iter().position(|t| t.id == *id)?;
        Some(tasks.remove(index))
    }

    /// Removes every task matching `predicate`, returning them in order.
    pub fn remove_where(&self, mut predicate: impl FnMut(&Task) -> bool) -> Vec<Task> {
        let mut tasks = self.tasks.lock();
        let (removed, kept): (Vec<Task>, Vec<Task>) = std::mem::take(&mut *tasks)
            .into_iter()
            .partition(|t| predicate(t));
        *tasks = kept;
        removed
    }

    /// Runs `f` with exclusive access to the underlying sequence.
    pub fn with_tasks_mut<T>(&self, f: impl FnOnce(&mut Vec<Task>) -> T) -> T {
        f(&mut self.tasks.lock())
    }
}
