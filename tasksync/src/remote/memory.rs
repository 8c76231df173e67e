//! In-process [`RemoteStore`] for tests.
//!
//! Keeps records in a map, assigns sequential numeric ids, counts every call
//! per operation and can be switched into a failing state where each request
//! returns a transport error.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tasksync_proto::codec::TaskRecord;
use tasksync_proto::remote::RemoteTask;
use tasksync_proto::task::RemoteId;

use super::{RemoteError, RemoteStore};

/// Number of calls made to each operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub delete_completed: usize,
}

impl CallCounts {
    /// Sum over every operation.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.list + self.create + self.update + self.delete + self.delete_completed
    }
}

#[derive(Default)]
struct Counters {
    list: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
    delete_completed: AtomicUsize,
}

/// Map-backed remote store.
#[derive(Default)]
pub struct MemoryRemote {
    records: Mutex<BTreeMap<i64, RemoteTask>>,
    next_id: AtomicUsize,
    failing: AtomicBool,
    calls: Counters,
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every request fails with a transport error.
    #[must_use]
    pub fn failing() -> Self {
        let remote = Self::default();
        remote.set_failing(true);
        remote
    }

    /// Toggles the failing state.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stores a record directly, bypassing the counters, and returns its id.
    pub fn seed(&self, mut task: RemoteTask) -> RemoteId {
        let id = self.allocate_id();
        task.id = Some(RemoteId::from(id));
        self.records.lock().insert(id, task);
        RemoteId::from(id)
    }

    /// Returns every stored record in id order.
    #[must_use]
    pub fn records(&self) -> Vec<RemoteTask> {
        self.records.lock().values().cloned().collect()
    }

    /// Returns the record stored under `id`.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<RemoteTask> {
        self.records.lock().get(&id).cloned()
    }

    /// Snapshot of the call counters.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            list: self.calls.list.load(Ordering::SeqCst),
            create: self.calls.create.load(Ordering::SeqCst),
            update: self.calls.update.load(Ordering::SeqCst),
            delete: self.calls.delete.load(Ordering::SeqCst),
            delete_completed: self.calls.delete_completed.load(Ordering::SeqCst),
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn allocate_id(&self) -> i64 {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1) as i64
    }

    fn enter(&self, counter: &AtomicUsize) -> Result<(), RemoteError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::transport("memory remote is failing"));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    async fn list(&self) -> Result<Vec<TaskRecord>, RemoteError> {
        self.enter(&self.calls.list)?;
        Ok(self.records().into_iter().map(TaskRecord::from).collect())
    }

    async fn create(&self, task: &RemoteTask) -> Result<TaskRecord, RemoteError> {
        self.enter(&self.calls.create)?;
        let id = self.allocate_id();
        let mut stored = task.clone();
        stored.id = Some(RemoteId::from(id));
        self.records.lock().insert(id, stored.clone());
        Ok(TaskRecord::from(stored))
    }

    async fn update(&self, id: RemoteId, task: &RemoteTask) -> Result<(), RemoteError> {
        self.enter(&self.calls.update)?;
        let Some(key) = id.as_integer() else {
            return Err(RemoteError::status(400, "Bad Request"));
        };
        let mut records = self.records.lock();
        let Some(slot) = records.get_mut(&key) else {
            return Err(RemoteError::status(404, "Not Found"));
        };
        *slot = RemoteTask {
            id: Some(id),
            ..task.clone()
        };
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), RemoteError> {
        self.enter(&self.calls.delete)?;
        let Ok(id) = key.parse::<i64>() else {
            return Err(RemoteError::status(400, "Bad Request"));
        };
        match self.records.lock().remove(&id) {
            Some(_) => Ok(()),
            None => Err(RemoteError::status(404, "Not Found")),
        }
    }

    async fn delete_completed(&self) -> Result<(), RemoteError> {
        self.enter(&self.calls.delete_completed)?;
        self.records.lock().retain(|_, task| !task.completed);
        Ok(())
    }
}
