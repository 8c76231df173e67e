//! The sync coordinator: remote-first mutations with local fallback.

use std::sync::Arc;

use futures_util::future::join_all;
use tasksync_proto::codec::{self, CodecError, TaskRecord};
use tasksync_proto::task::{NewTask, Task, TaskId, TaskPatch, now_iso};

use super::{Persisted, TaskError};
use crate::remote::RemoteStore;
use crate::repo::TaskRepository;

/// Orchestrates every mutation of the task collection.
///
/// Holds the repository by `Arc` so callers can read it while the
/// coordinator is mid-operation. No lock is held across a remote call, and
/// every write after a remote call finds its task by id again.
pub struct SyncCoordinator<R> {
    repo: Arc<TaskRepository>,
    remote: R,
}

impl<R: RemoteStore> SyncCoordinator<R> {
    pub const fn new(repo: Arc<TaskRepository>, remote: R) -> Self {
        Self { repo, remote }
    }

    #[must_use]
    pub const fn repository(&self) -> &Arc<TaskRepository> {
        &self.repo
    }

    #[must_use]
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Current collection in underlying order.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.repo.snapshot()
    }

    /// Loads the collection from the remote store, or from the local cache
    /// when the remote is unavailable. Returns the number of tasks loaded.
    ///
    /// A remote load overwrites the cache. A cache that cannot be read
    /// leaves an empty collection.
    pub async fn load(&self) -> Persisted<usize> {
        match self.remote.list().await {
            Ok(records) => {
                let tasks: Vec<Task> = records
                    .into_iter()
                    .enumerate()
                    .map(|(position, record)| {
                        record.into_remote_task(i64::try_from(position).unwrap_or(i64::MAX))
                    })
                    .collect();
                let count = tasks.len();
                self.repo.replace_all(tasks);
                self.save();
                tracing::info!(count, "loaded tasks from remote");
                Persisted::Remote(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote list failed; loading local cache");
                match self.repo.load() {
                    Ok(tasks) => {
                        tracing::info!(count = tasks.len(), "loaded tasks from local cache");
                        Persisted::LocalOnly(tasks.len())
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "local cache unreadable; starting empty");
                        self.repo.replace_all(Vec::new());
                        Persisted::LocalOnly(0)
                    }
                }
            }
        }
    }

    /// Creates a task.
    ///
    /// On remote success the remote's representation (with its numeric id)
    /// is kept; otherwise the task gets a fresh local id.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TitleEmpty`] if the trimmed title is empty.
    pub async fn create(&self, new: NewTask) -> Result<Persisted<Task>, TaskError> {
        if new.title.trim().is_empty() {
            return Err(TaskError::TitleEmpty);
        }
        let draft = new.into_task(TaskId::local(), now_iso());
        let created = match self.remote.create(&draft.to_remote()).await {
            Ok(record) => Persisted::Remote(record.into_remote_task(0)),
            Err(e) => {
                tracing::warn!(task_id = %draft.id, error = %e, "remote create failed; keeping task locally");
                Persisted::LocalOnly(draft)
            }
        };
        self.repo.push(created.as_inner().clone());
        self.save();
        Ok(created)
    }

    /// Applies `patch` to the task with this id.
    ///
    /// Only remote-backed tasks are sent to the remote. The merged task is
    /// written locally whatever the remote says.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::TitleEmpty`] if the patch sets a blank title and
    /// [`TaskError::NotFound`] if the task does not exist, or was deleted
    /// while the remote update was in flight.
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Persisted<Task>, TaskError> {
        if patch.title.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(TaskError::TitleEmpty);
        }
        let existing = self
            .repo
            .find(id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;
        let merged = patch.apply(&existing);

        let accepted = match existing.id.remote_id() {
            Some(remote_id) => match self.remote.update(remote_id, &merged.to_remote()).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(task_id = %id, error = %e, "remote update failed; applying locally");
                    false
                }
            },
            None => {
                tracing::debug!(task_id = %id, "local-only task; skipping remote update");
                false
            }
        };

        if !self.repo.replace(merged.clone()) {
            tracing::debug!(task_id = %id, "task removed during update; dropping result");
            return Err(TaskError::NotFound(id.clone()));
        }
        self.save();
        Ok(Persisted::tagged(accepted, merged))
    }

    /// Flips the completion flag.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] if the task does not exist.
    pub async fn toggle_complete(&self, id: &TaskId) -> Result<Persisted<Task>, TaskError> {
        let current = self
            .repo
            .find(id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;
        self.update(id, TaskPatch::completed(!current.completed))
            .await
    }

    /// Deletes a task remotely (best effort) and locally.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] if no task has this id.
    pub async fn delete(&self, id: &TaskId) -> Result<Persisted<Task>, TaskError> {
        let existing = self
            .repo
            .find(id)
            .ok_or_else(|| TaskError::NotFound(id.clone()))?;
        let key = existing
            .id
            .remote_id()
            .map_or_else(|| existing.id.to_string(), |remote_id| remote_id.to_string());

        let accepted = match self.remote.delete(&key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(task_id = %id, error = %e, "remote delete failed; removing locally");
                false
            }
        };

        let removed = self.repo.remove(id).unwrap_or(existing);
        self.save();
        Ok(Persisted::tagged(accepted, removed))
    }

    /// Removes every completed task. The local removal happens even if the
    /// remote bulk delete fails. Returns the removed tasks.
    pub async fn clear_completed(&self) -> Persisted<Vec<Task>> {
        let accepted = match self.remote.delete_completed().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "remote clear-completed failed; clearing locally");
                false
            }
        };
        let removed = self.repo.remove_where(|t| t.completed);
        self.save();
        Persisted::tagged(accepted, removed)
    }

    /// Imports records, creating each one remotely when possible.
    ///
    /// Remote creates run concurrently. Each result is independent; the
    /// tasks are appended in input order.
    pub async fn import(&self, records: Vec<TaskRecord>) -> Vec<Persisted<Task>> {
        let drafts: Vec<Task> = records
            .into_iter()
            .map(TaskRecord::into_imported_task)
            .collect();
        let payloads: Vec<_> = drafts.iter().map(Task::to_remote).collect();
        let outcomes = join_all(payloads.iter().map(|payload| self.remote.create(payload))).await;

        let results: Vec<Persisted<Task>> = drafts
            .into_iter()
            .zip(outcomes)
            .map(|(draft, outcome)| match outcome {
                Ok(record) => Persisted::Remote(record.into_remote_task(draft.order_index.unwrap_or(0))),
                Err(e) => {
                    tracing::warn!(task_id = %draft.id, error = %e, "remote create failed during import; keeping task locally");
                    Persisted::LocalOnly(draft)
                }
            })
            .collect();

        self.repo
            .extend(results.iter().map(|r| r.as_inner().clone()));
        self.save();
        tracing::info!(
            imported = results.len(),
            remote = results.iter().filter(|r| r.is_remote()).count(),
            "import finished"
        );
        results
    }

    /// Parses an import file and imports its records.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::MalformedImport`] if the text is not a JSON
    /// array. Nothing is mutated in that case.
    pub async fn import_json(&self, text: &str) -> Result<Vec<Persisted<Task>>, TaskError> {
        let batch =
            codec::decode_records(text).map_err(|e| TaskError::MalformedImport(e.to_string()))?;
        if batch.skipped > 0 {
            tracing::warn!(skipped = batch.skipped, "ignored non-record entries in import file");
        }
        Ok(self.import(batch.records).await)
    }

    /// Serializes the collection as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if serialization fails.
    pub fn export_json(&self) -> Result<String, CodecError> {
        codec::encode_tasks_pretty(&self.repo.snapshot())
    }

    /// Writes the cache, logging instead of failing.
    pub(super) fn save(&self) {
        if let Err(e) = self.repo.persist() {
            tracing::warn!(error = %e, "failed to write local task cache");
        }
    }
}
