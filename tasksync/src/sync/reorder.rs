//! Drag-and-drop reordering and its best-effort remote persistence.

use futures_util::future::join_all;
use tasksync_proto::task::{Task, TaskId};

use super::SyncCoordinator;
use crate::remote::RemoteStore;

/// What a reorder did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorderReport {
    /// Whether the sequence changed at all.
    pub moved: bool,
    /// Remote updates issued.
    pub pushed: usize,
    /// Remote updates that failed.
    pub failed: usize,
}

/// Moves the task `src` to the position `dst` held before the move, then
/// renumbers every `order_index` to its new position.
///
/// Returns `false` without touching `tasks` if the ids are equal or either
/// is missing.
pub fn move_task(tasks: &mut Vec<Task>, src: &TaskId, dst: &TaskId) -> bool {
    if src == dst {
        return false;
    }
    let Some(from) = tasks.iter().position(|t| t.id == *src) else {
        return false;
    };
    let Some(to) = tasks.iter().position(|t| t.id == *dst) else {
        return false;
    };
    let task = tasks.remove(from);
    tasks.insert(to, task);
    assign_dense_order(tasks);
    true
}

fn assign_dense_order(tasks: &mut [Task]) {
    for (position, task) in tasks.iter_mut().enumerate() {
        task.order_index = Some(i64::try_from(position).unwrap_or(i64::MAX));
    }
}

impl<R: RemoteStore> SyncCoordinator<R> {
    /// Drops `src` onto `dst` and pushes the new order to the remote.
    ///
    /// Every remote-backed task is updated, concurrently. Failures are
    /// logged and counted but never undo the local order.
    pub async fn reorder(&self, src: &TaskId, dst: &TaskId) -> ReorderReport {
        let moved = self
            .repository()
            .with_tasks_mut(|tasks| move_task(tasks, src, dst));
        if !moved {
            tracing::debug!(%src, %dst, "ignoring reorder");
            return ReorderReport::default();
        }
        self.save();

        let pending: Vec<_> = self
            .tasks()
            .into_iter()
            .filter_map(|task| {
                let remote_id = task.id.remote_id()?;
                Some((task.id.clone(), remote_id, task.to_remote()))
            })
            .collect();
        let outcomes = join_all(
            pending
                .iter()
                .map(|(_, remote_id, payload)| self.remote().update(*remote_id, payload)),
        )
        .await;

        let mut failed = 0;
        for ((id, _, _), outcome) in pending.iter().zip(outcomes) {
            if let Err(e) = outcome {
                tracing::warn!(task_id = %id, error = %e, "failed to persist order remotely");
                failed += 1;
            }
        }
        ReorderReport {
            moved: true,
            pushed: pending.len(),
            failed,
        }
    }
}
