//! The record shape exchanged with the remote task store.
//!
//! Outgoing payloads are typed [`RemoteTask`] values. Incoming records are
//! read through the lenient [`TaskRecord`](crate::codec::TaskRecord) and
//! mapped with [`TaskRecord::into_remote_task`](crate::codec::TaskRecord::into_remote_task),
//! so a missing or malformed field never fails a response.

use serde::{Deserialize, Serialize};

use crate::task::{RemoteId, Task};

/// A task record as the remote store expects it.
///
/// `id` is omitted for records the remote has not assigned an id to.
/// Optional fields serialize as `null` rather than being dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RemoteId>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    /// One of `HIGH`, `MEDIUM`, `LOW`.
    pub priority: String,
    pub tags: Vec<String>,
    pub completed: bool,
    pub created_at: Option<String>,
    pub order_index: i64,
}

impl Task {
    /// Builds the remote payload for this task.
    ///
    /// The priority is upper-cased, a missing order index is sent as `0`,
    /// and the id is included only when it is remote-backed.
    #[must_use]
    pub fn to_remote(&self) -> RemoteTask {
        RemoteTask {
            id: self.id.remote_id(),
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date.clone(),
            priority: self.priority.to_remote(),
            tags: self.tags.clone(),
            completed: self.completed,
            created_at: Some(self.created_at.clone()),
            order_index: self.order_index.unwrap_or(0),
        }
    }
}
