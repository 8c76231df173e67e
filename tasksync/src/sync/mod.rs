//! Dual-write synchronization between the remote store and the local cache.
//!
//! Every mutation tries the remote first and degrades to a local-only
//! change when the remote fails. The in-memory repository always ends up
//! consistent, and the durable cache is rewritten after each mutation.
//! Results say which path was taken via [`Persisted`].

pub mod coordinator;
pub mod reorder;

pub use coordinator::SyncCoordinator;
pub use reorder::{ReorderReport, move_task};

use tasksync_proto::task::TaskId;
use thiserror::Error;

/// Errors surfaced to the user by task operations.
///
/// Remote failures never appear here; they are absorbed by degrading to a
/// local-only change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Task title cannot be empty.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// An import file is not a JSON array of task records.
    #[error("malformed import file: {0}")]
    MalformedImport(String),
    /// No task has the given id.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

impl TaskError {
    /// Returns `true` for input validation failures.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::TitleEmpty | Self::MalformedImport(_))
    }
}

/// Outcome of a mutation, tagged with where it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted<T> {
    /// Accepted by the remote store and mirrored locally.
    Remote(T),
    /// Stored only in the local cache.
    LocalOnly(T),
}

impl<T> Persisted<T> {
    /// Returns the value regardless of where it was stored.
    pub fn into_inner(self) -> T {
        match self {
            Self::Remote(value) | Self::LocalOnly(value) => value,
        }
    }

    pub const fn as_inner(&self) -> &T {
        match self {
            Self::Remote(value) | Self::LocalOnly(value) => value,
        }
    }

    /// Returns `true` if the remote accepted the change.
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Maps the carried value, keeping the tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Persisted<U> {
        match self {
            Self::Remote(value) => Persisted::Remote(f(value)),
            Self::LocalOnly(value) => Persisted::LocalOnly(f(value)),
        }
    }

    fn tagged(remote: bool, value: T) -> Self {
        if remote {
            Self::Remote(value)
        } else {
            Self::LocalOnly(value)
        }
    }
}
