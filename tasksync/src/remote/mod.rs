//! Remote task store client.
//!
//! Defines the [`RemoteStore`] trait covering the five request shapes the
//! client uses. Implementations:
//! - [`http::HttpRemote`]: JSON over HTTP via `reqwest`
//! - [`memory::MemoryRemote`]: in-process store with call counters, for tests
//! - [`Backend`]: runtime choice between HTTP and offline mode
//!
//! Clients report success or failure only. They never retry and never touch
//! the caller's state; degrading on failure is the sync coordinator's job.

pub mod http;
pub mod memory;

use std::future::Future;

use tasksync_proto::codec::TaskRecord;
use tasksync_proto::remote::RemoteTask;
use tasksync_proto::task::RemoteId;

/// A failed remote request.
///
/// `status` is the HTTP status of a non-success response, or `0` when the
/// request never produced a usable response (unreachable host, timeout,
/// malformed body).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("remote request failed (status {status}): {message}")]
pub struct RemoteError {
    /// HTTP status, or `0` for transport failures.
    pub status: u16,
    /// Human-readable detail.
    pub message: String,
}

impl RemoteError {
    /// A transport-level failure (`status == 0`).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            message: message.into(),
        }
    }

    /// A non-success response.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Returns `true` if no response was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        self.status == 0
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

/// The five request shapes of the remote task store.
pub trait RemoteStore: Send + Sync {
    /// `GET /tasks`.
    fn list(&self) -> impl Future<Output = Result<Vec<TaskRecord>, RemoteError>> + Send;

    /// `POST /tasks`; returns the stored record with its assigned id.
    fn create(
        &self,
        task: &RemoteTask,
    ) -> impl Future<Output = Result<TaskRecord, RemoteError>> + Send;

    /// `PUT /tasks/{id}` with the full record.
    fn update(
        &self,
        id: RemoteId,
        task: &RemoteTask,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// `DELETE /tasks/{key}`.
    ///
    /// `key` is the numeric id when the task is remote-backed, otherwise the
    /// raw local id (which the remote is expected to reject).
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// `DELETE /tasks`; removes every completed task remotely.
    fn delete_completed(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Remote selected from configuration.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Talk to the configured HTTP endpoint.
    Http(http::HttpRemote),
    /// Never contact the network; every request fails as a transport error,
    /// so every mutation takes the local-only path.
    Offline,
}

impl Backend {
    fn offline_error() -> RemoteError {
        RemoteError::transport("offline mode")
    }
}

impl RemoteStore for Backend {
    async fn list(&self) -> Result<Vec<TaskRecord>, RemoteError> {
        match self {
            Self::Http(remote) => remote.list().await,
            Self::Offline => Err(Self::offline_error()),
        }
    }

    async fn create(&self, task: &RemoteTask) -> Result<TaskRecord, RemoteError> {
        match self {
            Self::Http(remote) => remote.create(task).await,
            Self::Offline => Err(Self::offline_error()),
        }
    }

    async fn update(&self, id: RemoteId, task: &RemoteTask) -> Result<(), RemoteError> {
        match self {
            Self::Http(remote) => remote.update(id, task).await,
            Self::Offline => Err(Self::offline_error()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), RemoteError> {
        match self {
            Self::Http(remote) => remote.delete(key).await,
            Self::Offline => Err(Self::offline_error()),
        }
    }

    async fn delete_completed(&self) -> Result<(), RemoteError> {
        match self {
            Self::Http(remote) => remote.delete_completed().await,
            Self::Offline => Err(Self::offline_error()),
        }
    }
}
