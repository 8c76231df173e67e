//! [`RemoteStore`] over HTTP with JSON bodies.

use std::time::Duration;

use reqwest::{Method, Response, Url};
use tasksync_proto::codec::TaskRecord;
use tasksync_proto::remote::RemoteTask;
use tasksync_proto::task::RemoteId;

use super::{RemoteError, RemoteStore};

/// Client for the remote task store rooted at a base URL
/// (e.g. `http://127.0.0.1:8080/api`).
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base: Url,
}

impl HttpRemote {
    /// Builds a client with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a transport [`RemoteError`] if `base_url` is not an absolute
    /// http(s) URL or the client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let base = Url::parse(base_url)
            .map_err(|e| RemoteError::transport(format!("invalid base URL {base_url}: {e}")))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(RemoteError::transport(format!(
                "base URL must be http(s): {base_url}"
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::transport("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&RemoteTask>,
    ) -> Result<Response, RemoteError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, "remote request");
        let mut builder = self
            .client
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let reason = status.canonical_reason().unwrap_or("");
        let text = response.text().await.unwrap_or_default();
        let message = match (reason.is_empty(), text.trim().is_empty()) {
            (_, true) => reason.to_string(),
            (true, false) => text.trim().to_string(),
            (false, false) => format!("{reason}: {}", text.trim()),
        };
        Err(RemoteError::status(status.as_u16(), message))
    }
}

impl RemoteStore for HttpRemote {
    async fn list(&self) -> Result<Vec<TaskRecord>, RemoteError> {
        let response = self.request(Method::GET, &["tasks"], None).await?;
        let records = response
            .json::<Vec<TaskRecord>>()
            .await
            .map_err(|e| RemoteError::transport(format!("malformed task list: {e}")))?;
        Ok(records)
    }

    async fn create(&self, task: &RemoteTask) -> Result<TaskRecord, RemoteError> {
        let response = self.request(Method::POST, &["tasks"], Some(task)).await?;
        response
            .json::<TaskRecord>()
            .await
            .map_err(|e| RemoteError::transport(format!("malformed created task: {e}")))
    }

    async fn update(&self, id: RemoteId, task: &RemoteTask) -> Result<(), RemoteError> {
        let key = id.to_string();
        self.request(Method::PUT, &["tasks", &key], Some(task))
            .await
            .map(drop)
    }

    async fn delete(&self, key: &str) -> Result<(), RemoteError> {
        self.request(Method::DELETE, &["tasks", key], None)
            .await
            .map(drop)
    }

    async fn delete_completed(&self) -> Result<(), RemoteError> {
        self.request(Method::DELETE, &["tasks"], None)
            .await
            .map(drop)
    }
}
