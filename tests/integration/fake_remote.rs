//! In-process fake of the remote task store, served by axum on an
//! ephemeral localhost port.
//!
//! Mirrors the contract the client relies on: `GET/POST/DELETE /api/tasks`
//! and `PUT/DELETE /api/tasks/{id}`. Every request is logged so tests can
//! assert which calls were made.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One logged request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct FakeState {
    records: Vec<Value>,
    next_id: i64,
    failing: bool,
    failing_updates: HashSet<i64>,
    log: Vec<Request>,
}

type Shared = Arc<Mutex<FakeState>>;

/// A running fake. The server stops when this is dropped.
pub struct FakeRemote {
    pub base_url: String,
    state: Shared,
    handle: JoinHandle<()>,
}

impl FakeRemote {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState::default()));
        let app = Router::new()
            .route(
                "/api/tasks",
                get(list_tasks).post(create_task).delete(delete_completed),
            )
            .route("/api/tasks/{id}", put(update_task).delete(delete_task))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
            handle,
        }
    }

    /// Stores a record as if created earlier and returns its id.
    pub fn seed(&self, mut record: Value) -> i64 {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        record["id"] = json!(id);
        state.records.push(record);
        id
    }

    /// Every stored record, in insertion order.
    pub fn records(&self) -> Vec<Value> {
        self.state.lock().records.clone()
    }

    pub fn record(&self, id: i64) -> Option<Value> {
        self.state
            .lock()
            .records
            .iter()
            .find(|r| r["id"] == json!(id))
            .cloned()
    }

    /// Makes every request answer `503 Service Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Makes `PUT /tasks/{id}` answer `500` for this id.
    pub fn fail_updates_for(&self, id: i64) {
        self.state.lock().failing_updates.insert(id);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().log.clone()
    }

    /// Number of logged requests with this method.
    pub fn count(&self, method: &str) -> usize {
        self.state
            .lock()
            .log
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    pub fn clear_log(&self) {
        self.state.lock().log.clear();
    }
}

impl Drop for FakeRemote {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Returns a base URL on which nothing is listening.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

fn record(state: &Shared, method: &'static str, path: String, body: Option<Value>) -> bool {
    let mut state = state.lock();
    state.log.push(Request { method, path, body });
    state.failing
}

fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "remote store is down").into_response()
}

async fn list_tasks(State(state): State<Shared>) -> Response {
    if record(&state, "GET", "/api/tasks".into(), None) {
        return unavailable();
    }
    Json(state.lock().records.clone()).into_response()
}

async fn create_task(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    if record(&state, "POST", "/api/tasks".into(), Some(body.clone())) {
        return unavailable();
    }
    let mut state = state.lock();
    state.next_id += 1;
    body["id"] = json!(state.next_id);
    if body["createdAt"].is_null() {
        body["createdAt"] = json!("2025-01-01T09:30");
    }
    state.records.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_task(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    if record(&state, "PUT", format!("/api/tasks/{id}"), Some(body.clone())) {
        return unavailable();
    }
    let Ok(id) = id.parse::<i64>() else {
        return (StatusCode::BAD_REQUEST, format!("invalid id {id}")).into_response();
    };
    let mut state = state.lock();
    if state.failing_updates.contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "update exploded").into_response();
    }
    let Some(slot) = state.records.iter_mut().find(|r| r["id"] == json!(id)) else {
        return (StatusCode::NOT_FOUND, format!("task {id} not found")).into_response();
    };
    body["id"] = json!(id);
    *slot = body;
    StatusCode::OK.into_response()
}

async fn delete_task(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    if record(&state, "DELETE", format!("/api/tasks/{id}"), None) {
        return unavailable();
    }
    let Ok(id) = id.parse::<i64>() else {
        return (StatusCode::BAD_REQUEST, format!("invalid id {id}")).into_response();
    };
    let mut state = state.lock();
    let before = state.records.len();
    state.records.retain(|r| r["id"] != json!(id));
    if state.records.len() == before {
        return (StatusCode::NOT_FOUND, format!("task {id} not found")).into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_completed(State(state): State<Shared>) -> Response {
    if record(&state, "DELETE", "/api/tasks".into(), None) {
        return unavailable();
    }
    state
        .lock()
        .records
        .retain(|r| r["completed"] != json!(true));
    StatusCode::NO_CONTENT.into_response()
}
