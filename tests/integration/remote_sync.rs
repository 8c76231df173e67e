//! Integration tests for the HTTP remote client and online sync.
//!
//! Drives `HttpRemote` and `SyncCoordinator` against an in-process axum
//! fake of the remote task store.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod fake_remote;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tasksync::remote::RemoteStore;
use tasksync::remote::http::HttpRemote;
use tasksync::repo::{FileStore, TaskRepository};
use tasksync::sync::{Persisted, SyncCoordinator};
use tasksync_proto::remote::RemoteTask;
use tasksync_proto::task::{NewTask, Priority, RemoteId, TaskId, TaskPatch};

use fake_remote::FakeRemote;

fn client(fake: &FakeRemote) -> HttpRemote {
    HttpRemote::new(&fake.base_url, Duration::from_secs(2)).unwrap()
}

fn payload(title: &str, completed: bool) -> RemoteTask {
    RemoteTask {
        title: title.to_string(),
        priority: "MEDIUM".to_string(),
        completed,
        created_at: Some("2025-04-01T08:00:00.000Z".to_string()),
        ..RemoteTask::default()
    }
}

// ---------------------------------------------------------------------------
// HttpRemote against the fake
// ---------------------------------------------------------------------------

#[tokio::test]
async fn crud_round_trip() {
    let fake = FakeRemote::start().await;
    let remote = client(&fake);

    let created = remote.create(&payload("Buy milk", false)).await.unwrap();
    let task = created.into_remote_task(0);
    assert_eq!(task.id.as_str(), "1");
    assert_eq!(task.title, "Buy milk");

    assert_eq!(remote.list().await.unwrap().len(), 1);

    let mut done = payload("Buy milk", true);
    done.id = Some(RemoteId::from(1));
    remote.update(RemoteId::from(1), &done).await.unwrap();
    assert_eq!(fake.record(1).unwrap()["completed"], json!(true));

    remote.delete("1").await.unwrap();
    assert!(remote.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_success_status_carries_reason_and_body() {
    let fake = FakeRemote::start().await;
    let remote = client(&fake);

    let err = remote
        .update(RemoteId::from(9), &payload("ghost", false))
        .await
        .unwrap_err();
    assert_eq!(err.status, 404);
    assert!(err.message.contains("Not Found"));
    assert!(err.message.contains("task 9 not found"));

    let err = remote
        .delete("0190a6c2-0000-7000-8000-000000000000")
        .await
        .unwrap_err();
    assert_eq!(err.status, 400);
}

#[tokio::test]
async fn delete_completed_is_bulk() {
    let fake = FakeRemote::start().await;
    fake.seed(json!({"title": "done", "completed": true}));
    fake.seed(json!({"title": "open", "completed": false}));
    client(&fake).delete_completed().await.unwrap();
    let records = fake.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["title"], json!("open"));
}

#[tokio::test]
async fn create_payload_shape() {
    let fake = FakeRemote::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let coordinator = SyncCoordinator::new(Arc::new(TaskRepository::new(store)), client(&fake));

    coordinator
        .create(NewTask::new("Plan trip").with_priority(Priority::High))
        .await
        .unwrap();

    let requests = fake.requests();
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(body["priority"], json!("HIGH"));
    assert!(body.get("description").unwrap().is_null());
    assert!(body.get("dueDate").unwrap().is_null());
    assert!(body.get("id").is_none());
    assert_eq!(body["tags"], json!([]));
    assert_eq!(body["completed"], json!(false));
}

// ---------------------------------------------------------------------------
// Coordinator online
// ---------------------------------------------------------------------------

#[tokio::test]
async fn load_maps_remote_records() {
    let fake = FakeRemote::start().await;
    fake.seed(json!({"title": "A", "priority": "LOW", "createdAt": "2025-03-01T10:00"}));
    fake.seed(json!({"title": "B", "priority": "bogus", "tags": ["x"]}));
    let dir = tempfile::tempdir().unwrap();
    let coordinator = SyncCoordinator::new(
        Arc::new(TaskRepository::new(Arc::new(FileStore::new(dir.path())))),
        client(&fake),
    );

    assert_eq!(coordinator.load().await, Persisted::Remote(2));
    let tasks = coordinator.tasks();
    assert_eq!(tasks[0].priority, Priority::Low);
    assert_eq!(tasks[0].order_index, Some(0));
    assert!(tasks[0].created_time().is_some());
    // Unrecognized remote priorities become medium.
    assert_eq!(tasks[1].priority, Priority::Medium);
    assert_eq!(tasks[1].order_index, Some(1));
    assert_eq!(tasks[1].tags, vec!["x"]);
    assert!(dir.path().join("tasks_v1.json").exists());
}

#[tokio::test]
async fn online_lifecycle() {
    let fake = FakeRemote::start().await;
    let dir = tempfile::tempdir().unwrap();
    let coordinator = SyncCoordinator::new(
        Arc::new(TaskRepository::new(Arc::new(FileStore::new(dir.path())))),
        client(&fake),
    );
    coordinator.load().await;

    let first = coordinator
        .create(NewTask::new("T1"))
        .await
        .unwrap();
    assert!(first.is_remote());
    let first = first.into_inner();
    let second = coordinator
        .create(NewTask::new("T2"))
        .await
        .unwrap()
        .into_inner();

    let toggled = coordinator.toggle_complete(&first.id).await.unwrap();
    assert!(toggled.is_remote());
    assert_eq!(fake.record(1).unwrap()["completed"], json!(true));

    let patch = TaskPatch {
        title: Some("T2 renamed".to_string()),
        ..TaskPatch::default()
    };
    coordinator.update(&second.id, patch).await.unwrap();
    assert_eq!(fake.record(2).unwrap()["title"], json!("T2 renamed"));

    let cleared = coordinator.clear_completed().await;
    assert!(cleared.is_remote());
    assert_eq!(fake.records().len(), 1);
    assert_eq!(coordinator.tasks().len(), 1);

    let removed = coordinator.delete(&second.id).await.unwrap();
    assert!(removed.is_remote());
    assert!(fake.records().is_empty());
    assert!(coordinator.tasks().is_empty());
    assert_eq!(fake.requests().last().unwrap().path, "/api/tasks/2");
}

#[tokio::test]
async fn import_creates_remotely_in_input_order() {
    let fake = FakeRemote::start().await;
    let coordinator = SyncCoordinator::new(
        Arc::new(TaskRepository::new(Arc::new(
            tasksync::repo::InMemoryStore::new(),
        ))),
        client(&fake),
    );

    let results = coordinator
        .import_json(r#"[{"title":"A","priority":"low"},{"title":"B","tags":"x, y"},{"title":"C"}]"#)
        .await
        .unwrap();
    assert!(results.iter().all(Persisted::is_remote));
    let titles: Vec<String> = coordinator.tasks().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
    assert_eq!(fake.count("POST"), 3);
    let b = coordinator
        .tasks()
        .into_iter()
        .find(|t| t.title == "B")
        .unwrap();
    assert_eq!(b.tags, vec!["x", "y"]);
    assert!(b.id.is_remote_backed());
    assert_ne!(b.id, TaskId::new(""));
}
