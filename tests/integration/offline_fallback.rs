//! Integration tests for degrading to the local cache when the remote store
//! is unreachable or failing.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod fake_remote;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tasksync::remote::RemoteStore;
use tasksync::remote::http::HttpRemote;
use tasksync::repo::{FileStore, KeyValueStore, STORAGE_KEY, TaskRepository};
use tasksync::sync::{Persisted, SyncCoordinator};
use tasksync_proto::task::{NewTask, TaskPatch};

use fake_remote::{FakeRemote, unreachable_url};

fn coordinator(base_url: &str, cache_dir: &Path) -> SyncCoordinator<HttpRemote> {
    let remote = HttpRemote::new(base_url, Duration::from_secs(2)).unwrap();
    let repo = Arc::new(TaskRepository::new(Arc::new(FileStore::new(cache_dir))));
    SyncCoordinator::new(repo, remote)
}

#[tokio::test]
async fn unreachable_remote_is_transport_error() {
    let remote = HttpRemote::new(&unreachable_url(), Duration::from_secs(2)).unwrap();
    let err = remote.list().await.unwrap_err();
    assert_eq!(err.status, 0);
    assert!(err.is_transport());
}

#[tokio::test]
async fn offline_create_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let url = unreachable_url();

    let first = coordinator(&url, dir.path());
    assert_eq!(first.load().await, Persisted::LocalOnly(0));
    let created = first
        .create(NewTask::new("Offline task").with_tags(["a", "b"]))
        .await
        .unwrap();
    assert!(!created.is_remote());
    let created = created.into_inner();
    assert!(!created.id.is_remote_backed());

    let second = coordinator(&url, dir.path());
    assert_eq!(second.load().await, Persisted::LocalOnly(1));
    let reloaded = &second.tasks()[0];
    assert_eq!(reloaded.id, created.id);
    assert_eq!(reloaded.tags, vec!["a", "b"]);
    // Position becomes the order index on load.
    assert_eq!(reloaded.order_index, Some(0));
}

#[tokio::test]
async fn failing_remote_degrades_and_local_update_skips_remote() {
    let fake = FakeRemote::start().await;
    let dir = tempfile::tempdir().unwrap();
    let coordinator = coordinator(&fake.base_url, dir.path());
    coordinator.load().await;

    fake.set_failing(true);
    let local = coordinator
        .create(NewTask::new("while down"))
        .await
        .unwrap();
    assert!(!local.is_remote());
    let local = local.into_inner();
    fake.set_failing(false);
    fake.clear_log();

    let patch = TaskPatch {
        title: Some("edited".to_string()),
        ..TaskPatch::default()
    };
    let updated = coordinator.update(&local.id, patch).await.unwrap();
    assert!(!updated.is_remote());
    assert_eq!(fake.count("PUT"), 0);
    assert_eq!(coordinator.tasks()[0].title, "edited");

    // The remote rejects the non-numeric key; the task is still removed.
    let removed = coordinator.delete(&local.id).await.unwrap();
    assert!(!removed.is_remote());
    assert_eq!(fake.count("DELETE"), 1);
    assert!(coordinator.tasks().is_empty());
}

#[tokio::test]
async fn remote_update_failure_still_applies_locally() {
    let fake = FakeRemote::start().await;
    let dir = tempfile::tempdir().unwrap();
    let coordinator = coordinator(&fake.base_url, dir.path());
    let task = coordinator
        .create(NewTask::new("flaky"))
        .await
        .unwrap()
        .into_inner();
    fake.fail_updates_for(1);

    let toggled = coordinator.toggle_complete(&task.id).await.unwrap();
    assert!(!toggled.is_remote());
    assert!(coordinator.tasks()[0].completed);
    assert_eq!(fake.record(1).unwrap()["completed"], serde_json::json!(false));
}

#[tokio::test]
async fn clear_completed_with_unreachable_remote() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = coordinator(&unreachable_url(), dir.path());
    let t1 = coordinator
        .create(NewTask::new("T1"))
        .await
        .unwrap()
        .into_inner();
    let t2 = coordinator
        .create(NewTask::new("T2"))
        .await
        .unwrap()
        .into_inner();
    coordinator.toggle_complete(&t1.id).await.unwrap();

    let cleared = coordinator.clear_completed().await;
    assert!(!cleared.is_remote());
    let left = coordinator.tasks();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, t2.id);

    let cached = FileStore::new(dir.path()).get(STORAGE_KEY).unwrap().unwrap();
    assert!(!cached.contains("\"T1\""));
    assert!(cached.contains("\"T2\""));
}

#[tokio::test]
async fn import_with_unreachable_remote() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = coordinator(&unreachable_url(), dir.path());
    let results = coordinator
        .import_json(r#"[{"title":"A"},{"title":"B","tags":"x, y"}]"#)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| !r.is_remote()));
    let tasks = coordinator.tasks();
    assert_eq!(tasks[0].title, "A");
    assert_eq!(tasks[1].title, "B");
    assert_eq!(tasks[1].tags, vec!["x", "y"]);
    assert_ne!(tasks[0].id, tasks[1].id);
    assert!(tasks.iter().all(|t| t.created_time().is_some()));
}

#[tokio::test]
async fn corrupt_cache_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    FileStore::new(dir.path())
        .set(STORAGE_KEY, "this is not json")
        .unwrap();
    let coordinator = coordinator(&unreachable_url(), dir.path());
    assert_eq!(coordinator.load().await, Persisted::LocalOnly(0));
    assert!(coordinator.tasks().is_empty());
}

#[tokio::test]
async fn remote_load_replaces_stale_cache() {
    let fake = FakeRemote::start().await;
    fake.seed(serde_json::json!({"title": "fresh", "priority": "HIGH"}));
    let dir = tempfile::tempdir().unwrap();
    FileStore::new(dir.path())
        .set(STORAGE_KEY, r#"[{"id":"old","title":"stale"}]"#)
        .unwrap();

    let coordinator = coordinator(&fake.base_url, dir.path());
    assert_eq!(coordinator.load().await, Persisted::Remote(1));
    assert_eq!(coordinator.tasks()[0].title, "fresh");
    let cached = FileStore::new(dir.path()).get(STORAGE_KEY).unwrap().unwrap();
    assert!(cached.contains("fresh"));
    assert!(!cached.contains("stale"));
}
