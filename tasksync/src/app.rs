//! Command layer: wires configuration, repository, remote and coordinator
//! together and turns each [`Command`] into printable output.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tasksync_proto::codec::{CodecError, split_tags};
use tasksync_proto::task::{NewTask, Priority, Task, TaskId, TaskPatch};

use crate::config::{ClientConfig, Command};
use crate::remote::http::HttpRemote;
use crate::remote::{Backend, RemoteError, RemoteStore};
use crate::repo::{FileStore, TaskRepository};
use crate::sync::{Persisted, SyncCoordinator, TaskError};
use crate::view::{self, TaskCounts, ViewQuery};

/// Errors that end a command.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The remote client could not be constructed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Builds the coordinator described by `config`.
///
/// # Errors
///
/// Returns [`AppError::Remote`] if the configured base URL is unusable.
pub fn build(config: &ClientConfig) -> Result<SyncCoordinator<Backend>, AppError> {
    let store = Arc::new(FileStore::new(&config.cache_dir));
    let repo = Arc::new(TaskRepository::new(store));
    let backend = if config.offline {
        Backend::Offline
    } else {
        Backend::Http(HttpRemote::new(&config.remote_url, config.request_timeout)?)
    };
    Ok(SyncCoordinator::new(repo, backend))
}

/// Loads the collection, runs `command` and returns the text to print.
///
/// # Errors
///
/// Returns [`AppError`] for validation failures, unreadable import files,
/// and export write failures. A missing task id is reported in the output
/// instead.
pub async fn run<R: RemoteStore>(
    coordinator: &SyncCoordinator<R>,
    command: Command,
    today: NaiveDate,
) -> Result<String, AppError> {
    let loaded = coordinator.load().await;
    if !loaded.is_remote() {
        tracing::info!("remote unavailable; working from local cache");
    }

    let mut out = String::new();
    let mut query = ViewQuery::default();
    let outcome = match command {
        Command::List {
            filter,
            search,
            sort,
        } => {
            query = ViewQuery {
                filter,
                search,
                sort,
            };
            Ok(())
        }
        Command::Add {
            title,
            description,
            due,
            priority,
            tags,
        } => {
            let new = NewTask {
                title,
                description,
                due_date: due,
                priority: priority.map(Priority::from).unwrap_or_default(),
                tags: tags.as_deref().map(split_tags).unwrap_or_default(),
            };
            coordinator
                .create(new)
                .await
                .map(|created| note(&mut out, "added", &created))
        }
        Command::Edit {
            id,
            title,
            description,
            clear_description,
            due,
            clear_due,
            priority,
            tags,
        } => {
            let patch = TaskPatch {
                title,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                due_date: if clear_due { Some(None) } else { due.map(Some) },
                priority: priority.map(Priority::from),
                tags: tags.as_deref().map(split_tags),
                ..TaskPatch::default()
            };
            coordinator
                .update(&TaskId::new(id), patch)
                .await
                .map(|updated| note(&mut out, "updated", &updated))
        }
        Command::Toggle { id } => coordinator
            .toggle_complete(&TaskId::new(id))
            .await
            .map(|toggled| note(&mut out, "toggled", &toggled)),
        Command::Rm { id } => coordinator
            .delete(&TaskId::new(id))
            .await
            .map(|removed| note(&mut out, "removed", &removed)),
        Command::ClearCompleted => {
            let removed = coordinator.clear_completed().await;
            let _ = writeln!(
                out,
                "cleared {} completed task(s){}",
                removed.as_inner().len(),
                local_suffix(removed.is_remote())
            );
            Ok(())
        }
        Command::Move { src, dst } => {
            let report = coordinator
                .reorder(&TaskId::new(src), &TaskId::new(dst))
                .await;
            if report.moved {
                let _ = writeln!(
                    out,
                    "moved; {} of {} remote update(s) succeeded",
                    report.pushed - report.failed,
                    report.pushed
                );
            } else {
                let _ = writeln!(out, "nothing to move");
            }
            Ok(())
        }
        Command::Export { path } => {
            let json = coordinator.export_json()?;
            match path {
                Some(path) => {
                    std::fs::write(&path, json).map_err(|source| AppError::Io {
                        path: path.clone(),
                        source,
                    })?;
                    let _ = writeln!(
                        out,
                        "exported {} task(s) to {}",
                        coordinator.repository().len(),
                        path.display()
                    );
                }
                None => return Ok(json),
            }
            Ok(())
        }
        Command::Import { path } => {
            let text = std::fs::read_to_string(&path).map_err(|source| AppError::Io {
                path: path.clone(),
                source,
            })?;
            coordinator.import_json(&text).await.map(|results| {
                let synced = results.iter().filter(|r| r.is_remote()).count();
                let _ = writeln!(
                    out,
                    "imported {} task(s), {synced} synced to remote",
                    results.len()
                );
            })
        }
    };

    match outcome {
        Ok(()) => {}
        Err(TaskError::NotFound(id)) => {
            let _ = writeln!(out, "no task with id {id}");
        }
        Err(e) => return Err(e.into()),
    }
    let tasks = coordinator.tasks();
    out.push_str(&render(
        &view::project(&tasks, &query),
        view::counts(&tasks),
        today,
    ));
    Ok(out)
}

/// Runs `command` against the configured backend, with today's local date.
///
/// # Errors
///
/// See [`run`] and [`build`].
pub async fn execute(config: &ClientConfig, command: Command) -> Result<String, AppError> {
    let coordinator = build(config)?;
    run(&coordinator, command, Local::now().date_naive()).await
}

fn note(out: &mut String, verb: &str, task: &Persisted<Task>) {
    let inner = task.as_inner();
    let _ = writeln!(
        out,
        "{verb} {} \"{}\"{}",
        inner.id,
        inner.title,
        local_suffix(task.is_remote())
    );
}

const fn local_suffix(remote: bool) -> &'static str {
    if remote { "" } else { " (local only)" }
}

/// Plain-text listing: one line per shown task, then `totals`, which cover
/// the whole collection rather than just the shown tasks.
#[must_use]
pub fn render(tasks: &[Task], totals: TaskCounts, today: NaiveDate) -> String {
    let mut out = String::new();
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        let _ = write!(out, "[{mark}] {:<38} {:<6} {}", task.id, task.priority, task.title);
        if let Some(due) = &task.due_date {
            let _ = write!(out, "  due {due}");
            if view::is_overdue(task, today) {
                out.push_str(" OVERDUE");
            }
        }
        for tag in &task.tags {
            let _ = write!(out, " #{tag}");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{} active, {} completed", totals.active, totals.completed);
    out
}
