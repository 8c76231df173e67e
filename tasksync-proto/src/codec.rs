//! Structured-data (JSON) encoding for task collections.
//!
//! The same lenient [`TaskRecord`] reads three sources: the local cache
//! (possibly written by an older schema), import files, and remote
//! responses. Every field is optional and loosely typed on read; the
//! `into_*_task` conversions apply the defaulting rules of each source and
//! never fail.

use serde::Deserialize;
use serde_json::Value;

use crate::remote::RemoteTask;
use crate::task::{Priority, Task, TaskId, non_blank, now_iso};

/// Errors from encoding or decoding task collections.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON, or serialization failed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level value is not an array.
    #[error("expected a JSON array of task records")]
    NotASequence,
}

/// A task-like record with every field optional and loosely typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskRecord {
    pub id: Option<Value>,
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub due_date: Option<Value>,
    pub priority: Option<Value>,
    /// Either an array of strings or a comma-separated string.
    pub tags: Option<Value>,
    pub completed: Option<Value>,
    pub created_at: Option<Value>,
    pub order_index: Option<Value>,
}

/// Records decoded from one document, plus the number of array elements
/// that were not records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBatch {
    pub records: Vec<TaskRecord>,
    pub skipped: usize,
}

impl TaskRecord {
    /// Converts a record read from the local cache.
    ///
    /// Missing `id`, `createdAt` and `tags` get generated defaults; a missing
    /// `orderIndex` becomes the record's position in the cache.
    #[must_use]
    pub fn into_cached_task(self, position: usize) -> Task {
        let priority = label_priority(self.priority.as_ref());
        let order_index = integer(self.order_index.as_ref()).or_else(|| Some(to_i64(position)));
        self.build(priority, order_index)
    }

    /// Converts a record from an import file.
    ///
    /// Same defaults as the cache, except that a missing `orderIndex` stays
    /// absent.
    #[must_use]
    pub fn into_imported_task(self) -> Task {
        let priority = label_priority(self.priority.as_ref());
        let order_index = integer(self.order_index.as_ref());
        self.build(priority, order_index)
    }

    /// Converts a record returned by the remote store.
    ///
    /// Unrecognized priorities become medium and a missing `orderIndex`
    /// becomes `fallback_order`.
    #[must_use]
    pub fn into_remote_task(self, fallback_order: i64) -> Task {
        let priority = Priority::from_remote(text(self.priority.as_ref()).as_deref());
        let order_index = integer(self.order_index.as_ref()).or(Some(fallback_order));
        self.build(priority, order_index)
    }

    fn build(self, priority: Priority, order_index: Option<i64>) -> Task {
        let id = non_blank(text(self.id.as_ref())).map_or_else(TaskId::local, TaskId::new);
        Task {
            id,
            title: text(self.title.as_ref()).unwrap_or_default(),
            description: non_blank(text(self.description.as_ref())),
            due_date: non_blank(text(self.due_date.as_ref())),
            priority,
            tags: self.tags.as_ref().map(parse_tags).unwrap_or_default(),
            completed: flag(self.completed.as_ref()),
            created_at: non_blank(text(self.created_at.as_ref())).unwrap_or_else(now_iso),
            order_index,
        }
    }
}

impl From<RemoteTask> for TaskRecord {
    fn from(task: RemoteTask) -> Self {
        Self {
            id: task.id.map(|id| {
                id.as_integer()
                    .map_or_else(|| Value::from(id.value()), Value::from)
            }),
            title: Some(Value::String(task.title)),
            description: task.description.map(Value::String),
            due_date: task.due_date.map(Value::String),
            priority: Some(Value::String(task.priority)),
            tags: Some(Value::Array(
                task.tags.into_iter().map(Value::String).collect(),
            )),
            completed: Some(Value::Bool(task.completed)),
            created_at: task.created_at.map(Value::String),
            order_index: Some(Value::from(task.order_index)),
        }
    }
}

/// Decodes a JSON document that must be an array of task records.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for invalid JSON and
/// [`CodecError::NotASequence`] if the top level is not an array. Array
/// elements that are not objects are counted in
/// [`RecordBatch::skipped`] instead of failing the document.
pub fn decode_records(text: &str) -> Result<RecordBatch, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(CodecError::NotASequence);
    };
    let mut batch = RecordBatch::default();
    for item in items {
        if !item.is_object() {
            batch.skipped += 1;
            continue;
        }
        match serde_json::from_value::<TaskRecord>(item) {
            Ok(record) => batch.records.push(record),
            Err(_) => batch.skipped += 1,
        }
    }
    Ok(batch)
}

/// Encodes tasks as a compact JSON array (cache format).
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_tasks(tasks: &[Task]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(tasks)?)
}

/// Encodes tasks as an indented JSON array (export format).
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_tasks_pretty(tasks: &[Task]) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

/// Reads tags from an array of strings or a comma-separated string.
///
/// Blank entries are dropped in both shapes; string input is also trimmed.
#[must_use]
pub fn parse_tags(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| text(Some(item)))
            .filter(|tag| !tag.trim().is_empty())
            .collect(),
        Value::String(raw) => split_tags(raw),
        _ => Vec::new(),
    }
}

/// Splits a comma-separated tag list, trimming each token and dropping
/// empty ones.
#[must_use]
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn label_priority(value: Option<&Value>) -> Priority {
    text(value).map_or_else(Priority::default, |label| Priority::from_label(&label))
}

fn to_i64(position: usize) -> i64 {
    i64::try_from(position).unwrap_or(i64::MAX)
}
