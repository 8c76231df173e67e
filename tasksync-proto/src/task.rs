//! Task model shared by the local cache, the remote boundary and the view.
//!
//! A [`Task`] carries a string [`TaskId`] with one of two provenances: a
//! remote id (numeric-valued, assigned by the remote store) or a local id
//! (a hyphenated UUID v7, assigned client-side while offline). The
//! provenance is never stored separately; it is derived from the id text
//! by [`TaskId::remote_id`].

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Largest magnitude at which every integer is exactly representable as `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Identifier of a task, remote-assigned or locally generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh local identifier.
    ///
    /// Local ids are hyphenated UUIDs, which never parse as a number, so a
    /// generated id is never mistaken for a remote-backed one.
    #[must_use]
    pub fn local() -> Self {
        Self(Uuid::now_v7().hyphenated().to_string())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the numeric remote id if this id is remote-backed.
    ///
    /// An id is remote-backed iff its (trimmed, non-empty) text parses as a
    /// finite number.
    #[must_use]
    pub fn remote_id(&self) -> Option<RemoteId> {
        let text = self.0.trim();
        if text.is_empty() {
            return None;
        }
        text.parse::<f64>().ok().and_then(RemoteId::from_f64)
    }

    /// Returns `true` if the remote store can be addressed with this id.
    #[must_use]
    pub fn is_remote_backed(&self) -> bool {
        self.remote_id().is_some()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<RemoteId> for TaskId {
    fn from(id: RemoteId) -> Self {
        Self(id.to_string())
    }
}

/// Numeric identifier understood by the remote store.
///
/// Always finite. Integral values display and serialize without a
/// fractional part, so `"7"` and `"7.0"` address the same record.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RemoteId(f64);

impl RemoteId {
    /// Returns `None` for NaN or infinite values.
    #[must_use]
    pub const fn from_f64(value: f64) -> Option<Self> {
        if value.is_finite() {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns the value as an integer when it is exactly integral.
    #[must_use]
    #[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
    pub fn as_integer(self) -> Option<i64> {
        (self.0.trunc() == self.0 && self.0.abs() < MAX_SAFE_INTEGER).then_some(self.0 as i64)
    }
}

impl From<i64> for RemoteId {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_integer() {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for RemoteId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_integer() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_f64(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for RemoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::from_f64(value).ok_or_else(|| serde::de::Error::custom("remote id must be finite"))
    }
}

/// Task priority.
///
/// Labels are matched case-insensitively. A label outside the three known
/// levels is kept verbatim as [`Priority::Other`] so that records from the
/// local cache or an import file are not silently rewritten; the view sorts
/// such tasks after every known level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    /// Most urgent.
    High,
    /// The default level.
    #[default]
    Medium,
    /// Least urgent.
    Low,
    /// An unrecognized label, preserved as written.
    Other(String),
}

impl Priority {
    /// Parses a label leniently. Blank labels fall back to [`Priority::Medium`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "medium" => Self::Medium,
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Maps a remote enum value. Anything unrecognized, or absent, is medium.
    #[must_use]
    pub fn from_remote(label: Option<&str>) -> Self {
        match label.map(Self::from_label) {
            Some(Self::Other(_)) | None => Self::Medium,
            Some(known) => known,
        }
    }

    /// Lower-case label used locally.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Other(label) => label,
        }
    }

    /// Upper-case label used by the remote store (`HIGH`, `MEDIUM`, `LOW`).
    #[must_use]
    pub fn to_remote(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    /// Sort rank: high < medium < low < unrecognized.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
            Self::Other(_) => 3,
        }
    }
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A task as held in memory, in the local cache and in export files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Remote or local identifier.
    pub id: TaskId,
    /// Display title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// ISO calendar date (`YYYY-MM-DD`).
    #[serde(default)]
    pub due_date: Option<String>,
    /// Priority level.
    #[serde(default)]
    pub priority: Priority,
    /// Ordered tags; duplicates allowed.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// ISO timestamp of creation. Never changed after creation.
    pub created_at: String,
    /// Manual ordering key; a cache of the task's position after a reorder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

impl Task {
    /// Parses `created_at` with [`parse_timestamp`].
    #[must_use]
    pub fn created_time(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.created_at)
    }

    /// Parses `due_date` as a calendar date.
    #[must_use]
    pub fn due(&self) -> Option<NaiveDate> {
        self.due_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
    }
}

/// Caller-supplied fields for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    /// Title; must be non-blank.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional ISO due date.
    pub due_date: Option<String>,
    /// Priority level.
    pub priority: Priority,
    /// Tags in order.
    pub tags: Vec<String>,
}

impl NewTask {
    /// Starts a new task with the given title and default fields.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builds the task, trimming the title and normalizing blank optionals
    /// and tags away.
    #[must_use]
    pub fn into_task(self, id: TaskId, created_at: String) -> Task {
        Task {
            id,
            title: self.title.trim().to_string(),
            description: non_blank(self.description),
            due_date: non_blank(self.due_date),
            priority: self.priority,
            tags: clean_tags(self.tags),
            completed: false,
            created_at,
            order_index: None,
        }
    }
}

/// A shallow patch over a task's mutable fields.
///
/// `None` keeps the existing value. The nested options on `description` and
/// `due_date` allow clearing: `Some(None)` removes the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub completed: Option<bool>,
    pub order_index: Option<i64>,
}

impl TaskPatch {
    /// A patch that only sets the completion flag.
    #[must_use]
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Returns `true` if the patch would leave every field unchanged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the patch over `base`, returning the result. `id` and
    /// `created_at` always come from `base`.
    #[must_use]
    pub fn apply(&self, base: &Task) -> Task {
        let mut merged = base.clone();
        if let Some(title) = &self.title {
            merged.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            merged.description = non_blank(description.clone());
        }
        if let Some(due_date) = &self.due_date {
            merged.due_date = non_blank(due_date.clone());
        }
        if let Some(priority) = &self.priority {
            merged.priority = priority.clone();
        }
        if let Some(tags) = &self.tags {
            merged.tags = clean_tags(tags.clone());
        }
        if let Some(completed) = self.completed {
            merged.completed = completed;
        }
        if let Some(order_index) = self.order_index {
            merged.order_index = Some(order_index);
        }
        merged
    }
}

/// Current time as an RFC 3339 UTC timestamp with millisecond precision.
#[must_use]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses the timestamp shapes seen in practice.
///
/// Accepts RFC 3339 (normalized to UTC), a local date-time with or without
/// seconds (the remote store writes `yyyy-MM-ddTHH:mm`), or a bare date
/// (midnight).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(local) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(local);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Trims a value and drops it if nothing remains.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
