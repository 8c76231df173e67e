//! View projection: filter, search and sort a task collection for display.
//!
//! [`project`] is pure. It never mutates its input, and the same inputs
//! always give the same output. Priority is always the primary sort key;
//! the selected [`SortKey`] only orders tasks within a priority group.

use std::cmp::{Ordering, Reverse};

use chrono::NaiveDate;
use tasksync_proto::task::Task;

/// Which tasks to show by completion state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterMode {
    const fn admits(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

/// Secondary ordering within a priority group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    /// Ascending `order_index`, else input position.
    #[default]
    Manual,
    /// Newest first.
    CreatedAt,
    /// Earliest due date first; tasks without one come first.
    DueDate,
    /// Priority only.
    Priority,
}

/// Filter, search and sort criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub filter: FilterMode,
    pub search: String,
    pub sort: SortKey,
}

/// Derives the display list for `query`.
#[must_use]
pub fn project(tasks: &[Task], query: &ViewQuery) -> Vec<Task> {
    let needle = query.search.trim().to_lowercase();
    let mut rows: Vec<(usize, &Task)> = tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| query.filter.admits(task))
        .filter(|(_, task)| needle.is_empty() || haystack(task).contains(&needle))
        .collect();

    rows.sort_by(|(pos_a, a), (pos_b, b)| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| secondary(query.sort, (*pos_a, *a), (*pos_b, *b)))
    });
    rows.into_iter().map(|(_, task)| task.clone()).collect()
}

fn haystack(task: &Task) -> String {
    format!(
        "{} {} {}",
        task.title,
        task.description.as_deref().unwrap_or(""),
        task.tags.join(" ")
    )
    .to_lowercase()
}

fn secondary(sort: SortKey, (pos_a, a): (usize, &Task), (pos_b, b): (usize, &Task)) -> Ordering {
    match sort {
        SortKey::Priority => Ordering::Equal,
        // Unparseable timestamps sort after every parseable one.
        SortKey::CreatedAt => {
            let key = |t: &Task| (t.created_time().is_none(), t.created_time().map(Reverse));
            key(a).cmp(&key(b))
        }
        SortKey::DueDate => a
            .due_date
            .as_deref()
            .unwrap_or("")
            .cmp(b.due_date.as_deref().unwrap_or("")),
        SortKey::Manual => manual_key(a, pos_a).cmp(&manual_key(b, pos_b)),
    }
}

fn manual_key(task: &Task, position: usize) -> i64 {
    task.order_index
        .unwrap_or_else(|| i64::try_from(position).unwrap_or(i64::MAX))
}

/// Active and completed totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub active: usize,
    pub completed: usize,
}

#[must_use]
pub fn counts(tasks: &[Task]) -> TaskCounts {
    let completed = tasks.iter().filter(|t| t.completed).count();
    TaskCounts {
        active: tasks.len() - completed,
        completed,
    }
}

/// A task is overdue when it is not completed and its due date is strictly
/// before `today`. Tasks without a parseable due date are never overdue.
#[must_use]
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.completed && task.due().is_some_and(|due| due < today)
}
