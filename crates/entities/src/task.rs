//! Task entity definitions.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{CreateTask, UpdateTask};

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier.
    pub id: i64,
    /// Task title. Never empty.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Optional due date, serialized as `YYYY-MM-DD`.
    pub due_date: Option<NaiveDate>,
    /// Whether the task is done.
    #[serde(default)]
    pub completed: bool,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a fresh, not yet completed task from validated input.
    ///
    /// Callers must run [`CreateTask::validate`] first.
    pub fn from_input(id: i64, input: CreateTask, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title.trim().to_string(),
            description: input.description,
            due_date: input.due_date,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the fields present in `patch` and stamps `updated_at`.
    ///
    /// Callers must run [`UpdateTask::validate`] first.
    pub fn apply(&mut self, patch: UpdateTask, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = now;
    }

    /// Returns true if the task is open and due on or before `threshold`.
    pub fn is_due_soon(&self, threshold: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due <= threshold)
    }
}

/// Returns the last calendar day (UTC) that still counts as "due soon".
pub fn due_soon_threshold(now: DateTime<Utc>) -> NaiveDate {
    (now + Duration::hours(24)).date_naive()
}

/// Listing order: due date ascending with undated tasks last, then newest
/// first.
pub fn listing_order(a: &Task, b: &Task) -> Ordering {
    let by_due = match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_due.then_with(|| b.created_at.cmp(&a.created_at))
}
