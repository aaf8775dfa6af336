//! Task data structure and its create/update payloads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fields::*;
use crate::project::ProjectId;

pub type TaskId = i64;

/// A unit of work, optionally grouped under a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Overdue means due before `today` and not yet completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed() && self.due_date.is_some_and(|d| d < today)
    }

    /// Trim text fields the way writes through `Database` do, then check the
    /// record is one `Database` could have written.
    pub(crate) fn normalized(mut self) -> Result<Self> {
        self.title = require_text("title", &self.title)?;
        self.category = self.category.trim().to_string();
        match (self.status, self.completed_at) {
            (Status::Completed, None) => {
                Err(Error::validation("completed_at", "completed task has no completion time"))
            }
            (s, Some(_)) if s != Status::Completed => {
                Err(Error::validation("completed_at", format!("set on a task with status {s}")))
            }
            _ => Ok(self),
        }
    }
}

/// Fields for creating a task. Everything but the title has a default.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub status: Option<Status>,
    pub due_date: Option<NaiveDate>,
    pub project_id: Option<ProjectId>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        NewTask { title: title.into(), ..Default::default() }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn due(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Fields that can be updated on a task.
///
/// The doubly optional fields distinguish "leave alone" (`None`) from
/// "clear" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due_date: Option<Option<NaiveDate>>,
    pub project_id: Option<Option<ProjectId>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
            && self.project_id.is_none()
    }

    /// Apply onto a copy of `task`, stamping `now` as the update time.
    pub(crate) fn apply(self, task: &Task, now: DateTime<Utc>) -> Result<Task> {
        let mut t = task.clone();
        if let Some(title) = self.title {
            t.title = require_text("title", &title)?;
        }
        if let Some(d) = self.description {
            t.description = d;
        }
        if let Some(c) = self.category {
            t.category = c.trim().to_string();
        }
        if let Some(p) = self.priority {
            t.priority = p;
        }
        if let Some(s) = self.status {
            t.completed_at = completion_time(t.status, t.completed_at, s, now);
            t.status = s;
        }
        if let Some(due) = self.due_date {
            t.due_date = due;
        }
        if let Some(project) = self.project_id {
            t.project_id = project;
        }
        t.updated_at = now;
        Ok(t)
    }
}

/// Completion time after moving from `old` to `new` status. Re-completing a
/// completed task keeps the first completion time.
pub(crate) fn completion_time(
    old: Status,
    old_completed_at: Option<DateTime<Utc>>,
    new: Status,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (old, new) {
        (Status::Completed, Status::Completed) => old_completed_at.or(Some(now)),
        (_, Status::Completed) => Some(now),
        _ => None,
    }
}

/// Trim a required text field, rejecting it when nothing is left.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}
