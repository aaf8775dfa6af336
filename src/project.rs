//! Project data structure and its create/update payloads.
//!
//! A project is a named grouping of tasks. Tasks point at projects through
//! `Task::project_id`; the project itself keeps no list of its tasks, so
//! progress is always derived from the task table (see `analytics`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fields::ProjectStatus;
use crate::task::require_text;

pub type ProjectId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Trim the name the way writes through `Database` do, rejecting a blank one.
    pub(crate) fn normalized(mut self) -> Result<Self> {
        self.name = require_text("name", &self.name)?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub due_date: Option<NaiveDate>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        NewProject { name: name.into(), ..Default::default() }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn due(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }
}

/// Fields that can be updated on a project. `due_date: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none() && self.due_date.is_none()
    }

    pub(crate) fn apply(self, project: &Project, now: DateTime<Utc>) -> Result<Project> {
        let mut p = project.clone();
        if let Some(name) = self.name {
            p.name = require_text("name", &name)?;
        }
        if let Some(d) = self.description {
            p.description = d;
        }
        if let Some(s) = self.status {
            p.status = s;
        }
        if let Some(due) = self.due_date {
            p.due_date = due;
        }
        p.updated_at = now;
        Ok(p)
    }
}

/// Filter options for listing projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
}
