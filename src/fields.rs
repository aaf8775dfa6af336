//! Enumerations and field types for tasks and projects.
//!
//! Every enum has one canonical lowercase string form. That form is what the
//! database stores, what the JSON document carries and what the CLI accepts,
//! so a value that round-trips through any of them is always one of the
//! listed variants.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Task completion status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Status {
    Todo,
    #[value(alias = "in-progress")]
    InProgress,
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }
}

/// Task importance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Lifecycle label carried by a project.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    #[value(alias = "on-hold")]
    OnHold,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Completed => "completed",
        }
    }
}

/// What happens to a project's tasks when the project is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Refuse while any task references the project.
    #[default]
    Block,
    /// Clear the project reference on its tasks.
    Orphan,
    /// Delete its tasks too.
    Cascade,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Newest first.
    #[default]
    Created,
    Due,
    Priority,
    Id,
}

/// Filtering options for tasks based on due dates.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DueFilter {
    Today,
    ThisWeek,
    Overdue,
    None,
}

macro_rules! impl_text_enum {
    ($ty:ty, $field:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase().replace('-', "_");
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        let allowed = [$($variant.as_str()),+].join(", ");
                        Error::validation($field, format!("'{s}' is not one of: {allowed}"))
                    })
            }
        }
    };
}

impl_text_enum!(Status, "status", [Status::Todo, Status::InProgress, Status::Completed]);
impl_text_enum!(Priority, "priority", [Priority::Low, Priority::Medium, Priority::High]);
impl_text_enum!(
    ProjectStatus,
    "project status",
    [ProjectStatus::Active, ProjectStatus::OnHold, ProjectStatus::Completed]
);

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Todo => "Todo",
        Status::InProgress => "In Progress",
        Status::Completed => "Completed",
    }
}

/// Format a priority for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    }
}

pub fn format_project_status(s: ProjectStatus) -> &'static str {
    match s {
        ProjectStatus::Active => "Active",
        ProjectStatus::OnHold => "On Hold",
        ProjectStatus::Completed => "Completed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_loose_forms() {
        assert_eq!("in_progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("In-Progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!(" HIGH ".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("on-hold".parse::<ProjectStatus>().unwrap(), ProjectStatus::OnHold);
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "priority", .. }));
        assert!(err.to_string().contains("low, medium, high"));
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in_progress\"");
        assert_eq!(serde_json::to_string(&Priority::Low).unwrap(), "\"low\"");
        assert!(serde_json::from_str::<Priority>("\"urgent\"").is_err());
    }
}
