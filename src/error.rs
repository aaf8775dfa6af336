//! Error types shared by the storage, import/export and analytics layers.

use thiserror::Error;

/// Which kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Task,
    Project,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Task => write!(f, "task"),
            Entity::Project => write!(f, "project"),
        }
    }
}

/// Main error type for taskdesk operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A field failed validation; the write was rejected.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// No record with the given id exists.
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    /// A project delete was blocked because tasks still reference it.
    #[error("project {id} still has {count} task(s); delete with orphan or cascade policy")]
    ProjectHasTasks { id: i64, count: usize },

    /// The import document could not be parsed.
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The import document parsed but is not consistent.
    #[error("import rejected: {0}")]
    Import(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation { field, reason: reason.into() }
    }

    pub(crate) fn task_not_found(id: i64) -> Self {
        Error::NotFound { entity: Entity::Task, id }
    }

    pub(crate) fn project_not_found(id: i64) -> Self {
        Error::NotFound { entity: Entity::Project, id }
    }

    /// True for errors the caller caused (bad input, missing ids) rather than
    /// storage or I/O failures.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. }
                | Error::NotFound { .. }
                | Error::ProjectHasTasks { .. }
                | Error::Parse(_)
                | Error::Import(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
