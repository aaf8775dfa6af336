//! # taskdesk
//!
//! A local task and project manager. Tasks and projects live in a single
//! SQLite file; the whole dataset can be exported to and imported from one
//! JSON document; and simple aggregates (counts by status, priority and
//! category, per-project completion) feed reports and charts.
//!
//! The library is the core. The `td` binary is one presentation layer on top
//! of it and owns nothing but argument parsing and printing.
//!
//! ```no_run
//! use taskdesk::{analytics, Database, NewProject, NewTask, Priority, Status};
//!
//! # fn main() -> taskdesk::Result<()> {
//! let mut db = Database::open("tasks.db".as_ref())?;
//! let launch = db.create_project(NewProject::new("Launch"))?;
//! let spec = db.create_task(NewTask::new("Write spec").priority(Priority::High).project(launch.id))?;
//! db.set_task_status(spec.id, Status::Completed)?;
//!
//! let progress = analytics::progress_for(&db, launch.id)?;
//! assert_eq!(progress.percent_label(), "100%");
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod fields;
pub mod project;
pub mod task;
pub mod transfer;

pub use db::{Database, TaskFilter};
pub use error::{Entity, Error, Result};
pub use fields::*;
pub use project::{NewProject, Project, ProjectFilter, ProjectId, ProjectUpdate};
pub use task::{NewTask, Task, TaskId, TaskUpdate};
