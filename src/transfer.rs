//! JSON import and export of the whole dataset.
//!
//! The document is a single object:
//!
//! ```json
//! {
//!   "version": 1,
//!   "exported_at": "2026-10-18T09:30:00Z",
//!   "projects": [ { "id": 1, "name": "Launch", ... } ],
//!   "tasks": [ { "id": 1, "title": "Write spec", "project_id": 1, ... } ]
//! }
//! ```
//!
//! Due dates are `YYYY-MM-DD`; timestamps are RFC 3339. Import is
//! all-or-nothing: the document is fully parsed and checked before the first
//! row is written, and the writes share one transaction.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{self, Database};
use crate::error::{Error, Result};
use crate::fields::SortKey;
use crate::project::{Project, ProjectFilter};
use crate::task::Task;

pub const FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    FORMAT_VERSION
}

/// Every project and task in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
}

/// What an import changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub projects_inserted: usize,
    pub projects_updated: usize,
    pub tasks_inserted: usize,
    pub tasks_updated: usize,
}

impl ImportSummary {
    pub fn projects(&self) -> usize {
        self.projects_inserted + self.projects_updated
    }

    pub fn tasks(&self) -> usize {
        self.tasks_inserted + self.tasks_updated
    }
}

/// Snapshot the store, ordered by id.
pub fn export(db: &Database) -> Result<ExportDocument> {
    let mut projects = db.list_projects(&ProjectFilter::default())?;
    projects.sort_by_key(|p| p.id);
    let tasks = db.list_tasks(&db::TaskFilter { sort: SortKey::Id, ..Default::default() })?;

    Ok(ExportDocument {
        version: FORMAT_VERSION,
        exported_at: Some(db::now()),
        projects,
        tasks,
    })
}

/// Write the export document to `path` as pretty JSON (temp file + rename).
pub fn export_to_path(db: &Database, path: &Path) -> Result<ExportDocument> {
    let doc = export(db)?;
    let data = serde_json::to_string_pretty(&doc)?;

    let tmp = path.with_extension("json.tmp");
    let mut f = File::create(&tmp)?;
    f.write_all(data.as_bytes())?;
    f.flush()?;
    fs::rename(&tmp, path)?;

    info!(
        projects = doc.projects.len(),
        tasks = doc.tasks.len(),
        "Exported data to {}",
        path.display()
    );
    Ok(doc)
}

/// Upsert every record of `doc` by id. Nothing is written unless the whole
/// document is valid.
pub fn import(db: &mut Database, doc: ExportDocument) -> Result<ImportSummary> {
    let doc = check_document(db, doc)?;

    let mut summary = ImportSummary::default();
    let tx = db.transaction()?;
    for project in &doc.projects {
        if db::project_exists(&tx, project.id)? {
            summary.projects_updated += 1;
        } else {
            summary.projects_inserted += 1;
        }
        db::upsert_project(&tx, project)?;
    }
    for task in &doc.tasks {
        if db::task_exists(&tx, task.id)? {
            summary.tasks_updated += 1;
        } else {
            summary.tasks_inserted += 1;
        }
        db::upsert_task(&tx, task)?;
    }
    tx.commit()?;

    info!(?summary, "Imported document");
    Ok(summary)
}

pub fn import_str(db: &mut Database, json: &str) -> Result<ImportSummary> {
    let doc: ExportDocument = serde_json::from_str(json)?;
    import(db, doc)
}

pub fn import_from_path(db: &mut Database, path: &Path) -> Result<ImportSummary> {
    let json = fs::read_to_string(path)?;
    import_str(db, &json)
}

/// Validate `doc` against itself and the store, returning it with text
/// fields trimmed.
fn check_document(db: &Database, doc: ExportDocument) -> Result<ExportDocument> {
    if doc.version != FORMAT_VERSION {
        return Err(Error::Import(format!(
            "unsupported document version {} (expected {FORMAT_VERSION})",
            doc.version
        )));
    }

    let mut project_ids = HashSet::new();
    let projects = doc
        .projects
        .into_iter()
        .map(|project| {
            let project = project.normalized()?;
            if !project_ids.insert(project.id) {
                return Err(Error::Import(format!("duplicate project id {}", project.id)));
            }
            Ok(project)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut task_ids = HashSet::new();
    let mut tasks = Vec::with_capacity(doc.tasks.len());
    for task in doc.tasks {
        let task = task.normalized()?;
        if !task_ids.insert(task.id) {
            return Err(Error::Import(format!("duplicate task id {}", task.id)));
        }
        if let Some(pid) = task.project_id {
            if !project_ids.contains(&pid) && !db::project_exists(db.connection(), pid)? {
                return Err(Error::Import(format!(
                    "task {} references unknown project {pid}",
                    task.id
                )));
            }
        }
        tasks.push(task);
    }

    Ok(ExportDocument { version: doc.version, exported_at: doc.exported_at, projects, tasks })
}
