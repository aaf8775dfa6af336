//! SQLite-backed storage for tasks and projects.
//!
//! `Database` owns a single connection. Every write runs as one statement or
//! inside one transaction, so a failed validation or a storage error never
//! leaves a half-written record behind.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, SubsecRound, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fields::*;
use crate::project::{NewProject, Project, ProjectFilter, ProjectId, ProjectUpdate};
use crate::task::{completion_time, require_text, NewTask, Task, TaskId, TaskUpdate};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'on_hold', 'completed')),
    due_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT '',
    priority TEXT NOT NULL DEFAULT 'medium'
        CHECK (priority IN ('low', 'medium', 'high')),
    status TEXT NOT NULL DEFAULT 'todo'
        CHECK (status IN ('todo', 'in_progress', 'completed')),
    due_date TEXT,
    project_id INTEGER REFERENCES projects (id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks (project_id);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status);
";

const TASK_COLUMNS: &str = "id, title, description, category, priority, status, due_date, \
                            project_id, created_at, updated_at, completed_at";

const PROJECT_COLUMNS: &str = "id, name, description, status, due_date, created_at, updated_at";

/// Filter options for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub project_id: Option<ProjectId>,
    /// Exact category match, ignoring case.
    pub category: Option<String>,
    /// Case-insensitive substring of title, description or category.
    pub search: Option<String>,
    pub due: Option<DueFilter>,
    pub sort: SortKey,
    pub limit: Option<usize>,
}

/// Local relational store for tasks and projects.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database file at `path`, creating parent
    /// directories and the schema as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn, path: Some(path.to_path_buf()) };
        db.init()?;
        debug!("Opened database at {}", path.display());
        Ok(db)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let db = Database { conn: Connection::open_in_memory()?, path: None };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        // SQLite's LIKE and NOCASE only fold ASCII; searches compare through
        // this Unicode lowercase instead.
        self.conn.create_scalar_function(
            "fold",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| fold(&s))),
        )?;
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Path of the backing file; `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    // Tasks

    pub fn create_task(&mut self, new: NewTask) -> Result<Task> {
        let title = require_text("title", &new.title)?;
        let now = now();
        let status = new.status.unwrap_or(Status::Todo);

        let tx = self.conn.transaction()?;
        if let Some(pid) = new.project_id {
            ensure_project(&tx, pid)?;
        }
        let mut task = Task {
            id: 0,
            title,
            description: new.description,
            category: new.category.trim().to_string(),
            priority: new.priority,
            status,
            due_date: new.due_date,
            project_id: new.project_id,
            created_at: now,
            updated_at: now,
            completed_at: completion_time(Status::Todo, None, status, now),
        };
        tx.execute(
            "INSERT INTO tasks (title, description, category, priority, status, due_date,
                                project_id, created_at, updated_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                task.title,
                task.description,
                task.category,
                task.priority,
                task.status,
                task.due_date,
                task.project_id,
                task.created_at,
                task.updated_at,
                task.completed_at,
            ],
        )?;
        task.id = tx.last_insert_rowid();
        tx.commit()?;

        debug!(task_id = task.id, "Created task '{}'", task.title);
        Ok(task)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Task> {
        fetch_task(&self.conn, id)
    }

    /// Apply `update` to task `id`. An empty update returns the task unchanged.
    pub fn update_task(&mut self, id: TaskId, update: TaskUpdate) -> Result<Task> {
        let tx = self.conn.transaction()?;
        let current = fetch_task(&tx, id)?;
        if update.is_empty() {
            return Ok(current);
        }
        if let Some(Some(pid)) = update.project_id {
            ensure_project(&tx, pid)?;
        }
        let task = update.apply(&current, now())?;
        tx.execute(
            "UPDATE tasks SET title = ?1, description = ?2, category = ?3, priority = ?4,
                              status = ?5, due_date = ?6, project_id = ?7, updated_at = ?8,
                              completed_at = ?9
             WHERE id = ?10",
            params![
                task.title,
                task.description,
                task.category,
                task.priority,
                task.status,
                task.due_date,
                task.project_id,
                task.updated_at,
                task.completed_at,
                id,
            ],
        )?;
        tx.commit()?;

        debug!(task_id = id, "Updated task");
        Ok(task)
    }

    pub fn set_task_status(&mut self, id: TaskId, status: Status) -> Result<Task> {
        self.update_task(id, TaskUpdate { status: Some(status), ..Default::default() })
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<()> {
        let rows = self.conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if rows == 0 {
            return Err(Error::task_not_found(id));
        }
        debug!(task_id = id, "Deleted task");
        Ok(())
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.list_tasks_as_of(filter, Local::now().date_naive())
    }

    /// Like `list_tasks`, evaluating due-date filters relative to `today`.
    pub fn list_tasks_as_of(&self, filter: &TaskFilter, today: NaiveDate) -> Result<Vec<Task>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            values.push(Box::new(status));
        }
        if let Some(priority) = filter.priority {
            conditions.push("priority = ?");
            values.push(Box::new(priority));
        }
        if let Some(pid) = filter.project_id {
            conditions.push("project_id = ?");
            values.push(Box::new(pid));
        }
        if let Some(category) = filter.category.as_deref() {
            conditions.push("fold(category) = ?");
            values.push(Box::new(fold(category.trim())));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let needle = fold(search.trim());
            conditions.push(
                "(instr(fold(title), ?) > 0 OR instr(fold(description), ?) > 0
                  OR instr(fold(category), ?) > 0)",
            );
            values.push(Box::new(needle.clone()));
            values.push(Box::new(needle.clone()));
            values.push(Box::new(needle));
        }
        match filter.due {
            Some(DueFilter::Today) => {
                conditions.push("due_date = ?");
                values.push(Box::new(today));
            }
            Some(DueFilter::ThisWeek) => {
                let (start, end) = start_end_of_week(today);
                conditions.push("due_date BETWEEN ? AND ?");
                values.push(Box::new(start));
                values.push(Box::new(end));
            }
            Some(DueFilter::Overdue) => {
                conditions.push("due_date < ? AND status != 'completed'");
                values.push(Box::new(today));
            }
            Some(DueFilter::None) => conditions.push("due_date IS NULL"),
            None => {}
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let order = match filter.sort {
            SortKey::Created => "created_at DESC, id DESC",
            SortKey::Due => "due_date IS NULL, due_date ASC, id ASC",
            SortKey::Priority => {
                "CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                 due_date IS NULL, due_date ASC, id ASC"
            }
            SortKey::Id => "id ASC",
        };
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks {where_clause} ORDER BY {order}");
        if let Some(n) = filter.limit {
            sql.push_str(" LIMIT ?");
            values.push(Box::new(i64::try_from(n).unwrap_or(i64::MAX)));
        }

        let params: Vec<&dyn ToSql> = values.iter().map(AsRef::as_ref).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params.as_slice(), parse_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    // Projects

    pub fn create_project(&mut self, new: NewProject) -> Result<Project> {
        let now = now();
        let mut project = Project {
            id: 0,
            name: require_text("name", &new.name)?,
            description: new.description,
            status: new.status,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO projects (name, description, status, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project.name,
                project.description,
                project.status,
                project.due_date,
                project.created_at,
                project.updated_at,
            ],
        )?;
        project.id = self.conn.last_insert_rowid();

        debug!(project_id = project.id, "Created project '{}'", project.name);
        Ok(project)
    }

    pub fn get_project(&self, id: ProjectId) -> Result<Project> {
        fetch_project(&self.conn, id)
    }

    pub fn update_project(&mut self, id: ProjectId, update: ProjectUpdate) -> Result<Project> {
        let tx = self.conn.transaction()?;
        let current = fetch_project(&tx, id)?;
        if update.is_empty() {
            return Ok(current);
        }
        let project = update.apply(&current, now())?;
        tx.execute(
            "UPDATE projects SET name = ?1, description = ?2, status = ?3, due_date = ?4,
                                 updated_at = ?5
             WHERE id = ?6",
            params![
                project.name,
                project.description,
                project.status,
                project.due_date,
                project.updated_at,
                id,
            ],
        )?;
        tx.commit()?;

        debug!(project_id = id, "Updated project");
        Ok(project)
    }

    /// Delete project `id`, handling its tasks according to `policy`.
    /// Returns the number of tasks that were orphaned or deleted.
    pub fn delete_project(&mut self, id: ProjectId, policy: DeletePolicy) -> Result<usize> {
        let tx = self.conn.transaction()?;
        ensure_project(&tx, id)?;
        let count = count_project_tasks(&tx, id)?;

        let affected = match policy {
            DeletePolicy::Block if count > 0 => {
                return Err(Error::ProjectHasTasks { id, count });
            }
            DeletePolicy::Block => 0,
            DeletePolicy::Orphan => tx.execute(
                "UPDATE tasks SET project_id = NULL, updated_at = ?1 WHERE project_id = ?2",
                params![now(), id],
            )?,
            DeletePolicy::Cascade => {
                tx.execute("DELETE FROM tasks WHERE project_id = ?1", params![id])?
            }
        };
        tx.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        tx.commit()?;

        debug!(project_id = id, ?policy, affected, "Deleted project");
        Ok(affected)
    }

    pub fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            values.push(Box::new(status));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let needle = fold(search.trim());
            conditions.push("(instr(fold(name), ?) > 0 OR instr(fold(description), ?) > 0)");
            values.push(Box::new(needle.clone()));
            values.push(Box::new(needle));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects {where_clause} ORDER BY created_at DESC, id DESC"
        );

        let params: Vec<&dyn ToSql> = values.iter().map(AsRef::as_ref).collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let projects = stmt
            .query_map(params.as_slice(), parse_project)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    /// Copy the database file into `dir` under a timestamped name.
    pub fn backup_to(&self, dir: &Path) -> Result<PathBuf> {
        let Some(path) = self.path.as_deref() else {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "in-memory database has no file to back up",
            )));
        };
        fs::create_dir_all(dir)?;

        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("taskdesk.db");
        let backup_path = dir.join(format!("{timestamp}_{file_name}"));

        fs::copy(path, &backup_path)?;

        info!("Backed up database to {}", backup_path.display());
        Ok(backup_path)
    }
}

/// Current time at the second granularity stored in the database.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Monday and Sunday of the ISO week containing `day`.
pub fn start_end_of_week(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = i64::from(day.weekday().num_days_from_monday());
    let start = day - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Case folding shared by the `fold` SQL function and the values compared to it.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

pub(crate) fn fetch_task(conn: &Connection, id: TaskId) -> Result<Task> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        parse_task,
    )
    .optional()?
    .ok_or_else(|| Error::task_not_found(id))
}

pub(crate) fn fetch_project(conn: &Connection, id: ProjectId) -> Result<Project> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
        params![id],
        parse_project,
    )
    .optional()?
    .ok_or_else(|| Error::project_not_found(id))
}

pub(crate) fn project_exists(conn: &Connection, id: ProjectId) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM projects WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn task_exists(conn: &Connection, id: TaskId) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn ensure_project(conn: &Connection, id: ProjectId) -> Result<()> {
    if project_exists(conn, id)? {
        Ok(())
    } else {
        Err(Error::project_not_found(id))
    }
}

fn count_project_tasks(conn: &Connection, id: ProjectId) -> Result<usize> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE project_id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(n).unwrap_or(0))
}

/// Insert `task` with its own id, or overwrite the row that has that id.
pub(crate) fn upsert_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (id, title, description, category, priority, status, due_date,
                            project_id, created_at, updated_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT (id) DO UPDATE SET
             title = excluded.title,
             description = excluded.description,
             category = excluded.category,
             priority = excluded.priority,
             status = excluded.status,
             due_date = excluded.due_date,
             project_id = excluded.project_id,
             created_at = excluded.created_at,
             updated_at = excluded.updated_at,
             completed_at = excluded.completed_at",
        params![
            task.id,
            task.title,
            task.description,
            task.category,
            task.priority,
            task.status,
            task.due_date,
            task.project_id,
            task.created_at,
            task.updated_at,
            task.completed_at,
        ],
    )?;
    Ok(())
}

/// Insert `project` with its own id, or overwrite the row that has that id.
pub(crate) fn upsert_project(conn: &Connection, project: &Project) -> Result<()> {
    conn.execute(
        "INSERT INTO projects (id, name, description, status, due_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (id) DO UPDATE SET
             name = excluded.name,
             description = excluded.description,
             status = excluded.status,
             due_date = excluded.due_date,
             created_at = excluded.created_at,
             updated_at = excluded.updated_at",
        params![
            project.id,
            project.name,
            project.description,
            project.status,
            project.due_date,
            project.created_at,
            project.updated_at,
        ],
    )?;
    Ok(())
}

fn parse_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        priority: row.get(4)?,
        status: row.get(5)?,
        due_date: row.get(6)?,
        project_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        completed_at: row.get(10)?,
    })
}

fn parse_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        due_date: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

macro_rules! impl_sql_text {
    ($($ty:ty),+) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value.as_str()?.parse().map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    )+};
}

impl_sql_text!(Status, Priority, ProjectStatus);

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_create_and_get_task_defaults() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.create_task(NewTask::new("  Write spec  ")).unwrap();

        assert_eq!(task.title, "Write spec");
        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.completed_at, None);
        assert_eq!(db.get_task(task.id).unwrap(), task);
    }

    #[test]
    fn test_create_task_rejects_empty_title() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db.create_task(NewTask::new("   ")).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "title", .. }));
        assert!(db.list_tasks(&TaskFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_create_task_with_unknown_project() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db.create_task(NewTask::new("Orphan").project(42)).unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 42, .. }));
    }

    #[test]
    fn test_create_completed_task_stamps_completion() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.create_task(NewTask::new("Done already").status(Status::Completed)).unwrap();
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn test_update_task_fields() {
        let mut db = Database::open_in_memory().unwrap();
        let project = db.create_project(NewProject::new("Launch")).unwrap();
        let task = db.create_task(NewTask::new("Draft")).unwrap();

        let updated = db
            .update_task(
                task.id,
                TaskUpdate {
                    title: Some("Final draft".into()),
                    priority: Some(Priority::High),
                    category: Some(" writing ".into()),
                    due_date: Some(Some(date(2026, 5, 1))),
                    project_id: Some(Some(project.id)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "Final draft");
        assert_eq!(updated.category, "writing");
        assert_eq!(db.get_task(task.id).unwrap(), updated);
    }

    #[test]
    fn test_update_missing_task_is_not_found() {
        let mut db = Database::open_in_memory().unwrap();
        let err = db.set_task_status(99, Status::Completed).unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 99, .. }));
    }

    #[test]
    fn test_status_round_trip_tracks_completion_time() {
        let mut db = Database::open_in_memory().unwrap();
        let task = db.create_task(NewTask::new("Ship")).unwrap();

        let done = db.set_task_status(task.id, Status::Completed).unwrap();
        assert!(done.completed_at.is_some());
        assert_eq!(db.get_task(task.id).unwrap().completed_at, done.completed_at);

        let reopened = db.set_task_status(task.id, Status::InProgress).unwrap();
        assert_eq!(reopened.completed_at, None);
        assert_eq!(db.get_task(task.id).unwrap().status, Status::InProgress);
    }

    #[test]
    fn test_delete_task_removes_it_everywhere() {
        let mut db = Database::open_in_memory().unwrap();
        let keep = db.create_task(NewTask::new("Keep")).unwrap();
        let gone = db.create_task(NewTask::new("Gone")).unwrap();

        db.delete_task(gone.id).unwrap();

        assert!(matches!(db.get_task(gone.id), Err(Error::NotFound { .. })));
        let all = db.list_tasks(&TaskFilter::default()).unwrap();
        assert_eq!(all, vec![keep]);
        assert!(matches!(db.delete_task(gone.id), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_list_filters_by_status_and_search() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_task(NewTask::new("Buy milk").description("2% fat")).unwrap();
        let report = db.create_task(NewTask::new("Quarterly report")).unwrap();
        db.create_task(NewTask::new("Review REPORT draft")).unwrap();
        db.set_task_status(report.id, Status::Completed).unwrap();

        let filter = TaskFilter { search: Some("report".into()), sort: SortKey::Id, ..Default::default() };
        assert_eq!(titles(&db.list_tasks(&filter).unwrap()), vec!["Quarterly report", "Review REPORT draft"]);

        let filter = TaskFilter {
            search: Some("report".into()),
            status: Some(Status::Todo),
            ..Default::default()
        };
        assert_eq!(titles(&db.list_tasks(&filter).unwrap()), vec!["Review REPORT draft"]);

        // Wildcard characters in the needle are matched literally.
        let filter = TaskFilter { search: Some("2%".into()), ..Default::default() };
        assert_eq!(titles(&db.list_tasks(&filter).unwrap()), vec!["Buy milk"]);
        let filter = TaskFilter { search: Some("%".into()), ..Default::default() };
        assert_eq!(db.list_tasks(&filter).unwrap().len(), 1);
    }

    #[test]
    fn test_search_matches_category_and_folds_unicode() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_task(NewTask::new("Paint fence").category("Chores")).unwrap();
        db.create_task(NewTask::new("Ölwechsel").description("Garage ÉTÉ")).unwrap();
        db.create_project(NewProject::new("Übersetzung")).unwrap();

        let by_category = TaskFilter { search: Some("chore".into()), ..Default::default() };
        assert_eq!(titles(&db.list_tasks(&by_category).unwrap()), vec!["Paint fence"]);

        let unicode = TaskFilter { search: Some("öLWECH".into()), ..Default::default() };
        assert_eq!(titles(&db.list_tasks(&unicode).unwrap()), vec!["Ölwechsel"]);
        let unicode = TaskFilter { search: Some("été".into()), ..Default::default() };
        assert_eq!(titles(&db.list_tasks(&unicode).unwrap()), vec!["Ölwechsel"]);

        let projects = db
            .list_projects(&ProjectFilter { search: Some("übersetz".into()), ..Default::default() })
            .unwrap();
        assert_eq!(projects.len(), 1);
    }

    #[test]
    fn test_list_filters_by_category_project_and_priority() {
        let mut db = Database::open_in_memory().unwrap();
        let p = db.create_project(NewProject::new("Home")).unwrap();
        db.create_task(NewTask::new("Paint").category("Chores").project(p.id)).unwrap();
        db.create_task(NewTask::new("Email").category("work").priority(Priority::High)).unwrap();

        let by_category = TaskFilter { category: Some("chores".into()), ..Default::default() };
        assert_eq!(titles(&db.list_tasks(&by_category).unwrap()), vec!["Paint"]);

        let by_project = TaskFilter { project_id: Some(p.id), ..Default::default() };
        assert_eq!(titles(&db.list_tasks(&by_project).unwrap()), vec!["Paint"]);

        let by_priority = TaskFilter { priority: Some(Priority::High), ..Default::default() };
        assert_eq!(titles(&db.list_tasks(&by_priority).unwrap()), vec!["Email"]);
    }

    #[test]
    fn test_list_due_filters_and_sorting() {
        let mut db = Database::open_in_memory().unwrap();
        let today = date(2026, 10, 14); // Wednesday
        db.create_task(NewTask::new("Late").due(date(2026, 10, 1))).unwrap();
        db.create_task(NewTask::new("Now").due(today).priority(Priority::Low)).unwrap();
        db.create_task(NewTask::new("Sunday").due(date(2026, 10, 18)).priority(Priority::High))
            .unwrap();
        db.create_task(NewTask::new("Someday")).unwrap();
        let done = db.create_task(NewTask::new("Late but done").due(date(2026, 9, 1))).unwrap();
        db.set_task_status(done.id, Status::Completed).unwrap();

        let due = |d| TaskFilter { due: Some(d), sort: SortKey::Due, ..Default::default() };
        let list = |f: TaskFilter| titles(&db.list_tasks_as_of(&f, today).unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        assert_eq!(list(due(DueFilter::Today)), vec!["Now"]);
        assert_eq!(list(due(DueFilter::ThisWeek)), vec!["Now", "Sunday"]);
        assert_eq!(list(due(DueFilter::Overdue)), vec!["Late"]);
        assert_eq!(list(due(DueFilter::None)), vec!["Someday"]);

        let by_due = TaskFilter { sort: SortKey::Due, ..Default::default() };
        assert_eq!(list(by_due), vec!["Late but done", "Late", "Now", "Sunday", "Someday"]);

        let by_priority = TaskFilter { sort: SortKey::Priority, limit: Some(2), ..Default::default() };
        assert_eq!(list(by_priority), vec!["Sunday", "Late but done"]);
    }

    #[test]
    fn test_project_crud_and_search() {
        let mut db = Database::open_in_memory().unwrap();
        let launch = db.create_project(NewProject::new("Launch").description("Go to market")).unwrap();
        db.create_project(NewProject::new("Garden")).unwrap();

        let updated = db
            .update_project(
                launch.id,
                ProjectUpdate { status: Some(ProjectStatus::OnHold), ..Default::default() },
            )
            .unwrap();
        assert_eq!(updated.status, ProjectStatus::OnHold);
        assert_eq!(db.get_project(launch.id).unwrap(), updated);

        let filter = ProjectFilter { search: Some("MARKET".into()), ..Default::default() };
        let found = db.list_projects(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Launch");

        assert_eq!(db.list_projects(&ProjectFilter::default()).unwrap().len(), 2);
        assert!(matches!(db.create_project(NewProject::new("")), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_delete_project_blocked_by_tasks() {
        let mut db = Database::open_in_memory().unwrap();
        let p = db.create_project(NewProject::new("Launch")).unwrap();
        db.create_task(NewTask::new("Write spec").project(p.id)).unwrap();

        let err = db.delete_project(p.id, DeletePolicy::Block).unwrap_err();
        assert!(matches!(err, Error::ProjectHasTasks { count: 1, .. }));
        assert!(db.get_project(p.id).is_ok());
    }

    #[test]
    fn test_delete_project_orphans_tasks() {
        let mut db = Database::open_in_memory().unwrap();
        let p = db.create_project(NewProject::new("Launch")).unwrap();
        let t = db.create_task(NewTask::new("Write spec").project(p.id)).unwrap();

        assert_eq!(db.delete_project(p.id, DeletePolicy::Orphan).unwrap(), 1);
        assert_eq!(db.get_task(t.id).unwrap().project_id, None);
        assert!(matches!(db.get_project(p.id), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_delete_project_cascades_tasks() {
        let mut db = Database::open_in_memory().unwrap();
        let p = db.create_project(NewProject::new("Launch")).unwrap();
        db.create_task(NewTask::new("Write spec").project(p.id)).unwrap();
        let other = db.create_task(NewTask::new("Unrelated")).unwrap();

        assert_eq!(db.delete_project(p.id, DeletePolicy::Cascade).unwrap(), 1);
        assert_eq!(db.list_tasks(&TaskFilter::default()).unwrap(), vec![other]);
    }

    #[test]
    fn test_delete_empty_project_with_block_policy() {
        let mut db = Database::open_in_memory().unwrap();
        let p = db.create_project(NewProject::new("Empty")).unwrap();
        assert_eq!(db.delete_project(p.id, DeletePolicy::Block).unwrap(), 0);
        assert!(matches!(db.delete_project(p.id, DeletePolicy::Block), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_schema_rejects_invalid_enum_text() {
        let db = Database::open_in_memory().unwrap();
        let res = db.connection().execute(
            "INSERT INTO tasks (title, priority, status, created_at, updated_at)
             VALUES ('x', 'urgent', 'todo', '2026-01-01', '2026-01-01')",
            [],
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_open_file_persists_and_backs_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tasks.db");
        {
            let mut db = Database::open(&path).unwrap();
            db.create_task(NewTask::new("Persisted")).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(titles(&db.list_tasks(&TaskFilter::default()).unwrap()), vec!["Persisted"]);

        let backup = db.backup_to(&dir.path().join("backup")).unwrap();
        assert!(backup.exists());
        assert!(backup.file_name().unwrap().to_str().unwrap().ends_with("_tasks.db"));

        let restored = Database::open(&backup).unwrap();
        assert_eq!(restored.list_tasks(&TaskFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_backup_in_memory_fails() {
        let dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.backup_to(dir.path()), Err(Error::Io(_))));
    }

    #[test]
    fn test_start_end_of_week() {
        assert_eq!(start_end_of_week(date(2026, 10, 14)), (date(2026, 10, 12), date(2026, 10, 18)));
        assert_eq!(start_end_of_week(date(2026, 10, 12)), (date(2026, 10, 12), date(2026, 10, 18)));
    }
}
