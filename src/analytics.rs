//! Read-only aggregates for charting.
//!
//! Everything is recomputed from the current tables on each call; there is
//! no cache to invalidate.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::fields::{Priority, Status};
use crate::project::ProjectId;

/// Task counts grouped by status, priority and category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskStatistics {
    pub total: usize,
    /// One entry per status, zero when no task has it.
    pub by_status: BTreeMap<Status, usize>,
    /// One entry per priority, zero when no task has it.
    pub by_priority: BTreeMap<Priority, usize>,
    /// Non-empty categories only.
    pub by_category: BTreeMap<String, usize>,
}

/// Completion of one project's tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectProgress {
    pub project_id: ProjectId,
    pub name: String,
    pub total: usize,
    pub completed: usize,
    /// `None` when the project has no tasks.
    pub percent: Option<f64>,
}

impl ProjectProgress {
    fn new(project_id: ProjectId, name: String, total: usize, completed: usize) -> Self {
        let percent = (total > 0).then(|| completed as f64 * 100.0 / total as f64);
        ProjectProgress { project_id, name, total, completed, percent }
    }

    /// `"N/A"` for an empty project, otherwise a whole percentage rounded
    /// down, so `"100%"` only appears once every task is completed.
    pub fn percent_label(&self) -> String {
        match self.percent {
            Some(p) => format!("{:.0}%", p.floor()),
            None => "N/A".into(),
        }
    }
}

pub fn task_statistics(db: &Database) -> Result<TaskStatistics> {
    let conn = db.connection();
    let mut stats = TaskStatistics {
        by_status: Status::ALL.into_iter().map(|s| (s, 0)).collect(),
        by_priority: Priority::ALL.into_iter().map(|p| (p, 0)).collect(),
        ..Default::default()
    };

    for (status, n) in grouped::<Status>(conn, "SELECT status, COUNT(*) FROM tasks GROUP BY status")? {
        stats.by_status.insert(status, n);
        stats.total += n;
    }
    for (priority, n) in
        grouped::<Priority>(conn, "SELECT priority, COUNT(*) FROM tasks GROUP BY priority")?
    {
        stats.by_priority.insert(priority, n);
    }
    stats.by_category = grouped::<String>(
        conn,
        "SELECT category, COUNT(*) FROM tasks WHERE category != '' GROUP BY category",
    )?
    .into_iter()
    .collect();

    Ok(stats)
}

/// Progress of every project, newest first, including projects with no tasks.
pub fn project_progress(db: &Database) -> Result<Vec<ProjectProgress>> {
    let mut stmt = db.connection().prepare(
        "SELECT p.id, p.name,
                COUNT(t.id),
                COUNT(CASE WHEN t.status = 'completed' THEN 1 END)
         FROM projects p
         LEFT JOIN tasks t ON t.project_id = p.id
         GROUP BY p.id
         ORDER BY p.created_at DESC, p.id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let total: i64 = row.get(2)?;
            let completed: i64 = row.get(3)?;
            Ok(ProjectProgress::new(row.get(0)?, row.get(1)?, to_count(total), to_count(completed)))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Progress of a single project.
pub fn progress_for(db: &Database, id: ProjectId) -> Result<ProjectProgress> {
    let project = db.get_project(id)?;
    let (total, completed): (i64, i64) = db.connection().query_row(
        "SELECT COUNT(*), COUNT(CASE WHEN status = 'completed' THEN 1 END)
         FROM tasks WHERE project_id = ?1",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(ProjectProgress::new(project.id, project.name, to_count(total), to_count(completed)))
}

fn grouped<K: rusqlite::types::FromSql>(conn: &Connection, sql: &str) -> Result<Vec<(K, usize)>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| {
            let n: i64 = row.get(1)?;
            Ok((row.get(0)?, to_count(n)))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn to_count(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::DeletePolicy;
    use crate::project::NewProject;
    use crate::task::NewTask;

    #[test]
    fn test_completed_task_gives_full_progress() {
        let mut db = Database::open_in_memory().unwrap();
        let launch = db.create_project(NewProject::new("Launch")).unwrap();
        assert_eq!(launch.id, 1);
        let spec = db
            .create_task(NewTask::new("Write spec").priority(Priority::High).project(launch.id))
            .unwrap();
        assert_eq!(spec.status, Status::Todo);

        db.set_task_status(spec.id, Status::Completed).unwrap();

        let progress = progress_for(&db, 1).unwrap();
        assert_eq!(progress.percent, Some(100.0));
        assert_eq!(progress.percent_label(), "100%");
    }

    #[test]
    fn test_empty_project_has_undefined_progress() {
        let mut db = Database::open_in_memory().unwrap();
        let p = db.create_project(NewProject::new("Empty")).unwrap();

        let all = project_progress(&db).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].total, 0);
        assert_eq!(all[0].percent, None);
        assert_eq!(all[0].percent_label(), "N/A");
        assert_eq!(progress_for(&db, p.id).unwrap().percent, None);
    }

    #[test]
    fn test_partial_progress_per_project() {
        let mut db = Database::open_in_memory().unwrap();
        let a = db.create_project(NewProject::new("A")).unwrap();
        let b = db.create_project(NewProject::new("B")).unwrap();
        for title in ["one", "two", "three"] {
            let t = db.create_task(NewTask::new(title).project(a.id)).unwrap();
            if title != "three" {
                db.set_task_status(t.id, Status::Completed).unwrap();
            }
        }
        db.create_task(NewTask::new("b1").project(b.id).status(Status::InProgress)).unwrap();
        db.create_task(NewTask::new("loose").status(Status::Completed)).unwrap();

        let all = project_progress(&db).unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!((all[1].completed, all[1].total), (2, 3));
        assert_eq!(all[1].percent_label(), "66%");
        assert_eq!(all[0].percent, Some(0.0));
    }

    #[test]
    fn test_almost_done_project_is_not_full() {
        let mut db = Database::open_in_memory().unwrap();
        let p = db.create_project(NewProject::new("Big")).unwrap();
        for i in 0..200 {
            let t = db.create_task(NewTask::new(format!("task {i}")).project(p.id)).unwrap();
            if i > 0 {
                db.set_task_status(t.id, Status::Completed).unwrap();
            }
        }

        let progress = progress_for(&db, p.id).unwrap();
        assert_eq!((progress.completed, progress.total), (199, 200));
        assert_eq!(progress.percent, Some(99.5));
        assert_eq!(progress.percent_label(), "99%");
    }

    #[test]
    fn test_task_statistics_counts() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_task(NewTask::new("a").category("work").priority(Priority::High)).unwrap();
        db.create_task(NewTask::new("b").category("work").status(Status::Completed)).unwrap();
        db.create_task(NewTask::new("c").category("home").status(Status::InProgress)).unwrap();
        db.create_task(NewTask::new("d")).unwrap();

        let stats = task_statistics(&db).unwrap();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.by_status[&Status::Todo], 2);
        assert_eq!(stats.by_status[&Status::InProgress], 1);
        assert_eq!(stats.by_status[&Status::Completed], 1);
        assert_eq!(stats.by_priority[&Priority::High], 1);
        assert_eq!(stats.by_priority[&Priority::Medium], 3);
        assert_eq!(stats.by_priority[&Priority::Low], 0);
        assert_eq!(stats.by_category.get("work"), Some(&2));
        assert_eq!(stats.by_category.get("home"), Some(&1));
        assert_eq!(stats.by_category.len(), 2);
    }

    #[test]
    fn test_statistics_on_empty_store() {
        let db = Database::open_in_memory().unwrap();
        let stats = task_statistics(&db).unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.by_status.len(), 3);
        assert!(stats.by_status.values().all(|&n| n == 0));
        assert!(stats.by_category.is_empty());
    }

    #[test]
    fn test_progress_after_cascade_delete() {
        let mut db = Database::open_in_memory().unwrap();
        let p = db.create_project(NewProject::new("Gone")).unwrap();
        db.create_task(NewTask::new("t").project(p.id)).unwrap();
        db.delete_project(p.id, DeletePolicy::Cascade).unwrap();

        assert!(project_progress(&db).unwrap().is_empty());
        assert_eq!(task_statistics(&db).unwrap().total, 0);
    }
}
