//! Command implementations for the CLI interface.
//!
//! Each handler turns parsed arguments into calls on the library and prints
//! the result. Errors are returned to `main`, which reports them.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use taskdesk::analytics;
use taskdesk::config::Config;
use taskdesk::dates::parse_due_input;
use taskdesk::transfer;
use taskdesk::*;

use crate::display::*;

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Free-text category label.
        #[arg(long)]
        category: Option<String>,
        /// Priority: low | medium | high (default from config, else medium).
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Status: todo | in_progress | completed.
        #[arg(long, value_enum, default_value_t = Status::Todo)]
        status: Status,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", or a weekday.
        #[arg(long)]
        due: Option<String>,
        /// Project ID.
        #[arg(long)]
        project: Option<ProjectId>,
    },

    /// List tasks with optional filters.
    List {
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Only tasks in this project ID.
        #[arg(long)]
        project: Option<ProjectId>,
        #[arg(long)]
        category: Option<String>,
        /// Substring of title or description (case-insensitive).
        #[arg(long, short)]
        search: Option<String>,
        /// Due filter: today | this-week | overdue | none.
        #[arg(long, value_enum)]
        due: Option<DueFilter>,
        /// Sort key (default from config, else created).
        #[arg(long, value_enum)]
        sort: Option<SortKey>,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task.
    View { id: TaskId },

    /// Update fields on a task.
    Update {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long, conflicts_with = "clear_project")]
        project: Option<ProjectId>,
        /// Clear due date.
        #[arg(long)]
        clear_due: bool,
        /// Detach the task from its project.
        #[arg(long)]
        clear_project: bool,
    },

    /// Mark a task in progress.
    Start { id: TaskId },

    /// Mark a task completed.
    Complete { id: TaskId },

    /// Reopen a task (status todo).
    Reopen { id: TaskId },

    /// Delete a task.
    Delete { id: TaskId },

    /// Manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Show task counts and project progress.
    Stats {
        /// Print the aggregates as JSON instead of charts.
        #[arg(long)]
        json: bool,
    },

    /// Export all tasks and projects to a JSON document.
    Export {
        /// Output file path (default: taskdesk-export.json)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import tasks and projects from a JSON document (upsert by id).
    Import {
        /// Input JSON file path
        input: PathBuf,
        /// Skip creating backup before import
        #[arg(long)]
        no_backup: bool,
    },

    /// Create a timestamped copy of the database file.
    Backup,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Add {
        name: String,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    /// List projects with progress.
    List {
        #[arg(long, value_enum)]
        status: Option<ProjectStatus>,
        /// Substring of name or description (case-insensitive).
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Show a project, its progress and its tasks.
    View { id: ProjectId },
    /// Update fields on a project.
    Update {
        id: ProjectId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        status: Option<ProjectStatus>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
    },
    /// Delete a project. Refused while tasks reference it unless --orphan or --cascade.
    Delete {
        id: ProjectId,
        /// Keep its tasks, clearing their project.
        #[arg(long, conflicts_with = "cascade")]
        orphan: bool,
        /// Delete its tasks too.
        #[arg(long)]
        cascade: bool,
    },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_due(s: Option<String>) -> taskdesk::Result<Option<NaiveDate>> {
    s.map(|s| parse_due_input(&s, today())).transpose()
}

/// Add a new task to the database.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    db: &mut Database,
    config: &Config,
    title: String,
    desc: Option<String>,
    category: Option<String>,
    priority: Option<Priority>,
    status: Status,
    due: Option<String>,
    project: Option<ProjectId>,
) -> anyhow::Result<()> {
    let new = NewTask {
        title,
        description: desc.unwrap_or_default(),
        category: category.unwrap_or_default(),
        priority: priority.unwrap_or(config.default_priority),
        status: Some(status),
        due_date: parse_due(due)?,
        project_id: project,
    };
    let task = db.create_task(new)?;
    println!("Added task {}", task.id);
    Ok(())
}

/// List tasks with optional filtering and sorting.
#[allow(clippy::too_many_arguments)]
pub fn cmd_list(
    db: &Database,
    config: &Config,
    status: Option<Status>,
    priority: Option<Priority>,
    project: Option<ProjectId>,
    category: Option<String>,
    search: Option<String>,
    due: Option<DueFilter>,
    sort: Option<SortKey>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let filter = TaskFilter {
        status,
        priority,
        project_id: project,
        category,
        search,
        due,
        sort: sort.unwrap_or(config.default_sort),
        limit,
    };
    let tasks = db.list_tasks(&filter)?;
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }
    let projects = db.list_projects(&ProjectFilter::default())?;
    print_task_table(&tasks, &projects, today());
    Ok(())
}

/// View detailed information about a specific task.
pub fn cmd_view(db: &Database, id: TaskId) -> anyhow::Result<()> {
    let task = db.get_task(id)?;
    let project = task.project_id.map(|pid| db.get_project(pid)).transpose()?;
    print_task_detail(&task, project.as_ref(), today());
    Ok(())
}

/// Update an existing task's fields.
#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    db: &mut Database,
    id: TaskId,
    title: Option<String>,
    desc: Option<String>,
    category: Option<String>,
    priority: Option<Priority>,
    status: Option<Status>,
    due: Option<String>,
    project: Option<ProjectId>,
    clear_due: bool,
    clear_project: bool,
) -> anyhow::Result<()> {
    let due_date = if clear_due { Some(None) } else { parse_due(due)?.map(Some) };
    let project_id = if clear_project { Some(None) } else { project.map(Some) };
    let update = TaskUpdate { title, description: desc, category, priority, status, due_date, project_id };
    if update.is_empty() {
        return Err(nothing_to_update().into());
    }
    db.update_task(id, update)?;
    println!("Updated task {id}");
    Ok(())
}

/// Move a task to `status`.
pub fn cmd_set_status(db: &mut Database, id: TaskId, status: Status) -> anyhow::Result<()> {
    let task = db.set_task_status(id, status)?;
    println!("Task {} is now {}", task.id, format_status(task.status));
    Ok(())
}

pub fn cmd_delete(db: &mut Database, id: TaskId) -> anyhow::Result<()> {
    db.delete_task(id)?;
    println!("Deleted task {id}");
    Ok(())
}

/// Handle project management commands.
pub fn cmd_project(db: &mut Database, action: ProjectAction) -> anyhow::Result<()> {
    match action {
        ProjectAction::Add { name, desc, due } => {
            let project = db.create_project(NewProject {
                name,
                description: desc.unwrap_or_default(),
                due_date: parse_due(due)?,
                ..Default::default()
            })?;
            println!("Added project {}", project.id);
        }

        ProjectAction::List { status, search } => {
            let projects = db.list_projects(&ProjectFilter { status, search })?;
            if projects.is_empty() {
                println!("No projects found.");
                return Ok(());
            }
            let progress = analytics::project_progress(db)?;
            print_project_table(&projects, &progress, today());
        }

        ProjectAction::View { id } => {
            let project = db.get_project(id)?;
            let progress = analytics::progress_for(db, id)?;
            let tasks = db.list_tasks(&TaskFilter {
                project_id: Some(id),
                sort: SortKey::Due,
                ..Default::default()
            })?;
            print_project_detail(&project, &progress, &tasks, today());
        }

        ProjectAction::Update { id, name, desc, status, due, clear_due } => {
            let due_date = if clear_due { Some(None) } else { parse_due(due)?.map(Some) };
            let update = ProjectUpdate { name, description: desc, status, due_date };
            if update.is_empty() {
                return Err(nothing_to_update().into());
            }
            db.update_project(id, update)?;
            println!("Updated project {id}");
        }

        ProjectAction::Delete { id, orphan, cascade } => {
            let policy = match (orphan, cascade) {
                (true, _) => DeletePolicy::Orphan,
                (_, true) => DeletePolicy::Cascade,
                _ => DeletePolicy::Block,
            };
            let affected = db.delete_project(id, policy)?;
            match policy {
                DeletePolicy::Orphan if affected > 0 => {
                    println!("Deleted project {id}; {affected} task(s) no longer have a project")
                }
                DeletePolicy::Cascade if affected > 0 => {
                    println!("Deleted project {id} and {affected} task(s)")
                }
                _ => println!("Deleted project {id}"),
            }
        }
    }
    Ok(())
}

/// Show aggregates as text charts, or as JSON for an external renderer.
pub fn cmd_stats(db: &Database, json: bool) -> anyhow::Result<()> {
    let stats = analytics::task_statistics(db)?;
    let progress = analytics::project_progress(db)?;
    if json {
        let out = serde_json::json!({ "tasks": stats, "projects": progress });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_stats(&stats, &progress);
    }
    Ok(())
}

pub fn cmd_export(db: &Database, output: Option<PathBuf>) -> anyhow::Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from("taskdesk-export.json"));
    let doc = transfer::export_to_path(db, &path)
        .with_context(|| format!("failed to export to {}", path.display()))?;
    println!(
        "Exported {} project(s) and {} task(s) to {}",
        doc.projects.len(),
        doc.tasks.len(),
        path.display()
    );
    Ok(())
}

/// Import a JSON document, backing up the database first unless told not to.
pub fn cmd_import(db: &mut Database, input: PathBuf, no_backup: bool) -> anyhow::Result<()> {
    if !no_backup {
        let backup = db
            .backup_to(&backup_dir(db))
            .context("failed to create backup before import (use --no-backup to skip)")?;
        println!("Created backup: {}", backup.display());
    }
    let summary = transfer::import_from_path(db, &input)
        .with_context(|| format!("import of {} failed; no changes were made", input.display()))?;
    println!(
        "Imported {} project(s) ({} new) and {} task(s) ({} new)",
        summary.projects(),
        summary.projects_inserted,
        summary.tasks(),
        summary.tasks_inserted
    );
    Ok(())
}

pub fn cmd_backup(db: &Database) -> anyhow::Result<()> {
    let backup = db.backup_to(&backup_dir(db))?;
    println!("Created backup: {}", backup.display());
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

fn nothing_to_update() -> Error {
    Error::Validation { field: "update", reason: "nothing to change; pass at least one field".into() }
}

/// Backups live next to the database in a `backup` directory.
fn backup_dir(db: &Database) -> PathBuf {
    db.path()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."))
        .join("backup")
}
