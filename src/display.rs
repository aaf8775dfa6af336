//! Plain-text rendering of tasks, projects and statistics.

use std::collections::HashMap;

use chrono::NaiveDate;

use taskdesk::analytics::{ProjectProgress, TaskStatistics};
use taskdesk::dates::format_due_relative;
use taskdesk::*;

const BAR_WIDTH: usize = 30;

/// Print tasks in a formatted table.
pub fn print_task_table(tasks: &[Task], projects: &[Project], today: NaiveDate) {
    let names: HashMap<ProjectId, &str> = projects.iter().map(|p| (p.id, p.name.as_str())).collect();
    println!(
        "{:<5} {:<12} {:<7} {:<12} {:<14} {:<12} {}",
        "ID", "Status", "Pri", "Due", "Project", "Category", "Title"
    );
    for t in tasks {
        let project = t.project_id.and_then(|id| names.get(&id).copied()).unwrap_or("-");
        let category = if t.category.is_empty() { "-" } else { t.category.as_str() };
        let due = if t.is_overdue(today) {
            format!("{}!", format_due_relative(t.due_date, today))
        } else {
            format_due_relative(t.due_date, today)
        };
        println!(
            "{:<5} {:<12} {:<7} {:<12} {:<14} {:<12} {}",
            t.id,
            format_status(t.status),
            format_priority(t.priority),
            due,
            truncate(project, 14),
            truncate(category, 12),
            t.title
        );
    }
}

pub fn print_task_detail(task: &Task, project: Option<&Project>, today: NaiveDate) {
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", format_status(task.status));
    println!("Priority:     {}", format_priority(task.priority));
    println!("Category:     {}", if task.category.is_empty() { "-" } else { task.category.as_str() });
    println!(
        "Project:      {}",
        project.map(|p| format!("{} (#{})", p.name, p.id)).unwrap_or_else(|| "-".into())
    );
    println!(
        "Due:          {}",
        match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!("Created UTC:  {}", task.created_at.to_rfc3339());
    println!("Updated UTC:  {}", task.updated_at.to_rfc3339());
    if let Some(done) = task.completed_at {
        println!("Completed:    {}", done.to_rfc3339());
    }
    println!(
        "Description:\n{}\n",
        if task.description.is_empty() { "-" } else { task.description.as_str() }
    );
}

pub fn print_project_table(projects: &[Project], progress: &[ProjectProgress], today: NaiveDate) {
    let by_id: HashMap<ProjectId, &ProjectProgress> = progress.iter().map(|p| (p.project_id, p)).collect();
    println!(
        "{:<5} {:<20} {:<10} {:>6} {:>5} {:>8} {:<12}",
        "ID", "Name", "Status", "Tasks", "Done", "Progress", "Due"
    );
    for p in projects {
        let (total, done, label) = match by_id.get(&p.id) {
            Some(pr) => (pr.total, pr.completed, pr.percent_label()),
            None => (0, 0, "N/A".to_string()),
        };
        println!(
            "{:<5} {:<20} {:<10} {:>6} {:>5} {:>8} {:<12}",
            p.id,
            truncate(&p.name, 20),
            format_project_status(p.status),
            total,
            done,
            label,
            format_due_relative(p.due_date, today)
        );
    }
}

pub fn print_project_detail(project: &Project, progress: &ProjectProgress, tasks: &[Task], today: NaiveDate) {
    println!("ID:           {}", project.id);
    println!("Name:         {}", project.name);
    println!("Status:       {}", format_project_status(project.status));
    println!(
        "Due:          {}",
        project.due_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
    );
    println!(
        "Progress:     {} ({} of {} task(s) completed)",
        progress.percent_label(),
        progress.completed,
        progress.total
    );
    println!(
        "Description:\n{}\n",
        if project.description.is_empty() { "-" } else { project.description.as_str() }
    );
    if tasks.is_empty() {
        println!("No tasks in this project.");
    } else {
        print_task_table(tasks, std::slice::from_ref(project), today);
    }
}

/// Status, priority and category counts as bar charts, then project progress.
pub fn print_stats(stats: &TaskStatistics, progress: &[ProjectProgress]) {
    println!("Tasks: {}", stats.total);

    println!("\nBy status");
    let rows: Vec<(&str, usize)> = stats.by_status.iter().map(|(s, n)| (format_status(*s), *n)).collect();
    print_bars(&rows);

    println!("\nBy priority");
    let rows: Vec<(&str, usize)> = stats
        .by_priority
        .iter()
        .rev()
        .map(|(p, n)| (format_priority(*p), *n))
        .collect();
    print_bars(&rows);

    println!("\nBy category");
    if stats.by_category.is_empty() {
        println!("  -");
    } else {
        let rows: Vec<(&str, usize)> = stats.by_category.iter().map(|(c, n)| (c.as_str(), *n)).collect();
        print_bars(&rows);
    }

    println!("\nProject progress");
    if progress.is_empty() {
        println!("  -");
    }
    for p in progress {
        let filled = p.percent.map_or(0, progress_cells);
        println!(
            "  {:<20} [{}{}] {:>4}  ({}/{})",
            truncate(&p.name, 20),
            "#".repeat(filled),
            ".".repeat(BAR_WIDTH - filled),
            p.percent_label(),
            p.completed,
            p.total
        );
    }
}

/// Filled cells for a progress bar; rounds down so a full bar means done.
fn progress_cells(percent: f64) -> usize {
    ((percent / 100.0 * BAR_WIDTH as f64).floor() as usize).min(BAR_WIDTH)
}

fn print_bars(rows: &[(&str, usize)]) {
    let max = rows.iter().map(|(_, n)| *n).max().unwrap_or(0);
    for (label, n) in rows {
        let len = if max == 0 { 0 } else { n * BAR_WIDTH / max };
        println!("  {:<14} {:>5} {}", truncate(label, 14), n, "#".repeat(len));
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
