//! nudge list command implementation

use chrono::Utc;

use crate::cli::TaskRow;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::TaskStore;
use crate::task::{Category, Priority, Task};

/// Options for the list command
pub struct ListOptions {
    pub category: Option<String>,
    pub priority: Option<String>,
    pub completed: bool,
    pub pending: bool,
    pub today: bool,
    pub overdue: bool,
    pub store: TaskStore,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct ListReport {
    tasks: Vec<TaskRow>,
    total: usize,
}

pub fn run(options: ListOptions) -> Result<()> {
    let now = Utc::now();

    let category: Option<Category> = options
        .category
        .as_deref()
        .map(str::parse)
        .transpose()?;
    let priority: Option<Priority> = options
        .priority
        .as_deref()
        .map(str::parse)
        .transpose()?;

    let today_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc());
    let today_end = today_start.map(|start| start + chrono::Duration::days(1));

    let mut tasks: Vec<Task> = options
        .store
        .all()?
        .into_iter()
        .filter(|task| category.map_or(true, |wanted| task.category == wanted))
        .filter(|task| priority.map_or(true, |wanted| task.priority == wanted))
        .filter(|task| !options.completed || task.completed)
        .filter(|task| !options.pending || !task.completed)
        .filter(|task| {
            if !options.today {
                return true;
            }
            match (task.due_at, today_start, today_end) {
                (Some(due), Some(start), Some(end)) => due >= start && due < end,
                _ => false,
            }
        })
        .filter(|task| {
            if !options.overdue {
                return true;
            }
            matches!(task.due_at, Some(due) if due < now) && !task.completed
        })
        .collect();

    // Most urgent first, then most recently touched.
    tasks.sort_by(|left, right| {
        right
            .priority
            .rank()
            .cmp(&left.priority.rank())
            .then_with(|| right.updated_at.cmp(&left.updated_at))
            .then_with(|| left.id.cmp(&right.id))
    });

    let report = ListReport {
        tasks: tasks.iter().map(TaskRow::from).collect(),
        total: tasks.len(),
    };

    let mut human = HumanOutput::new(format!("{} task(s)", tasks.len()));
    for task in &tasks {
        let state = if task.completed { "x" } else { " " };
        let mut line = format!(
            "[{}] #{} {} ({}, {})",
            state, task.id, task.title, task.category, task.priority
        );
        if let Some(reminder_at) = task.reminder_at {
            line.push_str(&format!(" remind {}", reminder_at.to_rfc3339()));
        }
        if let Some(due_at) = task.due_at {
            line.push_str(&format!(" due {}", due_at.to_rfc3339()));
        }
        human.push_detail(line);
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "list",
        &report,
        Some(&human),
    )
}
