//! nudge show command implementation

use chrono::Utc;

use crate::cli::{describe_triggers, TaskRow};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::TaskStore;

/// Options for the show command
pub struct ShowOptions {
    pub id: i64,
    pub store: TaskStore,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct ShowReport {
    task: TaskRow,
    planned_triggers: Vec<String>,
}

pub fn run(options: ShowOptions) -> Result<()> {
    let task = options
        .store
        .get(options.id)?
        .ok_or(Error::TaskNotFound(options.id))?;

    let now = Utc::now();
    let planned = describe_triggers(&task, now);

    let report = ShowReport {
        task: TaskRow::from(&task),
        planned_triggers: planned.clone(),
    };

    let mut human = HumanOutput::new(format!("#{} {}", task.id, task.title));
    if let Some(description) = &task.description {
        human.push_detail(description.clone());
    }
    human.push_summary("category", task.category.to_string());
    human.push_summary("priority", task.priority.to_string());
    human.push_summary("completed", task.completed.to_string());
    if let Some(reminder_at) = task.reminder_at {
        human.push_summary("reminder", reminder_at.to_rfc3339());
    }
    if let Some(due_at) = task.due_at {
        human.push_summary("due", due_at.to_rfc3339());
    }
    for line in &planned {
        human.push_detail(line.clone());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "show",
        &report,
        Some(&human),
    )
}
