//! nudge add command implementation
//!
//! Creates a task and reports the triggers its reminder will produce.

use chrono::Utc;

use crate::cli::{describe_triggers, parse_time, TaskRow};
use crate::config::Config;
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::TaskStore;
use crate::task::Task;

/// Options for the add command
pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub remind: Option<String>,
    pub due: Option<String>,
    pub config: Config,
    pub store: TaskStore,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct AddReport {
    task: TaskRow,
    planned_triggers: Vec<String>,
}

pub fn run(options: AddOptions) -> Result<()> {
    let now = Utc::now();

    let mut task = Task::new(options.title);
    task.description = options.description;
    task.category = options
        .category
        .as_deref()
        .unwrap_or(&options.config.defaults.category)
        .parse()?;
    task.priority = options
        .priority
        .as_deref()
        .unwrap_or(&options.config.defaults.priority)
        .parse()?;
    if let Some(raw) = options.remind.as_deref() {
        task.reminder_at = Some(parse_time(raw, now)?);
    }
    if let Some(raw) = options.due.as_deref() {
        task.due_at = Some(parse_time(raw, now)?);
    }

    let task = options.store.add(task)?;

    if let Some(destination) = EventDestination::parse(options.events.as_deref()) {
        let mut sink = destination.open()?;
        sink.emit(&Event::new(EventKind::TaskCreated).with_data(TaskRow::from(&task))?)?;
    }

    let planned = describe_triggers(&task, now);
    let report = AddReport {
        task: TaskRow::from(&task),
        planned_triggers: planned.clone(),
    };

    let mut human = HumanOutput::new(format!("Added task #{}: {}", task.id, task.title));
    human.push_summary("category", task.category.to_string());
    human.push_summary("priority", task.priority.to_string());
    if let Some(reminder_at) = task.reminder_at {
        human.push_summary("reminder", reminder_at.to_rfc3339());
        for line in &planned {
            human.push_detail(line.clone());
        }
        if planned.is_empty() {
            human.push_warning("reminder is in the past; nothing will fire".to_string());
        }
        human.push_next_step("nudge run".to_string());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "add",
        &report,
        Some(&human),
    )
}
