//! nudge edit command implementation
//!
//! Edits are the main reschedule path: the daemon watches the store and
//! replaces the task's triggers after every change, so an edited reminder
//! never leaves a stale registration behind.

use chrono::Utc;

use crate::cli::{describe_triggers, parse_time, TaskRow};
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::TaskStore;

/// Options for the edit command
pub struct EditOptions {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub remind: Option<String>,
    pub due: Option<String>,
    pub store: TaskStore,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct EditReport {
    task: TaskRow,
    planned_triggers: Vec<String>,
}

pub fn run(options: EditOptions) -> Result<()> {
    let now = Utc::now();

    // Parse everything up front so a bad argument never half-applies.
    let category = options
        .category
        .as_deref()
        .map(str::parse::<crate::task::Category>)
        .transpose()?;
    let priority = options
        .priority
        .as_deref()
        .map(str::parse::<crate::task::Priority>)
        .transpose()?;
    let remind = match options.remind.as_deref() {
        None => None,
        Some("none") => Some(None),
        Some(raw) => Some(Some(parse_time(raw, now)?)),
    };
    let due = match options.due.as_deref() {
        None => None,
        Some("none") => Some(None),
        Some(raw) => Some(Some(parse_time(raw, now)?)),
    };

    let task = options.store.update_task(options.id, |task| {
        if let Some(title) = options.title {
            task.title = title;
        }
        if let Some(description) = options.description {
            task.description = if description == "none" {
                None
            } else {
                Some(description)
            };
        }
        if let Some(category) = category {
            task.category = category;
        }
        if let Some(priority) = priority {
            task.priority = priority;
        }
        if let Some(remind) = remind {
            task.reminder_at = remind;
        }
        if let Some(due) = due {
            task.due_at = due;
        }
        Ok(())
    })?;

    if let Some(destination) = EventDestination::parse(options.events.as_deref()) {
        let mut sink = destination.open()?;
        sink.emit(&Event::new(EventKind::TaskEdited).with_data(TaskRow::from(&task))?)?;
    }

    let planned = describe_triggers(&task, now);
    let report = EditReport {
        task: TaskRow::from(&task),
        planned_triggers: planned.clone(),
    };

    let mut human = HumanOutput::new(format!("Updated task #{}: {}", task.id, task.title));
    if let Some(reminder_at) = task.reminder_at {
        human.push_summary("reminder", reminder_at.to_rfc3339());
        for line in &planned {
            human.push_detail(line.clone());
        }
    } else {
        human.push_summary("reminder", "none".to_string());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "edit",
        &report,
        Some(&human),
    )
}
