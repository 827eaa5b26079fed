//! nudge done command implementation
//!
//! Completing a task retires its reminder; toggling it back to incomplete
//! makes the reminder live again. The daemon picks up either change from the
//! store watch and cancels or reschedules accordingly.

use crate::cli::TaskRow;
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::TaskStore;

/// Options for the done command
pub struct DoneOptions {
    pub id: i64,
    pub store: TaskStore,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct DoneReport {
    task: TaskRow,
}

pub fn run(options: DoneOptions) -> Result<()> {
    let task = options.store.toggle_complete(options.id)?;

    if let Some(destination) = EventDestination::parse(options.events.as_deref()) {
        let kind = if task.completed {
            EventKind::TaskCompleted
        } else {
            EventKind::TaskReopened
        };
        let mut sink = destination.open()?;
        sink.emit(&Event::new(kind).with_data(TaskRow::from(&task))?)?;
    }

    let verb = if task.completed { "Completed" } else { "Reopened" };
    let mut human = HumanOutput::new(format!("{} task #{}: {}", verb, task.id, task.title));
    if !task.completed && task.reminder_at.is_some() {
        human.push_detail("reminder is live again".to_string());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "done",
        &DoneReport {
            task: TaskRow::from(&task),
        },
        Some(&human),
    )
}
