//! nudge rm command implementation

use crate::cli::TaskRow;
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::TaskStore;

/// Options for the rm command
pub struct RmOptions {
    pub id: i64,
    pub store: TaskStore,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct RmReport {
    task: TaskRow,
}

pub fn run(options: RmOptions) -> Result<()> {
    let task = options.store.remove(options.id)?;

    if let Some(destination) = EventDestination::parse(options.events.as_deref()) {
        let mut sink = destination.open()?;
        sink.emit(&Event::new(EventKind::TaskDeleted).with_data(TaskRow::from(&task))?)?;
    }

    let human = HumanOutput::new(format!("Removed task #{}: {}", task.id, task.title));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "rm",
        &RmReport {
            task: TaskRow::from(&task),
        },
        Some(&human),
    )
}
