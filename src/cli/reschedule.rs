//! nudge reschedule command implementation
//!
//! Runs one boot-recovery pass against a fresh timer table and reports what
//! registered. This is the restart-signal entry point, and doubles as a
//! dry-run view of the triggers the daemon would hold right now.

use chrono::Utc;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind};
use crate::host::InProcessTimers;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::recovery::{BootRecoveryCoordinator, RecoveryReport};
use crate::registry::TriggerRegistry;
use crate::store::TaskStore;

/// Options for the reschedule command
pub struct RescheduleOptions {
    pub config: Config,
    pub store: TaskStore,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct TriggerInfo {
    request_id: i64,
    task_id: i64,
    tier: String,
    fire_at: String,
}

#[derive(serde::Serialize)]
struct RescheduleReport {
    recovery: RecoveryReport,
    triggers: Vec<TriggerInfo>,
}

pub fn run(options: RescheduleOptions) -> Result<()> {
    let now = Utc::now();

    let timers = Arc::new(InProcessTimers::new(options.config.reminders.exact_wake));
    let registry = TriggerRegistry::new(timers.clone());
    let coordinator = BootRecoveryCoordinator::new(&options.store, &registry);

    // The timer table is fresh, so there are no stale registrations to prune.
    let recovery = coordinator.recover(now, std::iter::empty())?;

    if let Some(destination) = EventDestination::parse(options.events.as_deref()) {
        let mut sink = destination.open()?;
        sink.emit(&Event::new(EventKind::ReminderRecovered).with_data(&recovery)?)?;
    }

    let triggers: Vec<TriggerInfo> = timers
        .registered()
        .into_iter()
        .map(|registration| TriggerInfo {
            request_id: registration.request_id,
            task_id: registration.payload.task_id,
            tier: registration.payload.tier.to_string(),
            fire_at: registration.fire_at.to_rfc3339(),
        })
        .collect();

    let mut human = HumanOutput::new(format!(
        "Recovered {} trigger(s) from {} task(s)",
        recovery.triggers_registered, recovery.tasks_scanned
    ));
    for trigger in &triggers {
        human.push_detail(format!(
            "task #{} {} at {}",
            trigger.task_id, trigger.tier, trigger.fire_at
        ));
    }
    if !options.config.reminders.exact_wake {
        human.push_warning("exact wake scheduling disabled; alarm tiers were skipped".to_string());
    }
    human.push_next_step("nudge run".to_string());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "reschedule",
        &RescheduleReport { recovery, triggers },
        Some(&human),
    )
}
