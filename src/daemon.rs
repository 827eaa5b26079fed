//! The reminder daemon: the thin adapter between host events and the core.
//!
//! All scheduling and delivery logic lives in the components
//! (`TriggerRegistry`, `DeliveryController`, `BootRecoveryCoordinator`); the
//! loop here only routes events:
//!
//! - elapsed wake timers -> `DeliveryController::deliver`
//! - elapsed session countdowns -> `DeliveryController::expire_sessions`
//! - store file changes (edits from concurrent CLI invocations) -> a fresh
//!   recovery pass, which reschedules idempotently
//! - stdin commands (`dismiss <id>`, `view <id>`, `quit`) -> the session
//!   stop paths a mobile host would drive from notification actions
//!
//! A recovery pass also runs once at startup; that is the restart-signal
//! handler.

use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use notify::{RecursiveMode, Watcher};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::delivery::{DeliveryController, StopReason};
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind, EventSink};
use crate::host::{ConsoleNotifier, InProcessTimers, NoopForeground, TerminalBell};
use crate::recovery::BootRecoveryCoordinator;
use crate::registry::TriggerRegistry;
use crate::schedule::Tier;
use crate::store::TaskStore;

/// Idle poll interval when nothing is registered
const IDLE_POLL: StdDuration = StdDuration::from_secs(3600);

/// Debounce window for store file change bursts
const WATCH_DEBOUNCE: StdDuration = StdDuration::from_millis(250);

pub async fn run(
    config: &Config,
    store: TaskStore,
    events: Option<EventDestination>,
) -> Result<()> {
    let timers = Arc::new(InProcessTimers::new(config.reminders.exact_wake));
    let registry = TriggerRegistry::new(timers.clone());
    let controller = DeliveryController::new(
        Arc::new(ConsoleNotifier::new()),
        Arc::new(TerminalBell::new(config.reminders.bell)),
        Arc::new(NoopForeground),
    );
    let mut sink = match events {
        Some(destination) => Some(destination.open()?),
        None => None,
    };

    // Startup is the restart signal: rebuild every still-future trigger.
    let coordinator = BootRecoveryCoordinator::new(&store, &registry);
    let report = coordinator.recover(Utc::now(), registered_tasks(&timers))?;
    emit(
        &mut sink,
        Event::new(EventKind::ReminderRecovered).with_data(&report)?,
    );
    info!(
        triggers = report.triggers_registered,
        "daemon started; watching for reminders"
    );

    // Store watcher: concurrent CLI edits land as file events.
    let (watch_tx, watch_rx) = std_mpsc::channel::<()>();
    let mut watcher = notify::recommended_watcher(move |result| {
        if let Ok(notify::Event { .. }) = result {
            let _ = watch_tx.send(());
        }
    })?;
    std::fs::create_dir_all(store.tasks_file().parent().unwrap_or(std::path::Path::new(".")))?;
    watcher.watch(
        store.tasks_file().parent().unwrap_or(std::path::Path::new(".")),
        RecursiveMode::NonRecursive,
    )?;
    let (change_tx, mut change_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
    std::thread::spawn(move || {
        while watch_rx.recv().is_ok() {
            // Collapse bursts of filesystem events into one reschedule.
            while watch_rx.recv_timeout(WATCH_DEBOUNCE).is_ok() {}
            if change_tx.send(()).is_err() {
                break;
            }
        }
    });

    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        let now = Utc::now();

        // Fire every trigger and countdown that has elapsed.
        for registration in timers.take_due(now) {
            let payload = &registration.payload;
            let kind = match payload.tier {
                Tier::EarlyWarning => EventKind::EarlyWarningFired,
                Tier::Alarm => EventKind::AlarmFired,
            };
            emit(&mut sink, Event::new(kind).with_data(payload)?);
            controller.deliver(payload, now);
        }
        for task_id in controller.expire_sessions(now) {
            emit(
                &mut sink,
                Event::new(EventKind::AlarmStopped)
                    .with_data(serde_json::json!({ "task_id": task_id, "reason": "auto_dismiss" }))?,
            );
        }

        // Sleep until the next trigger or session deadline, or an event.
        let next = [timers.next_fire_at(), controller.next_deadline()]
            .into_iter()
            .flatten()
            .min();
        let wait = match next {
            Some(at) => (at - Utc::now()).to_std().unwrap_or(StdDuration::ZERO),
            None => IDLE_POLL,
        };
        debug!(?wait, "daemon sleeping");

        tokio::select! {
            _ = sleep(wait) => {}
            changed = change_rx.recv() => {
                if changed.is_some() {
                    debug!("store changed; rescheduling");
                    let report = coordinator.recover(Utc::now(), registered_tasks(&timers))?;
                    emit(
                        &mut sink,
                        Event::new(EventKind::ReminderRecovered).with_data(&report)?,
                    );
                }
            }
            line = stdin_lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        if handle_command(&line, &store, &controller, &mut sink)? {
                            break;
                        }
                    }
                    Ok(None) => {
                        // EOF. Stop polling stdin so the select arm does not
                        // complete instantly on every loop iteration; timers
                        // keep being served.
                        debug!("stdin closed; interactive commands disabled");
                        stdin_open = false;
                    }
                    Err(err) => warn!(%err, "stdin read failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    // The host is revoking our execution context; tear sessions down so no
    // audio or persistent surface outlives the process.
    for task_id in controller.active_tasks() {
        controller.stop(task_id, StopReason::Revoked);
    }

    Ok(())
}

/// Handle one interactive command line. Returns true when the daemon should
/// exit.
fn handle_command(
    line: &str,
    store: &TaskStore,
    controller: &DeliveryController,
    sink: &mut Option<EventSink>,
) -> Result<bool> {
    let mut parts = line.split_whitespace();
    let verb = match parts.next() {
        Some(verb) => verb,
        None => return Ok(false),
    };

    match verb {
        "quit" | "exit" => return Ok(true),
        "dismiss" | "view" => {
            let Some(task_id) = parts.next().and_then(|raw| raw.parse::<i64>().ok()) else {
                eprintln!("usage: {verb} <task-id>");
                return Ok(false);
            };

            let reason = if verb == "view" {
                StopReason::ViewDetails
            } else {
                StopReason::Dismissed
            };

            if controller.stop(task_id, reason) {
                emit(
                    sink,
                    Event::new(EventKind::AlarmStopped).with_data(
                        serde_json::json!({ "task_id": task_id, "reason": reason.to_string() }),
                    )?,
                );
            }

            if verb == "view" {
                match store.get(task_id)? {
                    Some(task) => println!(
                        "#{} {} [{} {}]{}",
                        task.id,
                        task.title,
                        task.category,
                        task.priority,
                        task.description
                            .as_deref()
                            .map(|d| format!(" - {d}"))
                            .unwrap_or_default()
                    ),
                    None => eprintln!("no such task: {task_id}"),
                }
            }
        }
        _ => eprintln!("commands: dismiss <id>, view <id>, quit"),
    }

    Ok(false)
}

/// Task ids currently holding live timer registrations
fn registered_tasks(timers: &InProcessTimers) -> Vec<i64> {
    timers
        .registered()
        .into_iter()
        .map(|registration| registration.payload.task_id)
        .collect()
}

fn emit(sink: &mut Option<EventSink>, event: Event) {
    if let Some(sink) = sink {
        if let Err(err) = sink.emit(&event) {
            warn!(%err, "failed to emit event");
        }
    }
}
