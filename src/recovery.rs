//! Boot recovery: restore timer registrations after a restart.
//!
//! Timer registrations live in the host facility and die with it; the task
//! store is the only durable source of truth. On a restart signal the
//! coordinator re-derives every still-future trigger and feeds the registry
//! exactly the way a task mutation would.
//!
//! Reminders that elapsed while the process was down are intentionally not
//! back-filled; missed-reminder catch-up is out of scope.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::registry::TriggerRegistry;
use crate::store::TaskStore;

/// Summary of one recovery pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecoveryReport {
    /// Tasks with a future reminder found in the store
    pub tasks_scanned: usize,
    /// Triggers actually registered
    pub triggers_registered: usize,
    /// Tasks whose stale registrations were cancelled
    pub tasks_cancelled: usize,
    /// Tasks whose scheduling failed (logged and skipped)
    pub tasks_failed: usize,
}

pub struct BootRecoveryCoordinator<'a> {
    store: &'a TaskStore,
    registry: &'a TriggerRegistry,
}

impl<'a> BootRecoveryCoordinator<'a> {
    pub fn new(store: &'a TaskStore, registry: &'a TriggerRegistry) -> Self {
        Self { store, registry }
    }

    /// Re-register triggers for every task with a future reminder, and
    /// cancel registrations for tasks that have left that set.
    ///
    /// `registered` is the set of task ids currently holding live triggers;
    /// any of them no longer backed by a future reminder (deleted, completed,
    /// reminder cleared or elapsed) gets its registrations cancelled. Safe to
    /// run any number of times (duplicate restart signals included):
    /// scheduling replaces rather than accumulates, and cancelling an absent
    /// trigger is a no-op. A single task failing does not abort the pass.
    pub fn recover<I>(&self, now: DateTime<Utc>, registered: I) -> Result<RecoveryReport>
    where
        I: IntoIterator<Item = i64>,
    {
        let tasks = self.store.future_reminders(now)?;
        let live: HashSet<i64> = tasks.iter().map(|task| task.id).collect();
        let mut report = RecoveryReport {
            tasks_scanned: tasks.len(),
            ..RecoveryReport::default()
        };

        let stale: HashSet<i64> = registered
            .into_iter()
            .filter(|task_id| !live.contains(task_id))
            .collect();
        for task_id in stale {
            match self.registry.cancel(task_id) {
                Ok(()) => {
                    debug!(task_id, "cancelled stale triggers");
                    report.tasks_cancelled += 1;
                }
                Err(err) => {
                    warn!(task_id, %err, "recovery cancellation failed");
                    report.tasks_failed += 1;
                }
            }
        }

        for task in &tasks {
            match self.registry.schedule(task, now) {
                Ok(tiers) => report.triggers_registered += tiers.len(),
                Err(err) => {
                    warn!(task_id = task.id, %err, "recovery scheduling failed");
                    report.tasks_failed += 1;
                }
            }
        }

        info!(
            tasks = report.tasks_scanned,
            triggers = report.triggers_registered,
            cancelled = report.tasks_cancelled,
            failed = report.tasks_failed,
            "reminder recovery pass complete"
        );
        Ok(report)
    }
}
