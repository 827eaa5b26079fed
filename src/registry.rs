//! Trigger registry: keeps the host timer facility consistent with a task's
//! computed reminder schedule.
//!
//! `schedule` is safe to call on every edit: it always cancels both possible
//! request ids for the task before registering the freshly computed triggers,
//! so repeated calls replace rather than accumulate. `cancel` is likewise
//! unconditional and tolerates triggers that no longer exist.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::Result;
use crate::platform::{TimerHost, TriggerPayload};
use crate::schedule::{compute_triggers, Tier, TriggerKey};
use crate::task::Task;

pub struct TriggerRegistry {
    timers: Arc<dyn TimerHost>,
}

impl TriggerRegistry {
    pub fn new(timers: Arc<dyn TimerHost>) -> Self {
        Self { timers }
    }

    /// Register the triggers for a task's reminder, replacing any prior ones.
    ///
    /// Returns the tiers actually registered. A task without a reminder, or
    /// with a reminder already in the past, registers nothing (and any stale
    /// triggers from an earlier schedule are cancelled).
    ///
    /// When the host denies exact wake scheduling the alarm tier is skipped
    /// for this call rather than degraded to an inexact timer; the skip is
    /// retried naturally on the next schedule call for the task.
    pub fn schedule(&self, task: &Task, now: DateTime<Utc>) -> Result<Vec<Tier>> {
        // Replace, never accumulate: clear both slots before registering.
        self.cancel(task.id)?;

        let Some(spec) = task.reminder_spec() else {
            return Ok(Vec::new());
        };

        let mut registered = Vec::new();
        for planned in compute_triggers(Some(spec.reminder_at), now) {
            if planned.tier == Tier::Alarm && !self.timers.exact_wake_allowed() {
                warn!(
                    task_id = task.id,
                    "exact wake scheduling denied; skipping alarm tier"
                );
                continue;
            }

            let key = TriggerKey::new(task.id, planned.tier);
            let payload = TriggerPayload::from_spec(&spec, planned.tier);
            self.timers
                .register_exact_wake(key.request_id(), planned.fire_at, payload)?;
            debug!(
                task_id = task.id,
                tier = %planned.tier,
                fire_at = %planned.fire_at,
                "registered trigger"
            );
            registered.push(planned.tier);
        }

        Ok(registered)
    }

    /// Cancel both possible triggers for a task.
    ///
    /// Cancelling triggers that were never registered (or already fired) is a
    /// no-op. This only prevents future firings; it does not reach into a
    /// session that is already ringing.
    pub fn cancel(&self, task_id: i64) -> Result<()> {
        for tier in [Tier::EarlyWarning, Tier::Alarm] {
            self.timers
                .cancel(TriggerKey::new(task_id, tier).request_id())?;
        }
        Ok(())
    }
}
