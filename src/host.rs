//! Desktop implementations of the platform boundary.
//!
//! A terminal process has no OS alarm service, so registrations live in an
//! in-process table owned by the daemon; durability across restarts comes
//! from boot recovery against the task store, not from the table itself.
//! Notifications render to the terminal and the alarm sound is the terminal
//! bell.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::platform::{
    AudioHost, ForegroundHost, NotificationHost, NotificationSurface, SurfaceAction, TimerHost,
    TriggerPayload, Urgency,
};

// =============================================================================
// In-process timer facility
// =============================================================================

/// A live registration in the in-process timer table
#[derive(Debug, Clone)]
pub struct TimerRegistration {
    pub request_id: i64,
    pub fire_at: DateTime<Utc>,
    pub payload: TriggerPayload,
}

/// In-memory wake-timer table.
///
/// Keyed by request id; registering an id that is already present replaces
/// the previous entry. The daemon loop drains due registrations with
/// [`take_due`](Self::take_due).
pub struct InProcessTimers {
    exact_wake: AtomicBool,
    registrations: Mutex<HashMap<i64, TimerRegistration>>,
}

impl InProcessTimers {
    pub fn new(exact_wake_allowed: bool) -> Self {
        Self {
            exact_wake: AtomicBool::new(exact_wake_allowed),
            registrations: Mutex::new(HashMap::new()),
        }
    }

    /// Flip the exact-wake permission gate (config reload, tests)
    pub fn set_exact_wake_allowed(&self, allowed: bool) {
        self.exact_wake.store(allowed, Ordering::SeqCst);
    }

    /// Snapshot of live registrations, ordered by fire time
    pub fn registered(&self) -> Vec<TimerRegistration> {
        let mut all: Vec<TimerRegistration> =
            self.table().values().cloned().collect();
        all.sort_by_key(|reg| (reg.fire_at, reg.request_id));
        all
    }

    /// Earliest fire time across live registrations
    pub fn next_fire_at(&self) -> Option<DateTime<Utc>> {
        self.table().values().map(|reg| reg.fire_at).min()
    }

    /// Remove and return every registration due at `now`, in fire order
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<TimerRegistration> {
        let mut table = self.table();
        let due_ids: Vec<i64> = table
            .values()
            .filter(|reg| reg.fire_at <= now)
            .map(|reg| reg.request_id)
            .collect();

        let mut due: Vec<TimerRegistration> = due_ids
            .into_iter()
            .filter_map(|id| table.remove(&id))
            .collect();
        due.sort_by_key(|reg| (reg.fire_at, reg.request_id));
        due
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<i64, TimerRegistration>> {
        self.registrations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TimerHost for InProcessTimers {
    fn exact_wake_allowed(&self) -> bool {
        self.exact_wake.load(Ordering::SeqCst)
    }

    fn register_exact_wake(
        &self,
        request_id: i64,
        fire_at: DateTime<Utc>,
        payload: TriggerPayload,
    ) -> Result<()> {
        self.table().insert(
            request_id,
            TimerRegistration {
                request_id,
                fire_at,
                payload,
            },
        );
        Ok(())
    }

    fn cancel(&self, request_id: i64) -> Result<()> {
        // Unknown ids are a no-op by contract.
        self.table().remove(&request_id);
        Ok(())
    }
}

// =============================================================================
// Terminal notification surface
// =============================================================================

/// Renders notification surfaces as terminal lines.
///
/// Keeps the posted surfaces in memory so replace/clear semantics hold even
/// though a printed line cannot be unprinted.
#[derive(Default)]
pub struct ConsoleNotifier {
    surfaces: Mutex<HashMap<i64, NotificationSurface>>,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationHost for ConsoleNotifier {
    fn post(&self, surface_id: i64, surface: NotificationSurface) -> Result<()> {
        let marker = match surface.urgency {
            Urgency::Medium => "--",
            Urgency::Critical => "!!",
        };
        let actions: Vec<&str> = surface
            .actions
            .iter()
            .map(|action| match action {
                SurfaceAction::ViewDetails => "view",
                SurfaceAction::Dismiss => "dismiss",
            })
            .collect();

        let mut line = format!("{} {}", marker, surface.title);
        if let Some(body) = &surface.body {
            line.push_str(&format!(" | {}", body));
        }
        if !actions.is_empty() {
            line.push_str(&format!("  [{}]", actions.join(", ")));
        }

        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", line)?;
        out.flush()?;

        self.surfaces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(surface_id, surface);
        Ok(())
    }

    fn clear(&self, surface_id: i64) -> Result<()> {
        self.surfaces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&surface_id);
        Ok(())
    }
}

// =============================================================================
// Terminal bell audio
// =============================================================================

const BELL_INTERVAL: StdDuration = StdDuration::from_secs(2);

/// Loops the terminal bell on a background thread until stopped.
pub struct TerminalBell {
    enabled: bool,
    playing: Arc<AtomicBool>,
}

impl TerminalBell {
    /// `enabled = false` tracks playback state without emitting anything
    /// (the `reminders.bell` config switch).
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            playing: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl AudioHost for TerminalBell {
    fn start_loop(&self) -> Result<()> {
        if self.playing.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if !self.enabled {
            return Ok(());
        }

        let playing = Arc::clone(&self.playing);
        std::thread::spawn(move || {
            while playing.load(Ordering::SeqCst) {
                let mut out = std::io::stdout().lock();
                let _ = out.write_all(b"\x07");
                let _ = out.flush();
                drop(out);
                std::thread::sleep(BELL_INTERVAL);
            }
        });
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

impl Drop for TerminalBell {
    fn drop(&mut self) {
        self.playing.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Foreground context
// =============================================================================

/// A terminal daemon already owns its process lifetime; elevated execution
/// is recorded for observability and otherwise does nothing.
#[derive(Default)]
pub struct NoopForeground;

impl ForegroundHost for NoopForeground {
    fn enter(&self, task_id: i64, duration_hint: StdDuration) -> Result<()> {
        debug!(task_id, ?duration_hint, "entered foreground context");
        Ok(())
    }

    fn exit(&self, task_id: i64) -> Result<()> {
        debug!(task_id, "left foreground context");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Tier;
    use crate::task::{Category, Priority};
    use chrono::Duration;

    fn payload(task_id: i64, tier: Tier) -> TriggerPayload {
        TriggerPayload {
            task_id,
            tier,
            title: "t".to_string(),
            description: None,
            category: Category::Personal,
            priority: Priority::Medium,
        }
    }

    #[test]
    fn registering_same_id_replaces() {
        let timers = InProcessTimers::new(true);
        let now = Utc::now();

        timers
            .register_exact_wake(3, now + Duration::minutes(5), payload(1, Tier::Alarm))
            .unwrap();
        timers
            .register_exact_wake(3, now + Duration::minutes(9), payload(1, Tier::Alarm))
            .unwrap();

        let all = timers.registered();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].fire_at, now + Duration::minutes(9));
    }

    #[test]
    fn take_due_drains_only_elapsed() {
        let timers = InProcessTimers::new(true);
        let now = Utc::now();

        timers
            .register_exact_wake(2, now - Duration::seconds(1), payload(1, Tier::EarlyWarning))
            .unwrap();
        timers
            .register_exact_wake(3, now + Duration::minutes(1), payload(1, Tier::Alarm))
            .unwrap();

        let due = timers.take_due(now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].request_id, 2);

        assert_eq!(timers.registered().len(), 1);
        assert_eq!(timers.next_fire_at(), Some(now + Duration::minutes(1)));
    }

    #[test]
    fn cancel_unknown_id_is_noop() {
        let timers = InProcessTimers::new(true);
        timers.cancel(999).unwrap();
        assert!(timers.registered().is_empty());
    }

    #[test]
    fn bell_state_tracks_start_and_stop() {
        let bell = TerminalBell::new(false);
        assert!(!bell.is_playing());

        bell.start_loop().unwrap();
        assert!(bell.is_playing());
        // Re-entrant start is a no-op.
        bell.start_loop().unwrap();
        assert!(bell.is_playing());

        bell.stop().unwrap();
        assert!(!bell.is_playing());
        bell.stop().unwrap();
    }
}
