//! Alarm delivery controller.
//!
//! State machine driven by timer firings:
//!
//! ```text
//! IDLE -> NOTIFIED(early warning)          one dismissable surface, done
//! IDLE -> RINGING -> STOPPED               audio + persistent surface + 30s countdown
//! ```
//!
//! A firing callback runs on a short execution budget, so everything that
//! must outlive it (looping audio, the persistent surface, the countdown)
//! belongs to the bounded `DeliverySession`. The controller is the sole
//! writer of the session map; re-entrant alarm firings are resolved with a
//! presence check, never by stacking a second set of resources.
//!
//! Errors raised while building a surface or starting audio are caught at
//! the firing boundary and logged: a crash inside the wake callback would
//! forfeit the wake, so a failed delivery degrades to "no reminder fired".

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::platform::{
    AudioHost, ForegroundHost, NotificationHost, NotificationSurface, SurfaceAction,
    TriggerPayload, Urgency,
};
use crate::schedule::Tier;

/// Wall-clock cap on a ringing session
pub fn auto_dismiss_window() -> Duration {
    Duration::seconds(30)
}

/// Surface id for a task's early-warning notification
pub fn early_surface_id(task_id: i64) -> i64 {
    task_id * 10
}

/// Surface id for a task's alarm notification
pub fn alarm_surface_id(task_id: i64) -> i64 {
    task_id * 10 + 1
}

/// Why a ringing session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// User hit the dismiss action
    Dismissed,
    /// User opened the task; also a valid stop trigger
    ViewDetails,
    /// The 30s countdown elapsed with no user action
    AutoDismiss,
    /// The host revoked the elevated execution context
    Revoked,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Dismissed => write!(f, "dismissed"),
            StopReason::ViewDetails => write!(f, "view_details"),
            StopReason::AutoDismiss => write!(f, "auto_dismiss"),
            StopReason::Revoked => write!(f, "revoked"),
        }
    }
}

/// An active ringing session for one task
#[derive(Debug, Clone)]
pub struct DeliverySession {
    pub session_id: Uuid,
    pub task_id: i64,
    pub started_at: DateTime<Utc>,
    pub auto_dismiss_at: DateTime<Utc>,
}

impl DeliverySession {
    fn new(task_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            task_id,
            started_at: now,
            auto_dismiss_at: now + auto_dismiss_window(),
        }
    }
}

pub struct DeliveryController {
    notifications: Arc<dyn NotificationHost>,
    audio: Arc<dyn AudioHost>,
    foreground: Arc<dyn ForegroundHost>,
    sessions: Mutex<HashMap<i64, DeliverySession>>,
}

impl DeliveryController {
    pub fn new(
        notifications: Arc<dyn NotificationHost>,
        audio: Arc<dyn AudioHost>,
        foreground: Arc<dyn ForegroundHost>,
    ) -> Self {
        Self {
            notifications,
            audio,
            foreground,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Entry point for a timer firing. Never propagates an error.
    pub fn deliver(&self, payload: &TriggerPayload, now: DateTime<Utc>) {
        let outcome = match payload.tier {
            Tier::EarlyWarning => self.notify_early(payload),
            Tier::Alarm => self.ring(payload, now),
        };

        if let Err(err) = outcome {
            warn!(
                task_id = payload.task_id,
                tier = %payload.tier,
                %err,
                "delivery dropped"
            );
        }
    }

    /// Whether a ringing session is active for the task
    pub fn is_ringing(&self, task_id: i64) -> bool {
        self.sessions().contains_key(&task_id)
    }

    /// Task ids with an active ringing session
    pub fn active_tasks(&self) -> Vec<i64> {
        self.sessions().keys().copied().collect()
    }

    /// Earliest auto-dismiss deadline across active sessions
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.sessions()
            .values()
            .map(|session| session.auto_dismiss_at)
            .min()
    }

    /// Stop the ringing session for a task.
    ///
    /// Idempotent: stopping a task with no active session is a no-op.
    /// Returns whether a session was actually stopped. All teardown effects
    /// run even if one of them fails; host errors are logged, not raised.
    pub fn stop(&self, task_id: i64, reason: StopReason) -> bool {
        let session = match self.sessions().remove(&task_id) {
            Some(session) => session,
            None => return false,
        };

        // The audio output is process-wide; keep it looping if another
        // task's session is still ringing.
        if self.sessions().is_empty() {
            if let Err(err) = self.audio.stop() {
                warn!(task_id, %err, "failed to stop alarm audio");
            }
        }

        if let Err(err) = self.foreground.exit(task_id) {
            warn!(task_id, %err, "failed to leave elevated execution");
        }

        self.retire_alarm_surface(task_id, reason);

        info!(
            task_id,
            session_id = %session.session_id,
            reason = %reason,
            "alarm session stopped"
        );
        true
    }

    /// Stop every session whose countdown has elapsed. Returns the task ids
    /// that were auto-dismissed. The daemon loop calls this at each session
    /// deadline; the controller itself owns no timer.
    pub fn expire_sessions(&self, now: DateTime<Utc>) -> Vec<i64> {
        let due: Vec<i64> = self
            .sessions()
            .values()
            .filter(|session| session.auto_dismiss_at <= now)
            .map(|session| session.task_id)
            .collect();

        due.into_iter()
            .filter(|&task_id| self.stop(task_id, StopReason::AutoDismiss))
            .collect()
    }

    fn notify_early(&self, payload: &TriggerPayload) -> Result<()> {
        let surface = NotificationSurface {
            task_id: payload.task_id,
            urgency: Urgency::Medium,
            title: format!("Upcoming: {}", payload.title),
            body: payload
                .description
                .clone()
                .or_else(|| Some("You have a task coming up in 30 minutes.".to_string())),
            persistent: false,
            full_screen: false,
            actions: vec![SurfaceAction::ViewDetails],
        };
        self.notifications
            .post(early_surface_id(payload.task_id), surface)?;
        debug!(task_id = payload.task_id, "early warning posted");
        Ok(())
    }

    fn ring(&self, payload: &TriggerPayload, now: DateTime<Utc>) -> Result<()> {
        let task_id = payload.task_id;
        let mut sessions = self.sessions();
        let restarting = sessions.contains_key(&task_id);

        if !restarting {
            // Audio first: the sound must be up before anything that can
            // take longer, and must not block this callback.
            self.audio.start_loop()?;

            let hint = StdDuration::from_secs(auto_dismiss_window().num_seconds() as u64);
            if let Err(err) = self.foreground.enter(task_id, hint) {
                // Losing the elevated context shortens our lifetime but the
                // alarm can still present; not worth dropping the delivery.
                warn!(task_id, %err, "elevated execution unavailable");
            }
        }

        let surface = NotificationSurface {
            task_id,
            urgency: Urgency::Critical,
            title: format!("ALARM: {}", payload.title),
            body: payload.description.clone(),
            persistent: true,
            full_screen: true,
            actions: vec![SurfaceAction::ViewDetails, SurfaceAction::Dismiss],
        };

        if let Err(err) = self.notifications.post(alarm_surface_id(task_id), surface) {
            if !restarting {
                // Don't leave audio looping behind a delivery we just dropped.
                let _ = self.audio.stop();
                let _ = self.foreground.exit(task_id);
            }
            return Err(err);
        }

        // Insert (or refresh) the session: a re-entrant firing restarts the
        // countdown and presentation instead of stacking a second stream.
        let session = DeliverySession::new(task_id, now);
        if restarting {
            debug!(task_id, "re-entrant alarm firing; session refreshed");
        } else {
            info!(task_id, session_id = %session.session_id, "alarm session started");
        }
        sessions.insert(task_id, session);

        Ok(())
    }

    /// Replace or clear the persistent surface so the user is never left
    /// with an un-clearable alert.
    fn retire_alarm_surface(&self, task_id: i64, reason: StopReason) {
        let surface_id = alarm_surface_id(task_id);
        let result = match reason {
            StopReason::AutoDismiss => {
                // Leave a dismissable trace so a missed alarm is visible.
                self.notifications.post(
                    surface_id,
                    NotificationSurface {
                        task_id,
                        urgency: Urgency::Medium,
                        title: "Missed reminder".to_string(),
                        body: None,
                        persistent: false,
                        full_screen: false,
                        actions: vec![SurfaceAction::ViewDetails],
                    },
                )
            }
            _ => self.notifications.clear(surface_id),
        };

        if let Err(err) = result {
            warn!(task_id, %err, "failed to retire alarm surface");
            let _ = self.notifications.clear(surface_id);
        }
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<i64, DeliverySession>> {
        self.sessions.lock().unwrap_or_else(|poisoned| {
            // A panic while holding the map leaves it structurally sound;
            // continuing beats losing every future alarm.
            poisoned.into_inner()
        })
    }
}
