//! Host platform boundary for the reminder core.
//!
//! The timer facility, notification surface registry, audio output, and
//! elevated-execution context are process-wide host facilities. They are
//! modeled as injected traits rather than ambient globals so the core stays
//! unit-testable: tests substitute recording fakes and assert call sequences
//! (e.g. "stop was called exactly once per session teardown").
//!
//! Desktop implementations live in `crate::host`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schedule::Tier;
use crate::task::{Category, Priority, ReminderSpec};

/// Payload carried inside a timer registration.
///
/// Everything delivery needs is serialized into the registration so a firing
/// never requires a live store read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPayload {
    pub task_id: i64,
    pub tier: Tier,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Category,
    pub priority: Priority,
}

impl TriggerPayload {
    pub fn from_spec(spec: &ReminderSpec, tier: Tier) -> Self {
        Self {
            task_id: spec.task_id,
            tier,
            title: spec.title.clone(),
            description: spec.description.clone(),
            category: spec.category,
            priority: spec.priority,
        }
    }
}

/// Urgency class of a notification surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Dismissable heads-up (early warnings, post-alarm summaries)
    Medium,
    /// Persistent, attention-grabbing alert (active alarms)
    Critical,
}

/// An action offered on a notification surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceAction {
    /// Open the task in the tracker and stop the ringing session
    ViewDetails,
    /// Stop the ringing session
    Dismiss,
}

/// Content of a notification surface, built by the delivery controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSurface {
    pub task_id: i64,
    pub urgency: Urgency,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Non-dismissable by swipe while true
    pub persistent: bool,
    /// Request the host's full-screen attention-grabbing presentation
    pub full_screen: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub actions: Vec<SurfaceAction>,
}

/// Exact, wake-capable timer facility.
///
/// Registrations are keyed by request id; registering an id that is already
/// live replaces the old registration. Cancelling an unknown id is a no-op.
pub trait TimerHost: Send + Sync {
    /// Whether exact wake-while-idle scheduling is currently granted
    fn exact_wake_allowed(&self) -> bool;

    /// Register (or replace) an exact wake timer
    fn register_exact_wake(
        &self,
        request_id: i64,
        fire_at: DateTime<Utc>,
        payload: TriggerPayload,
    ) -> Result<()>;

    /// Cancel a registration; unknown ids are ignored
    fn cancel(&self, request_id: i64) -> Result<()>;
}

/// Notification surface registry
pub trait NotificationHost: Send + Sync {
    /// Post (or replace) a surface under the given id
    fn post(&self, surface_id: i64, surface: NotificationSurface) -> Result<()>;

    /// Remove a surface; unknown ids are ignored
    fn clear(&self, surface_id: i64) -> Result<()>;
}

/// Looping audio output for the alarm sound
pub trait AudioHost: Send + Sync {
    /// Start looping playback; must not block the caller.
    /// Starting while already playing is a no-op.
    fn start_loop(&self) -> Result<()>;

    /// Stop playback and release the output; stopping while idle is a no-op.
    fn stop(&self) -> Result<()>;

    fn is_playing(&self) -> bool;
}

/// Elevated-priority execution context for a ringing session.
///
/// Keeps the process from being reclaimed while an alarm is presenting;
/// bounded by the duration hint, never indefinite.
pub trait ForegroundHost: Send + Sync {
    fn enter(&self, task_id: i64, duration_hint: Duration) -> Result<()>;

    fn exit(&self, task_id: i64) -> Result<()>;
}
