//! Trigger schedule calculation.
//!
//! Pure and synchronous: given a task's reminder timestamp and the current
//! time, decide which wake triggers exist and when they fire. No I/O, no
//! error conditions; total over its inputs.
//!
//! # Tiers
//!
//! - `EarlyWarning`: soft heads-up 30 minutes before the reminder
//! - `Alarm`: the exact-time critical alert
//!
//! Backward-in-time triggers are never produced: a reminder already in the
//! past yields nothing, and the early warning is dropped when its own fire
//! time has already passed.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How far ahead of the reminder the early warning fires
pub fn early_warning_offset() -> Duration {
    Duration::minutes(30)
}

/// Notification tier of a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    EarlyWarning,
    Alarm,
}

impl Tier {
    /// Ordinal used in request-id arithmetic
    pub fn ordinal(&self) -> i64 {
        match self {
            Tier::EarlyWarning => 0,
            Tier::Alarm => 1,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::EarlyWarning => write!(f, "early_warning"),
            Tier::Alarm => write!(f, "alarm"),
        }
    }
}

/// Identity of a live trigger: at most one exists per key at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerKey {
    pub task_id: i64,
    pub tier: Tier,
}

impl TriggerKey {
    pub fn new(task_id: i64, tier: Tier) -> Self {
        Self { task_id, tier }
    }

    /// Deterministic numeric handle for this key.
    ///
    /// `task_id * 2 + tier_ordinal` is injective over (task_id, tier), which
    /// lets `cancel` address a specific trigger without re-deriving the
    /// reminder spec or keeping a mapping table.
    pub fn request_id(&self) -> i64 {
        self.task_id * 2 + self.tier.ordinal()
    }
}

/// A `(tier, fire_at)` pair produced by the calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedTrigger {
    pub tier: Tier,
    pub fire_at: DateTime<Utc>,
}

/// Compute the triggers for a reminder timestamp.
///
/// Returns zero, one, or two triggers:
/// - `None` reminder, or a reminder at/before `now`: empty
/// - otherwise the alarm at `reminder_at`, plus the early warning at
///   `reminder_at - 30min` when that is still in the future
pub fn compute_triggers(
    reminder_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<PlannedTrigger> {
    let Some(reminder_at) = reminder_at else {
        return Vec::new();
    };
    if reminder_at <= now {
        return Vec::new();
    }

    let mut triggers = Vec::with_capacity(2);

    let early_at = reminder_at - early_warning_offset();
    if early_at > now {
        triggers.push(PlannedTrigger {
            tier: Tier::EarlyWarning,
            fire_at: early_at,
        });
    }

    triggers.push(PlannedTrigger {
        tier: Tier::Alarm,
        fire_at: reminder_at,
    });

    triggers
}
