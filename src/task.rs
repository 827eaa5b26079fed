//! Task domain types for nudge.
//!
//! A task is the unit the tracker persists; everything the reminder core
//! consumes is derived from it on demand. `ReminderSpec` is that derivation:
//! it has no lifecycle of its own and is recomputed every time it is needed,
//! never cached across a schedule/cancel boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Category
// =============================================================================

/// Life area a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Personal,
    Work,
    Study,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Personal => write!(f, "personal"),
            Category::Work => write!(f, "work"),
            Category::Study => write!(f, "study"),
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(Category::Personal),
            "work" => Ok(Category::Work),
            "study" => Ok(Category::Study),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid category '{}'. Expected: personal, work, study",
                s
            ))),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Personal
    }
}

// =============================================================================
// Priority
// =============================================================================

/// Priority level of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Get the rank used for sorting (higher = more urgent)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid priority '{}'. Expected: low, medium, high",
                s
            ))),
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

// =============================================================================
// Task
// =============================================================================

/// A persisted task record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    /// When the reminder should fire; None means no reminder configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Build a new task record. The id is assigned by the store on insert.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title: title.into(),
            description: None,
            category: Category::default(),
            priority: Priority::default(),
            completed: false,
            reminder_at: None,
            due_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derive the reminder spec for this task, if a reminder is configured.
    pub fn reminder_spec(&self) -> Option<ReminderSpec> {
        let reminder_at = self.reminder_at?;
        Some(ReminderSpec {
            task_id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category,
            priority: self.priority,
            reminder_at,
            due_at: self.due_at,
        })
    }
}

/// Everything the reminder core needs to know about a task, derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSpec {
    pub task_id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Category,
    pub priority: Priority,
    pub reminder_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
}
