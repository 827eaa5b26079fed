//! Command-line interface for nudge
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::TaskStore;

mod add;
mod done;
mod edit;
mod list;
mod remove;
mod reschedule;
mod run;
mod show;

/// nudge - a personal task tracker whose reminders actually fire
///
/// Tasks carry an optional reminder timestamp; the daemon turns it into a
/// tiered alert: a soft heads-up 30 minutes ahead and an exact-time alarm.
#[derive(Parser, Debug)]
#[command(name = "nudge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file (defaults to the platform config dir)
    #[arg(long, global = true, env = "NUDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the task store (overrides config)
    #[arg(long, global = true, env = "NUDGE_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit JSONL events to a file, or "-" for stdout
    #[arg(long, global = true, env = "NUDGE_EVENTS")]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Category: personal, work, study
        #[arg(short, long)]
        category: Option<String>,

        /// Priority: low, medium, high
        #[arg(short, long)]
        priority: Option<String>,

        /// Reminder time: RFC 3339 timestamp or a relative offset like "90m"
        #[arg(short, long)]
        remind: Option<String>,

        /// Due time: RFC 3339 timestamp or a relative offset
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Filter by priority
        #[arg(short, long)]
        priority: Option<String>,

        /// Only completed tasks
        #[arg(long, conflicts_with = "pending")]
        completed: bool,

        /// Only pending tasks
        #[arg(long)]
        pending: bool,

        /// Only tasks due today
        #[arg(long)]
        today: bool,

        /// Only tasks past their due time
        #[arg(long)]
        overdue: bool,
    },

    /// Show a task
    Show {
        /// Task id
        id: i64,
    },

    /// Edit a task
    Edit {
        /// Task id
        id: i64,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New description ("none" clears it)
        #[arg(short, long)]
        description: Option<String>,

        /// New category
        #[arg(short, long)]
        category: Option<String>,

        /// New priority
        #[arg(short, long)]
        priority: Option<String>,

        /// New reminder time ("none" clears it)
        #[arg(short, long)]
        remind: Option<String>,

        /// New due time ("none" clears it)
        #[arg(long)]
        due: Option<String>,
    },

    /// Toggle a task complete/incomplete
    Done {
        /// Task id
        id: i64,
    },

    /// Remove a task
    Rm {
        /// Task id
        id: i64,
    },

    /// Run the reminder daemon
    Run,

    /// Re-derive and report reminder triggers (the restart-signal path)
    Reschedule,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = load_config(self.config.as_ref())?;
        let store = open_store(&config, self.store_dir)?;

        match self.command {
            Commands::Add {
                title,
                description,
                category,
                priority,
                remind,
                due,
            } => add::run(add::AddOptions {
                title,
                description,
                category,
                priority,
                remind,
                due,
                config,
                store,
                events: self.events,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::List {
                category,
                priority,
                completed,
                pending,
                today,
                overdue,
            } => list::run(list::ListOptions {
                category,
                priority,
                completed,
                pending,
                today,
                overdue,
                store,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Show { id } => show::run(show::ShowOptions {
                id,
                store,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Edit {
                id,
                title,
                description,
                category,
                priority,
                remind,
                due,
            } => edit::run(edit::EditOptions {
                id,
                title,
                description,
                category,
                priority,
                remind,
                due,
                store,
                events: self.events,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Done { id } => done::run(done::DoneOptions {
                id,
                store,
                events: self.events,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Rm { id } => remove::run(remove::RmOptions {
                id,
                store,
                events: self.events,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Run => run::run(run::RunOptions {
                config,
                store,
                events: self.events,
            }),
            Commands::Reschedule => reschedule::run(reschedule::RescheduleOptions {
                config,
                store,
                events: self.events,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::load_default()),
    }
}

fn open_store(config: &Config, override_dir: Option<PathBuf>) -> Result<TaskStore> {
    let dir = match override_dir.or_else(|| config.store.dir.clone()) {
        Some(dir) => dir,
        None => TaskStore::default_dir()?,
    };
    Ok(TaskStore::open(dir))
}

/// Parse a user-supplied time: RFC 3339, or a relative offset like "45m",
/// "2h", "1d" measured from `now`.
pub(crate) fn parse_time(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(at.with_timezone(&Utc));
    }

    // Split on the last character, not the last byte: the unit may be
    // arbitrary user input, multibyte included.
    let mut chars = trimmed.chars();
    let unit = chars.next_back();
    let amount: i64 = chars.as_str().parse().map_err(|_| {
        Error::InvalidArgument(format!(
            "Invalid time '{}'. Expected RFC 3339 or a relative offset like 45m, 2h, 1d",
            raw
        ))
    })?;
    if amount <= 0 {
        return Err(Error::InvalidArgument(format!(
            "Relative time must be positive: {}",
            raw
        )));
    }

    let offset = match unit {
        Some('s') => Duration::seconds(amount),
        Some('m') => Duration::minutes(amount),
        Some('h') => Duration::hours(amount),
        Some('d') => Duration::days(amount),
        Some(unit) => {
            return Err(Error::InvalidArgument(format!(
                "Unknown time unit '{}'. Expected one of: s, m, h, d",
                unit
            )))
        }
        None => {
            return Err(Error::InvalidArgument(format!(
                "Invalid time '{}'. Expected RFC 3339 or a relative offset like 45m, 2h, 1d",
                raw
            )))
        }
    };

    Ok(now + offset)
}

/// Serializable task view shared by the reporting commands
#[derive(Debug, serde::Serialize)]
pub(crate) struct TaskRow {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub priority: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
}

impl From<&crate::task::Task> for TaskRow {
    fn from(task: &crate::task::Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category.to_string(),
            priority: task.priority.to_string(),
            completed: task.completed,
            reminder_at: task.reminder_at,
            due_at: task.due_at,
        }
    }
}

/// Human-readable lines describing the triggers a task's reminder produces
pub(crate) fn describe_triggers(task: &crate::task::Task, now: DateTime<Utc>) -> Vec<String> {
    crate::schedule::compute_triggers(task.reminder_at, now)
        .into_iter()
        .map(|planned| format!("{} at {}", planned.tier, planned.fire_at.to_rfc3339()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_time_accepts_rfc3339() {
        let now = Utc::now();
        let parsed = parse_time("2030-01-02T03:04:05Z", now).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap());
    }

    #[test]
    fn parse_time_accepts_relative_offsets() {
        let now = Utc::now();
        assert_eq!(parse_time("45m", now).unwrap(), now + Duration::minutes(45));
        assert_eq!(parse_time("2h", now).unwrap(), now + Duration::hours(2));
        assert_eq!(parse_time("1d", now).unwrap(), now + Duration::days(1));
    }

    #[test]
    fn parse_time_rejects_garbage() {
        let now = Utc::now();
        assert!(parse_time("soon", now).is_err());
        assert!(parse_time("-5m", now).is_err());
        assert!(parse_time("10y", now).is_err());
    }

    #[test]
    fn parse_time_rejects_multibyte_units_without_panicking() {
        let now = Utc::now();
        assert!(matches!(
            parse_time("45分", now),
            Err(Error::InvalidArgument(_))
        ));
        assert!(parse_time("分", now).is_err());
        assert!(parse_time("", now).is_err());
    }
}
