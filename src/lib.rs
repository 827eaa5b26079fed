//! nudge - Personal Task Tracker Library
//!
//! This library provides the core functionality for the nudge CLI tool:
//! a task tracker whose reminders are delivered as tiered, wake-capable
//! alerts.
//!
//! # Core Concepts
//!
//! - **Tiers**: every reminder expands into an early warning 30 minutes
//!   ahead and an exact-time alarm
//! - **Triggers**: wake-timer registrations keyed by `(task, tier)`;
//!   scheduling replaces, never accumulates
//! - **Delivery sessions**: an alarm rings for at most 30 seconds with a
//!   persistent notification surface, then auto-dismisses
//! - **Boot recovery**: registrations are re-derived from the task store on
//!   every restart; nothing about scheduling is persisted separately
//!
//! # Module Organization
//!
//! - `cli`: command-line interface using clap
//! - `config`: configuration loading from `nudge.toml`
//! - `error`: error types and result aliases
//! - `schedule`: pure trigger/tier calculation
//! - `registry`: trigger registration against the timer host
//! - `delivery`: the alarm delivery state machine
//! - `recovery`: boot recovery from the task store
//! - `platform`: injected host-facility traits
//! - `host`: desktop implementations of the platform traits
//! - `daemon`: the event loop routing host events into the core
//! - `store`: task persistence with locking and atomic writes
//! - `task`: task domain types
//! - `events`: JSONL event output for integrations
//! - `lock`: file locking and atomic write helpers

pub mod cli;
pub mod config;
pub mod daemon;
pub mod delivery;
pub mod error;
pub mod events;
pub mod host;
pub mod lock;
pub mod output;
pub mod platform;
pub mod recovery;
pub mod registry;
pub mod schedule;
pub mod store;
pub mod task;

pub use error::{Error, Result};
