//! nudge run command implementation
//!
//! Starts the reminder daemon. The daemon owns the in-process timer table,
//! so reminders only fire while it is running; recovery at startup rebuilds
//! every still-future trigger from the store.

use crate::config::Config;
use crate::daemon;
use crate::error::{Error, Result};
use crate::events::EventDestination;
use crate::store::TaskStore;

/// Options for the run command
pub struct RunOptions {
    pub config: Config,
    pub store: TaskStore,
    pub events: Option<String>,
}

pub fn run(options: RunOptions) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| Error::OperationFailed(format!("failed to start runtime: {err}")))?;

    let destination = EventDestination::parse(options.events.as_deref());
    runtime.block_on(daemon::run(&options.config, options.store, destination))
}
