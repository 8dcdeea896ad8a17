pub mod db;
pub mod schedule;
pub mod watch;

// Re-export command functions for convenience
pub use db::{import, init_db, mark_changed};
pub use schedule::{next, schedule, ScheduleParams};
pub use watch::watch;

use std::sync::Arc;

use anyhow::{Context, Result};

use recsched::config::Config;
use recsched::error::Error;
use recsched::scheduler::{Scheduler, SchedulerError};
use recsched::storage::SqliteScheduleStore;

/// Open the configured SQLite store, creating the schema when needed
pub(crate) fn open_store(config: &Config) -> Result<Arc<SqliteScheduleStore>> {
    let path = &config.database.sqlite_path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::with_source(
                format!("Failed to create database directory: {}", parent.display()),
                e,
            )
        })?;
    }

    let store = SqliteScheduleStore::new(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))
        .map_err(Error::from)?;
    Ok(Arc::new(store))
}

/// Log a scheduler failure with its category before handing it to `main`
pub(crate) fn classify(err: SchedulerError) -> Error {
    let err = Error::from(err);
    tracing::error!(
        category = err.category().as_str(),
        recoverable = err.is_recoverable(),
        error = %err,
        "Scheduler failed"
    );
    err
}

/// Open the store and load the capture topology
pub(crate) fn open_scheduler(config: &Config) -> Result<Scheduler> {
    let store = open_store(config)?;
    Ok(Scheduler::new(store, &config.scheduler).map_err(classify)?)
}
