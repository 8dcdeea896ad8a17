//! recsched - Recording scheduler for capture cards
//!
//! Assigns recordings generated from user rules onto a finite pool of tuner
//! inputs without double-booking a card, honoring rule priority, overrides
//! and user preferences.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Candidates, rules and guide entries
//! - [`scheduler`] - The scheduling pass and the change-flag watcher
//! - [`storage`] - Store trait with SQLite and in-memory backends
//! - [`metrics`] - Prometheus pass metrics
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use recsched::config::Config;
//! use recsched::scheduler::Scheduler;
//! use recsched::storage::SqliteScheduleStore;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(SqliteScheduleStore::new(&config.database.sqlite_path)?);
//!     let mut scheduler = Scheduler::new(store, &config.scheduler)?;
//!     scheduler.fill_record_lists(config.scheduler.auto_resolve)?;
//!     print!("{}", scheduler.snapshot().display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod scheduler;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{Candidate, GuideEntry, RecordRule, RecordType, ShowingKey};
    pub use crate::scheduler::{ScheduleSnapshot, ScheduleWatcher, Scheduler};
    pub use crate::storage::{MemoryScheduleStore, ScheduleStore, SqliteScheduleStore};
}

// Direct re-exports for convenience
pub use models::{Candidate, RecordRule, RecordType};
pub use scheduler::Scheduler;
