//! Recording scheduler
//!
//! Turns recording rules into a conflict-free decision list: which candidate
//! records, and on which card input.
//!
//! # Overview
//!
//! Each pass is a fixed sequence over a freshly loaded candidate list:
//!
//! 1. Load candidates from the rules and sort them by start time
//! 2. Assign inputs where the source has only one
//! 3. Detect conflicts, prune duplicate episodes, detect again
//! 4. On multi-card setups, rebalance inputs and detect again
//! 5. Apply overrides and preferences
//! 6. In auto-resolve mode, drop demoted candidates, pick winners by
//!    priority and drop the losers
//! 7. Final conflict detection
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────┐   ┌─────────┐   ┌───────────┐
//! │   loader    │──▶│  inputs  │──▶│  prune  │──▶│ rebalance │
//! └─────────────┘   └──────────┘   └─────────┘   └─────┬─────┘
//!        ▲                                             │
//!        │              ┌──────────┐                   ▼
//!  ┌─────┴──────┐       │ conflict │◀──────────  ┌───────────┐
//!  │  storage   │       │ detector │             │  arbiter  │
//!  └────────────┘       └──────────┘             └───────────┘
//! ```
//!
//! # Modules
//!
//! - [`topology`] - Source, input and card mapping
//! - [`loader`] - Rule expansion into candidates
//! - [`prune`] - Duplicate and already-recorded episode removal
//! - [`conflict`] - Pairwise conflict detection and clusters
//! - [`inputs`] - Known-input assignment
//! - [`arbiter`] - Overrides, preferences and the best-pick heuristic
//! - [`rebalance`] - Multi-card input reassignment
//! - [`orchestrator`] - The [`Scheduler`] and its pass sequence
//! - [`schedule`] - Serializable snapshots of a pass
//! - [`trigger`] - Change-flag polling service
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use recsched::config::SchedulerConfig;
//! use recsched::scheduler::Scheduler;
//! use recsched::storage::SqliteScheduleStore;
//!
//! let store = Arc::new(SqliteScheduleStore::new("data/recsched.db")?);
//! let mut scheduler = Scheduler::new(store, &SchedulerConfig::default())?;
//!
//! let unresolved = scheduler.fill_record_lists(true)?;
//! if let Some(next) = scheduler.next_recording() {
//!     println!("Next: {}", next.display());
//! }
//! ```

pub mod arbiter;
pub mod conflict;
pub mod error;
pub mod inputs;
pub mod loader;
pub mod orchestrator;
pub mod prune;
pub mod rebalance;
pub mod schedule;
pub mod topology;
pub mod trigger;

// Re-export main types
pub use arbiter::get_best;
pub use conflict::{conflict_cluster, conflicts, mark_conflicts};
pub use error::{SchedulerError, SchedulerResult};
pub use orchestrator::Scheduler;
pub use schedule::{ScheduleSnapshot, ScheduleSummary};
pub use topology::CaptureTopology;
pub use trigger::{PassReason, ScheduleEvent, ScheduleWatcher, WatcherConfig};
