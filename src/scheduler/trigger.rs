//! Change-flag watcher
//!
//! Polls the store's "schedule changed" flag on an interval and reruns the
//! scheduling pass when it is set. The scheduler sits behind a mutex so a
//! new pass never starts while another is in flight. Whether a pass runs the
//! heuristic phase is the scheduler's own `auto_resolve` setting.
//!
//! Store access is synchronous and runs under `block_in_place`, so the
//! watcher needs the multi-threaded tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch, Mutex};

use super::error::{SchedulerError, SchedulerResult};
use super::orchestrator::Scheduler;
use super::schedule::ScheduleSnapshot;

// ============================================================================
// Watcher Configuration
// ============================================================================

/// Configuration for the schedule watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Time between change-flag checks
    pub poll_interval: Duration,

    /// Run a pass immediately when the watcher starts
    pub run_on_startup: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            run_on_startup: true,
        }
    }
}

impl WatcherConfig {
    /// Validate the configuration
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.poll_interval.is_zero() {
            return Err(SchedulerError::invalid_config(
                "poll_interval",
                "Poll interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Watcher Events
// ============================================================================

/// Why a pass was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassReason {
    Startup,
    Changed,
    Manual,
}

/// Events emitted by the watcher
#[derive(Debug, Clone)]
pub enum ScheduleEvent {
    /// A pass finished and produced a new decision list
    Rescheduled {
        reason: PassReason,
        snapshot: ScheduleSnapshot,
    },

    /// A pass failed; the next poll will try again
    PassFailed { reason: PassReason, error: String },
}

// ============================================================================
// Schedule Watcher
// ============================================================================

/// Reruns the scheduler whenever the change flag is raised
pub struct ScheduleWatcher {
    config: WatcherConfig,
    scheduler: Arc<Mutex<Scheduler>>,
    event_sender: broadcast::Sender<ScheduleEvent>,
    shutdown: watch::Sender<bool>,
}

impl ScheduleWatcher {
    /// Create a new watcher owning the scheduler
    pub fn new(scheduler: Scheduler, config: WatcherConfig) -> SchedulerResult<Self> {
        config.validate()?;

        let (event_sender, _) = broadcast::channel(64);
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            config,
            scheduler: Arc::new(Mutex::new(scheduler)),
            event_sender,
            shutdown,
        })
    }

    /// Subscribe to watcher events
    pub fn subscribe(&self) -> broadcast::Receiver<ScheduleEvent> {
        self.event_sender.subscribe()
    }

    /// Shared handle to the scheduler, for reading the decision list
    pub fn scheduler(&self) -> Arc<Mutex<Scheduler>> {
        Arc::clone(&self.scheduler)
    }

    /// Check the change flag once, running a pass when it was set
    ///
    /// Returns the new snapshot, or `None` when nothing changed.
    pub async fn poll_once(&self) -> SchedulerResult<Option<ScheduleSnapshot>> {
        let mut scheduler = self.scheduler.lock().await;
        tokio::task::block_in_place(|| {
            if !scheduler.check_for_changes()? {
                return Ok(None);
            }

            tracing::info!("Schedule change detected, rescheduling");
            self.pass_locked(&mut scheduler, PassReason::Changed)
                .map(Some)
        })
    }

    /// Run a pass now, regardless of the change flag
    pub async fn run_pass(&self, reason: PassReason) -> SchedulerResult<ScheduleSnapshot> {
        let mut scheduler = self.scheduler.lock().await;
        tokio::task::block_in_place(|| self.pass_locked(&mut scheduler, reason))
    }

    fn pass_locked(
        &self,
        scheduler: &mut Scheduler,
        reason: PassReason,
    ) -> SchedulerResult<ScheduleSnapshot> {
        let auto_resolve = scheduler.auto_resolve();
        match scheduler.fill_record_lists(auto_resolve) {
            Ok(_) => {
                let snapshot = scheduler.snapshot();
                let _ = self.event_sender.send(ScheduleEvent::Rescheduled {
                    reason,
                    snapshot: snapshot.clone(),
                });
                Ok(snapshot)
            }
            Err(e) => {
                let _ = self.event_sender.send(ScheduleEvent::PassFailed {
                    reason,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Poll until [`stop`](Self::stop) is called
    ///
    /// Store errors are logged and retried on the next tick; anything else
    /// ends the loop.
    pub async fn run(&self) -> SchedulerResult<()> {
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            return Ok(());
        }

        if self.config.run_on_startup {
            self.tolerate(self.run_pass(PassReason::Startup).await.map(Some))?;
        }

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        tracing::info!(
            poll_secs = self.config.poll_interval.as_secs_f64(),
            "Schedule watcher started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tolerate(self.poll_once().await)?;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Schedule watcher stopped");
        Ok(())
    }

    fn tolerate(&self, result: SchedulerResult<Option<ScheduleSnapshot>>) -> SchedulerResult<()> {
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(error = %e, "Scheduling pass failed, retrying on next poll");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Stop the polling loop
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Check if a stop was requested
    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }
}

// ============================================================================
// Tests
// ============================================================================
