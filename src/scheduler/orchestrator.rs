//! The scheduler
//!
//! Owns the capture topology and the candidate list of the last completed
//! pass. Every pass rebuilds the list from scratch; nothing carries over.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use crate::config::SchedulerConfig;
use crate::metrics;
use crate::models::Candidate;
use crate::storage::ScheduleStore;

use super::arbiter::{guess_conflicts, mark_conflicts_to_remove, remove_non_recording};
use super::conflict::mark_conflicts;
use super::error::{SchedulerError, SchedulerResult};
use super::inputs::mark_known_inputs;
use super::loader::load_candidates;
use super::prune::prune_list;
use super::rebalance::rebalance;
use super::schedule::ScheduleSnapshot;
use super::topology::CaptureTopology;

/// Recording scheduler instance
pub struct Scheduler {
    store: Arc<dyn ScheduleStore>,
    topology: CaptureTopology,
    auto_resolve: bool,
    candidates: Vec<Candidate>,
    has_conflicts: bool,
    last_pass: Option<NaiveDateTime>,
}

impl Scheduler {
    /// Create a scheduler, loading the capture topology from the store
    ///
    /// Fails when the inventory has no cards or no sources, or (under
    /// `strict_topology`) when a source has no input.
    pub fn new(store: Arc<dyn ScheduleStore>, config: &SchedulerConfig) -> SchedulerResult<Self> {
        let inventory = store
            .capture_inventory()
            .map_err(|e| SchedulerError::store("load capture inventory", e))?;
        let topology = CaptureTopology::from_inventory(&inventory, config.strict_topology)?;

        Ok(Self {
            store,
            topology,
            auto_resolve: config.auto_resolve,
            candidates: Vec::new(),
            has_conflicts: false,
            last_pass: None,
        })
    }

    /// Whether passes started by the watcher run the heuristic phase
    pub fn auto_resolve(&self) -> bool {
        self.auto_resolve
    }

    /// Run a full pass against the local clock
    pub fn fill_record_lists(&mut self, auto_resolve: bool) -> SchedulerResult<bool> {
        self.fill_record_lists_at(Local::now().naive_local(), auto_resolve)
    }

    /// Run a full pass as if the current time were `now`
    ///
    /// Returns whether unresolved conflicts remain. On error the previous
    /// list has already been discarded and the scheduler holds an empty list.
    pub fn fill_record_lists_at(
        &mut self,
        now: NaiveDateTime,
        auto_resolve: bool,
    ) -> SchedulerResult<bool> {
        let _timer = metrics::start_pass_timer();

        self.candidates.clear();
        self.has_conflicts = false;

        let mut list = load_candidates(self.store.as_ref(), now)?;

        if !list.is_empty() {
            list.sort_by_key(|c| c.start);

            let known = mark_known_inputs(&mut list, &self.topology);
            tracing::debug!(assigned = known, "Known inputs marked");
            mark_conflicts(&mut list);

            prune_list(&mut list, self.store.as_ref())?;
            mark_conflicts(&mut list);

            if self.topology.is_multi_card() {
                list = rebalance(&list, &self.topology);
                mark_conflicts(&mut list);
            }

            mark_conflicts_to_remove(&mut list, self.store.as_ref())?;
            if auto_resolve {
                remove_non_recording(&mut list);
                guess_conflicts(&mut list);
                remove_non_recording(&mut list);
            }
            self.has_conflicts = mark_conflicts(&mut list);
        }

        self.candidates = list;
        self.last_pass = Some(now);

        let recording = self.candidates.iter().filter(|c| c.recording).count();
        let unresolved = self.candidates.iter().filter(|c| c.conflicting).count();
        metrics::record_pass(self.candidates.len(), recording, unresolved);

        tracing::info!(
            candidates = self.candidates.len(),
            recording,
            unresolved,
            auto_resolve,
            "Scheduling pass complete"
        );

        Ok(self.has_conflicts)
    }

    /// Ordered candidate list from the last pass
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Whether the last pass left unresolved conflicts
    pub fn has_conflicts(&self) -> bool {
        self.has_conflicts
    }

    /// Time the last pass was computed for
    pub fn last_pass(&self) -> Option<NaiveDateTime> {
        self.last_pass
    }

    /// Earliest candidate still set to record
    pub fn next_recording(&self) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.recording)
    }

    /// Remove and return the earliest candidate still set to record
    pub fn take_next_recording(&mut self) -> Option<Candidate> {
        let position = self.candidates.iter().position(|c| c.recording)?;
        Some(self.candidates.remove(position))
    }

    /// Check and clear the store's change flag
    pub fn check_for_changes(&self) -> SchedulerResult<bool> {
        self.store
            .take_change_flag()
            .map_err(|e| SchedulerError::store("check change flag", e))
    }

    /// Serializable view of the last pass
    pub fn snapshot(&self) -> ScheduleSnapshot {
        ScheduleSnapshot::new(
            self.last_pass,
            self.has_conflicts,
            self.topology.card_count(),
            self.candidates.clone(),
        )
    }
}
