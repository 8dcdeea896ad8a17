//! Schedule snapshots
//!
//! A snapshot is the decision list of one completed pass, detached from the
//! scheduler so it can be printed, serialized or broadcast.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Candidate, CardId};

use super::error::SchedulerResult;

// ============================================================================
// Snapshot
// ============================================================================

/// Decision list of a completed pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    /// Time the pass was computed for
    pub computed_for: Option<NaiveDateTime>,

    /// Whether unresolved conflicts remained
    pub has_conflicts: bool,

    /// Number of capture cards in the topology
    pub card_count: usize,

    /// Candidates in start order
    pub candidates: Vec<Candidate>,

    /// When this snapshot was taken
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

impl ScheduleSnapshot {
    pub fn new(
        computed_for: Option<NaiveDateTime>,
        has_conflicts: bool,
        card_count: usize,
        candidates: Vec<Candidate>,
    ) -> Self {
        Self {
            computed_for,
            has_conflicts,
            card_count,
            candidates,
            generated_at: Utc::now(),
        }
    }

    /// Candidates that will be recorded
    pub fn recording(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| c.recording)
    }

    /// Candidates still flagged conflicting
    pub fn conflicting(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| c.conflicting)
    }

    /// Get summary statistics
    pub fn summary(&self) -> ScheduleSummary {
        let mut per_card = BTreeMap::new();
        for candidate in self.recording() {
            if let Some(card_id) = candidate.card_id {
                *per_card.entry(card_id).or_insert(0) += 1;
            }
        }

        ScheduleSummary {
            total: self.candidates.len(),
            recording: self.recording().count(),
            conflicting: self.conflicting().count(),
            unassigned: self.candidates.iter().filter(|c| c.input_id.is_none()).count(),
            per_card,
        }
    }

    /// One line per candidate, in list order
    pub fn lines(&self) -> Vec<String> {
        self.candidates.iter().map(Candidate::display).collect()
    }

    /// Format as display string
    pub fn display(&self) -> String {
        let mut output = String::new();
        for line in self.lines() {
            output.push_str(&line);
            output.push('\n');
        }
        output
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> SchedulerResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> SchedulerResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }
}

/// Snapshot summary statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub total: usize,
    pub recording: usize,
    pub conflicting: usize,
    pub unassigned: usize,
    /// Recording candidates per card
    pub per_card: BTreeMap<CardId, usize>,
}

impl ScheduleSummary {
    pub fn display(&self) -> String {
        let mut output = String::from("Schedule Summary\n");
        output.push_str(&format!("{:-<40}\n", ""));
        output.push_str(&format!("Candidates: {}\n", self.total));
        output.push_str(&format!("Recording: {}\n", self.recording));
        output.push_str(&format!("Conflicting: {}\n", self.conflicting));
        output.push_str(&format!("Unassigned: {}\n", self.unassigned));
        for (card_id, count) in &self.per_card {
            output.push_str(&format!("Card {card_id}: {count}\n"));
        }
        output
    }
}

// ============================================================================
// Tests
// ============================================================================
