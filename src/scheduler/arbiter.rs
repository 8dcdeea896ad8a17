//! Conflict arbitration
//!
//! Decides which members of a conflict cluster keep recording. Stages run in
//! a fixed order over the whole list:
//!
//! 1. explicit overrides (the matching showing wins outright)
//! 2. user preferences, first by exact showing and then by title
//! 3. in auto-resolve mode only, the [`get_best`] heuristic
//!
//! `recording` only ever goes from true to false here, which is what lets the
//! pass converge without revisiting earlier decisions.

use crate::metrics::{self, DemotionStage};
use crate::models::Candidate;
use crate::storage::ScheduleStore;

use super::conflict::conflict_cluster;
use super::error::{SchedulerError, SchedulerResult};

/// Apply overrides and dislike preferences to every conflicting candidate
///
/// Returns the number of candidates demoted.
pub fn mark_conflicts_to_remove(
    list: &mut [Candidate],
    store: &dyn ScheduleStore,
) -> SchedulerResult<usize> {
    let mut overridden = 0;
    for i in 0..list.len() {
        if list[i].conflicting && list[i].recording {
            overridden += check_override(list, i, store)?;
        }
    }
    metrics::record_demotions(DemotionStage::Override, overridden);

    let mut disliked = 0;
    for i in 0..list.len() {
        if list[i].conflicting && list[i].recording {
            disliked += mark_single_conflict(list, i, store)?;
        } else if !list[i].recording {
            list[i].conflicting = false;
        }
    }
    metrics::record_demotions(DemotionStage::Dislike, disliked);

    Ok(overridden + disliked)
}

fn check_override(
    list: &mut [Candidate],
    index: usize,
    store: &dyn ScheduleStore,
) -> SchedulerResult<usize> {
    let cluster = conflict_cluster(list, index);
    let has_override = store
        .has_override(&list[index].showing_key())
        .map_err(|e| SchedulerError::store("check conflict override", e))?;
    if !has_override {
        return Ok(0);
    }

    let demoted = demote(list, &cluster);
    list[index].conflicting = false;

    tracing::debug!(
        title = %list[index].title,
        start = %list[index].start,
        demoted,
        "Override resolved conflict"
    );

    Ok(demoted)
}

fn mark_single_conflict(
    list: &mut [Candidate],
    index: usize,
    store: &dyn ScheduleStore,
) -> SchedulerResult<usize> {
    let cluster = conflict_cluster(list, index);
    let mut demoted = 0;

    let disliked_showings = store
        .disliked_showings(&list[index].showing_key())
        .map_err(|e| SchedulerError::store("read showing preferences", e))?;
    for showing in &disliked_showings {
        let matching: Vec<usize> = cluster
            .iter()
            .copied()
            .filter(|&j| list[j].showing_key() == *showing)
            .collect();
        demoted += demote(list, &matching);
    }

    if !any_recording(list, &cluster) {
        list[index].conflicting = false;
        return Ok(demoted);
    }

    let disliked_titles = store
        .disliked_titles(&list[index].title)
        .map_err(|e| SchedulerError::store("read title preferences", e))?;
    for title in &disliked_titles {
        let matching: Vec<usize> = cluster
            .iter()
            .copied()
            .filter(|&j| list[j].title == *title)
            .collect();
        demoted += demote(list, &matching);
    }

    if !any_recording(list, &cluster) {
        list[index].conflicting = false;
    }

    if demoted > 0 {
        tracing::debug!(
            title = %list[index].title,
            start = %list[index].start,
            demoted,
            "Preferences resolved conflict"
        );
    }

    Ok(demoted)
}

/// Drop every candidate that is no longer recording
pub fn remove_non_recording(list: &mut Vec<Candidate>) -> usize {
    let before = list.len();
    list.retain(|c| c.recording);
    before - list.len()
}

/// Pick the winner between `list[index]` and its cluster
///
/// Members are scanned in list order and the first one that beats the
/// original candidate wins: a lower rule ordinal, or with an equal ordinal an
/// earlier start, a longer duration, or a lower channel id. Every comparison
/// is made against the original candidate, not the best seen so far.
pub fn get_best(list: &[Candidate], index: usize, cluster: &[usize]) -> usize {
    let info = &list[index];

    for &j in cluster {
        let test = &list[j];
        if test.record_type < info.record_type {
            return j;
        }
        if test.record_type == info.record_type
            && (test.start < info.start
                || test.duration() > info.duration()
                || test.chan_id < info.chan_id)
        {
            return j;
        }
    }

    index
}

fn guess_single(list: &mut [Candidate], index: usize) -> usize {
    let cluster = conflict_cluster(list, index);
    if cluster.is_empty() {
        list[index].conflicting = false;
        return 0;
    }

    let best = get_best(list, index, &cluster);
    if best == index {
        let demoted = demote(list, &cluster);
        list[index].conflicting = false;
        demoted
    } else {
        tracing::debug!(
            loser = %list[index].title,
            winner = %list[best].title,
            start = %list[index].start,
            "Conflict resolved by priority"
        );
        list[index].recording = false;
        1
    }
}

/// Resolve remaining conflicts with the [`get_best`] heuristic
///
/// Returns the number of candidates demoted.
pub fn guess_conflicts(list: &mut [Candidate]) -> usize {
    let mut demoted = 0;
    for i in 0..list.len() {
        if list[i].recording && list[i].conflicting {
            demoted += guess_single(list, i);
        }
    }

    metrics::record_demotions(DemotionStage::Guess, demoted);
    demoted
}

/// Mark the given candidates not recording; returns how many changed
fn demote(list: &mut [Candidate], positions: &[usize]) -> usize {
    let mut changed = 0;
    for &j in positions {
        if list[j].recording {
            list[j].recording = false;
            changed += 1;
        }
    }
    changed
}

fn any_recording(list: &[Candidate], positions: &[usize]) -> bool {
    positions.iter().any(|&j| list[j].recording)
}
