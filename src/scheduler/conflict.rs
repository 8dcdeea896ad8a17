//! Conflict detection
//!
//! Pairwise overlap test over the candidate list. Flags are always recomputed
//! from scratch, so running the detector twice without touching the list
//! yields identical results.

use crate::models::Candidate;

/// Whether two candidates contend for the same tuner at the same time
///
/// Candidates already resolved to different positive card ids never
/// conflict. Otherwise the half-open intervals are tested for overlap.
pub fn conflicts(a: &Candidate, b: &Candidate) -> bool {
    if let (Some(card_a), Some(card_b)) = (a.resolved_card(), b.resolved_card()) {
        if card_a != card_b {
            return false;
        }
    }

    a.overlaps(b)
}

/// Recompute `conflicting` on every candidate
///
/// Only pairs where both members are still recording are considered.
/// Returns whether any conflict was found.
pub fn mark_conflicts(list: &mut [Candidate]) -> bool {
    for candidate in list.iter_mut() {
        candidate.conflicting = false;
    }

    let mut has_conflicts = false;
    for i in 0..list.len() {
        for j in (i + 1)..list.len() {
            if !list[i].recording || !list[j].recording {
                continue;
            }
            if conflicts(&list[i], &list[j]) {
                list[i].conflicting = true;
                list[j].conflicting = true;
                has_conflicts = true;
            }
        }
    }

    has_conflicts
}

/// Positions of the recording candidates that directly conflict with `list[index]`
///
/// Empty when the candidate itself is not flagged conflicting or is no longer
/// recording. Entries for the same showing (title, start, channel) are skipped.
pub fn conflict_cluster(list: &[Candidate], index: usize) -> Vec<usize> {
    let target = &list[index];
    if !target.conflicting || !target.recording {
        return Vec::new();
    }

    list.iter()
        .enumerate()
        .filter(|(_, other)| {
            other.recording && !other.is_same_showing(target) && conflicts(target, other)
        })
        .map(|(position, _)| position)
        .collect()
}
