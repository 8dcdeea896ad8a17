//! Multi-card rebalancing
//!
//! Greedy, single pass, no backtracking. Works on a scratch copy of the list
//! in which every candidate without a card gets its source's first input as a
//! provisional default. For each conflicting candidate the partner is moved
//! first, then the candidate itself, to any input that clears the pair.
//! Whatever conflicts survive are left for arbitration.

use crate::metrics;
use crate::models::Candidate;

use super::conflict::{conflict_cluster, conflicts, mark_conflicts};
use super::topology::CaptureTopology;

/// Build the rebalanced list that replaces `live`
pub fn rebalance(live: &[Candidate], topology: &CaptureTopology) -> Vec<Candidate> {
    let mut scratch: Vec<Candidate> = live
        .iter()
        .cloned()
        .map(|mut candidate| {
            candidate.conflict_fixed = false;
            if candidate.resolved_card().is_none() {
                if let Some(input_id) = topology.first_input(candidate.source_id) {
                    candidate.assign(input_id, topology.card_for(input_id));
                }
            }
            candidate
        })
        .collect();

    mark_conflicts(&mut scratch);

    let pending: Vec<(usize, bool)> = scratch
        .iter()
        .enumerate()
        .filter(|(_, c)| c.recording && c.conflicting)
        .map(|(i, c)| (i, topology.is_movable(c.source_id)))
        .collect();

    let mut moved = 0;
    for (first, first_movable) in pending {
        if scratch[first].conflict_fixed {
            continue;
        }

        for second in conflict_cluster(&scratch, first) {
            let second_movable =
                topology.is_movable(scratch[second].source_id) && !scratch[second].conflict_fixed;

            let mut fixed = false;
            if second_movable {
                fixed = try_inputs(&mut scratch, second, first, topology, &mut moved);
            }
            if !fixed && first_movable {
                try_inputs(&mut scratch, first, second, topology, &mut moved);
            }
        }

        if conflict_cluster(&scratch, first).is_empty() {
            scratch[first].conflict_fixed = true;
        }
    }

    metrics::record_rebalanced(moved);
    tracing::debug!(
        moved,
        fixed = scratch.iter().filter(|c| c.conflict_fixed).count(),
        "Multi-card rebalance finished"
    );

    scratch
}

/// Walk `mover` through its source's inputs until it no longer conflicts
/// with `other`; restores the original assignment when none works
fn try_inputs(
    scratch: &mut [Candidate],
    mover: usize,
    other: usize,
    topology: &CaptureTopology,
    moved: &mut usize,
) -> bool {
    let original = (scratch[mover].input_id, scratch[mover].card_id);

    for &input_id in topology.inputs_for(scratch[mover].source_id) {
        scratch[mover].assign(input_id, topology.card_for(input_id));
        if !conflicts(&scratch[mover], &scratch[other]) {
            if original.0 != Some(input_id) {
                *moved += 1;
                tracing::debug!(
                    title = %scratch[mover].title,
                    start = %scratch[mover].start,
                    input_id,
                    "Moved candidate to another input"
                );
            }
            return true;
        }
    }

    scratch[mover].input_id = original.0;
    scratch[mover].card_id = original.1;
    false
}
