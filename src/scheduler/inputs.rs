//! Known-input assignment
//!
//! Candidates on a source with exactly one bound input can only ever record
//! on that input, so they are resolved up front. Everything else waits for
//! the multi-card pass.

use crate::models::Candidate;

use super::topology::CaptureTopology;

/// Assign the sole input (and its card) to every unassigned candidate whose
/// source has exactly one input. Returns how many candidates were assigned.
pub fn mark_known_inputs(list: &mut [Candidate], topology: &CaptureTopology) -> usize {
    let mut assigned = 0;

    for candidate in list.iter_mut().filter(|c| c.input_id.is_none()) {
        if let Some(input_id) = topology.sole_input(candidate.source_id) {
            candidate.assign(input_id, topology.card_for(input_id));
            assigned += 1;
        }
    }

    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelInfo, GuideEntry, RecordType};
    use crate::storage::{CaptureInventory, CardInput, SourceRecord};
    use chrono::NaiveDate;

    fn topology() -> CaptureTopology {
        let inventory = CaptureInventory {
            cards: vec![1, 2],
            sources: vec![
                SourceRecord {
                    source_id: 1,
                    name: "Single".to_string(),
                },
                SourceRecord {
                    source_id: 2,
                    name: "Multi".to_string(),
                },
                SourceRecord {
                    source_id: 3,
                    name: "Unbound".to_string(),
                },
            ],
            inputs: vec![
                CardInput {
                    input_id: 1,
                    card_id: 1,
                    source_id: 1,
                },
                CardInput {
                    input_id: 2,
                    card_id: 1,
                    source_id: 2,
                },
                CardInput {
                    input_id: 3,
                    card_id: 2,
                    source_id: 2,
                },
            ],
        };
        CaptureTopology::from_inventory(&inventory, false).unwrap()
    }

    fn on_source(source_id: i64) -> Candidate {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        let entry = GuideEntry::new(
            ChannelInfo::new(source_id * 10, source_id),
            start,
            start + chrono::Duration::hours(1),
            "Show",
        );
        Candidate::from_guide(entry, RecordType::Single)
    }

    #[test]
    fn test_only_single_input_sources_are_assigned() {
        let mut list = vec![on_source(1), on_source(2), on_source(3)];

        assert_eq!(mark_known_inputs(&mut list, &topology()), 1);
        assert_eq!(list[0].input_id, Some(1));
        assert_eq!(list[0].card_id, Some(1));
        assert_eq!(list[1].input_id, None);
        assert_eq!(list[2].input_id, None);
    }

    #[test]
    fn test_assigned_candidates_are_left_alone() {
        let mut list = vec![on_source(1)];
        list[0].assign(7, Some(9));

        assert_eq!(mark_known_inputs(&mut list, &topology()), 0);
        assert_eq!(list[0].input_id, Some(7));
    }
}
