//! Duplicate episode pruning
//!
//! Recurring rules can pick up the same episode more than once in the guide
//! window, and can pick up episodes that were already recorded. Walking from
//! the latest start to the earliest, each recurring candidate with a
//! meaningful subtitle or description is checked against recording history,
//! then against the earlier part of the list.

use crate::models::{Candidate, RecordType};
use crate::storage::ScheduleStore;

use super::error::{SchedulerError, SchedulerResult};

/// Minimum subtitle/description length for episode matching to apply
const MIN_EPISODE_TEXT: usize = 2;

/// Remove already-recorded and duplicate episodes. Returns the number removed.
pub fn prune_list(list: &mut Vec<Candidate>, store: &dyn ScheduleStore) -> SchedulerResult<usize> {
    let mut removed = vec![false; list.len()];

    for i in (0..list.len()).rev() {
        if removed[i] || !is_episode_candidate(&list[i]) {
            continue;
        }

        if in_history(&list[i], store)? {
            tracing::debug!(
                title = %list[i].title,
                subtitle = %list[i].subtitle,
                "Dropping episode found in recording history"
            );
            removed[i] = true;
            continue;
        }

        let current = &list[i];
        if current.subtitle.is_empty() || current.description.is_empty() {
            continue;
        }

        for j in (0..i).rev() {
            if removed[j] || !list[j].is_same_episode(current) {
                continue;
            }

            if list[j].conflicting && !current.conflicting {
                removed[j] = true;
            } else {
                removed[i] = true;
                break;
            }
        }
    }

    let total = removed.iter().filter(|r| **r).count();
    let mut flags = removed.into_iter();
    list.retain(|_| !flags.next().unwrap_or(false));

    if total > 0 {
        tracing::debug!(removed = total, remaining = list.len(), "Pruned duplicate episodes");
    }

    Ok(total)
}

fn is_episode_candidate(candidate: &Candidate) -> bool {
    candidate.record_type > RecordType::Single
        && (candidate.subtitle.chars().count() > MIN_EPISODE_TEXT
            || candidate.description.chars().count() > MIN_EPISODE_TEXT)
}

/// History lookup needs both subtitle and description
fn in_history(candidate: &Candidate, store: &dyn ScheduleStore) -> SchedulerResult<bool> {
    if candidate.subtitle.is_empty() || candidate.description.is_empty() {
        return Ok(false);
    }

    store
        .in_recording_history(&candidate.title, &candidate.subtitle, &candidate.description)
        .map_err(|e| SchedulerError::store("check recording history", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelInfo, GuideEntry};
    use crate::storage::MemoryScheduleStore;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn episode(day: u32, record_type: RecordType, subtitle: &str, description: &str) -> Candidate {
        let entry = GuideEntry::new(
            ChannelInfo::new(5, 1),
            at(day, 20),
            at(day, 20) + Duration::hours(1),
            "Drama",
        )
        .with_episode(subtitle, description);
        Candidate::from_guide(entry, record_type)
    }

    #[test]
    fn test_later_repeat_is_dropped() {
        let store = MemoryScheduleStore::new();
        let mut list = vec![
            episode(1, RecordType::All, "Pilot", "First episode"),
            episode(2, RecordType::All, "Pilot", "First episode"),
            episode(3, RecordType::All, "Second", "Next episode"),
        ];

        assert_eq!(prune_list(&mut list, &store).unwrap(), 1);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].start, at(1, 20));
        assert_eq!(list[1].subtitle, "Second");
    }

    #[test]
    fn test_conflicting_earlier_copy_gives_way() {
        let store = MemoryScheduleStore::new();
        let mut list = vec![
            episode(1, RecordType::All, "Pilot", "First episode"),
            episode(2, RecordType::All, "Pilot", "First episode"),
        ];
        list[0].conflicting = true;

        prune_list(&mut list, &store).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].start, at(2, 20));
    }

    #[test]
    fn test_recorded_episode_is_dropped() {
        let store = MemoryScheduleStore::new();
        store.add_history("Drama", "Pilot", "First episode");
        let mut list = vec![
            episode(1, RecordType::Channel, "Pilot", "First episode"),
            episode(2, RecordType::Channel, "Second", "Next episode"),
        ];

        prune_list(&mut list, &store).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].subtitle, "Second");
    }

    #[test]
    fn test_single_rules_and_short_text_are_kept() {
        let store = MemoryScheduleStore::new();
        store.add_history("Drama", "Pilot", "First episode");
        let mut list = vec![
            episode(1, RecordType::Single, "Pilot", "First episode"),
            episode(2, RecordType::All, "ab", "cd"),
            episode(3, RecordType::All, "ab", "cd"),
        ];

        assert_eq!(prune_list(&mut list, &store).unwrap(), 0);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_missing_description_skips_matching() {
        let store = MemoryScheduleStore::new();
        store.add_history("Drama", "Pilot", "");
        let mut list = vec![
            episode(1, RecordType::All, "Pilot", ""),
            episode(2, RecordType::All, "Pilot", ""),
        ];

        assert_eq!(prune_list(&mut list, &store).unwrap(), 0);
    }
}
