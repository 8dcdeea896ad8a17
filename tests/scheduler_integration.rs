//! Integration tests for complete scheduling passes
//!
//! These tests drive [`Scheduler`] end to end against the in-memory store:
//! - Single-card and multi-card conflict resolution
//! - Overrides and preferences
//! - Rule expansion and duplicate pruning
//! - The change-flag watcher

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveTime};
use common::*;
use proptest::prelude::*;
use recsched::config::SchedulerConfig;
use recsched::models::{GuideEntry, RecordRule, RecordType, ShowingKey};
use recsched::scheduler::{
    conflicts, PassReason, ScheduleEvent, ScheduleSnapshot, ScheduleWatcher, SchedulerError,
    WatcherConfig,
};
use recsched::storage::{CaptureInventory, ScheduleStore};
use recsched::Scheduler;

// ============================================================================
// Conflict Resolution
// ============================================================================

#[test]
fn test_single_card_earlier_start_wins() {
    let store = store_with(single_card());
    store.add_rule(single(5, "News", at(20, 0), at(21, 0)));
    store.add_rule(single(6, "Movie", at(20, 30), at(22, 0)));

    let mut scheduler = scheduler(store);
    let has_conflicts = scheduler.fill_record_lists_at(noon(), true).unwrap();

    assert!(!has_conflicts);
    assert_eq!(recording_titles(&scheduler), vec!["News"]);
    assert_eq!(scheduler.candidates().len(), 1);
    assert_eq!(scheduler.candidates()[0].input_id, Some(1));
}

#[test]
fn test_two_cards_record_both() {
    let store = store_with(two_cards_one_source());
    store.add_rule(single(5, "News", at(20, 0), at(21, 0)));
    store.add_rule(single(6, "Movie", at(20, 30), at(22, 0)));

    let mut scheduler = scheduler(store);
    let has_conflicts = scheduler.fill_record_lists_at(noon(), true).unwrap();

    assert!(!has_conflicts);
    assert_eq!(recording_titles(&scheduler), vec!["News", "Movie"]);

    let cards: HashSet<_> = scheduler
        .candidates()
        .iter()
        .map(|c| c.resolved_card())
        .collect();
    assert_eq!(cards.len(), 2, "both recordings must land on distinct cards");
    assert!(!cards.contains(&None));
}

#[test]
fn test_override_beats_priority() {
    let store = store_with(single_card());
    store.add_rule(single(5, "News", at(20, 0), at(21, 0)));
    store.add_rule(single(6, "Movie", at(20, 30), at(22, 0)));
    store.add_override(ShowingKey::new(6, at(20, 30), at(22, 0)));

    let mut scheduler = scheduler(store);
    assert!(!scheduler.fill_record_lists_at(noon(), true).unwrap());

    assert_eq!(recording_titles(&scheduler), vec!["Movie"]);
}

#[test]
fn test_equal_priority_lower_channel_wins() {
    let store = store_with(single_card());
    // Higher channel loaded first, so list order alone would not pick channel 5
    store.add_rule(single(6, "Movie", at(20, 0), at(21, 0)));
    store.add_rule(single(5, "News", at(20, 0), at(21, 0)));

    let mut scheduler = scheduler(store);
    scheduler.fill_record_lists_at(noon(), true).unwrap();

    let winners: Vec<_> = scheduler.candidates().iter().map(|c| c.chan_id).collect();
    assert_eq!(winners, vec![5]);
}

#[test]
fn test_lower_rule_kind_wins() {
    let store = store_with(single_card());
    store.add_program(episode(
        channel(5, 1),
        "Series",
        at(19, 0),
        at(21, 0),
        "",
        "",
    ));
    store.add_rule(RecordRule::All {
        title: Some("Series".to_string()),
    });
    store.add_rule(single(6, "Special", at(20, 0), at(21, 0)));

    let mut scheduler = scheduler(store);
    scheduler.fill_record_lists_at(noon(), true).unwrap();

    let kept: Vec<_> = scheduler
        .candidates()
        .iter()
        .map(|c| (c.title.as_str(), c.record_type))
        .collect();
    assert_eq!(kept, vec![("Special", RecordType::Single)]);
}

#[test]
fn test_title_preference_in_manual_mode() {
    let store = store_with(single_card());
    store.add_rule(single(5, "News", at(20, 0), at(21, 0)));
    store.add_rule(single(6, "Movie", at(20, 30), at(22, 0)));
    store.prefer_title("Movie", "News");

    let mut scheduler = scheduler(store);
    let has_conflicts = scheduler.fill_record_lists_at(noon(), false).unwrap();

    // Manual mode keeps the demoted candidate in the list
    assert!(!has_conflicts);
    assert_eq!(scheduler.candidates().len(), 2);
    assert_eq!(recording_titles(&scheduler), vec!["Movie"]);
}

#[test]
fn test_manual_mode_leaves_conflicts() {
    let store = store_with(single_card());
    store.add_rule(single(5, "News", at(20, 0), at(21, 0)));
    store.add_rule(single(6, "Movie", at(20, 30), at(22, 0)));

    let mut scheduler = scheduler(store);
    assert!(scheduler.fill_record_lists_at(noon(), false).unwrap());
    assert!(scheduler.has_conflicts());
    assert!(scheduler.candidates().iter().all(|c| c.conflicting && c.recording));
}

// ============================================================================
// Rule Expansion and Pruning
// ============================================================================

#[test]
fn test_timeslot_rule_matches_exact_start() {
    let store = store_with(single_card());
    let news = channel(5, 1);
    store.add_program(episode(news.clone(), "News", on_day(1, 20, 0), on_day(1, 21, 0), "", ""));
    store.add_program(episode(news.clone(), "News", on_day(2, 20, 0), on_day(2, 21, 0), "", ""));
    store.add_program(episode(news, "News", on_day(3, 21, 0), on_day(3, 22, 0), "", ""));
    store.add_rule(RecordRule::Timeslot {
        chan_id: 5,
        source_id: 1,
        start_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        title: Some("News".to_string()),
    });

    let mut scheduler = scheduler(store);
    scheduler.fill_record_lists_at(noon(), true).unwrap();

    let starts: Vec<_> = scheduler.candidates().iter().map(|c| c.start).collect();
    assert_eq!(starts, vec![on_day(1, 20, 0), on_day(2, 20, 0)]);
    assert!(scheduler
        .candidates()
        .iter()
        .all(|c| c.record_type == RecordType::Timeslot));
}

#[test]
fn test_prune_history_and_repeats() {
    let store = store_with(single_card());
    let chan = channel(5, 1);
    store.add_program(episode(chan.clone(), "Show", on_day(2, 20, 0), on_day(2, 21, 0), "Pilot", "First episode"));
    store.add_program(episode(chan.clone(), "Show", on_day(3, 20, 0), on_day(3, 21, 0), "Pilot", "First episode"));
    store.add_program(episode(chan, "Show", on_day(4, 20, 0), on_day(4, 21, 0), "Second", "Already seen"));
    store.add_history("Show", "Second", "Already seen");
    store.add_rule(RecordRule::All {
        title: Some("Show".to_string()),
    });

    let mut scheduler = scheduler(store);
    scheduler.fill_record_lists_at(noon(), true).unwrap();

    let starts: Vec<_> = scheduler.candidates().iter().map(|c| c.start).collect();
    assert_eq!(starts, vec![on_day(2, 20, 0)]);
}

#[test]
fn test_started_single_is_dropped() {
    let store = store_with(single_card());
    store.add_rule(single(5, "Morning", at(9, 0), at(13, 0)));
    store.add_rule(single(5, "Evening", at(20, 0), at(21, 0)));

    let mut scheduler = scheduler(store);
    scheduler.fill_record_lists_at(noon(), true).unwrap();

    assert_eq!(recording_titles(&scheduler), vec!["Evening"]);
}

#[test]
fn test_empty_store_has_no_conflicts() {
    let mut scheduler = scheduler(store_with(single_card()));
    assert!(!scheduler.fill_record_lists_at(noon(), true).unwrap());
    assert!(scheduler.candidates().is_empty());
    assert!(scheduler.next_recording().is_none());
    assert_eq!(scheduler.last_pass(), Some(noon()));
}

#[test]
fn test_next_recording_is_taken_in_start_order() {
    let store = store_with(two_cards_two_sources());
    store.add_rule(single(5, "Late", at(22, 0), at(23, 0)));
    store.add_rule(single(5, "Early", at(18, 0), at(19, 0)));

    let mut scheduler = scheduler(store);
    scheduler.fill_record_lists_at(noon(), true).unwrap();

    assert_eq!(scheduler.take_next_recording().unwrap().title, "Early");
    assert_eq!(scheduler.next_recording().unwrap().title, "Late");
}

// ============================================================================
// Topology
// ============================================================================

#[test]
fn test_setup_errors() {
    let store = store_with(CaptureInventory::default());
    let err = Scheduler::new(store, &SchedulerConfig::default()).err().unwrap();
    assert!(matches!(err, SchedulerError::NoCaptureCards));
    assert!(err.is_fatal_setup());

    let mut unbound = single_card();
    unbound.sources.push(source(2));

    assert!(Scheduler::new(store_with(unbound.clone()), &SchedulerConfig::default()).is_ok());

    let strict = SchedulerConfig {
        strict_topology: true,
        ..Default::default()
    };
    let err = Scheduler::new(store_with(unbound), &strict).err().unwrap();
    assert!(matches!(err, SchedulerError::UnboundSource { source_id: 2, .. }));
}

#[test]
fn test_unbound_source_stays_unassigned() {
    let store = store_with(mixed_topology());
    store.add_rule(RecordRule::Single(GuideEntry::new(
        channel(9, 3),
        at(20, 0),
        at(21, 0),
        "Local",
    )));
    store.add_rule(single(5, "News", at(18, 0), at(19, 0)));

    let mut scheduler = scheduler(store);
    assert!(!scheduler.fill_record_lists_at(noon(), true).unwrap());

    let local = scheduler
        .candidates()
        .iter()
        .find(|c| c.title == "Local")
        .unwrap();
    assert!(local.recording);
    assert_eq!(local.input_id, None);
    assert_eq!(local.card_id, None);

    let news = scheduler
        .candidates()
        .iter()
        .find(|c| c.title == "News")
        .unwrap();
    assert_eq!(news.input_id, Some(1));
}

#[test]
fn test_shared_source_takes_free_card() {
    let store = store_with(mixed_topology());
    // Channel 6 can only use card 2, channel 5 may use either card
    store.add_rule(single(5, "News", at(20, 0), at(21, 0)));
    store.add_rule(RecordRule::Single(GuideEntry::new(
        channel(6, 2),
        at(20, 0),
        at(21, 0),
        "Movie",
    )));

    let mut scheduler = scheduler(store);
    assert!(!scheduler.fill_record_lists_at(noon(), true).unwrap());

    let placed: Vec<_> = scheduler
        .candidates()
        .iter()
        .filter(|c| c.recording)
        .map(|c| (c.title.as_str(), c.resolved_card()))
        .collect();
    assert_eq!(placed.len(), 2);
    assert!(placed.contains(&("Movie", Some(2))));
    assert!(placed.contains(&("News", Some(1))));
}

// ============================================================================
// Snapshots and Watcher
// ============================================================================

#[test]
fn test_snapshot_reflects_pass() {
    let store = store_with(single_card());
    store.add_rule(single(5, "News", at(20, 0), at(21, 0)));

    let mut scheduler = scheduler(store);
    scheduler.fill_record_lists_at(noon(), true).unwrap();

    let snapshot = scheduler.snapshot();
    assert_eq!(snapshot.computed_for, Some(noon()));
    assert_eq!(snapshot.card_count, 1);

    let summary = snapshot.summary();
    assert_eq!(summary.recording, 1);
    assert_eq!(summary.per_card.get(&1), Some(&1));

    let parsed = ScheduleSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
    assert_eq!(parsed.candidates, snapshot.candidates);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watcher_reschedules_after_mark_changed() {
    let store = store_with(single_card());
    let start = chrono::Local::now().naive_local() + ChronoDuration::hours(3);
    store.add_rule(single(5, "News", start, start + ChronoDuration::hours(1)));

    let config = WatcherConfig {
        poll_interval: Duration::from_millis(10),
        run_on_startup: true,
    };
    let watcher = Arc::new(ScheduleWatcher::new(scheduler(store.clone()), config).unwrap());
    let mut events = watcher.subscribe();

    let task = {
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { watcher.run().await })
    };

    let first = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        first,
        ScheduleEvent::Rescheduled {
            reason: PassReason::Startup,
            ..
        }
    ));

    store.add_rule(single(6, "Movie", start, start + ChronoDuration::hours(1)));
    store.mark_changed().unwrap();

    let second = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    match second {
        ScheduleEvent::Rescheduled { reason, snapshot } => {
            assert_eq!(reason, PassReason::Changed);
            assert_eq!(snapshot.recording().count(), 1);
        }
        other => panic!("Unexpected event: {other:?}"),
    }

    watcher.stop();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_auto_pass_never_double_books(
        showings in prop::collection::vec((0usize..3, 0i64..48, 1i64..6), 1..12)
    ) {
        let store = store_with(two_cards_two_sources());
        let channels = [(5, 1), (6, 2), (7, 1)];

        for (n, (chan, slot, length)) in showings.iter().enumerate() {
            let (chan_id, source_id) = channels[*chan];
            let start = on_day(2, 0, 0) + ChronoDuration::minutes(30 * slot);
            let end = start + ChronoDuration::minutes(30 * length);
            store.add_rule(RecordRule::Single(GuideEntry::new(
                channel(chan_id, source_id),
                start,
                end,
                format!("Show {n}"),
            )));
        }

        let mut scheduler = scheduler(store);
        let has_conflicts = scheduler.fill_record_lists_at(noon(), true).unwrap();
        prop_assert!(!has_conflicts);

        let recording: Vec<_> = scheduler.candidates().iter().filter(|c| c.recording).collect();
        prop_assert!(!recording.is_empty());
        for (i, a) in recording.iter().enumerate() {
            for b in &recording[i + 1..] {
                if a.resolved_card() == b.resolved_card() {
                    prop_assert!(!a.overlaps(b), "{} overlaps {}", a.display(), b.display());
                }
            }
        }
    }

    #[test]
    fn prop_auto_pass_resolves_mixed_topology(
        showings in prop::collection::vec((0usize..4, 0i64..48, 1i64..6), 1..14)
    ) {
        let store = store_with(mixed_topology());
        // Source 1 spans both cards, source 2 is card 2 only, source 3 is unbound
        let channels = [(5, 1), (6, 2), (7, 3), (8, 1)];

        for (n, (chan, slot, length)) in showings.iter().enumerate() {
            let (chan_id, source_id) = channels[*chan];
            let start = on_day(2, 0, 0) + ChronoDuration::minutes(30 * slot);
            let end = start + ChronoDuration::minutes(30 * length);
            store.add_rule(RecordRule::Single(GuideEntry::new(
                channel(chan_id, source_id),
                start,
                end,
                format!("Show {n}"),
            )));
        }

        let mut scheduler = scheduler(store);
        let has_conflicts = scheduler.fill_record_lists_at(noon(), true).unwrap();
        prop_assert!(!has_conflicts);

        let recording: Vec<_> = scheduler.candidates().iter().filter(|c| c.recording).collect();
        prop_assert!(!recording.is_empty());
        for (i, a) in recording.iter().enumerate() {
            if a.source_id == 3 {
                prop_assert_eq!(a.input_id, None);
            }
            for b in &recording[i + 1..] {
                prop_assert!(!conflicts(a, b), "{} conflicts with {}", a.display(), b.display());
                if a.resolved_card().is_some() && a.resolved_card() == b.resolved_card() {
                    prop_assert!(!a.overlaps(b), "{} overlaps {}", a.display(), b.display());
                }
            }
        }
    }
}
