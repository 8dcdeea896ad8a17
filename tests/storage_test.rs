//! SQLite store tests against a database file

mod common;

use std::sync::Arc;

use common::*;
use recsched::config::SchedulerConfig;
use recsched::models::{RecordRule, ShowingKey};
use recsched::storage::{ScheduleStore, SqliteScheduleStore, StoreFixture};
use recsched::Scheduler;
use tempfile::TempDir;

const FIXTURE: &str = r#"
cards = [1]

[[sources]]
source_id = 1
name = "Antenna"

[[inputs]]
input_id = 1
card_id = 1
source_id = 1

[[channels]]
chan_id = 5
source_id = 1
chan_num = "5"
call_sign = "NEWS"

[[channels]]
chan_id = 6
source_id = 1
chan_num = "6"
call_sign = "FILM"

[[programs]]
chan_id = 5
start = "2024-03-02T20:00:00"
end = "2024-03-02T21:00:00"
title = "News"

[[programs]]
chan_id = 6
start = "2024-03-02T20:30:00"
end = "2024-03-02T22:00:00"
title = "Movie"

[[rules]]
kind = "channel"
chan_id = 5
title = "News"

[[rules]]
kind = "all"
title = "Movie"

[[overrides]]
chan_id = 6
start = "2024-03-02T20:30:00"
end = "2024-03-02T22:00:00"
"#;

fn seeded(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("recsched.db");
    let store = SqliteScheduleStore::new(&path).unwrap();
    StoreFixture::from_toml(FIXTURE)
        .unwrap()
        .apply_sqlite(&store)
        .unwrap();
    path
}

#[test]
fn test_fixture_persists_across_connections() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);

    let store = SqliteScheduleStore::new(&path).unwrap();
    let inventory = store.capture_inventory().unwrap();
    assert_eq!(inventory.cards, vec![1]);
    assert_eq!(inventory.inputs.len(), 1);

    let rules = store.record_rules().unwrap();
    assert_eq!(rules.len(), 2);
    assert!(matches!(rules[0], RecordRule::Channel { chan_id: 5, .. }));

    assert!(store
        .has_override(&ShowingKey::new(6, on_day(2, 20, 30), on_day(2, 22, 0)))
        .unwrap());
}

#[test]
fn test_pass_over_sqlite_store() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);

    let store = Arc::new(SqliteScheduleStore::new(&path).unwrap());
    let mut scheduler = Scheduler::new(store, &SchedulerConfig::default()).unwrap();
    let has_conflicts = scheduler.fill_record_lists_at(noon(), true).unwrap();

    assert!(!has_conflicts);
    assert_eq!(recording_titles(&scheduler), vec!["Movie"]);

    let movie = &scheduler.candidates()[0];
    assert_eq!(movie.call_sign, "FILM");
    assert_eq!(movie.input_id, Some(1));
}

#[test]
fn test_change_flag_is_shared_between_connections() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir);

    let writer = SqliteScheduleStore::new(&path).unwrap();
    let reader = SqliteScheduleStore::new(&path).unwrap();

    assert!(!reader.take_change_flag().unwrap());
    writer.mark_changed().unwrap();
    assert!(reader.take_change_flag().unwrap());
    assert!(!reader.take_change_flag().unwrap());
}

#[test]
fn test_history_lookup() {
    let dir = TempDir::new().unwrap();
    let store = SqliteScheduleStore::new(dir.path().join("history.db")).unwrap();

    store.insert_history("Show", "Pilot", "First episode").unwrap();
    assert!(store.in_recording_history("Show", "Pilot", "First episode").unwrap());
    assert!(!store.in_recording_history("Show", "Pilot", "Other").unwrap());
}
