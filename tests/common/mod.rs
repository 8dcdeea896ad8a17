//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use recsched::config::SchedulerConfig;
use recsched::models::{ChannelInfo, GuideEntry, RecordRule};
use recsched::storage::{CaptureInventory, CardInput, MemoryScheduleStore, SourceRecord};
use recsched::Scheduler;

/// 2024-03-01 at the given time
pub fn at(hour: u32, min: u32) -> NaiveDateTime {
    on_day(1, hour, min)
}

/// March 2024, day `day`, at the given time
pub fn on_day(day: u32, hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

/// Pass time used by every scenario: noon on 2024-03-01
pub fn noon() -> NaiveDateTime {
    at(12, 0)
}

pub fn channel(chan_id: i64, source_id: i64) -> ChannelInfo {
    ChannelInfo::new(chan_id, source_id).with_labels(chan_id.to_string(), format!("CH{chan_id}"), "")
}

pub fn source(source_id: i64) -> SourceRecord {
    SourceRecord {
        source_id,
        name: format!("Source {source_id}"),
    }
}

pub fn input(input_id: i64, card_id: i64, source_id: i64) -> CardInput {
    CardInput {
        input_id,
        card_id,
        source_id,
    }
}

/// One card, one source, one input
pub fn single_card() -> CaptureInventory {
    CaptureInventory {
        cards: vec![1],
        sources: vec![source(1)],
        inputs: vec![input(1, 1, 1)],
    }
}

/// Two cards both wired to source 1
pub fn two_cards_one_source() -> CaptureInventory {
    CaptureInventory {
        cards: vec![1, 2],
        sources: vec![source(1)],
        inputs: vec![input(1, 1, 1), input(2, 2, 1)],
    }
}

/// Two cards, each with its own source
pub fn two_cards_two_sources() -> CaptureInventory {
    CaptureInventory {
        cards: vec![1, 2],
        sources: vec![source(1), source(2)],
        inputs: vec![input(1, 1, 1), input(2, 2, 2)],
    }
}

/// Source 1 on both cards, source 2 on card 2 only, source 3 unbound
pub fn mixed_topology() -> CaptureInventory {
    CaptureInventory {
        cards: vec![1, 2],
        sources: vec![source(1), source(2), source(3)],
        inputs: vec![input(1, 1, 1), input(2, 2, 1), input(3, 2, 2)],
    }
}

pub fn store_with(inventory: CaptureInventory) -> Arc<MemoryScheduleStore> {
    let store = MemoryScheduleStore::new();
    store.set_inventory(inventory);
    Arc::new(store)
}

/// Single-showing rule on `chan_id` (source 1)
pub fn single(chan_id: i64, title: &str, start: NaiveDateTime, end: NaiveDateTime) -> RecordRule {
    RecordRule::Single(GuideEntry::new(channel(chan_id, 1), start, end, title))
}

pub fn episode(
    chan: ChannelInfo,
    title: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    subtitle: &str,
    description: &str,
) -> GuideEntry {
    GuideEntry::new(chan, start, end, title).with_episode(subtitle, description)
}

pub fn scheduler(store: Arc<MemoryScheduleStore>) -> Scheduler {
    Scheduler::new(store, &SchedulerConfig::default()).unwrap()
}

/// Titles of the candidates still set to record, in list order
pub fn recording_titles(scheduler: &Scheduler) -> Vec<String> {
    scheduler
        .candidates()
        .iter()
        .filter(|c| c.recording)
        .map(|c| c.title.clone())
        .collect()
}
