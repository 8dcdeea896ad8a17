//! Candidate loading
//!
//! Expands every recording rule into concrete guide occurrences:
//!
//! | Rule     | Search                                                        |
//! |----------|---------------------------------------------------------------|
//! | Single   | the stored occurrence itself, dropped once it has started     |
//! | Timeslot | exact start at the slot time on each of the next 8 days       |
//! | Channel  | title on one channel, from now until 7 days out               |
//! | All      | title on any channel, from now until 7 days out               |
//!
//! A guide showing matched by several rules is loaded once, carrying the
//! highest-priority rule kind.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

use crate::models::{Candidate, ChanId, GuideEntry, RecordRule, RecordType, SourceId};
use crate::storage::{ProgramQuery, ScheduleStore, StartMatch};

use super::error::{SchedulerError, SchedulerResult};

/// Days searched by timeslot rules, today included
const TIMESLOT_DAYS: i64 = 8;
/// Window searched by channel and all-channel rules
const TITLE_WINDOW_DAYS: i64 = 7;

/// Load the candidate list for a pass starting at `now`
///
/// Candidates come back in rule order; sorting is the caller's job.
pub fn load_candidates(
    store: &dyn ScheduleStore,
    now: NaiveDateTime,
) -> SchedulerResult<Vec<Candidate>> {
    let rules = store
        .record_rules()
        .map_err(|e| SchedulerError::store("load recording rules", e))?;

    let mut loaded = Vec::new();
    for rule in rules {
        match rule {
            RecordRule::Single(entry) => {
                if entry.start < now {
                    tracing::debug!(
                        chan_id = entry.channel.chan_id,
                        start = %entry.start,
                        "Skipping single recording that already started"
                    );
                    continue;
                }
                loaded.push(Candidate::from_guide(entry, RecordType::Single));
            }
            RecordRule::Timeslot {
                chan_id,
                source_id,
                start_time,
                title: Some(title),
            } => {
                for entry in find_timeslot(store, now, chan_id, source_id, start_time, &title)? {
                    loaded.push(Candidate::from_guide(entry, RecordType::Timeslot));
                }
            }
            RecordRule::Channel {
                chan_id,
                title: Some(title),
            } => {
                for entry in find_title(store, now, Some(chan_id), &title)? {
                    loaded.push(Candidate::from_guide(entry, RecordType::Channel));
                }
            }
            RecordRule::All { title: Some(title) } => {
                for entry in find_title(store, now, None, &title)? {
                    loaded.push(Candidate::from_guide(entry, RecordType::All));
                }
            }
            untitled => {
                tracing::debug!(kind = %untitled.kind(), "Skipping rule without a title");
            }
        }
    }

    let candidates = collapse_showings(drop_empty_intervals(loaded));
    tracing::debug!(count = candidates.len(), "Candidates loaded");

    Ok(candidates)
}

fn find_timeslot(
    store: &dyn ScheduleStore,
    now: NaiveDateTime,
    chan_id: ChanId,
    source_id: SourceId,
    start_time: NaiveTime,
    title: &str,
) -> SchedulerResult<Vec<GuideEntry>> {
    let slot_passed = now.hour() > start_time.hour()
        || (now.hour() == start_time.hour() && now.minute() > start_time.minute());

    let mut found = Vec::new();
    for offset in 0..TIMESLOT_DAYS {
        if offset == 0 && slot_passed {
            continue;
        }

        let start = (now.date() + Duration::days(offset)).and_time(start_time);
        let query = ProgramQuery::new(title, StartMatch::Exactly(start), start + Duration::days(1))
            .on_channel(chan_id)
            .on_source(source_id);

        found.extend(
            store
                .find_programs(&query)
                .map_err(|e| SchedulerError::store("find timeslot programs", e))?,
        );
    }

    Ok(found)
}

fn find_title(
    store: &dyn ScheduleStore,
    now: NaiveDateTime,
    chan_id: Option<ChanId>,
    title: &str,
) -> SchedulerResult<Vec<GuideEntry>> {
    let from = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    let mut query = ProgramQuery::new(
        title,
        StartMatch::AtOrAfter(from),
        from + Duration::days(TITLE_WINDOW_DAYS),
    );
    if let Some(chan_id) = chan_id.filter(|c| *c > 0) {
        query = query.on_channel(chan_id);
    }

    store
        .find_programs(&query)
        .map_err(|e| SchedulerError::store("find title programs", e))
}

fn drop_empty_intervals(candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| {
            let valid = c.start < c.end;
            if !valid {
                tracing::warn!(
                    chan_id = c.chan_id,
                    title = %c.title,
                    start = %c.start,
                    end = %c.end,
                    "Dropping guide entry that does not end after it starts"
                );
            }
            valid
        })
        .collect()
}

/// Merge candidates for the same showing (channel, start, title), keeping the
/// first occurrence and the lowest rule ordinal
fn collapse_showings(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashMap<(ChanId, NaiveDateTime, String), usize> = HashMap::new();
    let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let key = (candidate.chan_id, candidate.start, candidate.title.clone());
        match seen.get(&key) {
            Some(&position) => {
                let kept = &mut merged[position];
                kept.record_type = kept.record_type.min(candidate.record_type);
            }
            None => {
                seen.insert(key, merged.len());
                merged.push(candidate);
            }
        }
    }

    merged
}
