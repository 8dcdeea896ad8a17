// Core data structures for the recording scheduler

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Guide channel identifier
pub type ChanId = i64;
/// Video source identifier
pub type SourceId = i64;
/// Card input identifier
pub type InputId = i64;
/// Capture card identifier
pub type CardId = i64;

/// Recording rule kind, ordered by scheduling priority (lower wins)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Single = 1,
    Timeslot = 2,
    Channel = 3,
    All = 4,
}

impl RecordType {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Timeslot => "timeslot",
            Self::Channel => "channel",
            Self::All => "all",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Channel row as the guide store reports it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelInfo {
    pub chan_id: ChanId,
    pub source_id: SourceId,
    pub chan_num: String,
    pub call_sign: String,
    pub name: String,
}

impl ChannelInfo {
    pub fn new(chan_id: ChanId, source_id: SourceId) -> Self {
        Self {
            chan_id,
            source_id,
            ..Default::default()
        }
    }

    pub fn with_labels(
        mut self,
        chan_num: impl Into<String>,
        call_sign: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.chan_num = chan_num.into();
        self.call_sign = call_sign.into();
        self.name = name.into();
        self
    }
}

/// One program guide occurrence. Text fields may be missing in the guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideEntry {
    pub channel: ChannelInfo,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
}

impl GuideEntry {
    pub fn new(
        channel: ChannelInfo,
        start: NaiveDateTime,
        end: NaiveDateTime,
        title: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            start,
            end,
            title: Some(title.into()),
            subtitle: None,
            description: None,
        }
    }

    pub fn with_episode(
        mut self,
        subtitle: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.subtitle = Some(subtitle.into());
        self.description = Some(description.into());
        self
    }
}

/// A user-defined recording rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordRule {
    /// Record exactly this showing
    Single(GuideEntry),

    /// Record this title in this weekly timeslot on this channel
    Timeslot {
        chan_id: ChanId,
        source_id: SourceId,
        start_time: NaiveTime,
        title: Option<String>,
    },

    /// Record this title whenever it airs on this channel
    Channel {
        chan_id: ChanId,
        title: Option<String>,
    },

    /// Record this title whenever it airs on any channel
    All { title: Option<String> },
}

impl RecordRule {
    /// Rule kind for priority purposes
    pub fn kind(&self) -> RecordType {
        match self {
            Self::Single(_) => RecordType::Single,
            Self::Timeslot { .. } => RecordType::Timeslot,
            Self::Channel { .. } => RecordType::Channel,
            Self::All { .. } => RecordType::All,
        }
    }
}

/// Exact (channel, start, end) identity used by override and preference tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShowingKey {
    pub chan_id: ChanId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ShowingKey {
    pub fn new(chan_id: ChanId, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { chan_id, start, end }
    }
}

/// One prospective recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub chan_id: ChanId,
    pub source_id: SourceId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,

    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub chan_num: String,
    pub call_sign: String,
    pub chan_name: String,

    pub record_type: RecordType,

    /// Assigned input, `None` while unresolved
    pub input_id: Option<InputId>,
    /// Card owning `input_id`
    pub card_id: Option<CardId>,

    pub conflicting: bool,
    pub recording: bool,
    /// Set by the multi-card pass once this candidate has no remaining conflicts
    pub conflict_fixed: bool,
}

impl Candidate {
    /// Build a candidate from a guide occurrence, normalizing missing text to ""
    pub fn from_guide(entry: GuideEntry, record_type: RecordType) -> Self {
        let GuideEntry {
            channel,
            start,
            end,
            title,
            subtitle,
            description,
        } = entry;

        Self {
            chan_id: channel.chan_id,
            source_id: channel.source_id,
            start,
            end,
            title: title.unwrap_or_default(),
            subtitle: subtitle.unwrap_or_default(),
            description: description.unwrap_or_default(),
            chan_num: channel.chan_num,
            call_sign: channel.call_sign,
            chan_name: channel.name,
            record_type,
            input_id: None,
            card_id: None,
            conflicting: false,
            recording: true,
            conflict_fixed: false,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Half-open interval overlap: `[s1,e1)` and `[s2,e2)` meet iff `s1 < e2 && s2 < e1`
    pub fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Identity used when building conflict clusters
    pub fn is_same_showing(&self, other: &Candidate) -> bool {
        self.title == other.title && self.start == other.start && self.chan_id == other.chan_id
    }

    /// Same episode by (title, subtitle, description)
    pub fn is_same_episode(&self, other: &Candidate) -> bool {
        self.title == other.title
            && self.subtitle == other.subtitle
            && self.description == other.description
    }

    pub fn showing_key(&self) -> ShowingKey {
        ShowingKey::new(self.chan_id, self.start, self.end)
    }

    pub fn assign(&mut self, input_id: InputId, card_id: Option<CardId>) {
        self.input_id = Some(input_id);
        self.card_id = card_id;
    }

    /// Card id when resolved to a positive value
    pub fn resolved_card(&self) -> Option<CardId> {
        self.card_id.filter(|card| *card > 0)
    }

    /// One-line listing for logs and the CLI
    pub fn display(&self) -> String {
        format!(
            "{} {} {} {} \"{}\" {} {} {} -- {} {}",
            self.title,
            self.chan_num,
            self.chan_id,
            self.record_type,
            self.start.format("%a %b %e %H:%M %Y"),
            self.source_id,
            self.input_id.unwrap_or(-1),
            self.card_id.unwrap_or(-1),
            u8::from(self.conflicting),
            u8::from(self.recording),
        )
    }
}
