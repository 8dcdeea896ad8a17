//! TOML store fixtures
//!
//! A fixture describes a whole store (inventory, channels, guide, rules and
//! conflict preferences) in one file, for seeding a database from the CLI or
//! building test stores.
//!
//! ```toml
//! cards = [1, 2]
//!
//! [[sources]]
//! source_id = 1
//! name = "Cable"
//!
//! [[inputs]]
//! input_id = 1
//! card_id = 1
//! source_id = 1
//!
//! [[channels]]
//! chan_id = 5
//! source_id = 1
//! chan_num = "5"
//!
//! [[programs]]
//! chan_id = 5
//! start = "2024-03-01T20:00:00"
//! end = "2024-03-01T21:00:00"
//! title = "News"
//!
//! [[rules]]
//! kind = "all"
//! title = "News"
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::{CardId, ChanId, ChannelInfo, GuideEntry, RecordRule, ShowingKey};

use super::repository::{
    CaptureInventory, CardInput, MemoryScheduleStore, SourceRecord, SqliteScheduleStore,
};

/// Guide row keyed by channel id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRow {
    pub chan_id: ChanId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub title: String,
    pub subtitle: String,
    pub description: String,
}

/// "Prefer this showing over that one"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowingPreference {
    pub prefer: ShowingKey,
    pub dislike: ShowingKey,
}

/// "Prefer this title over that one"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitlePreference {
    pub prefer: String,
    pub dislike: String,
}

/// Complete store contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreFixture {
    pub cards: Vec<CardId>,
    pub sources: Vec<SourceRecord>,
    pub inputs: Vec<CardInput>,
    pub channels: Vec<ChannelInfo>,
    pub programs: Vec<ProgramRow>,
    pub rules: Vec<RecordRule>,
    pub history: Vec<HistoryRow>,
    pub overrides: Vec<ShowingKey>,
    pub prefer_showings: Vec<ShowingPreference>,
    pub prefer_titles: Vec<TitlePreference>,
}

impl StoreFixture {
    /// Load a fixture from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse fixture: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Guide rows joined with their channels
    pub fn guide_entries(&self) -> Result<Vec<GuideEntry>> {
        let channels: HashMap<ChanId, &ChannelInfo> =
            self.channels.iter().map(|c| (c.chan_id, c)).collect();

        self.programs
            .iter()
            .map(|row| {
                let channel = channels
                    .get(&row.chan_id)
                    .with_context(|| format!("Program references unknown channel {}", row.chan_id))?;
                Ok(GuideEntry {
                    channel: (*channel).clone(),
                    start: row.start,
                    end: row.end,
                    title: row.title.clone(),
                    subtitle: row.subtitle.clone(),
                    description: row.description.clone(),
                })
            })
            .collect()
    }

    fn inventory(&self) -> CaptureInventory {
        CaptureInventory {
            cards: self.cards.clone(),
            sources: self.sources.clone(),
            inputs: self.inputs.clone(),
        }
    }

    /// Write the fixture into a SQLite store
    pub fn apply_sqlite(&self, store: &SqliteScheduleStore) -> Result<()> {
        let entries = self.guide_entries()?;

        for card_id in &self.cards {
            store.insert_card(*card_id)?;
        }
        for source in &self.sources {
            store.insert_source(source)?;
        }
        for input in &self.inputs {
            store.insert_input(input)?;
        }
        for channel in &self.channels {
            store.insert_channel(channel)?;
        }
        for entry in &entries {
            store.insert_program(entry)?;
        }
        for rule in &self.rules {
            store.insert_rule(rule)?;
        }
        for row in &self.history {
            store.insert_history(&row.title, &row.subtitle, &row.description)?;
        }
        for showing in &self.overrides {
            store.insert_override(showing)?;
        }
        for pref in &self.prefer_showings {
            store.insert_showing_preference(&pref.prefer, &pref.dislike)?;
        }
        for pref in &self.prefer_titles {
            store.insert_title_preference(&pref.prefer, &pref.dislike)?;
        }

        tracing::info!(
            programs = entries.len(),
            rules = self.rules.len(),
            "Fixture imported"
        );
        Ok(())
    }

    /// Build an in-memory store holding the fixture
    pub fn to_memory(&self) -> Result<MemoryScheduleStore> {
        let store = MemoryScheduleStore::new();
        store.set_inventory(self.inventory());

        for entry in self.guide_entries()? {
            store.add_program(entry);
        }
        for rule in &self.rules {
            store.add_rule(rule.clone());
        }
        for row in &self.history {
            store.add_history(&row.title, &row.subtitle, &row.description);
        }
        for showing in &self.overrides {
            store.add_override(*showing);
        }
        for pref in &self.prefer_showings {
            store.prefer_showing(pref.prefer, pref.dislike);
        }
        for pref in &self.prefer_titles {
            store.prefer_title(&pref.prefer, &pref.dislike);
        }

        Ok(store)
    }
}
