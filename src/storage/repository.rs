//! Repository Pattern for the scheduler's data collaborators
//!
//! The scheduler never talks to a database directly. Everything it consumes
//! (capture inventory, recording rules, program guide, recording history,
//! conflict overrides and preferences, the change flag) goes through the
//! [`ScheduleStore`] trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Scheduler                            │
//! │        (loader, prune, arbiter, change-flag watcher)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ScheduleStore trait                     │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                             │
//!                 ▼                             ▼
//!        ┌─────────────────┐           ┌─────────────────┐
//!        │     SQLite      │           │    In-memory    │
//!        │  Implementation │           │  Implementation │
//!        └─────────────────┘           └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use recsched::storage::{ScheduleStore, SqliteScheduleStore, MemoryScheduleStore};
//!
//! // Production: use SQLite
//! let store = SqliteScheduleStore::new("data/recsched.db")?;
//!
//! // Testing: in-memory
//! let store = MemoryScheduleStore::new();
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, NaiveTime};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, ToSql};
use serde::{Deserialize, Serialize};

use crate::models::{
    CardId, ChanId, ChannelInfo, GuideEntry, InputId, RecordRule, ShowingKey, SourceId,
};

// ============================================================================
// Core Types
// ============================================================================

/// A video source as listed in the capture inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub source_id: SourceId,
    pub name: String,
}

/// A card input, bound to exactly one source and one card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInput {
    pub input_id: InputId,
    pub card_id: CardId,
    pub source_id: SourceId,
}

/// Capture hardware inventory, each list ordered by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureInventory {
    pub cards: Vec<CardId>,
    pub sources: Vec<SourceRecord>,
    pub inputs: Vec<CardInput>,
}

/// How a guide query constrains the program start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMatch {
    /// Program starts exactly at this time
    Exactly(NaiveDateTime),
    /// Program starts at or after this time
    AtOrAfter(NaiveDateTime),
}

/// Program guide lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramQuery {
    pub title: String,
    pub start: StartMatch,
    /// Program must end strictly before this time
    pub end_before: NaiveDateTime,
    pub chan_id: Option<ChanId>,
    pub source_id: Option<SourceId>,
}

impl ProgramQuery {
    pub fn new(title: impl Into<String>, start: StartMatch, end_before: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            start,
            end_before,
            chan_id: None,
            source_id: None,
        }
    }

    pub fn on_channel(mut self, chan_id: ChanId) -> Self {
        self.chan_id = Some(chan_id);
        self
    }

    pub fn on_source(mut self, source_id: SourceId) -> Self {
        self.source_id = Some(source_id);
        self
    }

    /// Check an entry against the query
    pub fn matches(&self, entry: &GuideEntry) -> bool {
        let start_ok = match self.start {
            StartMatch::Exactly(at) => entry.start == at,
            StartMatch::AtOrAfter(from) => entry.start >= from,
        };

        start_ok
            && entry.end < self.end_before
            && entry.title.as_deref() == Some(self.title.as_str())
            && self.chan_id.map_or(true, |c| c == entry.channel.chan_id)
            && self.source_id.map_or(true, |s| s == entry.channel.source_id)
    }
}

// ============================================================================
// Repository Trait
// ============================================================================

/// Everything the scheduler reads from (and the one flag it clears in) its data store
pub trait ScheduleStore: Send + Sync {
    /// Cards, sources and card inputs
    fn capture_inventory(&self) -> Result<CaptureInventory>;

    /// All configured recording rules
    fn record_rules(&self) -> Result<Vec<RecordRule>>;

    /// Guide entries matching the query, ordered by start then channel
    fn find_programs(&self, query: &ProgramQuery) -> Result<Vec<GuideEntry>>;

    /// Whether this episode was already recorded
    fn in_recording_history(&self, title: &str, subtitle: &str, description: &str)
        -> Result<bool>;

    /// Whether an override forces this exact showing to win its conflicts
    fn has_override(&self, showing: &ShowingKey) -> Result<bool>;

    /// Showings the user prefers `preferred` over
    fn disliked_showings(&self, preferred: &ShowingKey) -> Result<Vec<ShowingKey>>;

    /// Titles the user prefers `preferred_title` over
    fn disliked_titles(&self, preferred_title: &str) -> Result<Vec<String>>;

    /// Return whether the schedule changed since the last call, clearing the flag
    fn take_change_flag(&self) -> Result<bool>;

    /// Raise the change flag
    fn mark_changed(&self) -> Result<()>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

const SETTING_RECORD_CHANGED: &str = "record_changed";

/// SQLite implementation of ScheduleStore
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteScheduleStore {
    conn: Mutex<Connection>,
}

impl SqliteScheduleStore {
    /// Open (or create) a SQLite store
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite schedule store initialized");
        Ok(store)
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create in-memory SQLite")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS capture_card (
                    card_id INTEGER PRIMARY KEY
                );

                CREATE TABLE IF NOT EXISTS video_source (
                    source_id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS card_input (
                    input_id INTEGER PRIMARY KEY,
                    card_id INTEGER NOT NULL,
                    source_id INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS channel (
                    chan_id INTEGER PRIMARY KEY,
                    source_id INTEGER NOT NULL,
                    chan_num TEXT,
                    call_sign TEXT,
                    name TEXT
                );

                CREATE TABLE IF NOT EXISTS program (
                    chan_id INTEGER NOT NULL,
                    start_time TEXT NOT NULL,
                    end_time TEXT NOT NULL,
                    title TEXT,
                    subtitle TEXT,
                    description TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_program_title
                    ON program(title, start_time);

                CREATE TABLE IF NOT EXISTS single_record (
                    chan_id INTEGER NOT NULL,
                    start_time TEXT NOT NULL,
                    end_time TEXT NOT NULL,
                    title TEXT,
                    subtitle TEXT,
                    description TEXT
                );

                CREATE TABLE IF NOT EXISTS timeslot_record (
                    chan_id INTEGER NOT NULL,
                    start_time TEXT NOT NULL,
                    title TEXT
                );

                CREATE TABLE IF NOT EXISTS title_record (
                    title TEXT,
                    chan_id INTEGER
                );

                CREATE TABLE IF NOT EXISTS recorded_history (
                    title TEXT NOT NULL,
                    subtitle TEXT NOT NULL,
                    description TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS conflict_override (
                    chan_id INTEGER NOT NULL,
                    start_time TEXT NOT NULL,
                    end_time TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS conflict_prefer_showing (
                    prefer_chan_id INTEGER NOT NULL,
                    prefer_start TEXT NOT NULL,
                    prefer_end TEXT NOT NULL,
                    dislike_chan_id INTEGER NOT NULL,
                    dislike_start TEXT NOT NULL,
                    dislike_end TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS conflict_prefer_title (
                    prefer_title TEXT NOT NULL,
                    dislike_title TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                "#,
            )
            .context("Failed to create SQLite schema")?;

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Seeding helpers
    // ------------------------------------------------------------------------

    pub fn insert_card(&self, card_id: CardId) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO capture_card (card_id) VALUES (?1)",
                params![card_id],
            )
            .context("Failed to insert capture card")?;
        Ok(())
    }

    pub fn insert_source(&self, source: &SourceRecord) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO video_source (source_id, name) VALUES (?1, ?2)",
                params![source.source_id, source.name],
            )
            .context("Failed to insert video source")?;
        Ok(())
    }

    pub fn insert_input(&self, input: &CardInput) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO card_input (input_id, card_id, source_id)
                 VALUES (?1, ?2, ?3)",
                params![input.input_id, input.card_id, input.source_id],
            )
            .context("Failed to insert card input")?;
        Ok(())
    }

    pub fn insert_channel(&self, channel: &ChannelInfo) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO channel (chan_id, source_id, chan_num, call_sign, name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    channel.chan_id,
                    channel.source_id,
                    channel.chan_num,
                    channel.call_sign,
                    channel.name
                ],
            )
            .context("Failed to insert channel")?;
        Ok(())
    }

    /// Insert a guide entry, creating its channel row if missing
    pub fn insert_program(&self, entry: &GuideEntry) -> Result<()> {
        let conn = self.conn();
        insert_channel_if_missing(&conn, &entry.channel)?;
        conn.execute(
            "INSERT INTO program (chan_id, start_time, end_time, title, subtitle, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.channel.chan_id,
                entry.start,
                entry.end,
                entry.title,
                entry.subtitle,
                entry.description
            ],
        )
        .context("Failed to insert program")?;
        Ok(())
    }

    /// Insert a recording rule
    pub fn insert_rule(&self, rule: &RecordRule) -> Result<()> {
        let conn = self.conn();
        let inserted = match rule {
            RecordRule::Single(entry) => {
                insert_channel_if_missing(&conn, &entry.channel)?;
                conn.execute(
                    "INSERT INTO single_record
                        (chan_id, start_time, end_time, title, subtitle, description)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        entry.channel.chan_id,
                        entry.start,
                        entry.end,
                        entry.title,
                        entry.subtitle,
                        entry.description
                    ],
                )
            }
            RecordRule::Timeslot {
                chan_id,
                source_id,
                start_time,
                title,
            } => {
                insert_channel_if_missing(&conn, &ChannelInfo::new(*chan_id, *source_id))?;
                conn.execute(
                    "INSERT INTO timeslot_record (chan_id, start_time, title) VALUES (?1, ?2, ?3)",
                    params![chan_id, start_time.format("%H:%M").to_string(), title],
                )
            }
            RecordRule::Channel { chan_id, title } => conn.execute(
                "INSERT INTO title_record (title, chan_id) VALUES (?1, ?2)",
                params![title, chan_id],
            ),
            RecordRule::All { title } => conn.execute(
                "INSERT INTO title_record (title, chan_id) VALUES (?1, NULL)",
                params![title],
            ),
        };
        inserted.context("Failed to insert recording rule")?;
        Ok(())
    }

    pub fn insert_history(&self, title: &str, subtitle: &str, description: &str) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO recorded_history (title, subtitle, description) VALUES (?1, ?2, ?3)",
                params![title, subtitle, description],
            )
            .context("Failed to insert recording history")?;
        Ok(())
    }

    pub fn insert_override(&self, showing: &ShowingKey) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO conflict_override (chan_id, start_time, end_time) VALUES (?1, ?2, ?3)",
                params![showing.chan_id, showing.start, showing.end],
            )
            .context("Failed to insert conflict override")?;
        Ok(())
    }

    pub fn insert_showing_preference(
        &self,
        preferred: &ShowingKey,
        disliked: &ShowingKey,
    ) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO conflict_prefer_showing
                    (prefer_chan_id, prefer_start, prefer_end,
                     dislike_chan_id, dislike_start, dislike_end)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    preferred.chan_id,
                    preferred.start,
                    preferred.end,
                    disliked.chan_id,
                    disliked.start,
                    disliked.end
                ],
            )
            .context("Failed to insert showing preference")?;
        Ok(())
    }

    pub fn insert_title_preference(&self, preferred: &str, disliked: &str) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO conflict_prefer_title (prefer_title, dislike_title) VALUES (?1, ?2)",
                params![preferred, disliked],
            )
            .context("Failed to insert title preference")?;
        Ok(())
    }
}

fn insert_channel_if_missing(conn: &Connection, channel: &ChannelInfo) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO channel (chan_id, source_id, chan_num, call_sign, name)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            channel.chan_id,
            channel.source_id,
            channel.chan_num,
            channel.call_sign,
            channel.name
        ],
    )
    .context("Failed to insert channel")?;
    Ok(())
}

/// Columns: chan_id, source_id, chan_num, call_sign, name, start, end, title, subtitle, description
fn guide_entry_from_row(row: &Row<'_>) -> rusqlite::Result<GuideEntry> {
    Ok(GuideEntry {
        channel: ChannelInfo {
            chan_id: row.get(0)?,
            source_id: row.get(1)?,
            chan_num: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            call_sign: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            name: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        },
        start: row.get(5)?,
        end: row.get(6)?,
        title: row.get(7)?,
        subtitle: row.get(8)?,
        description: row.get(9)?,
    })
}

impl ScheduleStore for SqliteScheduleStore {
    fn capture_inventory(&self) -> Result<CaptureInventory> {
        let conn = self.conn();

        let cards = conn
            .prepare("SELECT card_id FROM capture_card ORDER BY card_id")?
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<CardId>>>()
            .context("Failed to read capture cards")?;

        let sources = conn
            .prepare("SELECT source_id, name FROM video_source ORDER BY source_id")?
            .query_map([], |row| {
                Ok(SourceRecord {
                    source_id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read video sources")?;

        let inputs = conn
            .prepare("SELECT input_id, card_id, source_id FROM card_input ORDER BY input_id")?
            .query_map([], |row| {
                Ok(CardInput {
                    input_id: row.get(0)?,
                    card_id: row.get(1)?,
                    source_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read card inputs")?;

        Ok(CaptureInventory {
            cards,
            sources,
            inputs,
        })
    }

    fn record_rules(&self) -> Result<Vec<RecordRule>> {
        let conn = self.conn();
        let mut rules = Vec::new();

        let singles = conn
            .prepare(
                "SELECT c.chan_id, c.source_id, c.chan_num, c.call_sign, c.name,
                        s.start_time, s.end_time, s.title, s.subtitle, s.description
                 FROM single_record s JOIN channel c ON c.chan_id = s.chan_id
                 ORDER BY s.rowid",
            )?
            .query_map([], guide_entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read single recording rules")?;
        rules.extend(singles.into_iter().map(RecordRule::Single));

        let timeslots = conn
            .prepare(
                "SELECT t.chan_id, c.source_id, t.start_time, t.title
                 FROM timeslot_record t JOIN channel c ON c.chan_id = t.chan_id
                 ORDER BY t.rowid",
            )?
            .query_map([], |row| {
                Ok(RecordRule::Timeslot {
                    chan_id: row.get(0)?,
                    source_id: row.get(1)?,
                    start_time: row.get::<_, NaiveTime>(2)?,
                    title: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read timeslot recording rules")?;
        rules.extend(timeslots);

        let titles = conn
            .prepare("SELECT title, chan_id FROM title_record ORDER BY rowid")?
            .query_map([], |row| {
                let title: Option<String> = row.get(0)?;
                let chan_id: Option<ChanId> = row.get(1)?;
                Ok(match chan_id {
                    Some(chan_id) if chan_id > 0 => RecordRule::Channel { chan_id, title },
                    _ => RecordRule::All { title },
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read title recording rules")?;
        rules.extend(titles);

        Ok(rules)
    }

    fn find_programs(&self, query: &ProgramQuery) -> Result<Vec<GuideEntry>> {
        let mut sql = String::from(
            "SELECT c.chan_id, c.source_id, c.chan_num, c.call_sign, c.name,
                    p.start_time, p.end_time, p.title, p.subtitle, p.description
             FROM program p JOIN channel c ON c.chan_id = p.chan_id
             WHERE p.title = ?1 AND p.end_time < ?2",
        );
        let mut args: Vec<Box<dyn ToSql>> =
            vec![Box::new(query.title.clone()), Box::new(query.end_before)];

        match query.start {
            StartMatch::Exactly(at) => {
                args.push(Box::new(at));
                sql.push_str(&format!(" AND p.start_time = ?{}", args.len()));
            }
            StartMatch::AtOrAfter(from) => {
                args.push(Box::new(from));
                sql.push_str(&format!(" AND p.start_time >= ?{}", args.len()));
            }
        }
        if let Some(chan_id) = query.chan_id {
            args.push(Box::new(chan_id));
            sql.push_str(&format!(" AND c.chan_id = ?{}", args.len()));
        }
        if let Some(source_id) = query.source_id {
            args.push(Box::new(source_id));
            sql.push_str(&format!(" AND c.source_id = ?{}", args.len()));
        }
        sql.push_str(" ORDER BY p.start_time, c.chan_id");

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql).context("Failed to prepare program query")?;
        let entries = stmt
            .query_map(params_from_iter(args.iter()), guide_entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read program guide")?;

        Ok(entries)
    }

    fn in_recording_history(
        &self,
        title: &str,
        subtitle: &str,
        description: &str,
    ) -> Result<bool> {
        let exists: bool = self
            .conn()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM recorded_history
                    WHERE title = ?1 AND subtitle = ?2 AND description = ?3)",
                params![title, subtitle, description],
                |row| row.get(0),
            )
            .context("Failed to check recording history")?;
        Ok(exists)
    }

    fn has_override(&self, showing: &ShowingKey) -> Result<bool> {
        let exists: bool = self
            .conn()
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM conflict_override
                    WHERE chan_id = ?1 AND start_time = ?2 AND end_time = ?3)",
                params![showing.chan_id, showing.start, showing.end],
                |row| row.get(0),
            )
            .context("Failed to check conflict override")?;
        Ok(exists)
    }

    fn disliked_showings(&self, preferred: &ShowingKey) -> Result<Vec<ShowingKey>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT dislike_chan_id, dislike_start, dislike_end FROM conflict_prefer_showing
             WHERE prefer_chan_id = ?1 AND prefer_start = ?2 AND prefer_end = ?3
             ORDER BY rowid",
        )?;
        let showings = stmt
            .query_map(
                params![preferred.chan_id, preferred.start, preferred.end],
                |row| Ok(ShowingKey::new(row.get(0)?, row.get(1)?, row.get(2)?)),
            )?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read showing preferences")?;
        Ok(showings)
    }

    fn disliked_titles(&self, preferred_title: &str) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT dislike_title FROM conflict_prefer_title WHERE prefer_title = ?1
             ORDER BY rowid",
        )?;
        let titles = stmt
            .query_map(params![preferred_title], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .context("Failed to read title preferences")?;
        Ok(titles)
    }

    fn take_change_flag(&self) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let value: Option<String> = tx
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![SETTING_RECORD_CHANGED],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read change flag")?;

        let changed = value.as_deref() == Some("yes");
        if changed {
            tx.execute(
                "UPDATE settings SET value = 'no' WHERE key = ?1",
                params![SETTING_RECORD_CHANGED],
            )
            .context("Failed to clear change flag")?;
        }
        tx.commit()?;

        Ok(changed)
    }

    fn mark_changed(&self) -> Result<()> {
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, 'yes')",
                params![SETTING_RECORD_CHANGED],
            )
            .context("Failed to raise change flag")?;
        Ok(())
    }
}

// ============================================================================
// In-memory Implementation (for tests and demos)
// ============================================================================

/// In-memory implementation of ScheduleStore
#[derive(Default)]
pub struct MemoryScheduleStore {
    inventory: RwLock<CaptureInventory>,
    rules: RwLock<Vec<RecordRule>>,
    programs: RwLock<Vec<GuideEntry>>,
    history: RwLock<HashSet<(String, String, String)>>,
    overrides: RwLock<HashSet<ShowingKey>>,
    showing_preferences: RwLock<Vec<(ShowingKey, ShowingKey)>>,
    title_preferences: RwLock<Vec<(String, String)>>,
    changed: AtomicBool,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the capture inventory
    pub fn set_inventory(&self, inventory: CaptureInventory) {
        *write(&self.inventory) = inventory;
    }

    pub fn add_rule(&self, rule: RecordRule) {
        write(&self.rules).push(rule);
    }

    pub fn add_program(&self, entry: GuideEntry) {
        write(&self.programs).push(entry);
    }

    pub fn add_history(&self, title: &str, subtitle: &str, description: &str) {
        write(&self.history).insert((
            title.to_string(),
            subtitle.to_string(),
            description.to_string(),
        ));
    }

    pub fn add_override(&self, showing: ShowingKey) {
        write(&self.overrides).insert(showing);
    }

    pub fn prefer_showing(&self, preferred: ShowingKey, disliked: ShowingKey) {
        write(&self.showing_preferences).push((preferred, disliked));
    }

    pub fn prefer_title(&self, preferred: &str, disliked: &str) {
        write(&self.title_preferences).push((preferred.to_string(), disliked.to_string()));
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl ScheduleStore for MemoryScheduleStore {
    fn capture_inventory(&self) -> Result<CaptureInventory> {
        Ok(read(&self.inventory).clone())
    }

    fn record_rules(&self) -> Result<Vec<RecordRule>> {
        Ok(read(&self.rules).clone())
    }

    fn find_programs(&self, query: &ProgramQuery) -> Result<Vec<GuideEntry>> {
        let mut entries: Vec<GuideEntry> = read(&self.programs)
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.start, entry.channel.chan_id));
        Ok(entries)
    }

    fn in_recording_history(
        &self,
        title: &str,
        subtitle: &str,
        description: &str,
    ) -> Result<bool> {
        Ok(read(&self.history).contains(&(
            title.to_string(),
            subtitle.to_string(),
            description.to_string(),
        )))
    }

    fn has_override(&self, showing: &ShowingKey) -> Result<bool> {
        Ok(read(&self.overrides).contains(showing))
    }

    fn disliked_showings(&self, preferred: &ShowingKey) -> Result<Vec<ShowingKey>> {
        Ok(read(&self.showing_preferences)
            .iter()
            .filter(|(prefer, _)| prefer == preferred)
            .map(|(_, dislike)| *dislike)
            .collect())
    }

    fn disliked_titles(&self, preferred_title: &str) -> Result<Vec<String>> {
        Ok(read(&self.title_preferences)
            .iter()
            .filter(|(prefer, _)| prefer == preferred_title)
            .map(|(_, dislike)| dislike.clone())
            .collect())
    }

    fn take_change_flag(&self) -> Result<bool> {
        Ok(self.changed.swap(false, Ordering::AcqRel))
    }

    fn mark_changed(&self) -> Result<()> {
        self.changed.store(true, Ordering::Release);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
