//! Data collaborators for the scheduler
//!
//! The scheduler reads capture inventory, recording rules, the program guide,
//! recording history and conflict preferences through [`ScheduleStore`].
//! SQLite is the production backend; the in-memory store backs tests and demos.
//! [`StoreFixture`] seeds either backend from a TOML file.

pub mod fixture;
pub mod repository;

pub use fixture::StoreFixture;
pub use repository::{
    CaptureInventory, CardInput, MemoryScheduleStore, ProgramQuery, ScheduleStore,
    SourceRecord, SqliteScheduleStore, StartMatch,
};
