use std::path::PathBuf;

use anyhow::{Context, Result};

use recsched::config::Config;
use recsched::storage::{ScheduleStore, StoreFixture};

use super::open_store;

pub fn init_db(config: &Config) -> Result<()> {
    open_store(config)?;
    println!(
        "Database ready at {}",
        config.database.sqlite_path.display()
    );
    Ok(())
}

/// Seed the database from a TOML fixture and raise the change flag
pub fn import(config: &Config, fixture: PathBuf) -> Result<()> {
    let fixture = StoreFixture::from_file(&fixture)?;
    let store = open_store(config)?;

    fixture
        .apply_sqlite(&store)
        .context("Failed to import fixture")?;
    store.mark_changed()?;

    println!("Imported into {}", config.database.sqlite_path.display());
    println!("  Cards: {}", fixture.cards.len());
    println!("  Inputs: {}", fixture.inputs.len());
    println!("  Channels: {}", fixture.channels.len());
    println!("  Programs: {}", fixture.programs.len());
    println!("  Rules: {}", fixture.rules.len());
    Ok(())
}

pub fn mark_changed(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    store.mark_changed()?;
    println!("Schedule marked as changed");
    Ok(())
}
