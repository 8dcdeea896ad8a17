use anyhow::Result;

use recsched::config::Config;
use recsched::metrics;

use super::{classify, open_scheduler};

/// Options for the `schedule` command
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleParams {
    /// Stop after overrides and preferences
    pub manual: bool,
    pub json: bool,
    pub summary: bool,
    pub metrics: bool,
}

pub fn schedule(config: &Config, params: ScheduleParams) -> Result<()> {
    let mut scheduler = open_scheduler(config)?;

    let auto_resolve = !params.manual && config.scheduler.auto_resolve;
    let has_conflicts = scheduler
        .fill_record_lists(auto_resolve)
        .map_err(classify)?;
    let snapshot = scheduler.snapshot();

    if params.json {
        println!("{}", snapshot.to_json()?);
    } else {
        if snapshot.candidates.is_empty() {
            println!("Nothing to schedule.");
        } else {
            print!("{}", snapshot.display());
        }
        if has_conflicts {
            println!("\nUnresolved conflicts remain.");
        }
    }

    if params.summary {
        println!();
        print!("{}", snapshot.summary().display());
    }

    if params.metrics {
        let text = metrics::gather_metrics()
            .map_err(|e| anyhow::anyhow!("Failed to gather metrics: {e}"))?;
        println!();
        print!("{text}");
    }

    Ok(())
}

/// Print the earliest recording of a fresh pass
pub fn next(config: &Config) -> Result<()> {
    let mut scheduler = open_scheduler(config)?;
    scheduler
        .fill_record_lists(config.scheduler.auto_resolve)
        .map_err(classify)?;

    match scheduler.next_recording() {
        Some(candidate) => println!("{}", candidate.display()),
        None => println!("No upcoming recordings."),
    }
    Ok(())
}
