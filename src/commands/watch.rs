use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;

use recsched::config::Config;
use recsched::scheduler::{ScheduleEvent, ScheduleWatcher, WatcherConfig};

use super::{classify, open_scheduler};

/// Run the change-flag watcher until Ctrl+C
pub async fn watch(config: &Config, skip_startup: bool) -> Result<()> {
    let scheduler = open_scheduler(config)?;

    let watcher_config = WatcherConfig {
        poll_interval: config.poll_interval(),
        run_on_startup: !skip_startup,
    };
    let watcher = ScheduleWatcher::new(scheduler, watcher_config).map_err(classify)?;
    let watcher = Arc::new(watcher);

    let mut events = watcher.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ScheduleEvent::Rescheduled { reason, snapshot }) => {
                    let summary = snapshot.summary();
                    println!(
                        "[{reason:?}] {} candidates, {} recording, {} conflicting",
                        summary.total, summary.recording, summary.conflicting
                    );
                    if let Some(next) = snapshot.recording().next() {
                        println!("  Next: {}", next.display());
                    }
                }
                Ok(ScheduleEvent::PassFailed { reason, error }) => {
                    println!("[{reason:?}] pass failed: {error}");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Watcher events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut runner = {
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { watcher.run().await })
    };

    println!("Watching for schedule changes. Press Ctrl+C to stop.");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            tracing::info!("Shutdown requested");
            watcher.stop();
            runner
                .await
                .context("Watcher task panicked")?
                .map_err(classify)?;
        }
        finished = &mut runner => {
            finished
                .context("Watcher task panicked")?
                .map_err(classify)?;
        }
    }

    drop(watcher);
    printer.abort();
    Ok(())
}
