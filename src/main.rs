use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recsched::config::Config;
use recsched::error::Error;

mod commands;

#[derive(Parser)]
#[command(
    name = "recsched",
    version,
    about = "Recording scheduler that assigns guide showings to capture cards",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML). Environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the SQLite database path
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    InitDb,

    /// Load cards, channels, guide data and rules from a TOML fixture
    Import {
        /// Fixture file path
        fixture: PathBuf,
    },

    /// Run one scheduling pass and print the decision list
    Schedule {
        /// Skip the automatic best-pick; only overrides and preferences apply
        #[arg(long, default_value = "false")]
        manual: bool,

        /// Print the snapshot as JSON
        #[arg(long, default_value = "false")]
        json: bool,

        /// Print per-card summary statistics
        #[arg(long, default_value = "false")]
        summary: bool,

        /// Print Prometheus metrics after the pass
        #[arg(long, default_value = "false")]
        metrics: bool,
    },

    /// Print the next recording
    Next,

    /// Reschedule whenever the change flag is raised
    Watch {
        /// Wait for the first change instead of running a pass at startup
        #[arg(long, default_value = "false")]
        skip_startup: bool,
    },

    /// Raise the schedule change flag
    MarkChanged,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(database) = cli.database {
        config.database.sqlite_path = database;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    config
        .validate()
        .map_err(|e| Error::config(format!("{e:#}")))?;

    // Initialize tracing/logging
    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;

    if let Err(e) = recsched::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics disabled");
    }

    tracing::info!(
        database = %config.database.sqlite_path.display(),
        "recsched starting"
    );

    match cli.command {
        Commands::InitDb => {
            tracing::info!("Starting init-db command");
            commands::init_db(&config)?;
        }

        Commands::Import { fixture } => {
            tracing::info!(fixture = %fixture.display(), "Starting import command");
            commands::import(&config, fixture)?;
        }

        Commands::Schedule {
            manual,
            json,
            summary,
            metrics,
        } => {
            tracing::info!(
                manual = %manual,
                json = %json,
                "Starting schedule command"
            );
            let params = commands::ScheduleParams {
                manual,
                json,
                summary,
                metrics,
            };
            commands::schedule(&config, params)?;
        }

        Commands::Next => {
            tracing::info!("Starting next command");
            commands::next(&config)?;
        }

        Commands::Watch { skip_startup } => {
            tracing::info!(
                poll_secs = %config.scheduler.poll_interval_secs,
                skip_startup = %skip_startup,
                "Starting watch command"
            );
            commands::watch(&config, skip_startup).await?;
        }

        Commands::MarkChanged => {
            tracing::info!("Starting mark-changed command");
            commands::mark_changed(&config)?;
        }
    }

    tracing::info!("recsched completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("recsched=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new(format!("recsched={level},warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
