//! Calendar watcher CLI
//!
//! Local execution entry point. For AWS Lambda, use `calendar-watch-lambda`.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use clap::{Parser, Subcommand};

use calendar_watch::{
    error::{AppError, Result},
    models::Config,
    pipeline::{InvocationResult, run_once},
    services::{
        CalendarFetcher, EnvCredentials, EventExtractor, FileSource, HttpMailer, LogNotifier,
        PageSource,
    },
    storage::{LocalStore, MemoryStore, SnapshotStore},
};

/// Calendar watcher - reports changes on a public HTML calendar
#[derive(Parser, Debug)]
#[command(name = "calendar-watch", version, about = "Watches an HTML calendar for changes")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Snapshot directory (overrides storage.dir)
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, diff against the snapshot and notify
    Run {
        /// Leave the snapshot untouched and log the mail instead of sending it
        #[arg(long)]
        dry_run: bool,

        /// Read the calendar page from a saved HTML file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the events found on the calendar page as JSON
    Extract {
        /// Read the calendar page from a saved HTML file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List the rows of the stored snapshot
    Snapshot,

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, config_level: &str) {
    let level = if verbose { "debug" } else { config_level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn page_source(config: &Config, file: Option<PathBuf>) -> Result<Box<dyn PageSource>> {
    Ok(match file {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(CalendarFetcher::new(&config.source)?),
    })
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config);
    init_logging(cli.verbose, &config.logging.level);
    log::info!("Loaded configuration from {}", cli.config.display());

    let storage_dir = cli
        .storage_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.storage.dir));
    let store = LocalStore::new(&storage_dir);

    match cli.command {
        Command::Run { dry_run, file } => {
            config.validate()?;
            let source = page_source(&config, file)?;
            let start = Instant::now();

            let result = if dry_run {
                log::info!("Dry run: snapshot at {} stays untouched", storage_dir.display());
                let scratch = MemoryStore::with_rows(store.scan().await?);
                run_once(&config, source.as_ref(), &scratch, &LogNotifier, Utc::now()).await
            } else {
                let mailer = HttpMailer::new(&config.notify, EnvCredentials)?;
                run_once(&config, source.as_ref(), &store, &mailer, Utc::now()).await
            };

            let invocation = InvocationResult::from_run(result, start.elapsed());
            println!("{}", serde_json::to_string_pretty(&invocation)?);

            if let Some(message) = invocation.error {
                return Err(AppError::validation(format!("run failed: {message}")));
            }
        }

        Command::Extract { file } => {
            let source = page_source(&config, file)?;
            let body = source.fetch().await?;
            let events = EventExtractor::new(&config.extract).extract(&body);

            log::info!("Extracted {} events", events.len());
            println!("{}", serde_json::to_string_pretty(&events)?);
        }

        Command::Snapshot => {
            let rows = store.scan().await?;
            log::info!("Snapshot at {}: {} rows", store.root().display(), rows.len());
            for row in rows {
                println!("{}  {}  {}", row.key, row.date, row.description);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if config.notify.recipients.is_empty() {
                log::warn!("notify.recipients is empty; reports cannot be delivered");
            }
            log::info!("✓ Config OK");
        }
    }

    log::info!("Done!");

    Ok(())
}
