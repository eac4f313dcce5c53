//! Command line entry point for the table-tennis league rating tools
//!
//! Applies league sessions to a ratings file, syncs ratings from an
//! authoritative list and shows stored ratings.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tt_league::config::AppConfig;
use tt_league::feed::{load_authoritative, JsonSessionFeed};
use tt_league::rating::TableVersion;
use tt_league::seeding::{parse_seeds, Console, ScriptedConsole, TerminalConsole};
use tt_league::service::{LeagueService, NewLeagueOptions, RunStatus};
use tt_league::store::JsonFileStore;
use tt_league::utils::{parse_date, today};

/// Table-tennis league ratings
#[derive(Parser)]
#[command(
    name = "tt-league",
    version,
    about = "Table-driven rating updates for a table-tennis league",
    long_about = "Applies the results of a league session to a ratings file using fixed \
                 rating-gap / game-margin lookup tables, with seeding of new players, \
                 backups and authoritative overwrites."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Ratings file override
    #[arg(long, value_name = "FILE", help = "Override ratings file path")]
    ratings_path: Option<PathBuf>,

    /// Rating table override
    #[arg(long, value_name = "VERSION", help = "Rating table (standard, long_form)")]
    table_version: Option<TableVersion>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a new league session
    NewLeague {
        /// League date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Session scores file (JSON)
        #[arg(long, value_name = "FILE")]
        scores: PathBuf,
        /// Save the updated ratings
        #[arg(long)]
        execute: bool,
        /// Print a summary line for every match
        #[arg(long)]
        print_out: bool,
        /// Answer yes to every confirmation
        #[arg(long)]
        yes: bool,
        /// Initial ratings for new players instead of prompting (JSON)
        #[arg(long, value_name = "FILE")]
        seeds: Option<PathBuf>,
    },
    /// Overwrite ratings from an authoritative list
    Sync {
        /// Date recorded in each player's history
        #[arg(long)]
        date: String,
        /// Authoritative ratings file: [{"name": ..., "rating": ...}]
        #[arg(long, value_name = "FILE")]
        ratings: PathBuf,
        /// Save the updated ratings
        #[arg(long)]
        execute: bool,
        /// Answer yes to every confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Show ratings for players, or `all`
    Show {
        /// Only the current rating and active status
        #[arg(long)]
        current: bool,
        #[arg(required = true)]
        names: Vec<String>,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(config_path) => {
            let mut config = AppConfig::from_file(config_path)?;
            config.apply_env()?;
            config
        }
        None => AppConfig::from_env()?,
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if args.debug {
        config.service.log_level = "debug".to_string();
    }
    if let Some(path) = &args.ratings_path {
        config.storage.ratings_path = path.clone();
    }
    if let Some(version) = args.table_version {
        config.league.table_version = version;
    }

    tt_league::config::validate_config(&config)?;
    Ok(config)
}

/// Console for a run: scripted when answers are preset, the terminal otherwise
async fn console_for(yes: bool, seeds: Option<&PathBuf>) -> Result<Box<dyn Console>> {
    match seeds {
        Some(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            Ok(Box::new(
                ScriptedConsole::new(yes)
                    .with_seeds(parse_seeds(&text)?)
                    .with_echo(),
            ))
        }
        None if yes => Ok(Box::new(ScriptedConsole::new(true).with_echo())),
        None => Ok(Box::new(TerminalConsole::stdio())),
    }
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    let store = Arc::new(JsonFileStore::new(
        &config.storage.ratings_path,
        &config.storage.backup_dir,
    ));
    let service = LeagueService::new(config, store)?;

    match args.command {
        Command::NewLeague {
            date,
            scores,
            execute,
            print_out,
            yes,
            seeds,
        } => {
            let date = parse_date(&date)?;
            let feed = JsonSessionFeed::new(&scores);
            let mut console = console_for(yes, seeds.as_ref()).await?;

            let options = NewLeagueOptions {
                execute,
                print_out,
                expected_date: Some(date),
            };
            let report = service.new_league(&feed, console.as_mut(), options).await?;

            if let RunStatus::Saved { backup: Some(path) } = &report.status {
                info!("Previous ratings backed up to {}", path.display());
            }
        }
        Command::Sync {
            date,
            ratings,
            execute,
            yes,
        } => {
            let date = parse_date(&date)?;
            let ratings = load_authoritative(&ratings).await?;
            let mut console = console_for(yes, None).await?;

            service.sync(&ratings, date, console.as_mut(), execute).await?;
        }
        Command::Show { current, names } => {
            let mut console = ScriptedConsole::new(false).with_echo();
            service.show(&names, current, today(), &mut console).await?;
        }
    }

    service.write_metrics().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args, config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
