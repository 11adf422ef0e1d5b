//! DataSoup CLI
//!
//! Tracks the open-data catalog, diffs changed CSV resources, and posts
//! notifications to the configured chat channel.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use datasoup::{
    dashboard,
    error::Result,
    models::Config,
    pipeline,
    services::CatalogClient,
    storage::{CatalogStore, LocalStore},
};

/// DataSoup - Open-Data Catalog Change Tracker
#[derive(Parser, Debug)]
#[command(name = "datasoup", version, about = "Tracks catalog changes and notifies a chat channel")]
struct Cli {
    /// Path to the storage directory holding config, snapshot, and resources
    #[arg(short, long, default_value = "data")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a synchronization pass
    Sync {
        /// Seed the content store concurrently instead of running the
        /// incremental diff-and-notify pass
        #[arg(long)]
        bootstrap: bool,
    },

    /// Serve the read-only monitoring dashboard
    Dashboard,

    /// Validate the configuration file
    Validate,

    /// Show current snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    let store = LocalStore::new(&cli.storage_dir, config.storage.snapshot_file.clone());

    match cli.command {
        Command::Sync { bootstrap } => {
            if bootstrap {
                log::info!("Bootstrapping the content store");
                pipeline::run_bootstrap(&config, &store).await?;
            } else {
                log::info!("Running incremental update pass");
                pipeline::run_update(&config, &store).await?;
            }
        }

        Command::Dashboard => {
            dashboard::run_dashboard(&config, Arc::new(store)).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {e}");
                return Err(e);
            }
            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            match store.read_snapshot().await? {
                Some(raw) => match CatalogClient::parse(&raw) {
                    Ok(listing) => {
                        log::info!("Snapshot datasets: {}", listing.result.results.len());
                        if let Some(reference) = listing.reference_time() {
                            log::info!("Reference timestamp: {reference}");
                        }
                        if let Some(updated) = store.snapshot_modified().await? {
                            log::info!("Last updated: {updated}");
                        }
                    }
                    Err(e) => log::warn!("Snapshot present but unreadable: {e}"),
                },
                None => log::info!("No snapshot found yet."),
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
