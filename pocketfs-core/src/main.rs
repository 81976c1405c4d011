//! pfs: one-shot command line front end for the navigation core.
//!
//! Each invocation builds a manager from the user config, performs a single
//! operation and prints the listing it leaves behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use pocketfs_core::{
    NavigationManager, NavigationState,
    access::{EnvironmentInfo, RuntimeSignals},
    config::Config,
    fs::SortKey,
    logging::init_logging_with_config,
    util::humanize::{format_age, format_size},
};

/// Browse and manage files inside the sandboxed storage root.
#[derive(Parser, Debug)]
#[command(name = "pfs")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// List a directory (defaults to the storage root)
    Ls {
        path: Option<PathBuf>,

        /// name, date, size or type
        #[arg(long, short)]
        sort: Option<SortKey>,
    },

    /// Create a folder in the storage root
    Mkdir { name: String },

    /// Delete a file or folder
    Rm { path: PathBuf },

    /// Rename an item in place
    Rename { path: PathBuf, name: String },

    /// Copy an item to a new path
    Cp { source: PathBuf, destination: PathBuf },

    /// Move an item to a new path
    Mv { source: PathBuf, destination: PathBuf },

    /// Print the detected capability tier and runtime signals
    Env,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path).await,
        None => Config::load().await,
    }
    .context("Failed to load configuration")?;

    let _guard = init_logging_with_config(config.logging.clone())
        .await
        .context("Failed to initialise logging")?;

    let manager = NavigationManager::from_config(&config)?;
    info!(tier = %manager.tier(), command = ?cli.command, "pfs starting");

    if let Commands::Env = cli.command {
        let signals = RuntimeSignals::from_config(&config.runtime).with_env_overrides();
        let info = EnvironmentInfo::new(manager.tier(), config.storage.platform, signals);
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    // Desktop document roots are created on first use
    if !config.storage.platform.is_mobile() {
        tokio::fs::create_dir_all(manager.guard().root())
            .await
            .context("Failed to create the documents root")?;
    }

    if let Err(e) = manager.init().await {
        warn!(error = %e, "Initial listing failed");
    }
    let resolve = |path: &Path| -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            manager.current_location().join(path)
        }
    };

    match cli.command {
        Commands::Ls { path, sort } => {
            if let Some(key) = sort {
                manager.set_sort(key);
            }
            if let Some(path) = path {
                manager.navigate_to(resolve(&path)).await?;
            }
        }
        Commands::Mkdir { name } => {
            let created = manager.create_folder(&name).await?;
            println!("created {}", created.display());
        }
        Commands::Rm { path } => {
            let target = resolve(&path);
            manager.delete_item(&target).await?;
            println!("deleted {}", target.display());
        }
        Commands::Rename { path, name } => {
            let renamed = manager.rename_item(resolve(&path), &name).await?;
            println!("renamed to {}", renamed.display());
        }
        Commands::Cp {
            source,
            destination,
        } => {
            let copied = manager
                .copy_item(resolve(&source), resolve(&destination))
                .await?;
            println!("copied to {}", copied.display());
        }
        Commands::Mv {
            source,
            destination,
        } => {
            let moved = manager
                .move_item(resolve(&source), resolve(&destination))
                .await?;
            println!("moved to {}", moved.display());
        }
        Commands::Env => {}
    }

    print_listing(&manager.snapshot());
    Ok(())
}

fn print_listing(state: &NavigationState) {
    println!("{}  (sort: {})", state.current_location.display(), state.sort);

    if let Some(err) = &state.last_error {
        println!("! {err}");
    }

    let now = Utc::now();
    for entry in &state.entries {
        let size = if entry.is_dir() {
            "-".to_string()
        } else {
            format_size(entry.size())
        };
        let age = entry
            .modified()
            .map_or_else(|| "unknown".to_string(), |m| format_age(m, now));

        println!(
            "{:<8} {:>12}  {:<20} {}{}",
            entry.kind().as_str(),
            size,
            age,
            entry.name(),
            if entry.is_dir() { "/" } else { "" }
        );
    }
}
