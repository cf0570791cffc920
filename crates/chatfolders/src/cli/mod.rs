/// Clap argument definitions
mod args;

/// Config command handlers
mod config;

/// Folder command handlers
mod folder;

/// Topic command handlers
mod topic;

/// `tree`, `toggle` and `check` commands
mod tree;

/// Shared CLI utilities
mod util;

use std::sync::Arc;

use clap::Parser;

use chatfolders_core::config::Config;
use chatfolders_core::{FolderManager, SqliteStorage, SystemClock, UuidGenerator};

pub use args::Cli;
use args::Commands;

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    };

    // Config commands never touch the database
    if let Commands::Config { command } = cli.command {
        if !config::handle_config_command(command, &config, cli.db.as_deref()) {
            std::process::exit(1);
        }
        return;
    }

    let mut manager = match open_manager(&cli, config) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    // Execute commands and track success
    let success = match cli.command {
        Commands::Folder { command } => folder::handle_folder_command(&mut manager, command),
        Commands::Topic { command } => topic::handle_topic_command(&mut manager, command),
        Commands::Tree { depth, all } => tree::handle_tree(&manager, depth, all),
        Commands::Toggle { folder } => tree::handle_toggle(&manager, &folder),
        Commands::Check => tree::handle_check(&manager),
        Commands::Config { .. } => true,
    };

    if !success {
        std::process::exit(1);
    }
}

/// Open the SQLite database and load the folder model from it.
fn open_manager(cli: &Cli, config: Config) -> chatfolders_core::Result<FolderManager> {
    let path = match &cli.db {
        Some(path) => path.clone(),
        None => config.resolved_database_path()?,
    };
    log::debug!("Opening database {}", path.display());
    let storage = SqliteStorage::open(&path)?;
    FolderManager::load(
        Arc::new(storage),
        Arc::new(UuidGenerator),
        Arc::new(SystemClock),
        config,
    )
}
