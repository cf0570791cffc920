//! Config command handlers

use std::path::Path;

use chatfolders_core::config::Config;

use crate::cli::args::ConfigCommands;

/// Handle a `config` subcommand. Returns true on success.
pub fn handle_config_command(
    command: Option<ConfigCommands>,
    config: &Config,
    db_override: Option<&Path>,
) -> bool {
    match command {
        None | Some(ConfigCommands::Show) => {
            show_config(config, db_override);
            true
        }
        Some(ConfigCommands::Init) => init_config(config),
    }
}

/// Show the effective configuration
fn show_config(config: &Config, db_override: Option<&Path>) {
    println!("Chatfolders Configuration");
    println!("=========================");
    match db_override {
        Some(path) => println!("Database: {} (from --db)", path.display()),
        None => match config.resolved_database_path() {
            Ok(path) => println!("Database: {}", path.display()),
            Err(e) => println!("Database: unavailable ({})", e),
        },
    }
    println!("Default folder prefix: {}", config.default_folder_prefix);
    println!("Child order: {:?}", config.child_order);
    println!("Persist expansion: {}", config.persist_expansion);
    if let Ok(config_path) = Config::default_path() {
        let note = if config_path.exists() {
            ""
        } else {
            " (not created)"
        };
        println!("Config file: {}{}", config_path.display(), note);
    }
}

/// Write the config file unless it already exists
fn init_config(config: &Config) -> bool {
    match Config::default_path() {
        Ok(path) => init_config_at(config, &path),
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn init_config_at(config: &Config, path: &Path) -> bool {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return true;
    }
    match config.save_to(path) {
        Ok(()) => {
            println!("✓ Wrote config to {}", path.display());
            true
        }
        Err(e) => {
            eprintln!("✗ Error writing config: {}", e);
            false
        }
    }
}
