//! Configuration types for chatfolders.
//!
//! This module provides the [`Config`] struct which stores user preferences.
//! Configuration is persisted as TOML (typically at
//! `~/.config/chatfolders/config.toml` on Unix systems).
//!
//! # Key Configuration Fields
//!
//! - `database_path`: SQLite file used by the CLI
//! - `default_folder_prefix`: prefix for generated names ("Untitled 1", ...)
//! - `child_order`: how the tree orders siblings
//! - `persist_expansion`: whether expanded tree nodes are remembered
//!
//! # Example
//!
//! ```ignore
//! use chatfolders_core::config::Config;
//!
//! let config = Config::load()?;
//! println!("{}", config.default_folder_prefix);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChatFoldersError, Result};
use crate::tree::ChildOrder;

/// Default prefix for generated folder names.
pub const DEFAULT_FOLDER_PREFIX: &str = "Untitled";

/// `Config` is a data structure that represents the parts of chatfolders that the user can configure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database holding folders and topics.
    /// Falls back to `<data_dir>/chatfolders/folders.db` if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Prefix for generated folder names
    #[serde(default = "default_folder_prefix")]
    pub default_folder_prefix: String,

    /// Sibling ordering in the materialized tree
    #[serde(default)]
    pub child_order: ChildOrder,

    /// Remember which tree nodes are expanded
    #[serde(default = "default_true")]
    pub persist_expansion: bool,
}

fn default_folder_prefix() -> String {
    DEFAULT_FOLDER_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            default_folder_prefix: default_folder_prefix(),
            child_order: ChildOrder::default(),
            persist_expansion: true,
        }
    }
}

impl Config {
    /// Load config from a specific TOML file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Save config to a specific TOML file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("chatfolders").join("config.toml"))
            .ok_or(ChatFoldersError::NoConfigDir)
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Database path, falling back to the platform data directory
    pub fn resolved_database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("chatfolders").join("folders.db"))
            .ok_or(ChatFoldersError::NoConfigDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let config = Config {
            database_path: Some(PathBuf::from("/tmp/folders.db")),
            default_folder_prefix: "New Folder".to_string(),
            child_order: ChildOrder::SortOrder,
            persist_expansion: false,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_folder_prefix = \"Chat\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_folder_prefix, "Chat");
        assert!(config.persist_expansion);
        assert_eq!(config.child_order, ChildOrder::Merged);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "persist_expansion = \"maybe\"").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ChatFoldersError::ConfigParse(_))
        ));
    }
}
