//! Command-line argument structures and enums

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatfolders")]
#[command(version)]
#[command(about = "Organize chat topics into folders", long_about = None)]
pub struct Cli {
    /// Override the database location
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, rename, move and delete folders
    #[command(alias = "f")]
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },

    /// Register, rename, assign and delete topics
    #[command(alias = "t")]
    Topic {
        #[command(subcommand)]
        command: TopicCommands,
    },

    /// Show the folder tree
    Tree {
        /// Maximum depth to display (default: unlimited)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Show every folder expanded, ignoring saved expansion state
        #[arg(short, long)]
        all: bool,
    },

    /// Expand or collapse a folder in `tree` output
    Toggle {
        /// Folder id or name
        folder: String,
    },

    /// Check the folder hierarchy for broken links
    Check,

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum FolderCommands {
    /// Create a folder
    Create {
        /// Folder name (default: next free "Untitled N")
        name: Option<String>,

        /// Parent folder id or name (default: root)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Rename a folder
    Rename {
        /// Folder id or name
        folder: String,

        /// New name
        name: String,
    },

    /// Delete a folder and everything below it
    #[command(alias = "rm")]
    Delete {
        /// Folder id or name
        folder: String,
    },

    /// Move a folder under another parent
    #[command(alias = "mv")]
    Move {
        /// Folder id or name
        folder: String,

        /// New parent id or name (default: root)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// List all folders
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum TopicCommands {
    /// Register a topic
    Add {
        /// Topic name
        name: String,

        /// Topic id (default: generated)
        #[arg(long)]
        id: Option<String>,

        /// Owning assistant id
        #[arg(short, long, default_value = "default")]
        assistant: String,

        /// Folder id or name to file it in
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Rename a topic
    Rename {
        /// Topic id
        id: String,

        /// New name
        name: String,
    },

    /// Delete a topic
    #[command(alias = "rm")]
    Delete {
        /// Topic id
        id: String,
    },

    /// Put topics into a folder, taking them out of any other folder
    Assign {
        /// Folder id or name
        folder: String,

        /// Topic ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Move topics between folders
    #[command(alias = "mv")]
    Move {
        /// Source folder id or name (default: unassigned)
        #[arg(long)]
        from: Option<String>,

        /// Target folder id or name (default: unassigned)
        #[arg(long)]
        to: Option<String>,

        /// Topic ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List topics, optionally only those in one folder
    #[command(alias = "ls")]
    List {
        /// Folder id or name
        #[arg(short, long)]
        folder: Option<String>,

        /// Only topics no folder holds
        #[arg(short, long, conflicts_with = "folder")]
        unassigned: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a default config file if none exists
    Init,
}
