//! Command pattern API for unified command execution.
//!
//! UI collaborators (a desktop shell over IPC, a WASM build, the CLI) drive the
//! folder model through one serializable [`Command`] enum and receive a
//! [`Response`], instead of binding every [`FolderManager`] method separately.
//!
//! # Usage
//!
//! ```ignore
//! use chatfolders_core::{Command, Response};
//!
//! let cmd = Command::CreateFolder { name: "Work".to_string(), parent_id: None };
//! if let Response::Folder(folder) = manager.execute(cmd)? {
//!     println!("created {}", folder.id);
//! }
//! ```
//!
//! [`FolderManager`]: crate::manager::FolderManager

use serde::{Deserialize, Serialize};

use crate::error::SerializableError;
use crate::manager::DeletedSubtree;
use crate::store::BatchReport;
use crate::tree::TreeNode;
use crate::types::{Folder, Topic};
use crate::validate::ValidationResult;

// ============================================================================
// Command Types
// ============================================================================

/// All commands that can be executed against a folder manager.
///
/// Commands are serializable for cross-runtime usage (WASM, IPC, etc.).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Command {
    // === Folder Operations ===
    /// Create a folder.
    CreateFolder {
        /// Display name (trimmed, must not be blank).
        name: String,
        /// Parent folder; the root when omitted.
        #[serde(default)]
        parent_id: Option<String>,
    },

    /// Rename a folder.
    RenameFolder {
        /// Folder id.
        id: String,
        /// New name. Blank or unchanged names are ignored.
        name: String,
    },

    /// Delete a folder and its descendants.
    DeleteFolder {
        /// Folder id.
        id: String,
    },

    /// Move a folder under another parent.
    ReparentFolder {
        /// Folder id.
        id: String,
        /// New parent; the root when omitted.
        #[serde(default)]
        parent_id: Option<String>,
    },

    // === Topic Operations ===
    /// Add topics to a folder, removing them from any other folder.
    AssignTopics {
        /// Target folder id.
        folder_id: String,
        /// Topic ids to assign.
        topic_ids: Vec<String>,
    },

    /// Move topics between folders.
    MoveTopics {
        /// Folder currently holding the topics; omit for unassigned topics.
        #[serde(default)]
        source_id: Option<String>,
        /// Destination folder; omit to unassign.
        #[serde(default)]
        target_id: Option<String>,
        /// Topic ids to move.
        topic_ids: Vec<String>,
    },

    /// Register a topic created by the chat layer.
    RegisterTopic {
        /// Topic metadata. Messages are dropped.
        topic: Topic,
        /// Folder to assign it to.
        #[serde(default)]
        folder_id: Option<String>,
    },

    /// Replace a topic's metadata.
    UpdateTopic {
        /// Topic metadata. Messages are dropped.
        topic: Topic,
    },

    /// Rename a topic.
    RenameTopic {
        /// Topic id.
        id: String,
        /// New name. Blank or unchanged names are ignored.
        name: String,
    },

    /// Delete a topic and unassign it.
    DeleteTopic {
        /// Topic id.
        id: String,
    },

    /// Replace every topic with the given list.
    SyncTopics {
        /// The chat layer's current topics.
        topics: Vec<Topic>,
    },

    // === Queries ===
    /// Get the display tree.
    GetTree {
        /// Levels below the root to include.
        #[serde(default)]
        depth: Option<u32>,
        /// Expanded folder ids; the persisted set when omitted.
        #[serde(default)]
        expanded: Option<Vec<String>>,
    },

    /// Get a folder by id.
    GetFolder {
        /// Folder id.
        id: String,
    },

    /// Get a topic by id.
    GetTopic {
        /// Topic id.
        id: String,
    },

    /// List all folders, least recently updated first.
    ListFolders,

    /// List all topics, least recently updated first.
    ListTopics,

    /// Get the child folders of a folder.
    GetChildren {
        /// Folder id.
        id: String,
    },

    /// Get the topics assigned to a folder.
    GetFolderTopics {
        /// Folder id.
        id: String,
    },

    /// Get topics no folder holds.
    GetUnassignedTopics,

    /// Get the root's own topics followed by unassigned topics.
    GetRootTopics,

    /// Get the ancestor chain of a folder, root first.
    GetFolderPath {
        /// Folder id.
        id: String,
    },

    /// Get the first free default folder name.
    NextUntitledName,

    /// Check structural integrity.
    Validate,

    // === UI State ===
    /// Get the persisted expanded folder ids.
    GetExpandedKeys,

    /// Persist the expanded folder ids.
    SetExpandedKeys {
        /// Expanded folder ids.
        ids: Vec<String>,
    },

    /// Flip one folder's expanded state and persist it.
    ToggleExpanded {
        /// Folder id.
        id: String,
    },
}

// ============================================================================
// Response Types
// ============================================================================

/// Responses from command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Response {
    /// Command completed successfully with no data.
    Ok,

    /// String response.
    String(String),

    /// Boolean response.
    Bool(bool),

    /// Single folder response.
    Folder(Folder),

    /// Folder list response.
    Folders(Vec<Folder>),

    /// Single topic response.
    Topic(Topic),

    /// Topic list response.
    Topics(Vec<Topic>),

    /// Tree node response.
    Tree(TreeNode),

    /// Cascading delete response.
    DeletedSubtree(DeletedSubtree),

    /// Bulk operation response.
    Batch(BatchOutcome),

    /// Validation result response.
    ValidationResult(ValidationResult),

    /// String array response.
    Strings(Vec<String>),
}

// ============================================================================
// Helper Types
// ============================================================================

/// Serializable form of a [`BatchReport`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Ids that were written.
    pub applied: Vec<String>,
    /// Per-item failures.
    pub failed: Vec<SerializableError>,
}

impl From<BatchReport> for BatchOutcome {
    fn from(report: BatchReport) -> Self {
        Self {
            applied: report.applied,
            failed: report
                .failed
                .into_iter()
                .map(|(id, e)| SerializableError {
                    id: Some(id),
                    ..e.to_serializable()
                })
                .collect(),
        }
    }
}
