use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A folder record
    Folder,
    /// A topic record
    Topic,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Folder => f.write_str("Folder"),
            EntityKind::Topic => f.write_str("Topic"),
        }
    }
}

/// Unified error type for chatfolders operations
#[derive(Debug, Error)]
pub enum ChatFoldersError {
    // Model errors
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} '{id}' already exists")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("Invalid name: '{0}'. Names must not be empty or whitespace")]
    InvalidName(String),

    #[error("Moving folder '{folder}' under '{parent}' would create a cycle")]
    Cycle { folder: String, parent: String },

    #[error("The root folder cannot be deleted")]
    RootDeletion,

    #[error("'{0}' is a reserved id and cannot be used for a new folder")]
    ReservedId(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(all(not(target_arch = "wasm32"), feature = "sqlite"))]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias for chatfolders operations
pub type Result<T> = std::result::Result<T, ChatFoldersError>;

impl ChatFoldersError {
    pub(crate) fn folder_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: EntityKind::Folder,
            id: id.into(),
        }
    }

    pub(crate) fn topic_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: EntityKind::Topic,
            id: id.into(),
        }
    }

    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}

/// A serializable representation of ChatFoldersError for IPC (e.g., Tauri, WASM)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Record id the error refers to (if applicable)
    pub id: Option<String>,
}

impl From<&ChatFoldersError> for SerializableError {
    fn from(err: &ChatFoldersError) -> Self {
        let kind = match err {
            ChatFoldersError::NotFound { .. } => "NotFound",
            ChatFoldersError::DuplicateId { .. } => "DuplicateId",
            ChatFoldersError::InvalidName(_) => "InvalidName",
            ChatFoldersError::Cycle { .. } => "Cycle",
            ChatFoldersError::RootDeletion => "RootDeletion",
            ChatFoldersError::ReservedId(_) => "ReservedId",
            ChatFoldersError::Storage(_) => "Storage",
            ChatFoldersError::Json(_) => "Json",
            #[cfg(all(not(target_arch = "wasm32"), feature = "sqlite"))]
            ChatFoldersError::Database(_) => "Database",
            ChatFoldersError::Io(_) => "Io",
            ChatFoldersError::ConfigParse(_) => "ConfigParse",
            ChatFoldersError::ConfigSerialize(_) => "ConfigSerialize",
            ChatFoldersError::NoConfigDir => "NoConfigDir",
        }
        .to_string();

        let id = match err {
            ChatFoldersError::NotFound { id, .. } => Some(id.clone()),
            ChatFoldersError::DuplicateId { id, .. } => Some(id.clone()),
            ChatFoldersError::Cycle { folder, .. } => Some(folder.clone()),
            ChatFoldersError::ReservedId(id) => Some(id.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            id,
        }
    }
}

impl From<ChatFoldersError> for SerializableError {
    fn from(err: ChatFoldersError) -> Self {
        SerializableError::from(&err)
    }
}
