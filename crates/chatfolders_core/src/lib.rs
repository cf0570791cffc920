#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Clock and id generator collaborators
pub mod clock;

/// Command pattern API (serializable commands and responses)
pub mod command;

/// Command execution for the folder manager
pub mod command_handler;

/// Configuration options
pub mod config;

/// Error (common error types)
pub mod error;

/// Hierarchy index (derived parent/child and membership queries)
pub mod index;

/// Folder manager (mutations that keep the hierarchy consistent)
pub mod manager;

/// In-memory storage backend
pub mod memory_storage;

/// Load-time repair of stored records
pub mod reconcile;

/// SQLite storage backend
#[cfg(all(not(target_arch = "wasm32"), feature = "sqlite"))]
pub mod sqlite_storage;

/// Durable storage abstraction
pub mod storage;

/// Entity store (normalized folders and topics)
pub mod store;

/// Tree materializer and expansion state
pub mod tree;

/// Folder and topic records
pub mod types;

/// Validate (check hierarchy integrity)
pub mod validate;

#[cfg(test)]
pub mod test_utils;

pub use clock::{Clock, IdGenerator, ManualClock, SequentialIds, SystemClock, UuidGenerator};
pub use command::{BatchOutcome, Command, Response};
pub use config::Config;
pub use error::{ChatFoldersError, EntityKind, Result, SerializableError};
pub use index::HierarchyIndex;
pub use manager::{DeletedSubtree, FolderManager};
pub use memory_storage::MemoryStorage;
#[cfg(all(not(target_arch = "wasm32"), feature = "sqlite"))]
pub use sqlite_storage::SqliteStorage;
pub use storage::{ChangeBatch, FolderStorage};
pub use store::{BatchReport, EntityStore};
pub use tree::{ChildOrder, ExpansionState, NodeKind, TreeNode, TreeOptions};
pub use types::{Folder, ROOT_FOLDER_ID, Topic};
