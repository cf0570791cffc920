//! Storage abstraction for durable persistence.
//!
//! This module defines the [`FolderStorage`] trait which abstracts over
//! different backends (SQLite, in-memory) for persisting folder and topic
//! records. The core only relies on id-keyed upsert and delete; the layout of
//! the records on disk belongs to the backend.
//!
//! # Storage Model
//!
//! A backend keeps three things:
//! 1. **Folders** keyed by id
//! 2. **Topics** keyed by id
//! 3. **Values**: a small string key-value area for UI state such as the set
//!    of expanded tree nodes

use crate::error::ChatFoldersError;
use crate::types::{Folder, Topic};

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, ChatFoldersError>;

/// A set of record writes and deletes produced by one mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeBatch {
    /// Folders to upsert
    pub folders: Vec<Folder>,
    /// Topics to upsert
    pub topics: Vec<Topic>,
    /// Folder ids to delete
    pub removed_folders: Vec<String>,
    /// Topic ids to delete
    pub removed_topics: Vec<String>,
}

impl ChangeBatch {
    /// Returns true if the batch contains nothing to write.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
            && self.topics.is_empty()
            && self.removed_folders.is_empty()
            && self.removed_topics.is_empty()
    }
}

/// Trait for durable folder/topic storage backends.
pub trait FolderStorage: Send + Sync {
    /// Load every stored folder.
    fn load_folders(&self) -> StorageResult<Vec<Folder>>;

    /// Load every stored topic.
    fn load_topics(&self) -> StorageResult<Vec<Topic>>;

    /// Insert or replace a folder record.
    fn save_folder(&self, folder: &Folder) -> StorageResult<()>;

    /// Insert or replace a topic record.
    fn save_topic(&self, topic: &Topic) -> StorageResult<()>;

    /// Delete a folder record. Deleting a missing id is not an error.
    fn delete_folder(&self, id: &str) -> StorageResult<()>;

    /// Delete a topic record. Deleting a missing id is not an error.
    fn delete_topic(&self, id: &str) -> StorageResult<()>;

    /// Read a value from the key-value area.
    fn get_value(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value to the key-value area.
    fn set_value(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Apply a whole change batch.
    ///
    /// Backends with transactions should override this so the batch lands
    /// atomically (a cascading folder delete is one batch).
    fn apply_batch(&self, batch: &ChangeBatch) -> StorageResult<()> {
        // Default implementation: apply sequentially (not atomic)
        for folder in &batch.folders {
            self.save_folder(folder)?;
        }
        for topic in &batch.topics {
            self.save_topic(topic)?;
        }
        for id in &batch.removed_folders {
            self.delete_folder(id)?;
        }
        for id in &batch.removed_topics {
            self.delete_topic(id)?;
        }
        Ok(())
    }
}
