//! In-memory storage implementation for testing.
//!
//! This provides a simple in-memory implementation of [`FolderStorage`]
//! for use in unit tests and development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::error::ChatFoldersError;
use crate::storage::{ChangeBatch, FolderStorage, StorageResult};
use crate::types::{Folder, Topic};

/// In-memory storage for testing.
///
/// Records keep their insertion order so reloads are deterministic.
/// Data is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    folders: RwLock<IndexMap<String, Folder>>,
    topics: RwLock<IndexMap<String, Topic>>,
    values: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

fn read<T>(lock: &RwLock<T>) -> StorageResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| ChatFoldersError::Storage(format!("lock poisoned: {}", e)))
}

fn write<T>(lock: &RwLock<T>) -> StorageResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| ChatFoldersError::Storage(format!("lock poisoned: {}", e)))
}

impl MemoryStorage {
    /// Create a new empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed storage with records (builder pattern).
    pub fn with_records(self, folders: Vec<Folder>, topics: Vec<Topic>) -> Self {
        if let Ok(mut stored) = self.folders.write() {
            stored.extend(folders.into_iter().map(|f| (f.id.clone(), f)));
        }
        if let Ok(mut stored) = self.topics.write() {
            stored.extend(topics.into_iter().map(|t| (t.id.clone(), t)));
        }
        self
    }

    /// Make every subsequent write fail, to exercise error paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Get a stored folder (for test assertions).
    pub fn folder(&self, id: &str) -> Option<Folder> {
        read(&self.folders).ok()?.get(id).cloned()
    }

    /// Get a stored topic (for test assertions).
    pub fn topic(&self, id: &str) -> Option<Topic> {
        read(&self.topics).ok()?.get(id).cloned()
    }

    /// Number of stored folders.
    pub fn folder_count(&self) -> usize {
        read(&self.folders).map(|f| f.len()).unwrap_or(0)
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ChatFoldersError::Storage("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl FolderStorage for MemoryStorage {
    fn load_folders(&self) -> StorageResult<Vec<Folder>> {
        Ok(read(&self.folders)?.values().cloned().collect())
    }

    fn load_topics(&self) -> StorageResult<Vec<Topic>> {
        Ok(read(&self.topics)?.values().cloned().collect())
    }

    fn save_folder(&self, folder: &Folder) -> StorageResult<()> {
        self.check_writable()?;
        write(&self.folders)?.insert(folder.id.clone(), folder.clone());
        Ok(())
    }

    fn save_topic(&self, topic: &Topic) -> StorageResult<()> {
        self.check_writable()?;
        write(&self.topics)?.insert(topic.id.clone(), topic.clone());
        Ok(())
    }

    fn delete_folder(&self, id: &str) -> StorageResult<()> {
        self.check_writable()?;
        write(&self.folders)?.shift_remove(id);
        Ok(())
    }

    fn delete_topic(&self, id: &str) -> StorageResult<()> {
        self.check_writable()?;
        write(&self.topics)?.shift_remove(id);
        Ok(())
    }

    fn get_value(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(read(&self.values)?.get(key).cloned())
    }

    fn set_value(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable()?;
        write(&self.values)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn apply_batch(&self, batch: &ChangeBatch) -> StorageResult<()> {
        // Check once up front so a failing batch leaves nothing behind.
        self.check_writable()?;
        let mut folders = write(&self.folders)?;
        let mut topics = write(&self.topics)?;
        for folder in &batch.folders {
            folders.insert(folder.id.clone(), folder.clone());
        }
        for topic in &batch.topics {
            topics.insert(topic.id.clone(), topic.clone());
        }
        for id in &batch.removed_folders {
            folders.shift_remove(id);
        }
        for id in &batch.removed_topics {
            topics.shift_remove(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_folder() {
        let storage = MemoryStorage::new();
        storage.save_folder(&Folder::new("a", "A")).unwrap();
        let loaded = storage.load_folders().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "A");
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let storage = MemoryStorage::new();
        storage.delete_folder("nope").unwrap();
        storage.delete_topic("nope").unwrap();
    }

    #[test]
    fn test_values() {
        let storage = MemoryStorage::new();
        assert!(storage.get_value("k").unwrap().is_none());
        storage.set_value("k", "v").unwrap();
        assert_eq!(storage.get_value("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_apply_batch() {
        let storage = MemoryStorage::new()
            .with_records(vec![Folder::new("old", "Old")], vec![Topic::new("t", "T", "a")]);
        let batch = ChangeBatch {
            folders: vec![Folder::new("new", "New")],
            topics: Vec::new(),
            removed_folders: vec!["old".to_string()],
            removed_topics: vec!["t".to_string()],
        };
        storage.apply_batch(&batch).unwrap();
        assert!(storage.folder("old").is_none());
        assert!(storage.folder("new").is_some());
        assert!(storage.topic("t").is_none());
    }

    #[test]
    fn test_fail_writes() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        assert!(storage.save_folder(&Folder::new("a", "A")).is_err());
        assert!(storage.apply_batch(&ChangeBatch::default()).is_err());
        storage.set_fail_writes(false);
        storage.save_folder(&Folder::new("a", "A")).unwrap();
    }
}
