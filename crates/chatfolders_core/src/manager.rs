//! Folder and topic mutations that keep the hierarchy consistent.
//!
//! [`FolderManager`] is the entry point UI collaborators call into. It owns the
//! [`EntityStore`], applies each operation in memory, then writes the touched
//! records to its [`FolderStorage`] backend.
//!
//! Every operation validates its inputs before the first write, so a failed
//! call leaves the store exactly as it was. Durable writes happen after the
//! in-memory change; a backend failure is logged, the in-memory state is kept
//! and the unwritten changes ride along with the next write.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use chatfolders_core::{Config, FolderManager, MemoryStorage, SystemClock, UuidGenerator};
//!
//! let mut manager = FolderManager::load(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(UuidGenerator),
//!     Arc::new(SystemClock),
//!     Config::default(),
//! )?;
//! let work = manager.create_folder("Work", None)?;
//! let projects = manager.create_folder("Projects", Some(&work.id))?;
//! manager.delete_folder(&work.id)?;
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::clock::{Clock, IdGenerator};
use crate::config::Config;
use crate::error::{ChatFoldersError, Result};
use crate::index::HierarchyIndex;
use crate::reconcile::reconcile;
use crate::storage::{ChangeBatch, FolderStorage};
use crate::store::{BatchReport, EntityStore, PendingChanges};
use crate::tree::{EXPANDED_KEYS_STORAGE_KEY, ExpansionState, TreeNode, TreeOptions, materialize};
use crate::types::{Folder, ROOT_FOLDER_ID, Topic};
use crate::validate::{ValidationResult, validate};

/// What a cascading folder delete removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct DeletedSubtree {
    /// Removed folder ids, breadth-first from the deleted folder
    pub folders: Vec<String>,
    /// Topic ids those folders held, now unassigned
    pub unassigned_topics: Vec<String>,
}

/// Owns the folder/topic model and applies mutations to it.
pub struct FolderManager {
    store: EntityStore,
    ids: Arc<dyn IdGenerator>,
    storage: Arc<dyn FolderStorage>,
    config: Config,
}

impl std::fmt::Debug for FolderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderManager")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish()
    }
}

impl FolderManager {
    /// Build a manager from whatever `storage` holds.
    ///
    /// Loaded records are reconciled first: the root is seeded if missing,
    /// broken parent links and cycles are reattached to the root, child lists
    /// are re-derived from parent pointers and a topic claimed by two folders
    /// stays with the first. Repaired records are written back.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn load(
        storage: Arc<dyn FolderStorage>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Result<Self> {
        let folders = storage.load_folders()?;
        let topics = storage.load_topics()?;
        let reconciled = reconcile(folders, topics, clock.now_millis());

        for repair in &reconciled.repairs {
            log::info!("Repaired stored folder data: {:?}", repair);
        }

        let repaired = PendingChanges {
            folders: reconciled.changed_folders,
            ..Default::default()
        };
        let mut store = EntityStore::from_parts(clock, reconciled.folders, reconciled.topics);
        store.restore_changes(repaired);
        log::debug!(
            "Loaded {} folder(s) and {} topic(s)",
            store.folder_count(),
            store.topic_count()
        );

        let mut manager = Self {
            store,
            ids,
            storage,
            config,
        };
        manager.flush();
        Ok(manager)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The underlying store.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// A hierarchy view over the current state.
    pub fn index(&self) -> HierarchyIndex<'_> {
        HierarchyIndex::new(&self.store)
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn require_folder(&self, id: &str) -> Result<&Folder> {
        self.store
            .folder(id)
            .ok_or_else(|| ChatFoldersError::folder_not_found(id))
    }

    fn require_topic(&self, id: &str) -> Result<&Topic> {
        self.store
            .topic(id)
            .ok_or_else(|| ChatFoldersError::topic_not_found(id))
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write every record touched since the last flush.
    ///
    /// A failed write is logged and its changes are queued again, so the next
    /// successful flush carries them.
    fn flush(&mut self) {
        let changes = self.store.take_changes();
        if changes.is_empty() {
            return;
        }
        let batch = ChangeBatch {
            folders: changes
                .folders
                .iter()
                .filter_map(|id| self.store.folder(id).cloned())
                .collect(),
            topics: changes
                .topics
                .iter()
                .filter_map(|id| self.store.topic(id).cloned())
                .collect(),
            removed_folders: changes.removed_folders.iter().cloned().collect(),
            removed_topics: changes.removed_topics.iter().cloned().collect(),
        };
        if batch.is_empty() {
            return;
        }
        if let Err(e) = self.storage.apply_batch(&batch) {
            log::warn!(
                "Failed to persist {} folder(s), {} topic(s), {} deletion(s), will retry: {}",
                batch.folders.len(),
                batch.topics.len(),
                batch.removed_folders.len() + batch.removed_topics.len(),
                e
            );
            self.store.restore_changes(changes);
        }
    }

    // ========================================================================
    // Folder operations
    // ========================================================================

    /// Create a folder under `parent_id` (the root when `None`).
    ///
    /// Names are trimmed; duplicates are allowed.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if the name is blank
    /// - `NotFound` if the parent does not exist
    pub fn create_folder(&mut self, name: &str, parent_id: Option<&str>) -> Result<Folder> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ChatFoldersError::InvalidName(name.to_string()));
        }
        let parent_id = parent_id.unwrap_or(ROOT_FOLDER_ID);
        self.require_folder(parent_id)?;

        let folder = Folder::new(self.ids.next_id(), trimmed).with_parent(parent_id);
        let folder = self.store.add_folder(folder)?;
        log::debug!(
            "Created folder {} '{}' under {}",
            folder.id,
            folder.name,
            parent_id
        );
        self.flush();
        Ok(folder)
    }

    /// First `"<prefix> N"` not used by any folder, counting from 1.
    ///
    /// A convenience for callers that want unique default names;
    /// [`create_folder`](Self::create_folder) never applies it.
    pub fn next_untitled_name(&self) -> String {
        let taken: HashSet<&str> = self.store.folder_names().into_iter().collect();
        let prefix = &self.config.default_folder_prefix;
        (1..)
            .map(|n| format!("{} {}", prefix, n))
            .find(|name| !taken.contains(name.as_str()))
            .unwrap_or_else(|| prefix.clone())
    }

    /// Rename a folder. A blank or unchanged name leaves it untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` if the folder does not exist.
    pub fn rename_folder(&mut self, id: &str, name: &str) -> Result<Folder> {
        let folder = self.require_folder(id)?;
        let name = name.trim();
        if name.is_empty() || name == folder.name {
            return Ok(folder.clone());
        }

        let mut renamed = folder.clone();
        renamed.name = name.to_string();
        let renamed = self.store.update_folder(renamed)?;
        log::debug!("Renamed folder {} to '{}'", id, renamed.name);
        self.flush();
        Ok(renamed)
    }

    /// Delete a folder and everything below it.
    ///
    /// Topics held by removed folders become unassigned. The whole subtree is
    /// collected before anything is removed and reaches durable storage as one
    /// batch.
    ///
    /// # Errors
    ///
    /// - `RootDeletion` for the root folder
    /// - `NotFound` if the folder does not exist
    pub fn delete_folder(&mut self, id: &str) -> Result<DeletedSubtree> {
        if id == ROOT_FOLDER_ID {
            return Err(ChatFoldersError::RootDeletion);
        }
        self.require_folder(id)?;

        let subtree = self.collect_subtree(id);
        let mut deleted = DeletedSubtree::default();
        for folder_id in &subtree {
            let removed = self.store.remove_folder(folder_id)?;
            deleted.unassigned_topics.extend(removed.topic_ids);
            deleted.folders.push(removed.id);
        }

        log::debug!(
            "Deleted folder {} with {} descendant(s); {} topic(s) unassigned",
            id,
            deleted.folders.len() - 1,
            deleted.unassigned_topics.len()
        );
        self.flush();
        Ok(deleted)
    }

    /// `id` and its descendants, breadth-first.
    fn collect_subtree(&self, id: &str) -> Vec<String> {
        let mut seen: IndexSet<String> = IndexSet::new();
        let mut queue = VecDeque::from([id.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(folder) = self.store.folder(&current) {
                queue.extend(folder.child_folder_ids.iter().cloned());
            }
        }
        seen.into_iter()
            .filter(|id| self.store.contains_folder(id))
            .collect()
    }

    /// Move a folder under `new_parent_id` (the root when `None`).
    ///
    /// # Errors
    ///
    /// - `NotFound` if the folder or the new parent does not exist
    /// - `Cycle` if the new parent is the folder itself or one of its
    ///   descendants, or if the folder is the root
    pub fn reparent_folder(&mut self, id: &str, new_parent_id: Option<&str>) -> Result<Folder> {
        let parent_id = new_parent_id.unwrap_or(ROOT_FOLDER_ID);
        if id == ROOT_FOLDER_ID {
            return Err(ChatFoldersError::Cycle {
                folder: id.to_string(),
                parent: parent_id.to_string(),
            });
        }
        let folder = self.require_folder(id)?;
        self.require_folder(parent_id)?;

        if parent_id == id || self.index().is_descendant(id, parent_id) {
            return Err(ChatFoldersError::Cycle {
                folder: id.to_string(),
                parent: parent_id.to_string(),
            });
        }
        if folder.parent_id() == Some(parent_id) {
            return Ok(folder.clone());
        }

        let mut moved = folder.clone();
        moved.parent_folder_id = Some(parent_id.to_string());
        let moved = self.store.update_folder(moved)?;
        log::debug!("Moved folder {} under {}", id, parent_id);
        self.flush();
        Ok(moved)
    }

    // ========================================================================
    // Topic assignment
    // ========================================================================

    /// Put `topic_ids` into `folder_id`, taking them out of any other folder.
    ///
    /// # Errors
    ///
    /// `NotFound` if the folder does not exist. Nothing is changed in that case.
    pub fn assign_topics_to_folder<S: AsRef<str>>(
        &mut self,
        folder_id: &str,
        topic_ids: &[S],
    ) -> Result<Folder> {
        let folder = self.require_folder(folder_id)?;
        if topic_ids.is_empty() {
            return Ok(folder.clone());
        }

        let mut target = folder.clone();
        target
            .topic_ids
            .extend(topic_ids.iter().map(|id| id.as_ref().to_string()));
        // update_folder releases the ids from every other holder.
        let target = self.store.update_folder(target)?;
        log::debug!(
            "Assigned {} topic(s) to folder {}",
            topic_ids.len(),
            folder_id
        );
        self.flush();
        Ok(target)
    }

    /// Move topics from `source_id` to `target_id`.
    ///
    /// Without a source the topics are assumed unassigned; without a target
    /// they end up unassigned. Any other folder still holding one of the ids
    /// loses it when a target is given.
    ///
    /// # Errors
    ///
    /// `NotFound` if either folder does not exist. Nothing is changed in that case.
    pub fn move_topics<S: AsRef<str>>(
        &mut self,
        source_id: Option<&str>,
        target_id: Option<&str>,
        topic_ids: &[S],
    ) -> Result<()> {
        if let Some(source) = source_id {
            self.require_folder(source)?;
        }
        if let Some(target) = target_id {
            self.require_folder(target)?;
        }
        if topic_ids.is_empty() {
            return Ok(());
        }

        if let Some(source) = source_id {
            let moving: HashSet<&str> = topic_ids.iter().map(|id| id.as_ref()).collect();
            let mut folder = self.require_folder(source)?.clone();
            let before = folder.topic_ids.len();
            folder.topic_ids.retain(|id| !moving.contains(id.as_str()));
            if folder.topic_ids.len() != before {
                self.store.update_folder(folder)?;
            }
        }

        if let Some(target) = target_id {
            let mut folder = self.require_folder(target)?.clone();
            folder
                .topic_ids
                .extend(topic_ids.iter().map(|id| id.as_ref().to_string()));
            self.store.update_folder(folder)?;
        }

        log::debug!(
            "Moved {} topic(s) from {} to {}",
            topic_ids.len(),
            source_id.unwrap_or("unassigned"),
            target_id.unwrap_or("unassigned")
        );
        self.flush();
        Ok(())
    }

    // ========================================================================
    // Topic lifecycle
    // ========================================================================

    /// Add a topic created by the chat layer, optionally assigning it.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `folder_id` is given and does not exist
    /// - `DuplicateId` if the topic is already registered
    pub fn register_topic(&mut self, topic: Topic, folder_id: Option<&str>) -> Result<Topic> {
        if let Some(folder_id) = folder_id {
            self.require_folder(folder_id)?;
        }
        let topic = self.store.add_topic(topic)?;

        if let Some(folder_id) = folder_id {
            let mut folder = self.require_folder(folder_id)?.clone();
            folder.topic_ids.insert(topic.id.clone());
            self.store.update_folder(folder)?;
        }

        log::debug!("Registered topic {} '{}'", topic.id, topic.name);
        self.flush();
        Ok(topic)
    }

    /// Replace every topic with the chat layer's current list.
    ///
    /// Folder membership is left alone, so ids of topics that come back keep
    /// their folder.
    pub fn sync_topics(&mut self, topics: Vec<Topic>) -> BatchReport {
        let report = self.store.replace_all_topics(topics);
        for (id, e) in &report.failed {
            log::warn!("Failed to sync topic {}: {}", id, e);
        }
        self.flush();
        report
    }

    /// Replace a topic's metadata.
    ///
    /// # Errors
    ///
    /// `NotFound` if the topic does not exist.
    pub fn update_topic(&mut self, topic: Topic) -> Result<Topic> {
        let topic = self.store.update_topic(topic)?;
        self.flush();
        Ok(topic)
    }

    /// Rename a topic. A blank or unchanged name leaves it untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` if the topic does not exist.
    pub fn rename_topic(&mut self, id: &str, name: &str) -> Result<Topic> {
        let topic = self.require_topic(id)?;
        let name = name.trim();
        if name.is_empty() || name == topic.name {
            return Ok(topic.clone());
        }

        let mut renamed = topic.clone();
        renamed.name = name.to_string();
        let renamed = self.store.update_topic(renamed)?;
        log::debug!("Renamed topic {} to '{}'", id, renamed.name);
        self.flush();
        Ok(renamed)
    }

    /// Remove a topic and take it out of its folder.
    ///
    /// # Errors
    ///
    /// `NotFound` if the topic does not exist.
    pub fn delete_topic(&mut self, id: &str) -> Result<Topic> {
        let holder = self.index().folder_of(id).cloned();
        let removed = self.store.remove_topic(id)?;

        if let Some(mut folder) = holder {
            folder.topic_ids.shift_remove(id);
            self.store.update_folder(folder)?;
        }

        log::debug!("Deleted topic {}", id);
        self.flush();
        Ok(removed)
    }

    // ========================================================================
    // Tree and UI state
    // ========================================================================

    /// Materialize the display tree using the configured sibling order.
    pub fn tree(&self, expansion: &ExpansionState, max_depth: Option<usize>) -> TreeNode {
        let options = TreeOptions {
            max_depth,
            child_order: self.config.child_order,
        };
        materialize(&self.store, expansion, &options)
    }

    /// The persisted expansion state, minus folders that no longer exist.
    ///
    /// Returns an empty state when persistence is disabled or nothing was
    /// saved. Unreadable saved state is logged and ignored.
    pub fn load_expansion(&self) -> ExpansionState {
        if !self.config.persist_expansion {
            return ExpansionState::new();
        }
        let raw = match self.storage.get_value(EXPANDED_KEYS_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ExpansionState::new(),
            Err(e) => {
                log::warn!("Failed to read expanded folders: {}", e);
                return ExpansionState::new();
            }
        };
        let mut state: ExpansionState = match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Ignoring unreadable expanded folders: {}", e);
                return ExpansionState::new();
            }
        };
        state.retain_existing(&self.store);
        state
    }

    /// Persist the expansion state. Does nothing when persistence is disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub fn save_expansion(&self, state: &ExpansionState) -> Result<()> {
        if !self.config.persist_expansion {
            return Ok(());
        }
        let raw = serde_json::to_string(state)?;
        self.storage.set_value(EXPANDED_KEYS_STORAGE_KEY, &raw)
    }

    /// Check every structural invariant.
    pub fn check(&self) -> ValidationResult {
        validate(&self.store)
    }
}
