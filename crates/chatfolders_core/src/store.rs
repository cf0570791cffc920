//! Normalized in-memory storage of folders and topics.
//!
//! [`EntityStore`] is a CRUD layer. It keeps records keyed by id, fills in
//! timestamps, strips message payloads from topics and keeps the
//! `child_folder_ids` back-reference in sync with `parent_folder_id`. It does
//! not cascade deletes or reassign topics; that is the job of
//! [`FolderManager`](crate::manager::FolderManager).
//!
//! Every write is recorded in a [`PendingChanges`] set so the owner can flush
//! touched records to durable storage afterwards.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::clock::Clock;
use crate::error::{ChatFoldersError, EntityKind, Result};
use crate::types::{Folder, ROOT_FOLDER_ID, Topic};

/// Outcome of a bulk store call.
///
/// Bulk calls apply each item independently: a failing item does not roll back
/// the items before it and does not stop the items after it.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Ids that were written
    pub applied: Vec<String>,
    /// Ids that were rejected, with the reason
    pub failed: Vec<(String, ChatFoldersError)>,
}

impl BatchReport {
    /// Returns true if every item was applied.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record<T>(&mut self, id: String, result: Result<T>) {
        match result {
            Ok(_) => self.applied.push(id),
            Err(e) => self.failed.push((id, e)),
        }
    }
}

/// Ids touched since the last [`EntityStore::take_changes`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingChanges {
    /// Folders written (created or updated)
    pub folders: IndexSet<String>,
    /// Topics written (created or updated)
    pub topics: IndexSet<String>,
    /// Folders removed
    pub removed_folders: IndexSet<String>,
    /// Topics removed
    pub removed_topics: IndexSet<String>,
}

impl PendingChanges {
    /// Returns true if nothing was touched.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
            && self.topics.is_empty()
            && self.removed_folders.is_empty()
            && self.removed_topics.is_empty()
    }
}

/// Authoritative in-memory collections of folders and topics.
pub struct EntityStore {
    folders: IndexMap<String, Folder>,
    topics: IndexMap<String, Topic>,
    clock: Arc<dyn Clock>,
    changes: PendingChanges,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("folders", &self.folders.len())
            .field("topics", &self.topics.len())
            .finish()
    }
}

impl EntityStore {
    /// Create a store holding only the root folder.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let root = Folder::root(clock.now_millis());
        let mut folders = IndexMap::new();
        folders.insert(root.id.clone(), root);
        Self {
            folders,
            topics: IndexMap::new(),
            clock,
            changes: PendingChanges::default(),
        }
    }

    /// Build a store from records that are already consistent.
    ///
    /// Used after reconciliation; the caller guarantees the invariants hold.
    pub(crate) fn from_parts(
        clock: Arc<dyn Clock>,
        folders: IndexMap<String, Folder>,
        topics: IndexMap<String, Topic>,
    ) -> Self {
        Self {
            folders,
            topics,
            clock,
            changes: PendingChanges::default(),
        }
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Look up a folder by id.
    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.get(id)
    }

    /// Look up a topic by id.
    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.topics.get(id)
    }

    /// Returns true if a folder with this id exists.
    pub fn contains_folder(&self, id: &str) -> bool {
        self.folders.contains_key(id)
    }

    /// Returns true if a topic with this id exists.
    pub fn contains_topic(&self, id: &str) -> bool {
        self.topics.contains_key(id)
    }

    /// The root folder.
    pub fn root(&self) -> &Folder {
        // Seeded on construction and never removable.
        &self.folders[ROOT_FOLDER_ID]
    }

    /// All folders, least recently updated first.
    pub fn folders(&self) -> Vec<&Folder> {
        let mut all: Vec<&Folder> = self.folders.values().collect();
        all.sort_by_key(|f| f.updated_at);
        all
    }

    /// All topics, least recently updated first.
    pub fn topics(&self) -> Vec<&Topic> {
        let mut all: Vec<&Topic> = self.topics.values().collect();
        all.sort_by_key(|t| t.updated_at);
        all
    }

    /// Folders in insertion order.
    pub(crate) fn folders_in_insertion_order(&self) -> impl Iterator<Item = &Folder> {
        self.folders.values()
    }

    /// Topics in insertion order.
    pub(crate) fn topics_in_insertion_order(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }

    /// Number of folders, including the root.
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    /// Number of topics.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Names of every folder except the root, for default-name probing.
    pub fn folder_names(&self) -> Vec<&str> {
        self.folders
            .values()
            .filter(|f| !f.is_root())
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Returns true if `ancestor` appears in the parent chain above `folder_id`.
    pub(crate) fn is_ancestor(&self, ancestor: &str, folder_id: &str) -> bool {
        let mut seen = IndexSet::new();
        let mut current = self.folders.get(folder_id).and_then(|f| f.parent_id());
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                // Corrupt data; stop rather than loop.
                return false;
            }
            current = self.folders.get(id).and_then(|f| f.parent_id());
        }
        false
    }

    // ========================================================================
    // Change tracking
    // ========================================================================

    /// Drain the set of records touched since the last call.
    pub fn take_changes(&mut self) -> PendingChanges {
        std::mem::take(&mut self.changes)
    }

    /// Queue changes again after a failed write, under anything newer.
    ///
    /// A record written since `earlier` was taken wins over an older removal
    /// of the same id, and vice versa.
    pub fn restore_changes(&mut self, earlier: PendingChanges) {
        for id in earlier.folders {
            if !self.changes.removed_folders.contains(&id) {
                self.changes.folders.insert(id);
            }
        }
        for id in earlier.removed_folders {
            if !self.changes.folders.contains(&id) {
                self.changes.removed_folders.insert(id);
            }
        }
        for id in earlier.topics {
            if !self.changes.removed_topics.contains(&id) {
                self.changes.topics.insert(id);
            }
        }
        for id in earlier.removed_topics {
            if !self.changes.topics.contains(&id) {
                self.changes.removed_topics.insert(id);
            }
        }
    }

    fn mark_folder(&mut self, id: &str) {
        self.changes.removed_folders.shift_remove(id);
        self.changes.folders.insert(id.to_string());
    }

    fn mark_folder_removed(&mut self, id: &str) {
        self.changes.folders.shift_remove(id);
        self.changes.removed_folders.insert(id.to_string());
    }

    fn mark_topic(&mut self, id: &str) {
        self.changes.removed_topics.shift_remove(id);
        self.changes.topics.insert(id.to_string());
    }

    fn mark_topic_removed(&mut self, id: &str) {
        self.changes.topics.shift_remove(id);
        self.changes.removed_topics.insert(id.to_string());
    }

    // ========================================================================
    // Folder writes
    // ========================================================================

    fn sanitize_folder(&self, mut folder: Folder) -> Folder {
        let now = self.now();
        if folder.created_at == 0 {
            folder.created_at = now;
        }
        if folder.updated_at == 0 {
            folder.updated_at = now;
        }
        if folder.is_root() {
            folder.parent_folder_id = None;
        } else if folder.parent_folder_id.is_none() {
            folder.parent_folder_id = Some(ROOT_FOLDER_ID.to_string());
        }
        folder
    }

    /// Remove `topic_ids` from every folder other than `owner`.
    fn release_topics(&mut self, owner: &str, topic_ids: &IndexSet<String>) {
        if topic_ids.is_empty() {
            return;
        }
        let now = self.now();
        let mut touched = Vec::new();
        for folder in self.folders.values_mut() {
            if folder.id == owner {
                continue;
            }
            let before = folder.topic_ids.len();
            folder.topic_ids.retain(|id| !topic_ids.contains(id));
            if folder.topic_ids.len() != before {
                folder.updated_at = now;
                touched.push(folder.id.clone());
            }
        }
        for id in touched {
            self.mark_folder(&id);
        }
    }

    fn attach_child(&mut self, parent_id: &str, child_id: &str) {
        let now = self.now();
        if let Some(parent) = self.folders.get_mut(parent_id)
            && parent.child_folder_ids.insert(child_id.to_string())
        {
            parent.updated_at = now;
            self.mark_folder(parent_id);
        }
    }

    fn detach_child(&mut self, parent_id: &str, child_id: &str) {
        let now = self.now();
        if let Some(parent) = self.folders.get_mut(parent_id)
            && parent.child_folder_ids.shift_remove(child_id)
        {
            parent.updated_at = now;
            self.mark_folder(parent_id);
        }
    }

    /// Insert a new folder and link it under its parent.
    ///
    /// # Errors
    ///
    /// - `ReservedId` if the id is the root id
    /// - `DuplicateId` if a folder with this id exists
    /// - `NotFound` if the parent folder does not exist
    pub fn add_folder(&mut self, folder: Folder) -> Result<Folder> {
        if folder.is_root() {
            return Err(ChatFoldersError::ReservedId(folder.id));
        }
        if self.folders.contains_key(&folder.id) {
            return Err(ChatFoldersError::DuplicateId {
                kind: EntityKind::Folder,
                id: folder.id,
            });
        }

        let mut folder = self.sanitize_folder(folder);
        folder.child_folder_ids.clear();

        let parent_id = folder
            .parent_folder_id
            .clone()
            .unwrap_or_else(|| ROOT_FOLDER_ID.to_string());
        if !self.folders.contains_key(&parent_id) {
            return Err(ChatFoldersError::folder_not_found(parent_id));
        }

        let id = folder.id.clone();
        let topic_ids = folder.topic_ids.clone();
        self.folders.insert(id.clone(), folder);
        self.release_topics(&id, &topic_ids);
        self.attach_child(&parent_id, &id);
        self.mark_folder(&id);

        Ok(self.folders[&id].clone())
    }

    /// Replace a folder record by id.
    ///
    /// `child_folder_ids` and `created_at` are kept from the stored record and
    /// `updated_at` is refreshed. If the parent changes, the new parent is
    /// checked before anything is modified, then the folder moves from the old
    /// parent's child list to the new one.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the folder or the new parent does not exist
    /// - `Cycle` if the new parent is the folder itself or one of its descendants
    pub fn update_folder(&mut self, folder: Folder) -> Result<Folder> {
        let existing = self
            .folders
            .get(&folder.id)
            .ok_or_else(|| ChatFoldersError::folder_not_found(&folder.id))?;

        let old_parent = existing.parent_folder_id.clone();
        let children = existing.child_folder_ids.clone();
        let created_at = existing.created_at;

        let mut folder = self.sanitize_folder(folder);
        folder.child_folder_ids = children;
        folder.created_at = created_at;
        folder.updated_at = self.now();

        let id = folder.id.clone();
        let new_parent = folder.parent_folder_id.clone();
        let reparenting = new_parent != old_parent;

        if reparenting && let Some(parent_id) = new_parent.as_deref() {
            if !self.folders.contains_key(parent_id) {
                return Err(ChatFoldersError::folder_not_found(parent_id));
            }
            if parent_id == id || self.is_ancestor(&id, parent_id) {
                return Err(ChatFoldersError::Cycle {
                    folder: id,
                    parent: parent_id.to_string(),
                });
            }
        }

        let topic_ids = folder.topic_ids.clone();
        self.folders.insert(id.clone(), folder);
        self.release_topics(&id, &topic_ids);

        if reparenting {
            if let Some(old) = old_parent.as_deref() {
                self.detach_child(old, &id);
            }
            if let Some(new) = new_parent.as_deref() {
                self.attach_child(new, &id);
            }
        }
        self.mark_folder(&id);

        Ok(self.folders[&id].clone())
    }

    /// Insert the folder if its id is new, otherwise replace it.
    pub fn upsert_folder(&mut self, folder: Folder) -> Result<Folder> {
        if self.folders.contains_key(&folder.id) {
            self.update_folder(folder)
        } else {
            self.add_folder(folder)
        }
    }

    /// Remove one folder and unlink it from its parent.
    ///
    /// Child folders keep their (now dangling) parent id and the folder's
    /// topics simply stop being listed anywhere.
    ///
    /// # Errors
    ///
    /// - `RootDeletion` for the root folder
    /// - `NotFound` if the folder does not exist
    pub fn remove_folder(&mut self, id: &str) -> Result<Folder> {
        if id == ROOT_FOLDER_ID {
            return Err(ChatFoldersError::RootDeletion);
        }
        let removed = self
            .folders
            .shift_remove(id)
            .ok_or_else(|| ChatFoldersError::folder_not_found(id))?;
        if let Some(parent_id) = removed.parent_id() {
            self.detach_child(parent_id, id);
        }
        self.mark_folder_removed(id);
        Ok(removed)
    }

    /// Add several folders; see [`BatchReport`] for the failure policy.
    pub fn add_folders(&mut self, folders: Vec<Folder>) -> BatchReport {
        let mut report = BatchReport::default();
        for folder in folders {
            let id = folder.id.clone();
            let result = self.add_folder(folder);
            report.record(id, result);
        }
        report
    }

    /// Upsert several folders; see [`BatchReport`] for the failure policy.
    pub fn upsert_folders(&mut self, folders: Vec<Folder>) -> BatchReport {
        let mut report = BatchReport::default();
        for folder in folders {
            let id = folder.id.clone();
            let result = self.upsert_folder(folder);
            report.record(id, result);
        }
        report
    }

    /// Remove several folders; see [`BatchReport`] for the failure policy.
    pub fn remove_folders<S: AsRef<str>>(&mut self, ids: &[S]) -> BatchReport {
        let mut report = BatchReport::default();
        for id in ids {
            let id = id.as_ref();
            let result = self.remove_folder(id);
            report.record(id.to_string(), result);
        }
        report
    }

    // ========================================================================
    // Topic writes
    // ========================================================================

    fn sanitize_topic(&self, mut topic: Topic) -> Topic {
        let now = self.now();
        if topic.created_at == 0 {
            topic.created_at = now;
        }
        if topic.updated_at == 0 {
            topic.updated_at = now;
        }
        if !topic.messages.is_empty() {
            log::debug!(
                "Stripping {} message(s) from topic {}",
                topic.messages.len(),
                topic.id
            );
            topic.messages.clear();
        }
        topic
    }

    /// Insert a new topic.
    ///
    /// # Errors
    ///
    /// `DuplicateId` if a topic with this id exists.
    pub fn add_topic(&mut self, topic: Topic) -> Result<Topic> {
        if self.topics.contains_key(&topic.id) {
            return Err(ChatFoldersError::DuplicateId {
                kind: EntityKind::Topic,
                id: topic.id,
            });
        }
        let topic = self.sanitize_topic(topic);
        let id = topic.id.clone();
        self.topics.insert(id.clone(), topic);
        self.mark_topic(&id);
        Ok(self.topics[&id].clone())
    }

    /// Replace a topic record by id, keeping `created_at` and refreshing `updated_at`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the topic does not exist.
    pub fn update_topic(&mut self, topic: Topic) -> Result<Topic> {
        let created_at = self
            .topics
            .get(&topic.id)
            .map(|t| t.created_at)
            .ok_or_else(|| ChatFoldersError::topic_not_found(&topic.id))?;
        let mut topic = self.sanitize_topic(topic);
        topic.created_at = created_at;
        topic.updated_at = self.now();
        let id = topic.id.clone();
        self.topics.insert(id.clone(), topic);
        self.mark_topic(&id);
        Ok(self.topics[&id].clone())
    }

    /// Insert the topic if its id is new, otherwise replace it.
    pub fn upsert_topic(&mut self, topic: Topic) -> Result<Topic> {
        if self.topics.contains_key(&topic.id) {
            self.update_topic(topic)
        } else {
            self.add_topic(topic)
        }
    }

    /// Remove a topic record. Folder membership is left untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` if the topic does not exist.
    pub fn remove_topic(&mut self, id: &str) -> Result<Topic> {
        let removed = self
            .topics
            .shift_remove(id)
            .ok_or_else(|| ChatFoldersError::topic_not_found(id))?;
        self.mark_topic_removed(id);
        Ok(removed)
    }

    /// Add several topics; see [`BatchReport`] for the failure policy.
    pub fn add_topics(&mut self, topics: Vec<Topic>) -> BatchReport {
        let mut report = BatchReport::default();
        for topic in topics {
            let id = topic.id.clone();
            let result = self.add_topic(topic);
            report.record(id, result);
        }
        report
    }

    /// Upsert several topics; see [`BatchReport`] for the failure policy.
    pub fn upsert_topics(&mut self, topics: Vec<Topic>) -> BatchReport {
        let mut report = BatchReport::default();
        for topic in topics {
            let id = topic.id.clone();
            let result = self.upsert_topic(topic);
            report.record(id, result);
        }
        report
    }

    /// Remove several topics; see [`BatchReport`] for the failure policy.
    pub fn remove_topics<S: AsRef<str>>(&mut self, ids: &[S]) -> BatchReport {
        let mut report = BatchReport::default();
        for id in ids {
            let id = id.as_ref();
            let result = self.remove_topic(id);
            report.record(id.to_string(), result);
        }
        report
    }

    /// Replace every topic with `topics`, keeping the first occurrence of each id.
    pub fn replace_all_topics(&mut self, topics: Vec<Topic>) -> BatchReport {
        let old_ids: Vec<String> = self.topics.keys().cloned().collect();
        self.topics.clear();
        for id in &old_ids {
            self.mark_topic_removed(id);
        }

        let mut seen = IndexSet::new();
        let unique: Vec<Topic> = topics
            .into_iter()
            .filter(|t| seen.insert(t.id.clone()))
            .collect();
        self.add_topics(unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{store_at, topic};

    #[test]
    fn test_new_store_has_root() {
        let store = store_at(100);
        assert_eq!(store.folder_count(), 1);
        assert!(store.root().is_root());
        assert_eq!(store.root().created_at, 100);
    }

    #[test]
    fn test_add_folder_links_parent() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("work", "Work")).unwrap();
        store
            .add_folder(Folder::new("proj", "Projects").with_parent("work"))
            .unwrap();

        assert!(store.root().child_folder_ids.contains("work"));
        let work = store.folder("work").unwrap();
        assert_eq!(work.child_folder_ids.iter().collect::<Vec<_>>(), ["proj"]);
    }

    #[test]
    fn test_add_folder_sets_timestamps_and_normalizes_parent() {
        let mut store = store_at(50);
        let mut folder = Folder::new("f", "F");
        folder.parent_folder_id = None;
        let stored = store.add_folder(folder).unwrap();
        assert_eq!(stored.created_at, 50);
        assert_eq!(stored.updated_at, 50);
        assert_eq!(stored.parent_id(), Some(ROOT_FOLDER_ID));
    }

    #[test]
    fn test_add_folder_ignores_supplied_children() {
        let mut store = store_at(1);
        let mut folder = Folder::new("f", "F");
        folder.child_folder_ids.insert("ghost".to_string());
        let stored = store.add_folder(folder).unwrap();
        assert!(stored.child_folder_ids.is_empty());
    }

    #[test]
    fn test_add_folder_rejects_duplicate_and_reserved() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("f", "F")).unwrap();
        assert!(matches!(
            store.add_folder(Folder::new("f", "Again")),
            Err(ChatFoldersError::DuplicateId { .. })
        ));
        assert!(matches!(
            store.add_folder(Folder::new(ROOT_FOLDER_ID, "Root 2")),
            Err(ChatFoldersError::ReservedId(_))
        ));
    }

    #[test]
    fn test_add_folder_unknown_parent() {
        let mut store = store_at(1);
        let result = store.add_folder(Folder::new("f", "F").with_parent("nope"));
        assert!(matches!(result, Err(ChatFoldersError::NotFound { .. })));
        assert!(!store.contains_folder("f"));
    }

    #[test]
    fn test_add_folder_claims_topics_exclusively() {
        let mut store = store_at(1);
        store
            .add_folder(Folder::new("a", "A").with_topics(["t1", "t2"]))
            .unwrap();
        store.add_folder(Folder::new("b", "B").with_topics(["t1"])).unwrap();

        assert_eq!(
            store.folder("a").unwrap().topic_ids.iter().collect::<Vec<_>>(),
            ["t2"]
        );
        assert!(store.folder("b").unwrap().topic_ids.contains("t1"));
    }

    #[test]
    fn test_update_folder_moves_back_link() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("a", "A")).unwrap();
        store.add_folder(Folder::new("b", "B")).unwrap();
        store.add_folder(Folder::new("c", "C").with_parent("a")).unwrap();

        let mut c = store.folder("c").unwrap().clone();
        c.parent_folder_id = Some("b".to_string());
        store.update_folder(c).unwrap();

        assert!(store.folder("a").unwrap().child_folder_ids.is_empty());
        assert!(store.folder("b").unwrap().child_folder_ids.contains("c"));
    }

    #[test]
    fn test_update_folder_rejects_cycle_without_changes() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("a", "A")).unwrap();
        store.add_folder(Folder::new("b", "B").with_parent("a")).unwrap();

        let mut a = store.folder("a").unwrap().clone();
        a.parent_folder_id = Some("b".to_string());
        a.name = "Renamed".to_string();
        let result = store.update_folder(a);

        assert!(matches!(result, Err(ChatFoldersError::Cycle { .. })));
        let a = store.folder("a").unwrap();
        assert_eq!(a.name, "A");
        assert_eq!(a.parent_id(), Some(ROOT_FOLDER_ID));
        assert!(store.root().child_folder_ids.contains("a"));
    }

    #[test]
    fn test_update_folder_unknown_new_parent_is_atomic() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("a", "A")).unwrap();
        let mut a = store.folder("a").unwrap().clone();
        a.parent_folder_id = Some("missing".to_string());
        assert!(store.update_folder(a).is_err());
        assert!(store.root().child_folder_ids.contains("a"));
    }

    #[test]
    fn test_update_folder_keeps_children_and_created_at() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("a", "A")).unwrap();
        store.add_folder(Folder::new("b", "B").with_parent("a")).unwrap();

        let mut a = store.folder("a").unwrap().clone();
        a.child_folder_ids.clear();
        a.created_at = 999;
        let updated = store.update_folder(a).unwrap();
        assert!(updated.child_folder_ids.contains("b"));
        assert_eq!(updated.created_at, 1);
    }

    #[test]
    fn test_update_missing_folder() {
        let mut store = store_at(1);
        assert!(matches!(
            store.update_folder(Folder::new("x", "X")),
            Err(ChatFoldersError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_folder_detaches_without_cascade() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("a", "A")).unwrap();
        store.add_folder(Folder::new("b", "B").with_parent("a")).unwrap();

        store.remove_folder("a").unwrap();
        assert!(!store.root().child_folder_ids.contains("a"));
        assert!(store.contains_folder("b"));
    }

    #[test]
    fn test_remove_root_fails() {
        let mut store = store_at(1);
        assert!(matches!(
            store.remove_folder(ROOT_FOLDER_ID),
            Err(ChatFoldersError::RootDeletion)
        ));
    }

    #[test]
    fn test_bulk_add_is_best_effort() {
        let mut store = store_at(1);
        let report = store.add_folders(vec![
            Folder::new("a", "A"),
            Folder::new("a", "Dup"),
            Folder::new("b", "B"),
        ]);
        assert_eq!(report.applied, ["a", "b"]);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_complete());
        assert_eq!(store.folder("a").unwrap().name, "A");
    }

    #[test]
    fn test_remove_folders_reports_missing() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("a", "A")).unwrap();
        let report = store.remove_folders(&["a", "missing"]);
        assert_eq!(report.applied, ["a"]);
        assert_eq!(report.failed[0].0, "missing");
    }

    #[test]
    fn test_upsert_folders_mixes_updates_inserts_and_failures() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("a", "A")).unwrap();
        store.add_folder(Folder::new("b", "B").with_parent("a")).unwrap();

        let mut looped = store.folder("a").unwrap().clone();
        looped.parent_folder_id = Some("b".to_string());
        looped.name = "Looped".to_string();
        let mut renamed = store.folder("b").unwrap().clone();
        renamed.name = "Bee".to_string();

        let report = store.upsert_folders(vec![
            looped,
            renamed,
            Folder::new("c", "C").with_parent("b"),
            Folder::new("d", "D").with_parent("zz"),
        ]);

        assert_eq!(report.applied, ["b", "c"]);
        let failed: Vec<&str> = report.failed.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(failed, ["a", "d"]);
        assert!(matches!(report.failed[0].1, ChatFoldersError::Cycle { .. }));
        assert!(matches!(report.failed[1].1, ChatFoldersError::NotFound { .. }));

        // The cyclic item left its folder untouched
        let a = store.folder("a").unwrap();
        assert_eq!(a.name, "A");
        assert_eq!(a.parent_id(), Some(ROOT_FOLDER_ID));
        assert!(store.root().child_folder_ids.contains("a"));

        assert_eq!(store.folder("b").unwrap().name, "Bee");
        assert!(store.folder("b").unwrap().child_folder_ids.contains("c"));
        assert!(!store.contains_folder("d"));
        assert!(crate::validate::validate(&store).is_ok());
    }

    #[test]
    fn test_upsert_folder_single() {
        let mut store = store_at(1);
        let inserted = store.upsert_folder(Folder::new("a", "A")).unwrap();
        assert_eq!(inserted.name, "A");

        let mut a = inserted.clone();
        a.name = "Again".to_string();
        let updated = store.upsert_folder(a).unwrap();
        assert_eq!(updated.name, "Again");
        assert_eq!(store.folder_count(), 2);
    }

    #[test]
    fn test_upsert_topics_strips_messages_on_both_paths() {
        let mut store = store_at(1);
        store.add_topic(topic("t1", "Existing")).unwrap();

        let mut existing = topic("t1", "Renamed");
        existing.messages.push(serde_json::json!({"role": "user"}));
        let mut fresh = topic("t2", "Fresh");
        fresh.messages.push(serde_json::json!({"role": "assistant"}));

        let report = store.upsert_topics(vec![existing, fresh]);
        assert!(report.is_complete());
        assert_eq!(report.applied, ["t1", "t2"]);

        let t1 = store.topic("t1").unwrap();
        assert_eq!(t1.name, "Renamed");
        assert!(t1.messages.is_empty());
        assert!(store.topic("t2").unwrap().messages.is_empty());

        let single = store.upsert_topic(topic("t3", "One")).unwrap();
        assert_eq!(single.created_at, 1);
        assert_eq!(store.topic_count(), 3);
    }

    #[test]
    fn test_remove_topics_reports_missing() {
        let mut store = store_at(1);
        store.add_topic(topic("t1", "Hello")).unwrap();
        let report = store.remove_topics(&["t1", "x"]);
        assert_eq!(report.applied, ["t1"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "x");
        assert!(matches!(
            report.failed[0].1,
            ChatFoldersError::NotFound { .. }
        ));
        assert_eq!(store.topic_count(), 0);
    }

    #[test]
    fn test_linking_a_child_refreshes_parent() {
        let clock = Arc::new(crate::clock::ManualClock::new(1_000));
        let mut store = EntityStore::new(clock.clone());
        store.add_folder(Folder::new("a", "A")).unwrap();
        store.add_folder(Folder::new("c", "C")).unwrap();

        clock.advance(10);
        store.add_folder(Folder::new("b", "B").with_parent("a")).unwrap();
        assert_eq!(store.folder("a").unwrap().updated_at, 1_010);

        clock.advance(10);
        let mut b = store.folder("b").unwrap().clone();
        b.parent_folder_id = Some("c".to_string());
        store.update_folder(b).unwrap();
        assert_eq!(store.folder("a").unwrap().updated_at, 1_020);
        assert_eq!(store.folder("c").unwrap().updated_at, 1_020);

        clock.advance(10);
        store.remove_folder("b").unwrap();
        assert_eq!(store.folder("c").unwrap().updated_at, 1_030);
    }

    #[test]
    fn test_topic_messages_are_stripped() {
        let mut store = store_at(1);
        let mut t = topic("t1", "Hello");
        t.messages.push(serde_json::json!({"role": "user"}));
        let stored = store.add_topic(t).unwrap();
        assert!(stored.messages.is_empty());

        let mut t = stored.clone();
        t.messages.push(serde_json::json!({"role": "assistant"}));
        let stored = store.update_topic(t).unwrap();
        assert!(stored.messages.is_empty());
    }

    #[test]
    fn test_topic_crud_contracts() {
        let mut store = store_at(1);
        store.add_topic(topic("t1", "Hello")).unwrap();
        assert!(matches!(
            store.add_topic(topic("t1", "Again")),
            Err(ChatFoldersError::DuplicateId { .. })
        ));
        assert!(matches!(
            store.update_topic(topic("t2", "Missing")),
            Err(ChatFoldersError::NotFound { .. })
        ));
        store.remove_topic("t1").unwrap();
        assert!(matches!(
            store.remove_topic("t1"),
            Err(ChatFoldersError::NotFound { .. })
        ));
    }

    #[test]
    fn test_replace_all_topics_dedupes() {
        let mut store = store_at(1);
        store.add_topic(topic("old", "Old")).unwrap();
        let report = store.replace_all_topics(vec![
            topic("t1", "First"),
            topic("t1", "Second"),
            topic("t2", "Other"),
        ]);
        assert!(report.is_complete());
        assert_eq!(store.topic_count(), 2);
        assert_eq!(store.topic("t1").unwrap().name, "First");
        assert!(!store.contains_topic("old"));
    }

    #[test]
    fn test_folders_sorted_by_updated_at() {
        let mut store = store_at(10);
        store.add_folder(Folder::new("a", "A")).unwrap();
        let mut b = Folder::new("b", "B");
        b.updated_at = 5;
        store.add_folder(b).unwrap();

        let order: Vec<&str> = store.folders().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(order[0], "b");
    }

    #[test]
    fn test_take_changes_tracks_writes_and_removals() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("a", "A")).unwrap();
        let changes = store.take_changes();
        assert!(changes.folders.contains("a"));
        assert!(changes.folders.contains(ROOT_FOLDER_ID));

        store.remove_folder("a").unwrap();
        let changes = store.take_changes();
        assert!(changes.removed_folders.contains("a"));
        assert!(!changes.folders.contains("a"));
        assert!(store.take_changes().is_empty());
    }

    #[test]
    fn test_restore_changes_yields_to_newer() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("a", "A")).unwrap();
        store.add_topic(topic("t1", "T")).unwrap();
        let earlier = store.take_changes();

        // Newer removals win over the re-queued writes
        store.remove_folder("a").unwrap();
        store.remove_topic("t1").unwrap();
        store.restore_changes(earlier);

        let changes = store.take_changes();
        assert!(!changes.folders.contains("a"));
        assert!(changes.removed_folders.contains("a"));
        assert!(changes.folders.contains(ROOT_FOLDER_ID));
        assert!(!changes.topics.contains("t1"));
        assert!(changes.removed_topics.contains("t1"));
    }

    #[test]
    fn test_folder_names_excludes_root() {
        let mut store = store_at(1);
        store.add_folder(Folder::new("a", "Untitled 1")).unwrap();
        assert_eq!(store.folder_names(), ["Untitled 1"]);
    }
}
