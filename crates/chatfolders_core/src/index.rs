//! Derived, read-only relationships over an [`EntityStore`].
//!
//! Nothing here is cached: every query walks the current store state.

use std::collections::{HashSet, VecDeque};

use crate::store::EntityStore;
use crate::types::{Folder, ROOT_FOLDER_ID, Topic};

/// Read-only view answering parent/child and membership questions.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyIndex<'a> {
    store: &'a EntityStore,
}

impl<'a> HierarchyIndex<'a> {
    /// Create a view over `store`.
    pub fn new(store: &'a EntityStore) -> Self {
        Self { store }
    }

    /// Child folders of `folder_id`, in link order. Empty for unknown ids.
    pub fn children_of(&self, folder_id: &str) -> Vec<&'a Folder> {
        let Some(folder) = self.store.folder(folder_id) else {
            return Vec::new();
        };
        folder
            .child_folder_ids
            .iter()
            .filter_map(|id| self.store.folder(id))
            .collect()
    }

    /// Topics directly assigned to `folder_id`. Ids without a record are skipped.
    pub fn topics_of(&self, folder_id: &str) -> Vec<&'a Topic> {
        let Some(folder) = self.store.folder(folder_id) else {
            return Vec::new();
        };
        folder
            .topic_ids
            .iter()
            .filter_map(|id| self.store.topic(id))
            .collect()
    }

    /// Every topic id listed by any folder.
    pub fn all_folder_topic_ids(&self) -> HashSet<&'a str> {
        self.store
            .folders_in_insertion_order()
            .flat_map(|f| f.topic_ids.iter().map(String::as_str))
            .collect()
    }

    /// Topics that no folder lists.
    pub fn unassigned_topics(&self) -> Vec<&'a Topic> {
        let assigned = self.all_folder_topic_ids();
        self.store
            .topics_in_insertion_order()
            .filter(|t| !assigned.contains(t.id.as_str()))
            .collect()
    }

    /// Topics shown at the top level of the sidebar: the root folder's own
    /// topics followed by every unassigned topic.
    pub fn root_topics(&self) -> Vec<&'a Topic> {
        let mut topics = self.topics_of(ROOT_FOLDER_ID);
        topics.extend(self.unassigned_topics());
        topics
    }

    /// The folder currently listing `topic_id`, if any.
    pub fn folder_of(&self, topic_id: &str) -> Option<&'a Folder> {
        self.store
            .folders_in_insertion_order()
            .find(|f| f.topic_ids.contains(topic_id))
    }

    /// All folders below `folder_id`, breadth-first, excluding `folder_id` itself.
    pub fn descendants_of(&self, folder_id: &str) -> Vec<&'a Folder> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        visited.insert(folder_id);
        queue.push_back(folder_id);

        while let Some(current) = queue.pop_front() {
            let Some(folder) = self.store.folder(current) else {
                continue;
            };
            for child_id in &folder.child_folder_ids {
                if !visited.insert(child_id.as_str()) {
                    continue;
                }
                if let Some(child) = self.store.folder(child_id) {
                    result.push(child);
                    queue.push_back(child.id.as_str());
                }
            }
        }

        result
    }

    /// Returns true if `candidate` is somewhere below `ancestor`.
    pub fn is_descendant(&self, ancestor: &str, candidate: &str) -> bool {
        self.descendants_of(ancestor)
            .iter()
            .any(|f| f.id == candidate)
    }

    /// Folders from the root down to `folder_id` (inclusive). Empty for unknown ids.
    pub fn path_to(&self, folder_id: &str) -> Vec<&'a Folder> {
        let mut path = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = self.store.folder(folder_id);
        while let Some(folder) = current {
            if !seen.insert(folder.id.as_str()) {
                break;
            }
            path.push(folder);
            current = folder.parent_id().and_then(|id| self.store.folder(id));
        }
        path.reverse();
        path
    }

    /// Resolve a list of topic ids, skipping unknown ones.
    pub fn topics_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&'a Topic> {
        ids.iter()
            .filter_map(|id| self.store.topic(id.as_ref()))
            .collect()
    }

    /// Topics belonging to an assistant.
    pub fn topics_for_assistant(&self, assistant_id: &str) -> Vec<&'a Topic> {
        self.store
            .topics_in_insertion_order()
            .filter(|t| t.assistant_id == assistant_id)
            .collect()
    }
}
