//! Core record types for folders and topics.
//!
//! This module contains the two normalized record types kept by the
//! [`EntityStore`](crate::store::EntityStore):
//! - `Folder` - a named container with a parent link, child links and topic membership
//! - `Topic` - a chat session's metadata
//!
//! Timestamps are Unix milliseconds. A value of `0` means "not set yet"; the
//! store fills it in when the record is first written.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The reserved id of the always-present root folder.
///
/// Every top-level folder has this id as its parent. Topics that no folder
/// lists are shown under the root as "unassigned".
pub const ROOT_FOLDER_ID: &str = "root";

/// Display name of the root folder.
pub const ROOT_FOLDER_NAME: &str = "Root";

/// A folder in the sidebar hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Folder {
    /// Unique, immutable id
    pub id: String,

    /// Display name
    pub name: String,

    /// Parent folder id. `None` only for the root folder; the store
    /// normalizes any other parentless folder to [`ROOT_FOLDER_ID`].
    #[serde(default)]
    pub parent_folder_id: Option<String>,

    /// Ids of folders whose parent is this folder.
    /// Maintained by the store, never by callers.
    #[serde(default)]
    pub child_folder_ids: IndexSet<String>,

    /// Ids of topics directly assigned to this folder
    #[serde(default)]
    pub topic_ids: IndexSet<String>,

    /// Position hint used by [`ChildOrder::SortOrder`](crate::tree::ChildOrder)
    #[serde(default)]
    pub sort_order: i64,

    /// Creation time (Unix milliseconds)
    #[serde(default)]
    pub created_at: i64,

    /// Last modification time (Unix milliseconds)
    #[serde(default)]
    pub updated_at: i64,
}

impl Folder {
    /// Create a folder with the given id and name, attached to the root.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_folder_id: Some(ROOT_FOLDER_ID.to_string()),
            child_folder_ids: IndexSet::new(),
            topic_ids: IndexSet::new(),
            sort_order: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Set the parent folder (builder pattern).
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_folder_id = Some(parent_id.into());
        self
    }

    /// Set the directly assigned topics (builder pattern).
    pub fn with_topics<I, S>(mut self, topic_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topic_ids = topic_ids.into_iter().map(Into::into).collect();
        self
    }

    /// The root folder record as seeded into every store.
    pub fn root(now: i64) -> Self {
        Self {
            id: ROOT_FOLDER_ID.to_string(),
            name: ROOT_FOLDER_NAME.to_string(),
            parent_folder_id: None,
            child_folder_ids: IndexSet::new(),
            topic_ids: IndexSet::new(),
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if this is the sentinel root folder
    pub fn is_root(&self) -> bool {
        self.id == ROOT_FOLDER_ID
    }

    /// Parent id as a string slice
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_folder_id.as_deref()
    }
}

/// Metadata for a chat topic.
///
/// Message bodies live in an external store; any `messages` passed in are
/// dropped when the topic is written to the [`EntityStore`](crate::store::EntityStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Topic {
    /// Unique id
    pub id: String,

    /// Display name
    pub name: String,

    /// Id of the assistant that owns this chat session
    #[serde(default)]
    pub assistant_id: String,

    /// Embedded message payloads. Always empty once stored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<serde_json::Value>,

    /// Creation time (Unix milliseconds)
    #[serde(default)]
    pub created_at: i64,

    /// Last modification time (Unix milliseconds)
    #[serde(default)]
    pub updated_at: i64,
}

impl Topic {
    /// Create a topic with the given id, name and assistant.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        assistant_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            assistant_id: assistant_id.into(),
            messages: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_folder_attaches_to_root() {
        let folder = Folder::new("f1", "Work");
        assert_eq!(folder.parent_id(), Some(ROOT_FOLDER_ID));
        assert!(!folder.is_root());
    }

    #[test]
    fn test_folder_json_uses_camel_case() {
        let folder = Folder::new("f1", "Work").with_topics(["t1"]);
        let json = serde_json::to_value(&folder).unwrap();
        assert_eq!(json["parentFolderId"], "root");
        assert_eq!(json["topicIds"][0], "t1");
        assert!(json.get("childFolderIds").is_some());
    }

    #[test]
    fn test_folder_deserializes_with_missing_sets() {
        let folder: Folder =
            serde_json::from_str(r#"{"id":"f1","name":"Work","parentFolderId":null}"#).unwrap();
        assert!(folder.topic_ids.is_empty());
        assert!(folder.child_folder_ids.is_empty());
        assert_eq!(folder.created_at, 0);
    }

    #[test]
    fn test_topic_skips_empty_messages() {
        let topic = Topic::new("t1", "Hello", "a1");
        let json = serde_json::to_value(&topic).unwrap();
        assert!(json.get("messages").is_none());
        assert_eq!(json["assistantId"], "a1");
    }
}
