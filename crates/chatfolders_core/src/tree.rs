//! Presentational tree built from the normalized store.
//!
//! [`materialize`] is a pure function of the store, an [`ExpansionState`] and
//! [`TreeOptions`]. Expansion state belongs to the UI: it is never written into
//! folder records, only kept alongside them (and optionally persisted through
//! the storage key-value area under [`EXPANDED_KEYS_STORAGE_KEY`]).

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::index::HierarchyIndex;
use crate::store::EntityStore;
use crate::types::{Folder, ROOT_FOLDER_ID, Topic};

/// Storage key for the persisted set of expanded node ids.
pub const EXPANDED_KEYS_STORAGE_KEY: &str = "chats-folder-expanded-keys";

/// What a tree node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum NodeKind {
    /// A folder
    Folder,
    /// A topic
    Topic,
    /// Stand-in for children cut off by the depth limit
    More,
}

/// Node in the folder tree (for display purposes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TreeNode {
    /// Folder or topic id
    pub id: String,
    /// Display name
    pub name: String,
    /// Node kind
    pub kind: NodeKind,
    /// Child folders first, then topics
    pub children: Vec<TreeNode>,
    /// Whether the UI shows this node expanded
    pub is_open: bool,
}

impl TreeNode {
    fn folder(folder: &Folder, is_open: bool, children: Vec<TreeNode>) -> Self {
        Self {
            id: folder.id.clone(),
            name: folder.name.clone(),
            kind: NodeKind::Folder,
            children,
            is_open,
        }
    }

    fn topic(topic: &Topic) -> Self {
        Self {
            id: topic.id.clone(),
            name: topic.name.clone(),
            kind: NodeKind::Topic,
            children: Vec::new(),
            is_open: false,
        }
    }

    fn more(parent_id: &str, hidden: usize) -> Self {
        Self {
            id: format!("{}:more", parent_id),
            name: format!("... ({} more)", hidden),
            kind: NodeKind::More,
            children: Vec::new(),
            is_open: false,
        }
    }

    /// Number of direct children of the given kind.
    pub fn count_children(&self, kind: NodeKind) -> usize {
        self.children.iter().filter(|c| c.kind == kind).count()
    }

    /// Depth-first search for a node by id.
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// Sibling ordering within a folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ChildOrder {
    /// Link order: child folders in the order they were attached, topics in the
    /// order they were assigned
    #[default]
    Merged,
    /// Folders by `sort_order` then name; topics by name
    SortOrder,
}

/// Options for [`materialize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeOptions {
    /// Levels below the root to expand. `None` means unlimited.
    pub max_depth: Option<usize>,
    /// Sibling ordering
    pub child_order: ChildOrder,
}

/// The set of expanded node ids, owned by the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpansionState {
    open: IndexSet<String>,
}

impl ExpansionState {
    /// Create an empty state (everything but the root collapsed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of open ids.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            open: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Expand a node.
    pub fn open(&mut self, id: &str) {
        self.open.insert(id.to_string());
    }

    /// Collapse a node.
    pub fn close(&mut self, id: &str) {
        self.open.shift_remove(id);
    }

    /// Flip a node and return its new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.open.shift_remove(id) {
            false
        } else {
            self.open.insert(id.to_string());
            true
        }
    }

    /// Returns true if the node is expanded. The root always is.
    pub fn is_open(&self, id: &str) -> bool {
        id == ROOT_FOLDER_ID || self.open.contains(id)
    }

    /// Forget ids of folders that no longer exist.
    pub fn retain_existing(&mut self, store: &EntityStore) {
        self.open.retain(|id| store.contains_folder(id));
    }

    /// Expanded ids in the order they were opened.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.open.iter().map(String::as_str)
    }

    /// Number of expanded ids.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Returns true if nothing is expanded.
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

/// Build the display tree rooted at the root folder.
///
/// Each folder lists its child folders, then its own topics. The root also
/// lists every unassigned topic after its own topics.
pub fn materialize(
    store: &EntityStore,
    expansion: &ExpansionState,
    options: &TreeOptions,
) -> TreeNode {
    let index = HierarchyIndex::new(store);
    let mut visited = HashSet::new();
    build_folder_node(
        &index,
        store.root(),
        expansion,
        options,
        options.max_depth,
        &mut visited,
    )
}

fn build_folder_node(
    index: &HierarchyIndex<'_>,
    folder: &Folder,
    expansion: &ExpansionState,
    options: &TreeOptions,
    depth: Option<usize>,
    visited: &mut HashSet<String>,
) -> TreeNode {
    visited.insert(folder.id.clone());
    let is_open = expansion.is_open(&folder.id);

    let mut folders = index.children_of(&folder.id);
    let mut topics = if folder.is_root() {
        index.root_topics()
    } else {
        index.topics_of(&folder.id)
    };

    if options.child_order == ChildOrder::SortOrder {
        folders.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        topics.sort_by(|a, b| a.name.cmp(&b.name));
    }

    let child_count = folders.len() + topics.len();
    let mut children = Vec::with_capacity(child_count);

    if depth == Some(0) {
        if child_count > 0 {
            children.push(TreeNode::more(&folder.id, child_count));
        }
    } else {
        let next_depth = depth.map(|d| d - 1);
        for child in folders {
            if visited.contains(&child.id) {
                log::warn!("Skipping folder {} already present in tree", child.id);
                continue;
            }
            children.push(build_folder_node(
                index, child, expansion, options, next_depth, visited,
            ));
        }
        children.extend(topics.into_iter().map(TreeNode::topic));
    }

    TreeNode::folder(folder, is_open, children)
}

/// Render a tree as indented ASCII.
///
/// With `respect_expansion`, children of collapsed folders are hidden and the
/// folder shows a `[+]` marker instead.
pub fn format_tree(node: &TreeNode, respect_expansion: bool) -> String {
    format_tree_node(node, "", respect_expansion)
}

fn format_tree_node(node: &TreeNode, prefix: &str, respect_expansion: bool) -> String {
    let mut result = String::new();

    result.push_str(&node.name);
    let collapsed = respect_expansion && !node.is_open;
    match node.kind {
        NodeKind::Folder if collapsed && !node.children.is_empty() => result.push_str("/ [+]"),
        NodeKind::Folder => result.push('/'),
        NodeKind::Topic | NodeKind::More => {}
    }
    result.push('\n');

    if collapsed {
        return result;
    }

    let child_count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == child_count - 1;
        let connector = if is_last_child {
            "└── "
        } else {
            "├── "
        };
        let child_prefix = if is_last_child { "    " } else { "│   " };

        result.push_str(prefix);
        result.push_str(connector);
        result.push_str(&format_tree_node(
            child,
            &format!("{}{}", prefix, child_prefix),
            respect_expansion,
        ));
    }

    result
}
