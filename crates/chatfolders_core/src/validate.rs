//! Structural integrity checks.
//!
//! This module inspects an [`EntityStore`] for broken parent/child links,
//! cycles and duplicate topic membership. A store only ever changed through
//! [`FolderManager`](crate::manager::FolderManager) always validates cleanly;
//! the checks exist for data loaded from elsewhere and as a test oracle.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::store::EntityStore;
use crate::types::ROOT_FOLDER_ID;

/// A validation error indicating a broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ValidationError {
    /// The root folder is missing.
    MissingRoot,
    /// A folder's parent does not exist.
    DanglingParent {
        /// The folder with the broken parent
        folder: String,
        /// The missing parent id
        parent: String,
    },
    /// A folder lists a child whose parent is some other folder (or missing).
    BrokenBackLink {
        /// The folder listing the child
        folder: String,
        /// The listed child id
        child: String,
    },
    /// A folder's parent does not list it as a child.
    MissingBackLink {
        /// The parent folder
        parent: String,
        /// The unlisted child
        child: String,
    },
    /// Following parents from this folder loops back on itself.
    Cycle {
        /// The folders on the loop
        folders: Vec<String>,
    },
    /// A topic is listed by more than one folder.
    DuplicateMembership {
        /// The topic
        topic: String,
        /// Every folder listing it
        folders: Vec<String>,
    },
}

/// A validation warning indicating a harmless inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ValidationWarning {
    /// A folder lists a topic id with no topic record.
    StaleTopicRef {
        /// The folder
        folder: String,
        /// The unknown topic id
        topic: String,
    },
    /// A non-root folder has no parent at all.
    MissingParent {
        /// The folder
        folder: String,
    },
}

/// Result of validating a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Broken invariants
    pub errors: Vec<ValidationError>,
    /// Harmless inconsistencies
    pub warnings: Vec<ValidationWarning>,
    /// Number of folders checked
    pub folders_checked: usize,
}

impl ValidationResult {
    /// Returns true if validation passed with no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are any errors or warnings.
    pub fn has_issues(&self) -> bool {
        !self.errors.is_empty() || !self.warnings.is_empty()
    }
}

/// Check every structural invariant of `store`.
pub fn validate(store: &EntityStore) -> ValidationResult {
    let mut result = ValidationResult::default();
    let folders: Vec<_> = store.folders_in_insertion_order().collect();
    result.folders_checked = folders.len();

    match store.folder(ROOT_FOLDER_ID) {
        None => result.errors.push(ValidationError::MissingRoot),
        Some(root) if root.parent_folder_id.is_some() => {
            result.errors.push(ValidationError::Cycle {
                folders: vec![ROOT_FOLDER_ID.to_string()],
            })
        }
        Some(_) => {}
    }

    let mut holders: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut reported_cycles: HashSet<&str> = HashSet::new();

    for folder in &folders {
        // Parent side
        match folder.parent_id() {
            Some(parent_id) => match store.folder(parent_id) {
                None => result.errors.push(ValidationError::DanglingParent {
                    folder: folder.id.clone(),
                    parent: parent_id.to_string(),
                }),
                Some(parent) if !parent.child_folder_ids.contains(&folder.id) => {
                    result.errors.push(ValidationError::MissingBackLink {
                        parent: parent_id.to_string(),
                        child: folder.id.clone(),
                    })
                }
                Some(_) => {}
            },
            None if !folder.is_root() => result.warnings.push(ValidationWarning::MissingParent {
                folder: folder.id.clone(),
            }),
            None => {}
        }

        // Child side
        for child_id in &folder.child_folder_ids {
            let linked = store
                .folder(child_id)
                .is_some_and(|c| c.parent_id() == Some(folder.id.as_str()));
            if !linked {
                result.errors.push(ValidationError::BrokenBackLink {
                    folder: folder.id.clone(),
                    child: child_id.clone(),
                });
            }
        }

        // Membership
        for topic_id in &folder.topic_ids {
            holders
                .entry(topic_id.as_str())
                .or_default()
                .push(folder.id.as_str());
            if !store.contains_topic(topic_id) {
                result.warnings.push(ValidationWarning::StaleTopicRef {
                    folder: folder.id.clone(),
                    topic: topic_id.clone(),
                });
            }
        }

        // Cycles
        if !reported_cycles.contains(folder.id.as_str())
            && let Some(cycle) = find_cycle(store, &folder.id)
        {
            for id in &cycle {
                if let Some(f) = store.folder(id) {
                    reported_cycles.insert(f.id.as_str());
                }
            }
            result.errors.push(ValidationError::Cycle { folders: cycle });
        }
    }

    let mut duplicates: Vec<_> = holders
        .into_iter()
        .filter(|(_, folders)| folders.len() > 1)
        .collect();
    duplicates.sort_by_key(|(topic, _)| *topic);
    for (topic, folders) in duplicates {
        result.errors.push(ValidationError::DuplicateMembership {
            topic: topic.to_string(),
            folders: folders.into_iter().map(String::from).collect(),
        });
    }

    result
}

/// Follow parent links from `start`; return the loop if one is reached.
pub(crate) fn find_cycle(store: &EntityStore, start: &str) -> Option<Vec<String>> {
    let mut chain: Vec<&str> = Vec::new();
    let mut current = store.folder(start);
    while let Some(folder) = current {
        if let Some(pos) = chain.iter().position(|id| *id == folder.id) {
            return Some(chain[pos..].iter().map(|s| s.to_string()).collect());
        }
        chain.push(folder.id.as_str());
        current = folder.parent_id().and_then(|id| store.folder(id));
    }
    None
}
