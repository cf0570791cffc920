//! Load-time repair of stored records.
//!
//! Records coming back from durable storage may predate the current rules or
//! have been written by an interrupted process. [`reconcile`] turns them into
//! a consistent set before they are handed to the
//! [`EntityStore`](crate::store::EntityStore):
//!
//! - the root folder exists and has no parent
//! - every other folder has an existing parent, and no parent chain loops
//! - every `child_folder_ids` matches the parent pointers exactly
//! - no topic is listed by two folders (the first holder keeps it)
//!
//! Topic ids without a topic record are kept: topics may be registered by the
//! chat layer after loading.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::error::EntityKind;
use crate::types::{Folder, ROOT_FOLDER_ID, Topic};

/// One change made while reconciling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Repair {
    /// No root folder was stored; a fresh one was created.
    SeededRoot,
    /// A second record with an already-seen id was dropped.
    DroppedDuplicateRecord {
        /// Record kind
        kind: EntityKind,
        /// The repeated id
        id: String,
    },
    /// A folder's parent was missing, so it now hangs off the root.
    ReattachedToRoot {
        /// The folder
        folder: String,
        /// Its previous parent id
        previous_parent: Option<String>,
    },
    /// A folder sat on a parent loop and was moved under the root.
    BrokeCycle {
        /// The folder
        folder: String,
    },
    /// A folder's child list did not match its children's parent pointers.
    RelinkedChildren {
        /// The folder
        folder: String,
    },
    /// A topic listed by an earlier folder was removed from this one.
    DroppedDuplicateMembership {
        /// The topic
        topic: String,
        /// The folder that lost it
        folder: String,
    },
}

/// Consistent records plus what had to change.
#[derive(Debug, Default)]
pub struct Reconciled {
    /// Folders keyed by id, root first
    pub folders: IndexMap<String, Folder>,
    /// Topics keyed by id
    pub topics: IndexMap<String, Topic>,
    /// Repairs made, in order
    pub repairs: Vec<Repair>,
    /// Folders whose stored record differs from the repaired one
    pub changed_folders: IndexSet<String>,
}

/// Repair loaded records. `now` fills in missing timestamps.
pub fn reconcile(folders: Vec<Folder>, topics: Vec<Topic>, now: i64) -> Reconciled {
    let mut out = Reconciled::default();

    // Topics: first record wins, payloads stripped.
    for mut topic in topics {
        if out.topics.contains_key(&topic.id) {
            out.repairs.push(Repair::DroppedDuplicateRecord {
                kind: EntityKind::Topic,
                id: topic.id,
            });
            continue;
        }
        if topic.created_at == 0 {
            topic.created_at = now;
        }
        if topic.updated_at == 0 {
            topic.updated_at = topic.created_at;
        }
        topic.messages.clear();
        out.topics.insert(topic.id.clone(), topic);
    }

    // Folders: first record wins, root first.
    let mut loaded: IndexMap<String, Folder> = IndexMap::new();
    for folder in folders {
        if loaded.contains_key(&folder.id) {
            out.repairs.push(Repair::DroppedDuplicateRecord {
                kind: EntityKind::Folder,
                id: folder.id,
            });
            continue;
        }
        loaded.insert(folder.id.clone(), folder);
    }

    let root = match loaded.shift_remove(ROOT_FOLDER_ID) {
        Some(mut root) => {
            if root.parent_folder_id.take().is_some() {
                out.changed_folders.insert(ROOT_FOLDER_ID.to_string());
            }
            root
        }
        None => {
            out.repairs.push(Repair::SeededRoot);
            out.changed_folders.insert(ROOT_FOLDER_ID.to_string());
            Folder::root(now)
        }
    };
    out.folders.insert(ROOT_FOLDER_ID.to_string(), root);
    for (id, mut folder) in loaded {
        if folder.created_at == 0 {
            folder.created_at = now;
        }
        if folder.updated_at == 0 {
            folder.updated_at = folder.created_at;
        }
        out.folders.insert(id, folder);
    }

    reattach_orphans(&mut out);
    break_cycles(&mut out);
    relink_children(&mut out);
    dedupe_membership(&mut out);

    out
}

fn reattach_orphans(out: &mut Reconciled) {
    let ids: Vec<String> = out.folders.keys().cloned().collect();
    for id in ids {
        if id == ROOT_FOLDER_ID {
            continue;
        }
        let parent = out.folders[&id].parent_folder_id.clone();
        let valid = parent
            .as_deref()
            .is_some_and(|p| p != id && out.folders.contains_key(p));
        if valid {
            continue;
        }
        // A plain missing parent is the legacy "top level" encoding.
        if parent.is_some() {
            out.repairs.push(Repair::ReattachedToRoot {
                folder: id.clone(),
                previous_parent: parent,
            });
        }
        out.folders[&id].parent_folder_id = Some(ROOT_FOLDER_ID.to_string());
        out.changed_folders.insert(id);
    }
}

fn loops_back(folders: &IndexMap<String, Folder>, start: &str) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = folders.get(start).and_then(|f| f.parent_id());
    while let Some(id) = current {
        if id == start {
            return true;
        }
        if !seen.insert(id) {
            // Leads into a loop that does not include `start`.
            return false;
        }
        current = folders.get(id).and_then(|f| f.parent_id());
    }
    false
}

fn break_cycles(out: &mut Reconciled) {
    let ids: Vec<String> = out.folders.keys().cloned().collect();
    for id in ids {
        if loops_back(&out.folders, &id) {
            out.folders[&id].parent_folder_id = Some(ROOT_FOLDER_ID.to_string());
            out.repairs.push(Repair::BrokeCycle { folder: id.clone() });
            out.changed_folders.insert(id);
        }
    }
}

fn relink_children(out: &mut Reconciled) {
    let mut expected: IndexMap<String, IndexSet<String>> = IndexMap::new();
    for folder in out.folders.values() {
        if let Some(parent) = folder.parent_id() {
            expected
                .entry(parent.to_string())
                .or_default()
                .insert(folder.id.clone());
        }
    }

    for folder in out.folders.values_mut() {
        let wanted = expected.shift_remove(&folder.id).unwrap_or_default();
        // Keep the stored order for valid links, append the rest.
        let mut relinked: IndexSet<String> = folder
            .child_folder_ids
            .iter()
            .filter(|id| wanted.contains(*id))
            .cloned()
            .collect();
        relinked.extend(wanted);

        let unchanged = relinked.len() == folder.child_folder_ids.len()
            && relinked.iter().eq(folder.child_folder_ids.iter());
        if !unchanged {
            folder.child_folder_ids = relinked;
            out.repairs.push(Repair::RelinkedChildren {
                folder: folder.id.clone(),
            });
            out.changed_folders.insert(folder.id.clone());
        }
    }
}

fn dedupe_membership(out: &mut Reconciled) {
    let mut claimed: HashSet<String> = HashSet::new();
    for folder in out.folders.values_mut() {
        let before = folder.topic_ids.len();
        let mut dropped = Vec::new();
        folder.topic_ids.retain(|topic| {
            if claimed.insert(topic.clone()) {
                true
            } else {
                dropped.push(topic.clone());
                false
            }
        });
        if folder.topic_ids.len() != before {
            for topic in dropped {
                out.repairs.push(Repair::DroppedDuplicateMembership {
                    topic,
                    folder: folder.id.clone(),
                });
            }
            out.changed_folders.insert(folder.id.clone());
        }
    }
}
