//! Command execution handler.
//!
//! This module contains the implementation of the `execute()` method for
//! [`FolderManager`]. It maps every [`Command`] onto the manager's operations
//! and wraps the result in a [`Response`].

use crate::command::{BatchOutcome, Command, Response};
use crate::error::{ChatFoldersError, Result};
use crate::manager::FolderManager;
use crate::tree::ExpansionState;

fn owned<T: Clone>(items: Vec<&T>) -> Vec<T> {
    items.into_iter().cloned().collect()
}

impl FolderManager {
    /// Execute a command and return the response.
    ///
    /// This is the unified command interface that replaces individual method calls.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use chatfolders_core::{Command, Response};
    ///
    /// let cmd = Command::GetFolderTopics { id: "folder-1".to_string() };
    /// if let Response::Topics(topics) = manager.execute(cmd)? {
    ///     println!("{} topic(s)", topics.len());
    /// }
    /// ```
    pub fn execute(&mut self, command: Command) -> Result<Response> {
        match command {
            // === Folder Operations ===
            Command::CreateFolder { name, parent_id } => {
                let folder = self.create_folder(&name, parent_id.as_deref())?;
                Ok(Response::Folder(folder))
            }

            Command::RenameFolder { id, name } => {
                Ok(Response::Folder(self.rename_folder(&id, &name)?))
            }

            Command::DeleteFolder { id } => Ok(Response::DeletedSubtree(self.delete_folder(&id)?)),

            Command::ReparentFolder { id, parent_id } => {
                let folder = self.reparent_folder(&id, parent_id.as_deref())?;
                Ok(Response::Folder(folder))
            }

            // === Topic Operations ===
            Command::AssignTopics {
                folder_id,
                topic_ids,
            } => {
                let folder = self.assign_topics_to_folder(&folder_id, &topic_ids)?;
                Ok(Response::Folder(folder))
            }

            Command::MoveTopics {
                source_id,
                target_id,
                topic_ids,
            } => {
                self.move_topics(source_id.as_deref(), target_id.as_deref(), &topic_ids)?;
                Ok(Response::Ok)
            }

            Command::RegisterTopic { topic, folder_id } => {
                let topic = self.register_topic(topic, folder_id.as_deref())?;
                Ok(Response::Topic(topic))
            }

            Command::UpdateTopic { topic } => Ok(Response::Topic(self.update_topic(topic)?)),

            Command::RenameTopic { id, name } => Ok(Response::Topic(self.rename_topic(&id, &name)?)),

            Command::DeleteTopic { id } => Ok(Response::Topic(self.delete_topic(&id)?)),

            Command::SyncTopics { topics } => {
                let report = self.sync_topics(topics);
                Ok(Response::Batch(BatchOutcome::from(report)))
            }

            // === Queries ===
            Command::GetTree { depth, expanded } => {
                let expansion = match expanded {
                    Some(ids) => ExpansionState::from_ids(ids),
                    None => self.load_expansion(),
                };
                let tree = self.tree(&expansion, depth.map(|d| d as usize));
                Ok(Response::Tree(tree))
            }

            Command::GetFolder { id } => match self.store().folder(&id) {
                Some(folder) => Ok(Response::Folder(folder.clone())),
                None => Err(ChatFoldersError::folder_not_found(id)),
            },

            Command::GetTopic { id } => match self.store().topic(&id) {
                Some(topic) => Ok(Response::Topic(topic.clone())),
                None => Err(ChatFoldersError::topic_not_found(id)),
            },

            Command::ListFolders => Ok(Response::Folders(owned(self.store().folders()))),

            Command::ListTopics => Ok(Response::Topics(owned(self.store().topics()))),

            Command::GetChildren { id } => {
                if !self.store().contains_folder(&id) {
                    return Err(ChatFoldersError::folder_not_found(id));
                }
                Ok(Response::Folders(owned(self.index().children_of(&id))))
            }

            Command::GetFolderTopics { id } => {
                if !self.store().contains_folder(&id) {
                    return Err(ChatFoldersError::folder_not_found(id));
                }
                Ok(Response::Topics(owned(self.index().topics_of(&id))))
            }

            Command::GetUnassignedTopics => {
                Ok(Response::Topics(owned(self.index().unassigned_topics())))
            }

            Command::GetRootTopics => Ok(Response::Topics(owned(self.index().root_topics()))),

            Command::GetFolderPath { id } => {
                if !self.store().contains_folder(&id) {
                    return Err(ChatFoldersError::folder_not_found(id));
                }
                Ok(Response::Folders(owned(self.index().path_to(&id))))
            }

            Command::NextUntitledName => Ok(Response::String(self.next_untitled_name())),

            Command::Validate => Ok(Response::ValidationResult(self.check())),

            // === UI State ===
            Command::GetExpandedKeys => {
                let state = self.load_expansion();
                Ok(Response::Strings(state.ids().map(String::from).collect()))
            }

            Command::SetExpandedKeys { ids } => {
                let mut state = ExpansionState::from_ids(ids);
                state.retain_existing(self.store());
                self.save_expansion(&state)?;
                Ok(Response::Ok)
            }

            Command::ToggleExpanded { id } => {
                if !self.store().contains_folder(&id) {
                    return Err(ChatFoldersError::folder_not_found(id));
                }
                let mut state = self.load_expansion();
                let open = state.toggle(&id);
                self.save_expansion(&state)?;
                Ok(Response::Bool(open))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Harness, topic};
    use crate::tree::NodeKind;

    fn create(h: &mut Harness, name: &str, parent: Option<&str>) -> String {
        let cmd = Command::CreateFolder {
            name: name.to_string(),
            parent_id: parent.map(String::from),
        };
        match h.manager.execute(cmd).unwrap() {
            Response::Folder(folder) => folder.id,
            other => panic!("Wrong response type: {:?}", other),
        }
    }

    #[test]
    fn test_folder_commands() {
        let mut h = Harness::new();
        let work = create(&mut h, "Work", None);
        let projects = create(&mut h, "Projects", Some(&work));

        let resp = h
            .manager
            .execute(Command::GetChildren { id: work.clone() })
            .unwrap();
        match resp {
            Response::Folders(children) => assert_eq!(children[0].id, projects),
            other => panic!("Wrong response type: {:?}", other),
        }

        let resp = h
            .manager
            .execute(Command::GetFolderPath {
                id: projects.clone(),
            })
            .unwrap();
        match resp {
            Response::Folders(path) => {
                let ids: Vec<&str> = path.iter().map(|f| f.id.as_str()).collect();
                assert_eq!(ids, ["root", work.as_str(), projects.as_str()]);
            }
            other => panic!("Wrong response type: {:?}", other),
        }

        let resp = h
            .manager
            .execute(Command::DeleteFolder { id: work.clone() })
            .unwrap();
        match resp {
            Response::DeletedSubtree(deleted) => assert_eq!(deleted.folders.len(), 2),
            other => panic!("Wrong response type: {:?}", other),
        }
        h.assert_consistent();
    }

    #[test]
    fn test_errors_propagate() {
        let mut h = Harness::new();
        let err = h
            .manager
            .execute(Command::GetFolder {
                id: "missing".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.to_serializable().kind, "NotFound");

        let err = h
            .manager
            .execute(Command::DeleteFolder {
                id: "root".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ChatFoldersError::RootDeletion));
    }

    #[test]
    fn test_topic_commands() {
        let mut h = Harness::new();
        let work = create(&mut h, "Work", None);

        h.manager
            .execute(Command::RegisterTopic {
                topic: topic("t1", "Hello"),
                folder_id: None,
            })
            .unwrap();
        h.manager
            .execute(Command::AssignTopics {
                folder_id: work.clone(),
                topic_ids: vec!["t1".to_string()],
            })
            .unwrap();

        match h.manager.execute(Command::GetUnassignedTopics).unwrap() {
            Response::Topics(topics) => assert!(topics.is_empty()),
            other => panic!("Wrong response type: {:?}", other),
        }

        h.manager
            .execute(Command::MoveTopics {
                source_id: Some(work.clone()),
                target_id: None,
                topic_ids: vec!["t1".to_string()],
            })
            .unwrap();
        match h.manager.execute(Command::GetRootTopics).unwrap() {
            Response::Topics(topics) => assert_eq!(topics[0].id, "t1"),
            other => panic!("Wrong response type: {:?}", other),
        }
    }

    #[test]
    fn test_sync_topics_command() {
        let mut h = Harness::new();
        let resp = h
            .manager
            .execute(Command::SyncTopics {
                topics: vec![topic("t1", "A"), topic("t2", "B")],
            })
            .unwrap();
        match resp {
            Response::Batch(outcome) => {
                assert_eq!(outcome.applied, ["t1", "t2"]);
                assert!(outcome.failed.is_empty());
            }
            other => panic!("Wrong response type: {:?}", other),
        }
    }

    #[test]
    fn test_tree_and_expansion_commands() {
        let mut h = Harness::new();
        let work = create(&mut h, "Work", None);
        create(&mut h, "Projects", Some(&work));

        let resp = h
            .manager
            .execute(Command::ToggleExpanded { id: work.clone() })
            .unwrap();
        assert!(matches!(resp, Response::Bool(true)));

        match h.manager.execute(Command::GetExpandedKeys).unwrap() {
            Response::Strings(ids) => assert_eq!(ids, [work.clone()]),
            other => panic!("Wrong response type: {:?}", other),
        }

        let resp = h
            .manager
            .execute(Command::GetTree {
                depth: None,
                expanded: None,
            })
            .unwrap();
        match resp {
            Response::Tree(tree) => {
                let node = tree.find(&work).unwrap();
                assert!(node.is_open);
                assert_eq!(node.count_children(NodeKind::Folder), 1);
            }
            other => panic!("Wrong response type: {:?}", other),
        }

        h.manager
            .execute(Command::SetExpandedKeys {
                ids: vec!["ghost".to_string()],
            })
            .unwrap();
        match h.manager.execute(Command::GetExpandedKeys).unwrap() {
            Response::Strings(ids) => assert!(ids.is_empty()),
            other => panic!("Wrong response type: {:?}", other),
        }
    }

    #[test]
    fn test_next_untitled_and_validate() {
        let mut h = Harness::new();
        create(&mut h, "Untitled 1", None);
        match h.manager.execute(Command::NextUntitledName).unwrap() {
            Response::String(name) => assert_eq!(name, "Untitled 2"),
            other => panic!("Wrong response type: {:?}", other),
        }
        match h.manager.execute(Command::Validate).unwrap() {
            Response::ValidationResult(result) => assert!(result.is_ok()),
            other => panic!("Wrong response type: {:?}", other),
        }
    }
}
