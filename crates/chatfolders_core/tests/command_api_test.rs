//! Integration tests for the serialized command API

#[cfg(test)]
mod command_api_tests {
    use std::sync::Arc;

    use chatfolders_core::{
        Command, Config, FolderManager, ManualClock, MemoryStorage, Response, SequentialIds,
    };
    use serde_json::json;

    fn manager() -> FolderManager {
        FolderManager::load(
            Arc::new(MemoryStorage::new()),
            Arc::new(SequentialIds::new("folder")),
            Arc::new(ManualClock::new(1)),
            Config::default(),
        )
        .unwrap()
    }

    /// Run a command given as JSON, the way an IPC bridge would.
    fn run(manager: &mut FolderManager, command: serde_json::Value) -> serde_json::Value {
        let command: Command = serde_json::from_value(command).unwrap();
        let response = manager.execute(command).unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn test_json_round_trip_through_execute() {
        let mut m = manager();

        let created = run(
            &mut m,
            json!({"type": "CreateFolder", "params": {"name": "Work"}}),
        );
        assert_eq!(created["type"], "Folder");
        assert_eq!(created["data"]["id"], "folder-1");
        assert_eq!(created["data"]["parentFolderId"], "root");

        run(
            &mut m,
            json!({"type": "RegisterTopic", "params": {
                "topic": {"id": "t1", "name": "Hello", "assistantId": "a1",
                          "messages": [{"role": "user", "content": "hi"}]},
                "folder_id": "folder-1"
            }}),
        );

        let topics = run(
            &mut m,
            json!({"type": "GetFolderTopics", "params": {"id": "folder-1"}}),
        );
        assert_eq!(topics["type"], "Topics");
        assert_eq!(topics["data"][0]["id"], "t1");
        // Message payloads never reach the store.
        assert!(topics["data"][0].get("messages").is_none());
    }

    #[test]
    fn test_tree_response_shape() {
        let mut m = manager();
        run(
            &mut m,
            json!({"type": "CreateFolder", "params": {"name": "Work"}}),
        );
        let tree = run(
            &mut m,
            json!({"type": "GetTree", "params": {"depth": 1, "expanded": ["folder-1"]}}),
        );
        assert_eq!(tree["type"], "Tree");
        assert_eq!(tree["data"]["id"], "root");
        assert_eq!(tree["data"]["kind"], "folder");
        assert_eq!(tree["data"]["isOpen"], true);
        assert_eq!(tree["data"]["children"][0]["name"], "Work");
        assert_eq!(tree["data"]["children"][0]["isOpen"], true);
    }

    #[test]
    fn test_failed_command_serializes_error() {
        let mut m = manager();
        let command: Command = serde_json::from_value(json!({
            "type": "ReparentFolder",
            "params": {"id": "missing", "parent_id": null}
        }))
        .unwrap();
        let err = m.execute(command).unwrap_err().to_serializable();
        assert_eq!(err.kind, "NotFound");
        assert_eq!(err.id.as_deref(), Some("missing"));

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "NotFound");
    }

    #[test]
    fn test_response_deserializes() {
        let mut m = manager();
        let response = m
            .execute(Command::CreateFolder {
                name: "Work".to_string(),
                parent_id: None,
            })
            .unwrap();
        let json = serde_json::to_string(&response).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        match back {
            Response::Folder(folder) => assert_eq!(folder.name, "Work"),
            other => panic!("Wrong response type: {:?}", other),
        }
    }
}
