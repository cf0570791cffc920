//! Topic command handlers

use chatfolders_core::{FolderManager, IdGenerator, Topic, UuidGenerator};

use crate::cli::args::TopicCommands;
use crate::cli::util::{folder_path, resolve_folder, resolve_optional};

/// Handle a `topic` subcommand. Returns true on success.
pub fn handle_topic_command(manager: &mut FolderManager, command: TopicCommands) -> bool {
    match command {
        TopicCommands::Add {
            name,
            id,
            assistant,
            folder,
        } => {
            let id = id.unwrap_or_else(|| UuidGenerator.next_id());
            handle_add(manager, Topic::new(id, name, assistant), folder.as_deref())
        }
        TopicCommands::Rename { id, name } => handle_rename(manager, &id, &name),
        TopicCommands::Delete { id } => handle_delete(manager, &id),
        TopicCommands::Assign { folder, ids } => handle_assign(manager, &folder, &ids),
        TopicCommands::Move { from, to, ids } => {
            handle_move(manager, from.as_deref(), to.as_deref(), &ids)
        }
        TopicCommands::List { folder, unassigned } => {
            handle_list(manager, folder.as_deref(), unassigned)
        }
    }
}

fn handle_add(manager: &mut FolderManager, topic: Topic, folder: Option<&str>) -> bool {
    let Some(folder_id) = resolve_optional(manager, folder) else {
        return false;
    };

    match manager.register_topic(topic, folder_id.as_deref()) {
        Ok(topic) => {
            match folder_id {
                Some(folder_id) => println!(
                    "✓ Added topic '{}' to '{}'",
                    topic.name,
                    folder_path(manager, &folder_id)
                ),
                None => println!("✓ Added topic '{}'", topic.name),
            }
            println!("  id: {}", topic.id);
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn handle_rename(manager: &mut FolderManager, id: &str, name: &str) -> bool {
    match manager.rename_topic(id, name) {
        Ok(topic) => {
            println!("✓ Topic is now '{}'", topic.name);
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn handle_delete(manager: &mut FolderManager, id: &str) -> bool {
    match manager.delete_topic(id) {
        Ok(topic) => {
            println!("✓ Deleted topic '{}'", topic.name);
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn handle_assign(manager: &mut FolderManager, folder: &str, ids: &[String]) -> bool {
    let folder_id = match resolve_folder(manager, folder) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    warn_unknown_topics(manager, ids);

    match manager.assign_topics_to_folder(&folder_id, ids) {
        Ok(folder) => {
            println!(
                "✓ Assigned {} topic(s) to '{}'",
                ids.len(),
                folder_path(manager, &folder.id)
            );
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn handle_move(
    manager: &mut FolderManager,
    from: Option<&str>,
    to: Option<&str>,
    ids: &[String],
) -> bool {
    let Some(source) = resolve_optional(manager, from) else {
        return false;
    };
    let Some(target) = resolve_optional(manager, to) else {
        return false;
    };
    warn_unknown_topics(manager, ids);

    match manager.move_topics(source.as_deref(), target.as_deref(), ids) {
        Ok(()) => {
            let destination = match &target {
                Some(id) => format!("'{}'", folder_path(manager, id)),
                None => "unassigned".to_string(),
            };
            println!("✓ Moved {} topic(s) to {}", ids.len(), destination);
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn handle_list(manager: &FolderManager, folder: Option<&str>, unassigned: bool) -> bool {
    let index = manager.index();
    let topics = if unassigned {
        index.unassigned_topics()
    } else if let Some(folder) = folder {
        match resolve_folder(manager, folder) {
            Ok(id) => index.topics_of(&id),
            Err(e) => {
                eprintln!("✗ {}", e);
                return false;
            }
        }
    } else {
        manager.store().topics()
    };

    if topics.is_empty() {
        println!("No topics");
        return true;
    }
    for topic in topics {
        let location = match index.folder_of(&topic.id) {
            Some(folder) => folder_path(manager, &folder.id),
            None => "(unassigned)".to_string(),
        };
        println!("{}  {}  {}", topic.id, topic.name, location);
    }
    true
}

/// Topic ids are accepted even without a record, but usually mean a typo.
fn warn_unknown_topics(manager: &FolderManager, ids: &[String]) {
    for id in ids {
        if !manager.store().contains_topic(id) {
            eprintln!("  warning: no topic with id '{}'", id);
        }
    }
}
