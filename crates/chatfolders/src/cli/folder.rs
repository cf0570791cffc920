//! Folder command handlers

use chatfolders_core::FolderManager;

use crate::cli::args::FolderCommands;
use crate::cli::util::{folder_path, resolve_folder, resolve_optional};

/// Handle a `folder` subcommand. Returns true on success.
pub fn handle_folder_command(manager: &mut FolderManager, command: FolderCommands) -> bool {
    match command {
        FolderCommands::Create { name, parent } => {
            handle_create(manager, name.as_deref(), parent.as_deref())
        }
        FolderCommands::Rename { folder, name } => handle_rename(manager, &folder, &name),
        FolderCommands::Delete { folder } => handle_delete(manager, &folder),
        FolderCommands::Move { folder, parent } => handle_move(manager, &folder, parent.as_deref()),
        FolderCommands::List => {
            handle_list(manager);
            true
        }
    }
}

fn handle_create(manager: &mut FolderManager, name: Option<&str>, parent: Option<&str>) -> bool {
    let Some(parent_id) = resolve_optional(manager, parent) else {
        return false;
    };
    let name = match name {
        Some(name) => name.to_string(),
        None => manager.next_untitled_name(),
    };

    match manager.create_folder(&name, parent_id.as_deref()) {
        Ok(folder) => {
            println!("✓ Created folder '{}'", folder_path(manager, &folder.id));
            println!("  id: {}", folder.id);
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn handle_rename(manager: &mut FolderManager, folder: &str, name: &str) -> bool {
    let id = match resolve_folder(manager, folder) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    let before = manager.store().folder(&id).map(|f| f.name.clone());

    match manager.rename_folder(&id, name) {
        Ok(renamed) if before.as_deref() == Some(renamed.name.as_str()) => {
            println!("Folder '{}' unchanged", renamed.name);
            true
        }
        Ok(renamed) => {
            println!("✓ Renamed folder to '{}'", renamed.name);
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn handle_delete(manager: &mut FolderManager, folder: &str) -> bool {
    let id = match resolve_folder(manager, folder) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    let path = folder_path(manager, &id);

    match manager.delete_folder(&id) {
        Ok(deleted) => {
            println!("✓ Deleted '{}'", path);
            if deleted.folders.len() > 1 {
                println!("  {} subfolder(s) removed", deleted.folders.len() - 1);
            }
            if !deleted.unassigned_topics.is_empty() {
                println!(
                    "  {} topic(s) moved to unassigned",
                    deleted.unassigned_topics.len()
                );
            }
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn handle_move(manager: &mut FolderManager, folder: &str, parent: Option<&str>) -> bool {
    let id = match resolve_folder(manager, folder) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    let Some(parent_id) = resolve_optional(manager, parent) else {
        return false;
    };

    match manager.reparent_folder(&id, parent_id.as_deref()) {
        Ok(folder) => {
            println!("✓ Moved folder to '{}'", folder_path(manager, &folder.id));
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

/// Print one line per folder in tree order.
fn handle_list(manager: &FolderManager) {
    let index = manager.index();
    let mut folders = index.descendants_of(chatfolders_core::ROOT_FOLDER_ID);
    if folders.is_empty() {
        println!("No folders");
        return;
    }
    folders.sort_by_cached_key(|f| folder_path(manager, &f.id));

    for folder in folders {
        println!(
            "{}  {}  ({} topic(s))",
            folder.id,
            folder_path(manager, &folder.id),
            folder.topic_ids.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::util::test_support::manager;

    #[test]
    fn test_create_uses_untitled_default() {
        let mut m = manager();
        assert!(handle_create(&mut m, None, None));
        assert!(handle_create(&mut m, None, None));
        let names = m.store().folder_names();
        assert_eq!(names, ["Untitled 1", "Untitled 2"]);
    }

    #[test]
    fn test_create_under_named_parent() {
        let mut m = manager();
        assert!(handle_create(&mut m, Some("Work"), None));
        assert!(handle_create(&mut m, Some("Projects"), Some("work")));
        assert!(!handle_create(&mut m, Some("Lost"), Some("missing")));

        let projects = m
            .store()
            .folders()
            .into_iter()
            .find(|f| f.name == "Projects")
            .unwrap()
            .id
            .clone();
        assert_eq!(folder_path(&m, &projects), "Work/Projects");
    }

    #[test]
    fn test_move_and_delete() {
        let mut m = manager();
        let a = m.create_folder("A", None).unwrap();
        let b = m.create_folder("B", None).unwrap();

        assert!(handle_move(&mut m, "B", Some("A")));
        assert!(!handle_move(&mut m, "A", Some("B")));
        assert!(handle_delete(&mut m, &a.id));
        assert!(!m.store().contains_folder(&b.id));
        assert!(!handle_delete(&mut m, "root"));
    }

    #[test]
    fn test_rename() {
        let mut m = manager();
        m.create_folder("Work", None).unwrap();
        assert!(handle_rename(&mut m, "Work", "Jobs"));
        assert!(handle_rename(&mut m, "Jobs", "  "));
        assert_eq!(m.store().folder_names(), ["Jobs"]);
    }
}
