//! `tree`, `toggle` and `check` command handlers

use chatfolders_core::tree::format_tree;
use chatfolders_core::validate::{ValidationError, ValidationWarning};
use chatfolders_core::{ExpansionState, FolderManager};

use crate::cli::util::{folder_path, resolve_folder};

/// Print the folder tree. With `all`, every folder is shown expanded.
pub fn handle_tree(manager: &FolderManager, depth: Option<usize>, all: bool) -> bool {
    let expansion = if all {
        ExpansionState::new()
    } else {
        manager.load_expansion()
    };
    let tree = manager.tree(&expansion, depth);
    print!("{}", format_tree(&tree, !all));
    true
}

/// Flip a folder's expanded state and save it.
pub fn handle_toggle(manager: &FolderManager, folder: &str) -> bool {
    let id = match resolve_folder(manager, folder) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    if !manager.config().persist_expansion {
        eprintln!("✗ Expansion state is not persisted (persist_expansion = false)");
        return false;
    }

    let mut expansion = manager.load_expansion();
    let open = expansion.toggle(&id);
    if let Err(e) = manager.save_expansion(&expansion) {
        eprintln!("✗ Failed to save expansion state: {}", e);
        return false;
    }
    let verb = if open { "Expanded" } else { "Collapsed" };
    println!("✓ {} '{}'", verb, folder_path(manager, &id));
    true
}

/// Validate the hierarchy and print every problem found.
pub fn handle_check(manager: &FolderManager) -> bool {
    let result = manager.check();

    for error in &result.errors {
        eprintln!("✗ {}", describe_error(error));
    }
    for warning in &result.warnings {
        eprintln!("  warning: {}", describe_warning(warning));
    }

    if result.is_ok() {
        println!(
            "✓ {} folder(s) checked, no problems found",
            result.folders_checked
        );
        true
    } else {
        eprintln!(
            "{} error(s), {} warning(s) in {} folder(s)",
            result.errors.len(),
            result.warnings.len(),
            result.folders_checked
        );
        false
    }
}

fn describe_error(error: &ValidationError) -> String {
    match error {
        ValidationError::MissingRoot => "Root folder is missing".to_string(),
        ValidationError::DanglingParent { folder, parent } => {
            format!("Folder {} points to missing parent {}", folder, parent)
        }
        ValidationError::BrokenBackLink { folder, child } => {
            format!("Folder {} lists {} as a child, but it is not", folder, child)
        }
        ValidationError::MissingBackLink { parent, child } => {
            format!("Folder {} does not list its child {}", parent, child)
        }
        ValidationError::Cycle { folders } => {
            format!("Parent loop: {}", folders.join(" -> "))
        }
        ValidationError::DuplicateMembership { topic, folders } => {
            format!("Topic {} is in several folders: {}", topic, folders.join(", "))
        }
    }
}

fn describe_warning(warning: &ValidationWarning) -> String {
    match warning {
        ValidationWarning::StaleTopicRef { folder, topic } => {
            format!("Folder {} lists unknown topic {}", folder, topic)
        }
        ValidationWarning::MissingParent { folder } => {
            format!("Folder {} has no parent", folder)
        }
    }
}
