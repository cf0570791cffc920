//! Shared CLI utilities

use chatfolders_core::{FolderManager, ROOT_FOLDER_ID};

/// Resolve a folder given by id or by name.
///
/// An exact id wins. Otherwise the name must match exactly one folder
/// (case-insensitive); `"root"` and `"/"` always mean the root.
pub fn resolve_folder(manager: &FolderManager, key: &str) -> Result<String, String> {
    if key == "/" || manager.store().contains_folder(key) {
        return Ok(if key == "/" {
            ROOT_FOLDER_ID.to_string()
        } else {
            key.to_string()
        });
    }

    let matches: Vec<&str> = manager
        .store()
        .folders()
        .into_iter()
        .filter(|f| !f.is_root() && f.name.eq_ignore_ascii_case(key))
        .map(|f| f.id.as_str())
        .collect();

    match matches.as_slice() {
        [id] => Ok(id.to_string()),
        [] => Err(format!("No folder with id or name '{}'", key)),
        _ => Err(format!(
            "'{}' matches {} folders; use an id: {}",
            key,
            matches.len(),
            matches.join(", ")
        )),
    }
}

/// Resolve an optional folder argument, printing the error on failure.
pub fn resolve_optional(manager: &FolderManager, key: Option<&str>) -> Option<Option<String>> {
    match key {
        None => Some(None),
        Some(key) => match resolve_folder(manager, key) {
            Ok(id) => Some(Some(id)),
            Err(e) => {
                eprintln!("✗ {}", e);
                None
            }
        },
    }
}

/// Folder name with its ancestors, e.g. `Work/Projects`.
pub fn folder_path(manager: &FolderManager, id: &str) -> String {
    let path = manager.index().path_to(id);
    let names: Vec<&str> = path
        .iter()
        .filter(|f| !f.is_root())
        .map(|f| f.name.as_str())
        .collect();
    if names.is_empty() {
        "/".to_string()
    } else {
        names.join("/")
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Arc;

    use chatfolders_core::{Config, FolderManager, ManualClock, MemoryStorage, SequentialIds};

    /// A manager over memory storage with ids `folder-N`.
    pub fn manager() -> FolderManager {
        FolderManager::load(
            Arc::new(MemoryStorage::new()),
            Arc::new(SequentialIds::new("folder")),
            Arc::new(ManualClock::new(1)),
            Config::default(),
        )
        .unwrap()
    }
}
