//! Test utilities for chatfolders_core
//!
//! Shared fixtures: a frozen clock, deterministic ids and in-memory storage.

use std::sync::Arc;

use crate::clock::{ManualClock, SequentialIds};
use crate::config::Config;
use crate::manager::FolderManager;
use crate::memory_storage::MemoryStorage;
use crate::store::EntityStore;
use crate::types::Topic;
use crate::validate;

/// A store whose clock is frozen at `now`.
pub fn store_at(now: i64) -> EntityStore {
    EntityStore::new(Arc::new(ManualClock::new(now)))
}

/// A topic owned by the default test assistant.
pub fn topic(id: &str, name: &str) -> Topic {
    Topic::new(id, name, "assistant-1")
}

/// Everything a manager test needs to inspect afterwards.
pub struct Harness {
    pub manager: FolderManager,
    pub clock: Arc<ManualClock>,
    pub storage: Arc<MemoryStorage>,
}

impl Harness {
    /// A manager over empty memory storage, clock at 1000, ids `folder-N`.
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    /// A manager loaded from existing storage.
    pub fn with_storage(storage: Arc<MemoryStorage>) -> Self {
        let clock = Arc::new(ManualClock::new(1_000));
        let manager = FolderManager::load(
            storage.clone(),
            Arc::new(SequentialIds::new("folder")),
            clock.clone(),
            Config::default(),
        )
        .expect("memory storage never fails");
        Self {
            manager,
            clock,
            storage,
        }
    }

    /// Register topics by id, each unassigned.
    pub fn with_topics(mut self, ids: &[&str]) -> Self {
        for id in ids {
            self.manager.register_topic(topic(id, id), None).unwrap();
        }
        self
    }

    /// Panic if the store breaks any structural invariant.
    pub fn assert_consistent(&self) {
        let result = validate::validate(self.manager.store());
        assert!(result.is_ok(), "store is inconsistent: {:?}", result.errors);
    }
}
