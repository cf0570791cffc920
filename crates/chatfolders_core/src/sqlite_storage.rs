//! SQLite-backed storage implementation.
//!
//! Records are stored as JSON text keyed by id, so schema changes to
//! [`Folder`] and [`Topic`] never need a migration. Batches run inside a
//! single transaction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Transaction, params};

use crate::error::ChatFoldersError;
use crate::storage::{ChangeBatch, FolderStorage, StorageResult};
use crate::types::{Folder, Topic};

/// SQLite-backed folder/topic storage.
///
/// # Thread Safety
///
/// The connection is wrapped in a `Mutex` for thread-safe access.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open or create a SQLite database at the given path.
    ///
    /// This will create the necessary tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or if schema
    /// initialization fails.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database for testing.
    ///
    /// Data is lost when the storage is dropped.
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ChatFoldersError::Storage(format!("connection lock poisoned: {}", e)))
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS folders (
                id TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS topics (
                id TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- UI state (expanded nodes etc.)
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn upsert_folder(conn: &Connection, folder: &Folder) -> StorageResult<()> {
        let data = serde_json::to_string(folder)?;
        // ON CONFLICT keeps the rowid, so load order stays insertion order.
        conn.execute(
            "INSERT INTO folders (id, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![folder.id, data, folder.updated_at],
        )?;
        Ok(())
    }

    fn upsert_topic(conn: &Connection, topic: &Topic) -> StorageResult<()> {
        let data = serde_json::to_string(topic)?;
        conn.execute(
            "INSERT INTO topics (id, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![topic.id, data, topic.updated_at],
        )?;
        Ok(())
    }

    fn load_rows<T: serde::de::DeserializeOwned>(
        conn: &Connection,
        sql: &str,
    ) -> StorageResult<Vec<T>> {
        let mut stmt = conn.prepare(sql)?;
        let rows: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, data) in rows {
            match serde_json::from_str(&data) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping unreadable record {}: {}", id, e),
            }
        }
        Ok(records)
    }

    fn write_batch(tx: &Transaction<'_>, batch: &ChangeBatch) -> StorageResult<()> {
        for folder in &batch.folders {
            Self::upsert_folder(tx, folder)?;
        }
        for topic in &batch.topics {
            Self::upsert_topic(tx, topic)?;
        }
        for id in &batch.removed_folders {
            tx.execute("DELETE FROM folders WHERE id = ?1", params![id])?;
        }
        for id in &batch.removed_topics {
            tx.execute("DELETE FROM topics WHERE id = ?1", params![id])?;
        }
        Ok(())
    }
}

impl FolderStorage for SqliteStorage {
    fn load_folders(&self) -> StorageResult<Vec<Folder>> {
        let conn = self.lock()?;
        Self::load_rows(&conn, "SELECT id, data FROM folders ORDER BY rowid")
    }

    fn load_topics(&self) -> StorageResult<Vec<Topic>> {
        let conn = self.lock()?;
        Self::load_rows(&conn, "SELECT id, data FROM topics ORDER BY rowid")
    }

    fn save_folder(&self, folder: &Folder) -> StorageResult<()> {
        let conn = self.lock()?;
        Self::upsert_folder(&conn, folder)
    }

    fn save_topic(&self, topic: &Topic) -> StorageResult<()> {
        let conn = self.lock()?;
        Self::upsert_topic(&conn, topic)
    }

    fn delete_folder(&self, id: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM folders WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn delete_topic(&self, id: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM topics WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn get_value(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_value(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn apply_batch(&self, batch: &ChangeBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::write_batch(&tx, batch)?;
        tx.commit()?;
        Ok(())
    }
}
