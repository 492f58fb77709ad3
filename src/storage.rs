//! Persisted client state: a string key/value store surviving across sessions.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Trait for client storage backends.
pub trait ClientStorage: Send + Sync {
  /// Read the value stored under `key`.
  fn get_item(&self, key: &str) -> Result<Option<String>>;

  /// Store `value` under `key`, replacing any previous value.
  fn set_item(&self, key: &str, value: &str) -> Result<()>;

  /// Delete `key`. Removing a missing key is not an error.
  fn remove_item(&self, key: &str) -> Result<()>;
}

/// Storage kept in process memory only.
#[derive(Default)]
pub struct MemoryStorage {
  items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ClientStorage for MemoryStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    let items = self
      .items
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(items.get(key).cloned())
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let mut items = self
      .items
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    items.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    let mut items = self
      .items
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    items.remove(key);
    Ok(())
  }
}

/// SQLite-based client storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

const STORAGE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SqliteStorage {
  /// Open or create the storage database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create storage directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open storage database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Storage that lives only as long as this value.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory storage: {}", e))?;

    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(STORAGE_SCHEMA)
      .map_err(|e| eyre!("Failed to run storage migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }
}

impl ClientStorage for SqliteStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row(
        "SELECT value FROM local_storage WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read storage key {}: {}", key, e))
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO local_storage (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to write storage key {}: {}", key, e))?;

    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM local_storage WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to remove storage key {}: {}", key, e))?;

    Ok(())
  }
}
