//! Session identifier persistence using SQLite

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{Connection, params};

use crate::Result;

/// Row key for the single per-profile session entry
const SESSION_KEY: &str = "default";

/// Key-value port for the persisted session identifier.
///
/// Keeps storage substitutable: SQLite in production, in-memory for tests
/// and as a fallback when the database cannot be opened.
pub trait SessionStore: Send {
    /// Load the stored session id, if any
    fn load(&self) -> Result<Option<String>>;

    /// Persist a session id, replacing any previous value
    fn save(&self, session_id: &str) -> Result<()>;
}

impl SessionStore for Box<dyn SessionStore> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, session_id: &str) -> Result<()> {
        (**self).save(session_id)
    }
}

/// SQLite-based session store
pub struct SqliteSessionStore {
    conn: Connection,
}

impl SqliteSessionStore {
    /// Create a new session store with the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    /// Create an in-memory session store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_tables()?;
        Ok(store)
    }

    /// Initialize database tables
    fn init_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT session_id FROM session WHERE key = ?1")?;

        match stmt.query_row(params![SESSION_KEY], |row| row.get::<_, String>(0)) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session (key, session_id, updated_at)
             VALUES (?1, ?2, ?3)",
            params![SESSION_KEY, session_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// In-memory session store. Values do not survive the process; used in
/// tests and as the ephemeral fallback when SQLite is unavailable.
#[derive(Default)]
pub struct MemorySessionStore {
    value: Mutex<Option<String>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value.lock().unwrap().clone())
    }

    fn save(&self, session_id: &str) -> Result<()> {
        *self.value.lock().unwrap() = Some(session_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_starts_empty() {
        let store = SqliteSessionStore::in_memory().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let store = SqliteSessionStore::in_memory().unwrap();
        store.save("abc-123").unwrap();
        assert_eq!(store.load().unwrap(), Some("abc-123".to_string()));
    }

    #[test]
    fn test_save_replaces_previous_value() {
        let store = SqliteSessionStore::in_memory().unwrap();
        store.save("first").unwrap();
        store.save("second").unwrap();
        assert_eq!(store.load().unwrap(), Some("second".to_string()));
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("session.db");
        let db_path = db_path.to_str().unwrap();

        {
            let store = SqliteSessionStore::new(db_path).unwrap();
            store.save("persisted").unwrap();
        }

        let store = SqliteSessionStore::new(db_path).unwrap();
        assert_eq!(store.load().unwrap(), Some("persisted".to_string()));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::default();
        assert!(store.load().unwrap().is_none());
        store.save("ephemeral").unwrap();
        assert_eq!(store.load().unwrap(), Some("ephemeral".to_string()));
    }
}
