//! Session lifecycle management

use tracing::{debug, info};
use uuid::Uuid;

use crate::Result;
use crate::session::SessionStore;

/// Owns the durable session identifier.
///
/// The id is a UUIDv4 created on first use and replaced only by an
/// explicit [`renew`](SessionManager::renew).
pub struct SessionManager<S: SessionStore> {
    store: S,
    current: Option<String>,
}

impl<S: SessionStore> SessionManager<S> {
    /// Create a manager over a session store
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Read the stored session id, creating and persisting a fresh one if
    /// absent. Repeated calls return the same id until `renew` runs.
    pub fn get_or_create(&mut self) -> Result<String> {
        if let Some(id) = &self.current {
            return Ok(id.clone());
        }

        if let Some(id) = self.store.load()? {
            debug!("Loaded session id from store");
            self.current = Some(id.clone());
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        self.store.save(&id)?;
        info!("Created new session id");
        self.current = Some(id.clone());
        Ok(id)
    }

    /// Generate a fresh session id and overwrite the stored one.
    ///
    /// The backend keeps whatever history it holds for the old id; nothing
    /// is deleted remotely.
    pub fn renew(&mut self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.store.save(&id)?;
        info!("Renewed session id");
        self.current = Some(id.clone());
        Ok(id)
    }

    /// The id currently in use, if one has been loaded or created
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, SqliteSessionStore};

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut manager = SessionManager::new(SqliteSessionStore::in_memory().unwrap());

        let first = manager.get_or_create().unwrap();
        let second = manager.get_or_create().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_generated_id_is_uuid_v4() {
        let mut manager = SessionManager::new(MemorySessionStore::default());

        let id = manager.get_or_create().unwrap();
        let parsed = Uuid::parse_str(&id).unwrap();

        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed.get_variant(), uuid::Variant::RFC4122);
    }

    #[test]
    fn test_renew_changes_id() {
        let mut manager = SessionManager::new(SqliteSessionStore::in_memory().unwrap());

        let old = manager.get_or_create().unwrap();
        let new = manager.renew().unwrap();

        assert_ne!(old, new);
        assert_eq!(manager.get_or_create().unwrap(), new);
    }

    #[test]
    fn test_renew_persists_to_store() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("session.db");
        let db_path = db_path.to_str().unwrap();

        let renewed = {
            let mut manager = SessionManager::new(SqliteSessionStore::new(db_path).unwrap());
            manager.get_or_create().unwrap();
            manager.renew().unwrap()
        };

        let mut manager = SessionManager::new(SqliteSessionStore::new(db_path).unwrap());
        assert_eq!(manager.get_or_create().unwrap(), renewed);
    }

    #[test]
    fn test_current_tracks_active_id() {
        let mut manager = SessionManager::new(MemorySessionStore::default());
        assert!(manager.current().is_none());

        let id = manager.get_or_create().unwrap();
        assert_eq!(manager.current(), Some(id.as_str()));
    }
}
