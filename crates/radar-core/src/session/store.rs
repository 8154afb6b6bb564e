//! Session persistence using SQLite
//!
//! The store holds at most one session (the current login), mirroring the
//! single token slot of the browser client it replaces.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::error::{Error, Result};
use crate::session::{Session, SessionUser};

/// SQLite-based store for the current auth session
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Create a new session store with the given database path
    pub fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
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
                id INTEGER PRIMARY KEY CHECK (id = 1),
                token TEXT NOT NULL,
                user TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Persist the current session, replacing any previous one
    pub fn save(&self, session: &Session) -> Result<()> {
        let user_json = serde_json::to_string(&session.user)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO session (id, token, user, created_at)
             VALUES (1, ?1, ?2, ?3)",
            params![
                session.token,
                user_json,
                session.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Load the persisted session, if any
    pub fn load(&self) -> Result<Option<Session>> {
        let mut stmt = self
            .conn
            .prepare("SELECT token, user, created_at FROM session WHERE id = 1")?;

        let result = stmt.query_row([], |row| {
            let token: String = row.get(0)?;
            let user_json: String = row.get(1)?;
            let created_at_str: String = row.get(2)?;

            let user: SessionUser = serde_json::from_str(&user_json)
                .map_err(|_| rusqlite::Error::InvalidQuery)?;
            let created_at = DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|_| rusqlite::Error::InvalidQuery)?
                .with_timezone(&Utc);

            Ok(Session {
                token,
                user,
                created_at,
            })
        });

        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::from(e)),
        }
    }

    /// Remove the persisted session (logout)
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM session WHERE id = 1", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            "tok-abc",
            SessionUser {
                id: 42,
                email: "marc@example.org".to_string(),
                nom: None,
                role: "user".to_string(),
            },
        )
    }

    #[test]
    fn test_store_creation() {
        let store = SessionStore::in_memory().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let store = SessionStore::in_memory().unwrap();
        let session = session();

        store.save(&session).unwrap();
        let loaded = store.load().unwrap();

        assert!(loaded.is_some());
        let loaded = loaded.unwrap();
        assert_eq!(loaded.token, "tok-abc");
        assert_eq!(loaded.user.id, 42);
    }

    #[test]
    fn test_save_replaces_previous() {
        let store = SessionStore::in_memory().unwrap();
        store.save(&session()).unwrap();

        let mut other = session();
        other.token = "tok-def".to_string();
        store.save(&other).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token, "tok-def");
    }

    #[test]
    fn test_clear() {
        let store = SessionStore::in_memory().unwrap();
        store.save(&session()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");
        let path = path.to_str().unwrap();

        {
            let store = SessionStore::new(path).unwrap();
            store.save(&session()).unwrap();
        }

        let store = SessionStore::new(path).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token, "tok-abc");
    }
}
