//! Session management
//!
//! The manager is the single process-wide handle on the auth session. It is
//! injected into every component that needs gating; there is no ambient
//! global lookup. Interested observers subscribe to the logged-in flag
//! through a watch channel.

use std::sync::{Mutex, RwLock};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::Result;
use crate::session::{Session, SessionStore, SessionUser};

/// Manages the current auth session and broadcasts login state changes
pub struct SessionManager {
    /// Persistent storage (wrapped in Mutex for thread safety)
    store: Mutex<SessionStore>,
    /// In-memory copy of the current session
    current: RwLock<Option<Session>>,
    /// Logged-in flag broadcast to observers
    logged_in_tx: watch::Sender<bool>,
}

impl SessionManager {
    /// Create a session manager, restoring any persisted session
    pub fn new(db_path: &str) -> Result<Self> {
        let store = SessionStore::new(db_path)?;
        Self::with_store(store)
    }

    /// Create an in-memory session manager (for testing)
    pub fn in_memory() -> Result<Self> {
        Self::with_store(SessionStore::in_memory()?)
    }

    fn with_store(store: SessionStore) -> Result<Self> {
        let restored = store.load()?;
        if let Some(ref session) = restored {
            debug!("Restored session for user {}", session.user.id);
        }
        let (logged_in_tx, _) = watch::channel(restored.is_some());
        Ok(Self {
            store: Mutex::new(store),
            current: RwLock::new(restored),
            logged_in_tx,
        })
    }

    /// Establish a new session after a successful login
    pub fn login(&self, token: impl Into<String>, user: SessionUser) -> Result<()> {
        let session = Session::new(token, user);
        info!("Logging in user {}", session.user.id);

        {
            let store = self.store.lock().unwrap();
            store.save(&session)?;
        }
        *self.current.write().unwrap() = Some(session);
        let _ = self.logged_in_tx.send(true);
        Ok(())
    }

    /// Clear the session entirely (token, user, persisted copy)
    pub fn logout(&self) -> Result<()> {
        info!("Logging out");
        {
            let store = self.store.lock().unwrap();
            store.clear()?;
        }
        *self.current.write().unwrap() = None;
        let _ = self.logged_in_tx.send(false);
        Ok(())
    }

    /// The current bearer token, if logged in
    pub fn token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.token.clone())
    }

    /// The current user, if logged in
    pub fn user(&self) -> Option<SessionUser> {
        self.current.read().unwrap().as_ref().map(|s| s.user.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.read().unwrap().is_some()
    }

    /// Subscribe to login state changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.logged_in_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> SessionUser {
        SessionUser {
            id,
            email: format!("user{}@example.org", id),
            nom: None,
            role: "user".to_string(),
        }
    }

    #[test]
    fn test_starts_logged_out() {
        let manager = SessionManager::in_memory().unwrap();
        assert!(!manager.is_logged_in());
        assert!(manager.token().is_none());
    }

    #[test]
    fn test_login_logout() {
        let manager = SessionManager::in_memory().unwrap();

        manager.login("tok-1", user(1)).unwrap();
        assert!(manager.is_logged_in());
        assert_eq!(manager.token().as_deref(), Some("tok-1"));
        assert_eq!(manager.user().unwrap().id, 1);

        manager.logout().unwrap();
        assert!(!manager.is_logged_in());
        assert!(manager.token().is_none());
        assert!(manager.user().is_none());
    }

    #[test]
    fn test_broadcasts_state_changes() {
        let manager = SessionManager::in_memory().unwrap();
        let mut rx = manager.subscribe();
        assert!(!*rx.borrow_and_update());

        manager.login("tok-1", user(1)).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());

        manager.logout().unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());
    }

    #[test]
    fn test_restores_persisted_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");
        let path = path.to_str().unwrap();

        {
            let manager = SessionManager::new(path).unwrap();
            manager.login("tok-persist", user(9)).unwrap();
        }

        let manager = SessionManager::new(path).unwrap();
        assert!(manager.is_logged_in());
        assert_eq!(manager.token().as_deref(), Some("tok-persist"));
    }
}
