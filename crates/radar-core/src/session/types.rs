//! Session types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal user record kept alongside the auth token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User identifier as assigned by the API
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub nom: Option<String>,
    /// `user`, `organizer` or `admin`
    pub role: String,
}

/// An authenticated session: bearer token plus the minimal user object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token sent as `Authorization: Bearer <token>`
    pub token: String,
    pub user: SessionUser,
    /// When the session was established locally
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a session established now
    pub fn new(token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            token: token.into(),
            user,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: 7,
            email: "ana@example.org".to_string(),
            nom: Some("Ana".to_string()),
            role: "user".to_string(),
        }
    }

    #[test]
    fn test_session_creation() {
        let session = Session::new("tok-123", user());
        assert_eq!(session.token, "tok-123");
        assert_eq!(session.user.id, 7);
    }

    #[test]
    fn test_session_roundtrip_json() {
        let session = Session::new("tok-123", user());
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
