//! Cookie-based web sessions backed by the document store
//!
//! - [`SessionStore`]: where session documents live (SQLite or in-memory)
//! - [`SessionProvider`]: turns session lifecycle calls into store operations
//! - [`SessionManager`]: issues and reads the session cookie
//!
//! Sessions are created lazily, written through on every mutation and never
//! deleted. There is no expiry beyond the cookie's Max-Age.

mod locks;
mod manager;
mod provider;
mod store;

pub use locks::{SessionGuard, SessionLocks};
pub use manager::SessionManager;
pub use provider::SessionProvider;
pub use store::{MemorySessionStore, SessionDocument, SessionStore};

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Session key holding the logged-in username
pub const USERNAME_KEY: &str = "username";

/// A value that can be stored in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl SessionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SessionValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SessionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionValue::Bool(b) => write!(f, "{}", b),
            SessionValue::Integer(i) => write!(f, "{}", i),
            SessionValue::Float(x) => write!(f, "{}", x),
            SessionValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for SessionValue {
    fn from(s: &str) -> Self {
        SessionValue::Text(s.to_string())
    }
}

impl From<String> for SessionValue {
    fn from(s: String) -> Self {
        SessionValue::Text(s)
    }
}

impl From<i64> for SessionValue {
    fn from(i: i64) -> Self {
        SessionValue::Integer(i)
    }
}

impl From<f64> for SessionValue {
    fn from(x: f64) -> Self {
        SessionValue::Float(x)
    }
}

impl From<bool> for SessionValue {
    fn from(b: bool) -> Self {
        SessionValue::Bool(b)
    }
}

/// Key/value payload of a session
pub type SessionData = BTreeMap<String, SessionValue>;

/// A web session: an opaque ID plus its data.
///
/// Reads are served from the local copy. Every mutation is written through
/// to the store before it returns.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    data: SessionData,
    provider: SessionProvider,
}

impl Session {
    pub(crate) fn new(id: String, data: SessionData, provider: SessionProvider) -> Self {
        Session { id, data, provider }
    }

    /// The session ID (unescaped cookie value)
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<&SessionValue> {
        self.data.get(key)
    }

    /// Get a text value; other value kinds read as absent
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(SessionValue::as_str)
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Set `key` and persist the session.
    ///
    /// If the store write fails the local copy is restored and the error returned.
    pub async fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<SessionValue>,
    ) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(CoreError::Validation(
                "session key must not be empty".to_string(),
            ));
        }

        let previous = self.data.insert(key.clone(), value.into());
        if let Err(e) = self.provider.update_session(self).await {
            match previous {
                Some(old) => self.data.insert(key, old),
                None => self.data.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Remove `key` and persist the session
    pub async fn delete(&mut self, key: &str) -> Result<()> {
        let Some(previous) = self.data.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.provider.update_session(self).await {
            self.data.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SessionProvider {
        SessionProvider::new(SessionStore::ephemeral())
    }

    #[test]
    fn test_session_value_json_shape() {
        let mut data = SessionData::new();
        data.insert("username".into(), "alice".into());
        data.insert("visits".into(), 3i64.into());
        data.insert("ratio".into(), 0.5f64.into());
        data.insert("admin".into(), false.into());

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"admin": false, "ratio": 0.5, "username": "alice", "visits": 3})
        );

        let back: SessionData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let json = serde_json::json!({"prefs": {"theme": "dark"}});
        assert!(serde_json::from_value::<SessionData>(json).is_err());
    }

    #[tokio::test]
    async fn test_set_then_get_without_store_read() {
        let mut session = provider().initialize_session("sid-1");
        session.set(USERNAME_KEY, "alice").await.unwrap();

        assert_eq!(session.get_str(USERNAME_KEY), Some("alice"));
        assert_eq!(session.get(USERNAME_KEY), Some(&SessionValue::from("alice")));
    }

    #[tokio::test]
    async fn test_get_str_ignores_other_kinds() {
        let mut session = provider().initialize_session("sid-2");
        session.set("count", 7i64).await.unwrap();

        assert_eq!(session.get("count"), Some(&SessionValue::Integer(7)));
        assert_eq!(session.get_str("count"), None);
        assert_eq!(session.get_str("missing"), None);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let mut session = provider().initialize_session("sid-3");
        let err = session.set("", "x").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(session.data().is_empty());
    }

    #[tokio::test]
    async fn test_set_and_delete_write_through() {
        let provider = provider();
        let mut session = provider.initialize_session("sid-4");
        session.set(USERNAME_KEY, "alice").await.unwrap();

        let stored = provider.read_session("sid-4").await.unwrap();
        assert_eq!(stored.get_str(USERNAME_KEY), Some("alice"));

        session.delete(USERNAME_KEY).await.unwrap();
        let stored = provider.read_session("sid-4").await.unwrap();
        assert!(stored.get(USERNAME_KEY).is_none());
    }
}
