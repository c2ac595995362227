//! Session provider: maps session lifecycle onto store documents

use super::{Session, SessionData, SessionDocument, SessionLocks, SessionStore};
use crate::db::schema::SESSION_DOC_VERSION;
use crate::error::{CoreError, Result};
use std::sync::Arc;

/// Translates initialize/read/update of sessions into store operations.
///
/// Cheap to clone; clones share the store and the lock table.
#[derive(Debug, Clone)]
pub struct SessionProvider {
    store: SessionStore,
    locks: Arc<SessionLocks>,
}

impl SessionProvider {
    pub fn new(store: SessionStore) -> Self {
        SessionProvider {
            store,
            locks: Arc::new(SessionLocks::new()),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Lock table shared by every holder of this provider
    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    /// Build an empty session for `sid`. Nothing is written until the session is updated.
    pub fn initialize_session(&self, sid: impl Into<String>) -> Session {
        Session::new(sid.into(), SessionData::new(), self.clone())
    }

    /// Load the session stored under `sid`
    pub async fn read_session(&self, sid: &str) -> Result<Session> {
        let doc = self
            .store
            .find(sid)
            .await?
            .ok_or_else(|| CoreError::NotFound("Session", sid.to_string()))?;

        if doc.version != SESSION_DOC_VERSION {
            return Err(CoreError::SchemaMismatch(format!(
                "session {} has document version {}, expected {}",
                sid, doc.version, SESSION_DOC_VERSION
            )));
        }

        let data: SessionData = serde_json::from_value(doc.data).map_err(|e| {
            CoreError::SchemaMismatch(format!("session {} has unreadable data: {}", sid, e))
        })?;

        Ok(Session::new(doc.sid, data, self.clone()))
    }

    /// Upsert `{sid, version, data}` for the session.
    ///
    /// Holds the session's lock for the write, so it waits out a concurrent
    /// `SessionManager::start_session` on the same ID.
    pub async fn update_session(&self, session: &Session) -> Result<()> {
        let doc = SessionDocument {
            sid: session.id().to_string(),
            version: SESSION_DOC_VERSION,
            data: serde_json::to_value(session.data())?,
        };

        let _guard = self.locks.lock(&doc.sid).await;
        self.store.upsert(&doc).await?;
        tracing::debug!("Persisted session {} ({} keys)", doc.sid, session.data().len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use serde_json::json;

    #[tokio::test]
    async fn test_initialize_does_not_write() {
        let provider = SessionProvider::new(SessionStore::ephemeral());
        let session = provider.initialize_session("abc123");

        assert_eq!(session.id(), "abc123");
        assert!(session.data().is_empty());
        assert_eq!(provider.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let provider = SessionProvider::new(SessionStore::ephemeral());
        let err = provider.read_session("abc123").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_writes_versioned_document() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("dbweb.db")).unwrap();
        let provider = SessionProvider::new(SessionStore::Db(Arc::new(db)));

        let mut session = provider.initialize_session("abc123");
        session.set("username", "alice").await.unwrap();

        let doc = provider.store().find("abc123").await.unwrap().unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.data, json!({"username": "alice"}));

        let read = provider.read_session("abc123").await.unwrap();
        assert_eq!(read.id(), "abc123");
        assert_eq!(read.get_str("username"), Some("alice"));
    }

    #[tokio::test]
    async fn test_unknown_version_is_schema_mismatch() {
        let provider = SessionProvider::new(SessionStore::ephemeral());
        provider
            .store()
            .upsert(&SessionDocument {
                sid: "v2".to_string(),
                version: 2,
                data: json!({"username": "alice"}),
            })
            .await
            .unwrap();

        let err = provider.read_session("v2").await.unwrap_err();
        assert!(matches!(err, CoreError::SchemaMismatch(_)));
    }

    #[tokio::test]
    async fn test_non_object_data_is_schema_mismatch() {
        let provider = SessionProvider::new(SessionStore::ephemeral());
        provider
            .store()
            .upsert(&SessionDocument {
                sid: "odd".to_string(),
                version: 1,
                data: json!(["not", "a", "map"]),
            })
            .await
            .unwrap();

        let err = provider.read_session("odd").await.unwrap_err();
        assert!(matches!(err, CoreError::SchemaMismatch(_)));
    }
}
