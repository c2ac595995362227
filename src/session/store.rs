//! SessionStore: storage backend for session documents.
//!
//! Uses enum dispatch to support multiple backends without trait objects.
//! - `Db` variant: SQLite database (storage = "db")
//! - `Ephemeral` variant: in-memory map (storage = "ephemeral")

use crate::db::Database;
use crate::error::{CoreError, Result};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A session document as persisted: `{sid, version, data}`.
///
/// `data` is kept as raw JSON so that documents written by another layout
/// version can still be fetched and reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub sid: String,
    pub version: i64,
    pub data: serde_json::Value,
}

/// Storage backend used by the session provider
#[derive(Debug, Clone)]
pub enum SessionStore {
    /// SQLite database backend
    Db(Arc<Database>),
    /// In-memory backend, lost on restart
    Ephemeral(Arc<MemorySessionStore>),
}

impl SessionStore {
    /// A fresh, empty in-memory store
    pub fn ephemeral() -> Self {
        SessionStore::Ephemeral(Arc::new(MemorySessionStore::default()))
    }

    /// Fetch the document for `sid`, if any
    pub async fn find(&self, sid: &str) -> Result<Option<SessionDocument>> {
        match self {
            SessionStore::Db(db) => db_find(db, sid).await,
            SessionStore::Ephemeral(mem) => Ok(mem.docs.read().await.get(sid).cloned()),
        }
    }

    /// Insert or replace the document keyed by `doc.sid`
    pub async fn upsert(&self, doc: &SessionDocument) -> Result<()> {
        match self {
            SessionStore::Db(db) => db_upsert(db, doc).await,
            SessionStore::Ephemeral(mem) => {
                mem.docs.write().await.insert(doc.sid.clone(), doc.clone());
                Ok(())
            }
        }
    }

    /// Number of stored session documents
    pub async fn count(&self) -> Result<usize> {
        match self {
            SessionStore::Db(db) => {
                db.with_conn(|conn| {
                    Ok(conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| {
                        row.get::<_, usize>(0)
                    })?)
                })
                .await
            }
            SessionStore::Ephemeral(mem) => Ok(mem.docs.read().await.len()),
        }
    }
}

/// Volatile session documents keyed by ID
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    docs: RwLock<HashMap<String, SessionDocument>>,
}

async fn db_find(db: &Database, sid: &str) -> Result<Option<SessionDocument>> {
    let sid = sid.to_string();
    db.with_conn(move |conn| {
        let row = conn
            .query_row(
                "SELECT sid, version, data FROM sessions WHERE sid = ?",
                [&sid],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((sid, version, raw)) => {
                let data: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
                    CoreError::SchemaMismatch(format!(
                        "session {} has unreadable data: {}",
                        sid, e
                    ))
                })?;
                Ok(Some(SessionDocument { sid, version, data }))
            }
            None => Ok(None),
        }
    })
    .await
}

async fn db_upsert(db: &Database, doc: &SessionDocument) -> Result<()> {
    let sid = doc.sid.clone();
    let version = doc.version;
    let data = serde_json::to_string(&doc.data)?;
    let now = chrono::Utc::now().to_rfc3339();

    db.with_conn(move |conn| {
        conn.execute(
            "INSERT INTO sessions (sid, version, data, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(sid) DO UPDATE SET
                version = excluded.version,
                data = excluded.data,
                updated_at = excluded.updated_at",
            params![sid, version, data, now],
        )?;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(sid: &str, data: serde_json::Value) -> SessionDocument {
        SessionDocument {
            sid: sid.to_string(),
            version: 1,
            data,
        }
    }

    async fn exercise(store: SessionStore) {
        assert!(store.find("abc123").await.unwrap().is_none());

        store.upsert(&doc("abc123", json!({}))).await.unwrap();
        assert_eq!(
            store.find("abc123").await.unwrap(),
            Some(doc("abc123", json!({})))
        );

        store
            .upsert(&doc("abc123", json!({"username": "alice"})))
            .await
            .unwrap();
        assert_eq!(
            store.find("abc123").await.unwrap().unwrap().data,
            json!({"username": "alice"})
        );
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ephemeral_store() {
        exercise(SessionStore::ephemeral()).await;
    }

    #[tokio::test]
    async fn test_db_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("dbweb.db")).unwrap();
        exercise(SessionStore::Db(Arc::new(db))).await;
    }

    #[tokio::test]
    async fn test_db_store_unreadable_data() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::new(dir.path().join("dbweb.db")).unwrap());
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (sid, version, data, updated_at) VALUES ('bad', 1, 'not json', '')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let err = SessionStore::Db(db).find("bad").await.unwrap_err();
        assert!(matches!(err, CoreError::SchemaMismatch(_)));
    }
}
