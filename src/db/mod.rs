//! Database module for dbweb
//!
//! SQLite document storage for sessions and users. Every operation opens
//! its own connection on the blocking pool and drops it when done.

pub mod schema;
pub mod users;

use crate::error::{CoreError, Result};
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the document database file
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database and make sure the schema exists
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database { path: db_path };
        let conn = db.open()?;
        schema::init_db(&conn)?;

        Ok(db)
    }

    /// Open a fresh connection
    pub fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).map_err(|e| {
            CoreError::StoreUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Run `f` against a fresh connection on the blocking thread pool.
    ///
    /// The connection is closed when `f` returns, on success and on error.
    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.open()?;
            f(&conn)
        })
        .await?
    }
}

pub use schema::init_db;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_creation() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("dbweb.db");

        let db = Database::new(db_path.clone());
        assert!(db.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn test_directory_path_cannot_hold_schema() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file
        let db = Database {
            path: dir.path().to_path_buf(),
        };
        let err = db.open().and_then(|conn| {
            schema::init_db(&conn)?;
            Ok(())
        });
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_with_conn_runs_closure() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("dbweb.db")).unwrap();

        let count = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| {
                    row.get::<_, i64>(0)
                })?)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
