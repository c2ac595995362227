//! SQLite schema for dbweb
//!
//! Sessions and users are stored as small versioned documents.

use rusqlite::{Connection, Result};

/// Current layout of a session document
pub const SESSION_DOC_VERSION: i64 = 1;

/// Current layout of a user document
pub const USER_DOC_VERSION: i64 = 1;

/// Initialize the database with required tables
pub fn init_db(conn: &Connection) -> Result<()> {
    // Session documents: {sid, version, data}, data is a JSON object
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            sid TEXT PRIMARY KEY,
            version INTEGER NOT NULL,
            data TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // User documents: {version, username}
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY,
            version INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_db_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();
        assert_eq!(tables, vec!["sessions", "users"]);
    }
}
