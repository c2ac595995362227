//! User documents
//!
//! A user is nothing more than a unique username for now.

use super::schema::USER_DOC_VERSION;
use super::Database;
use crate::error::{CoreError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

/// Look up a user by exact username
pub fn find_user(conn: &Connection, username: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT username FROM users WHERE username = ?",
            [username],
            |row| {
                Ok(User {
                    username: row.get(0)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// Insert a new user document. Fails with `AlreadyExists` when the name is taken.
pub fn insert_user(conn: &Connection, username: &str) -> Result<User> {
    if find_user(conn, username)?.is_some() {
        return Err(CoreError::AlreadyExists("User", username.to_string()));
    }

    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (username, version, created_at) VALUES (?, ?, ?)",
        params![username, USER_DOC_VERSION, now],
    )
    .map_err(|e| match e {
        // Lost a race with a concurrent insert of the same name
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            CoreError::AlreadyExists("User", username.to_string())
        }
        other => CoreError::Database(other),
    })?;

    Ok(User {
        username: username.to_string(),
    })
}

/// Trim and check a username before it is stored or looked up
pub fn normalize_username(raw: &str) -> Result<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(CoreError::Validation("username must not be empty".to_string()));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(CoreError::Validation(format!(
            "username must not contain whitespace: {:?}",
            username
        )));
    }
    Ok(username.to_string())
}

impl Database {
    /// Fetch a user by username. Missing users are `NotFound`.
    pub async fn get_user(&self, username: &str) -> Result<User> {
        let name = username.to_string();
        self.with_conn(move |conn| {
            find_user(conn, &name)?.ok_or_else(|| CoreError::NotFound("User", name.clone()))
        })
        .await
    }

    /// Register a new user after validating the name
    pub async fn add_user(&self, username: &str) -> Result<User> {
        let name = normalize_username(username)?;
        self.with_conn(move |conn| insert_user(conn, &name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_db;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_find() {
        let conn = memory_conn();
        insert_user(&conn, "alice").unwrap();

        let user = find_user(&conn, "alice").unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert!(find_user(&conn, "bob").unwrap().is_none());

        let version: i64 = conn
            .query_row("SELECT version FROM users WHERE username = 'alice'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, USER_DOC_VERSION);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let conn = memory_conn();
        insert_user(&conn, "alice").unwrap();

        let err = insert_user(&conn, "alice").unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists("User", ref name) if name == "alice"));
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  alice \n").unwrap(), "alice");
        assert!(matches!(normalize_username("   "), Err(CoreError::Validation(_))));
        assert!(matches!(normalize_username(""), Err(CoreError::Validation(_))));
        assert!(matches!(normalize_username("al ice"), Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_database_user_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("dbweb.db")).unwrap();

        let added = db.add_user(" user@dreamblade.com ").await.unwrap();
        assert_eq!(added.username, "user@dreamblade.com");

        let found = db.get_user("user@dreamblade.com").await.unwrap();
        assert_eq!(found, added);

        let missing = db.get_user("nobody").await.unwrap_err();
        assert!(missing.is_not_found());

        let dup = db.add_user("user@dreamblade.com").await.unwrap_err();
        assert!(matches!(dup, CoreError::AlreadyExists(..)));
    }
}
