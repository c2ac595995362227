//! dbweb - a small web catalogue of Dreamblade miniatures
//!
//! This crate provides:
//! - The miniature catalogue, loaded from a CSV export
//! - Cookie-backed sessions persisted in a document store
//! - User accounts for logging in
//! - Server-rendered HTML pages
//!
//! # Usage
//!
//! As a library:
//! ```ignore
//! use dbweb::{Config, Core};
//!
//! let config = Config::from_file("~/.dbweb/config.toml").unwrap();
//! let core = Core::new(config).unwrap();
//! core.add_user("alice").await.unwrap();
//! ```
//!
//! As a standalone server (CLI):
//! ```text
//! dbweb start
//! ```

pub mod catalogue;
pub mod config;
pub mod db;
pub mod error;
pub mod session;
pub mod web;

// Re-export main types for convenience
pub use catalogue::Catalogue;
pub use config::Config;
pub use db::Database;
pub use error::{CoreError, Result};
pub use session::{Session, SessionManager};

use config::Storage;
use db::users::User;
use session::{SessionProvider, SessionStore};
use std::sync::Arc;
use web::{AppState, Templates};

/// Core service that owns configuration and storage
pub struct Core {
    /// Configuration
    pub config: Config,

    /// Database connection
    pub db: Arc<Database>,
}

impl Core {
    /// Create a new Core instance with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let db = Database::new(config.database_path())?;
        Ok(Core {
            config,
            db: Arc::new(db),
        })
    }

    /// Register a user who may then log in
    pub async fn add_user(&self, username: &str) -> Result<User> {
        let user = self.db.add_user(username).await?;
        tracing::info!("Added user {}", user.username);
        Ok(user)
    }

    /// Session manager over the configured store
    pub fn session_manager(&self) -> SessionManager {
        let store = match self.config.storage {
            Storage::Db => SessionStore::Db(self.db.clone()),
            Storage::Ephemeral => {
                tracing::info!("Sessions are kept in memory and lost on restart");
                SessionStore::ephemeral()
            }
        };
        SessionManager::from_config(&self.config.session, SessionProvider::new(store))
    }

    /// Load the catalogue and templates, then serve pages until shutdown
    pub async fn start_server(&self) -> Result<()> {
        let catalogue = Catalogue::from_path(self.config.catalogue_path()?)?;
        let templates = Templates::load(&self.config.template_dir())?;

        let state = AppState {
            db: self.db.clone(),
            catalogue: Arc::new(catalogue),
            sessions: Arc::new(self.session_manager()),
            templates: Arc::new(templates),
        };

        let addr = self.config.server_addr();
        tracing::info!("Starting web server on {}", addr);
        web::serve(addr, state).await
    }

    /// Get a reference to the database
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    fn test_core(storage: Storage) -> (Core, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            storage,
            ..Config::default()
        };
        (Core::new(config).unwrap(), dir)
    }

    #[tokio::test]
    async fn test_add_user() {
        let (core, _dir) = test_core(Storage::Db);
        let user = core.add_user("  alice ").await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(core.database().get_user("alice").await.unwrap(), user);

        let err = core.add_user("alice").await.unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists(..)));
    }

    #[tokio::test]
    async fn test_add_user_rejects_empty_name() {
        let (core, _dir) = test_core(Storage::Db);
        let err = core.add_user("").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_session_manager_uses_db_store() {
        let (core, _dir) = test_core(Storage::Db);
        let manager = core.session_manager();
        let (session, _) = manager.start_session(&HeaderMap::new()).await;

        let doc = SessionStore::Db(core.db.clone())
            .find(session.id())
            .await
            .unwrap();
        assert!(doc.is_some());
    }

    #[tokio::test]
    async fn test_session_manager_ephemeral_store() {
        let (core, _dir) = test_core(Storage::Ephemeral);
        let manager = core.session_manager();
        manager.start_session(&HeaderMap::new()).await;

        let stored = SessionStore::Db(core.db.clone()).count().await.unwrap();
        assert_eq!(stored, 0);
        assert_eq!(manager.provider().store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_start_server_without_catalogue_fails() {
        let (core, _dir) = test_core(Storage::Db);
        let err = core.start_server().await.unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
