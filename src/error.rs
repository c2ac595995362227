//! Error types for dbweb

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The document store could not be reached or opened
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalogue data could not be loaded
    #[error("Catalogue error: {0}")]
    Catalogue(String),

    /// Template loading or rendering error
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Not found error
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    /// Duplicate key on insert
    #[error("{0} already exists: {1}")]
    AlreadyExists(&'static str, String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Stored document has a layout this build does not understand
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),

    /// Blocking task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}

impl CoreError {
    /// True for the not-found class of failures (missing cookie, store miss, unknown user)
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(..))
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Catalogue(e.to_string())
    }
}

impl From<tokio::task::JoinError> for CoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        CoreError::Task(e.to_string())
    }
}

/// Result type alias for Core operations
pub type Result<T> = std::result::Result<T, CoreError>;
