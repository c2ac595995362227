//! Configuration management for dbweb
//!
//! Loads settings from a TOML file (default `~/.dbweb/config.toml`), then
//! applies environment overrides (`PORT`, `DATA`, `TEMPLATE_PATH`, ...).

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Miniature catalogue source
    #[serde(default)]
    pub catalogue: CatalogueConfig,

    /// HTML template location
    #[serde(default)]
    pub templates: TemplateConfig,

    /// Session cookie settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Where sessions are kept
    #[serde(default)]
    pub storage: Storage,

    /// Data directory (defaults to ~/.dbweb)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".dbweb"))
        .unwrap_or_else(|| PathBuf::from(".dbweb"))
}

/// Session storage backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    /// Sessions persisted in the SQLite document database
    #[default]
    Db,
    /// Sessions kept in process memory, lost on restart
    Ephemeral,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server host (default: 127.0.0.1 - localhost only)
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Catalogue configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogueConfig {
    /// CSV file with one miniature per row (header row first)
    #[serde(default)]
    pub data_path: Option<PathBuf>,
}

/// Template configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Directory containing `layouts/main.html` and the page templates
    #[serde(default = "default_template_path")]
    pub path: PathBuf,
}

fn default_template_path() -> PathBuf {
    PathBuf::from("templates")
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig {
            path: default_template_path(),
        }
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session ID
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Cookie Max-Age in seconds
    #[serde(default = "default_max_age")]
    pub max_age_secs: i64,
}

fn default_cookie_name() -> String {
    "dbsession".to_string()
}

fn default_max_age() -> i64 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            cookie_name: default_cookie_name(),
            max_age_secs: default_max_age(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            catalogue: CatalogueConfig::default(),
            templates: TemplateConfig::default(),
            session: SessionConfig::default(),
            storage: Storage::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_path(path.as_ref());

        if !expanded_path.exists() {
            return Err(CoreError::Config(format!(
                "Configuration file not found: {}",
                expanded_path.display()
            )));
        }

        let content = std::fs::read_to_string(&expanded_path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".dbweb").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".dbweb/config.toml"))
    }

    /// Get the data directory, expanding ~ if present
    pub fn data_dir(&self) -> PathBuf {
        expand_path(&self.data_dir)
    }

    /// Path of the SQLite document database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("dbweb.db")
    }

    /// Catalogue CSV path, required to serve pages
    pub fn catalogue_path(&self) -> Result<PathBuf> {
        self.catalogue
            .data_path
            .as_deref()
            .map(expand_path)
            .ok_or_else(|| {
                CoreError::Config(
                    "No catalogue data file configured. Set DATA or [catalogue] data_path \
                     to the location of the Dreamblade data as a CSV file."
                        .to_string(),
                )
            })
    }

    /// Template directory, expanding ~ if present
    pub fn template_dir(&self) -> PathBuf {
        expand_path(&self.templates.path)
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> SocketAddr {
        use std::net::ToSocketAddrs;

        format!("{}:{}", self.server.host, self.server.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], self.server.port)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(host) = var("DBWEB_HOST").filter(|h| !h.is_empty()) {
            self.server.host = host;
        }
        if let Some(data) = var("DATA").filter(|d| !d.is_empty()) {
            self.catalogue.data_path = Some(PathBuf::from(data));
        }
        if let Some(templates) = var("TEMPLATE_PATH").filter(|t| !t.is_empty()) {
            self.templates.path = PathBuf::from(templates);
        }
        if let Some(data_dir) = var("DBWEB_DATA_DIR").filter(|d| !d.is_empty()) {
            self.data_dir = PathBuf::from(data_dir);
        }
    }

    /// Create a default configuration file at the given path
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = r#"# dbweb configuration

# Session backend: "db" (SQLite, survives restarts) or "ephemeral" (in memory)
storage = "db"

# Directory holding dbweb.db
# data_dir = "~/.dbweb"

[server]
# Overridden by the PORT environment variable
port = 8080
host = "127.0.0.1"

[catalogue]
# CSV export of the Dreamblade miniatures. Overridden by DATA.
# data_path = "~/dreamblade.csv"

[templates]
# Overridden by TEMPLATE_PATH
path = "templates"

[session]
cookie_name = "dbsession"
max_age_secs = 3600
"#;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
