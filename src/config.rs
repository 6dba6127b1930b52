//! Configuration loading and management
//!
//! Handles parsing of `tracker.toml` configuration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::history::HistoryTracker;
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::TaskFile;

/// File name looked up in the working directory
pub const CONFIG_FILE: &str = "tracker.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Data file configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// View history configuration
    #[serde(default)]
    pub history: HistoryConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port`, resolved when the listener binds
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Data file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// CSV file the store is saved to; in-memory only when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// How long to wait for the data file lock (milliseconds)
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StorageConfig {
    /// Data file at `path` using the configured lock timeout
    pub fn task_file(&self, path: impl Into<PathBuf>) -> TaskFile {
        TaskFile::new(path).with_lock_timeout(self.lock_timeout_ms)
    }
}

/// View history configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of entries; unbounded when unset
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl HistoryConfig {
    pub fn tracker(&self) -> HistoryTracker {
        match self.capacity {
            Some(capacity) => HistoryTracker::with_capacity(capacity),
            None => HistoryTracker::new(),
        }
    }
}

impl Config {
    /// Load configuration from a `tracker.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `tracker.toml` from a directory, or return defaults when absent
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "server.host cannot be empty".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(Error::InvalidConfig("server.port must be > 0".to_string()));
        }
        if let Some(path) = &self.storage.path {
            if path.as_os_str().is_empty() {
                return Err(Error::InvalidConfig(
                    "storage.path cannot be empty".to_string(),
                ));
            }
        }
        if self.storage.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.history.capacity == Some(0) {
            return Err(Error::InvalidConfig(
                "history.capacity must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
