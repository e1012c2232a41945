//! Configuration types and structures.

use crate::assign::policy::DEFAULT_MAX_LOAD_GAP;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 8000;

/// Default row cap for listing queries.
pub const DEFAULT_LISTING_LIMIT: usize = 1000;

/// Root configuration, built once at startup and passed down by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub assignment: AssignmentConfig,
}

/// Storage and HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Interface the HTTP API binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP API listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Listings that reach this many rows fail and ask for a narrower search.
    #[serde(default = "default_listing_limit")]
    pub listing_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
            listing_limit: default_listing_limit(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-assign/tasks.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_listing_limit() -> usize {
    DEFAULT_LISTING_LIMIT
}

/// Assignment policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentConfig {
    /// A parent's assignee keeps the subtask while their load exceeds the
    /// minimum by at most this many tasks.
    #[serde(default = "default_max_load_gap")]
    pub max_load_gap: i64,

    /// Serialize decide+apply per task chain inside this process.
    #[serde(default = "default_true")]
    pub serialize_chains: bool,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            max_load_gap: default_max_load_gap(),
            serialize_chains: true,
        }
    }
}

fn default_max_load_gap() -> i64 {
    DEFAULT_MAX_LOAD_GAP
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a single YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
