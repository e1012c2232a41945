//! Configuration loader with tier-based merging.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_FILE: &str = "config.yaml";

/// Where each tier lives.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicit config file; when set, tiers are skipped.
    pub explicit_file: Option<PathBuf>,
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let explicit_file = std::env::var("TASK_ASSIGN_CONFIG_PATH")
            .ok()
            .map(PathBuf::from);

        let user_dir = std::env::var("TASK_ASSIGN_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".task-assign")));

        let project_dir = std::env::var("TASK_ASSIGN_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("task-assign")));

        Self {
            explicit_file,
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            explicit_file: None,
            project_dir,
            user_dir,
        }
    }

    /// Use a single file instead of the tiers.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }
}

/// Loads and merges configuration tiers.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority file that contributed (if any)
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from discovered tiers, then environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(ConfigPaths::discover())
    }

    /// Load configuration from the given paths, then environment overrides.
    pub fn load_from(paths: ConfigPaths) -> Result<Self> {
        let mut loader = Self::load_with_paths(paths)?;
        apply_env_overrides(&mut loader.config, |key| std::env::var(key).ok());
        Ok(loader)
    }

    /// Load configuration from the given paths, without environment overrides.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        if let Some(path) = paths.explicit_file.clone() {
            let config = Config::load(&path)
                .with_context(|| format!("failed to load config file {}", path.display()))?;
            return Ok(Self {
                paths,
                config,
                config_path: Some(path),
            });
        }

        let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut config_path = None;

        for dir in [paths.project_dir.as_deref(), paths.user_dir.as_deref()]
            .into_iter()
            .flatten()
        {
            if let Some(value) = read_tier(dir) {
                tiers.push(value);
                config_path = Some(dir.join(CONFIG_FILE));
            }
        }

        let config: Config = serde_json::from_value(deep_merge_all(tiers))?;

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config file that was used, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Read `<dir>/config.yaml` as a merge tier. Unreadable files are skipped.
fn read_tier(dir: &Path) -> Option<Value> {
    let file = dir.join(CONFIG_FILE);
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(&file) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %file.display(), error = %e, "Skipping unreadable config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => {
            debug!(path = %file.display(), "Loaded config tier");
            Some(value)
        }
        Err(e) => {
            warn!(path = %file.display(), error = %e, "Skipping invalid config file");
            None
        }
    }
}

/// Apply `TASK_ASSIGN_*` overrides using the given variable lookup.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(db_path) = lookup("TASK_ASSIGN_DB_PATH") {
        config.server.db_path = PathBuf::from(db_path);
    }

    if let Some(port) = lookup("TASK_ASSIGN_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %port, "Ignoring invalid TASK_ASSIGN_PORT"),
        }
    }
}
