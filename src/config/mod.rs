//! Unified configuration system.
//!
//! Consolidates configuration from tiers with field-by-field YAML merging:
//! 1. **Defaults** - `Config::default()`
//! 2. **Project** - `$CWD/task-assign/config.yaml`
//! 3. **User** - `~/.task-assign/config.yaml`
//! 4. **Environment** - variables below
//!
//! ## Environment Variables
//! - `TASK_ASSIGN_CONFIG_PATH` - Explicit config file (overrides all tiers)
//! - `TASK_ASSIGN_DB_PATH` - Database path
//! - `TASK_ASSIGN_PORT` - HTTP API port
//! - `TASK_ASSIGN_USER_DIR` - User config dir (default: `~/.task-assign`)
//! - `TASK_ASSIGN_PROJECT_DIR` - Project config dir (default: `./task-assign`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths};
pub use merge::deep_merge;
pub use types::*;
