//! YAML configuration for sync runs.
//!
//! # Storage layout
//!
//! ```text
//! ~/.roster-sync/
//!   config.yaml       (optional; every key may be overridden on the CLI)
//!   last_sync.json    (written by non-dry runs)
//! ```
//!
//! Every loader has two forms, following the `_at` convention:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Filename glob used when neither config nor CLI names one.
pub const DEFAULT_PROFILE_PATTERN: &str = "Profile*.md";

/// Name of the last-run state file inside the config directory.
pub const STATE_FILE_NAME: &str = "last_sync.json";

/// Values read from `config.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub roster_path: Option<PathBuf>,
    pub profiles_root: Option<PathBuf>,
    pub profile_pattern: Option<String>,
    /// Worker threads for per-profile processing; `1` is sequential.
    pub jobs: Option<usize>,
    pub state_file: Option<PathBuf>,
}

impl SyncConfig {
    /// Pattern to use, falling back to [`DEFAULT_PROFILE_PATTERN`].
    pub fn pattern(&self) -> &str {
        self.profile_pattern
            .as_deref()
            .unwrap_or(DEFAULT_PROFILE_PATTERN)
    }
}

/// `<home>/.roster-sync/`
pub fn config_dir_at(home: &Path) -> PathBuf {
    home.join(".roster-sync")
}

/// `<home>/.roster-sync/config.yaml`
pub fn default_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join("config.yaml")
}

/// `<home>/.roster-sync/last_sync.json`
pub fn default_state_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join(STATE_FILE_NAME)
}

/// Load a config file. A missing file is an error here; see [`load_or_default_at`].
pub fn load_from(path: &Path) -> Result<SyncConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(SyncConfig::default());
    }
    let config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Load `<home>/.roster-sync/config.yaml`, or defaults when it does not exist.
pub fn load_or_default_at(home: &Path) -> Result<SyncConfig, ConfigError> {
    let path = default_path_at(home);
    if !path.exists() {
        return Ok(SyncConfig::default());
    }
    load_from(&path)
}

/// [`load_or_default_at`] convenience wrapper.
pub fn load_or_default() -> Result<SyncConfig, ConfigError> {
    load_or_default_at(&home()?)
}

/// [`default_state_path_at`] convenience wrapper.
pub fn default_state_path() -> Result<PathBuf, ConfigError> {
    Ok(default_state_path_at(&home()?))
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
