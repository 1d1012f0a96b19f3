//! Persisted application settings.
//!
//! Stored as `settings.json` in the OS config directory. Every field has a
//! default, so a partial file is valid and a missing file is created on first
//! run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::model::{LineFilter, ViewMode};

/// Environment variable that overrides the stored backend password.
pub const PASSWORD_ENV: &str = "PRODUCTION_GANTT_PASSWORD";

/// Where schedule data comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Built-in sample data, optionally seeded from a snapshot file.
    Demo {
        #[serde(default)]
        seed_file: Option<PathBuf>,
    },
    /// An Odoo server reached through `/jsonrpc`.
    Odoo {
        url: String,
        database: String,
        login: String,
        #[serde(default)]
        password: String,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Demo { seed_file: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub request_timeout_secs: u64,
    pub auto_refresh: bool,
    /// Zero disables the timer.
    pub refresh_interval_secs: u64,
    pub min_item_width_px: f32,
    /// Lower bound for a day column; wider ranges scroll horizontally.
    pub min_day_width_px: f32,
    pub default_view_mode: ViewMode,
    pub default_line_filter: LineFilter,
    /// Used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            request_timeout_secs: 30,
            auto_refresh: true,
            refresh_interval_secs: 60,
            min_item_width_px: crate::model::placement::DEFAULT_MIN_WIDTH_PX,
            min_day_width_px: 48.0,
            default_view_mode: ViewMode::Week,
            default_line_filter: LineFilter::All,
            log_level: "info".into(),
        }
    }
}

impl AppConfig {
    /// Default location of the settings file.
    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "ProductionGantt") {
            proj_dirs.config_dir().join("settings.json")
        } else {
            PathBuf::from(".").join("settings.json")
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// Load the settings file, writing defaults on first run. A broken file
    /// is reported and replaced by defaults in memory only.
    pub fn load_or_default(path: &Path) -> Self {
        let mut config = if path.exists() {
            match Self::load(path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("{}; using defaults", e);
                    Self::default()
                }
            }
        } else {
            let config = Self::default();
            match config.save(path) {
                Ok(()) => info!(path = %path.display(), "wrote default settings"),
                Err(e) => warn!("{}", e),
            }
            config
        };
        config.apply_env(std::env::var(PASSWORD_ENV).ok());
        config
    }

    fn apply_env(&mut self, password: Option<String>) {
        if let (BackendConfig::Odoo { password: stored, .. }, Some(password)) =
            (&mut self.backend, password)
        {
            *stored = password;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Auto-refresh period, if enabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.auto_refresh && self.refresh_interval_secs > 0)
            .then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}
