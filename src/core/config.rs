//! Configuration system: TOML file + smart defaults.
//!
//! All tunables live in one explicit `Config` value handed to each component
//! at construction. There is no process-global state; locale in particular is
//! a config field, not an ambient setting.

#![allow(missing_docs)]

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{MbkError, Result};
use crate::daemon::notifications::NotificationConfig;

/// Log file size threshold before rotation (500 KiB, fixed by design).
pub const LOG_SIZE_LIMIT_BYTES: u64 = 500 * 1024;

/// Operator language for notifications and prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::En => write!(f, "en"),
            Self::Zh => write!(f, "zh"),
        }
    }
}

/// Full configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub locale: Locale,
    pub paths: PathsConfig,
    pub estimate: EstimateConfig,
    pub log: LogConfig,
    pub notifications: NotificationConfig,
}

/// Filesystem layout for backup artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// Root folder for all backup output, relative to the working directory.
    pub backup_root: PathBuf,
    /// Base name of the cycle log file (without the `.txt` extension).
    pub log_file_name: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            backup_root: PathBuf::from("Monika_backup"),
            log_file_name: "Monika.log".to_string(),
        }
    }
}

impl PathsConfig {
    /// Directory that receives the timestamped zip archives.
    #[must_use]
    pub fn archive_dir(&self) -> PathBuf {
        self.backup_root.join("Monika_backup")
    }

    /// Directory that holds the rotating cycle log.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.backup_root.join("Log")
    }

    /// Full path of the cycle log file.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.log_dir().join(format!("{}.txt", self.log_file_name))
    }
}

/// Space estimator tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimateConfig {
    /// Expected compressed/uncompressed size ratio. Observed zip ratio for the
    /// save data is ~0.93; 0.95 keeps a margin on the cautious side.
    pub safety_ratio: f64,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self { safety_ratio: 0.95 }
    }
}

/// Cycle log rotation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Rotate the log once it grows past this many bytes.
    pub max_size_bytes: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: LOG_SIZE_LIMIT_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or defaults when `path` is `None`.
    ///
    /// An explicitly given path that cannot be read is an error; the tool is
    /// expected to run with pure defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path).map_err(|source| MbkError::io(path, source))?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the backup loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.estimate.safety_ratio > 0.0 && self.estimate.safety_ratio <= 1.0) {
            return Err(MbkError::InvalidConfig {
                details: format!(
                    "estimate.safety_ratio must be in (0, 1], got {}",
                    self.estimate.safety_ratio
                ),
            });
        }
        if self.log.max_size_bytes == 0 {
            return Err(MbkError::InvalidConfig {
                details: "log.max_size_bytes must be positive".to_string(),
            });
        }
        if self.paths.log_file_name.is_empty() {
            return Err(MbkError::InvalidConfig {
                details: "paths.log_file_name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
