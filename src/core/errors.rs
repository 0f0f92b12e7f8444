//! MBK-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, MbkError>;

/// Top-level error type for the backup tool.
///
/// Fatal errors (unsupported platform, missing env var, bad frequency token)
/// halt startup; everything else is contained within a single backup cycle.
#[derive(Debug, Error)]
pub enum MbkError {
    #[error("[MBK-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[MBK-1002] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[MBK-1101] unsupported platform: {details}")]
    UnsupportedPlatform { details: String },

    #[error("[MBK-1102] required environment variable {name} is not set")]
    MissingEnvVar { name: &'static str },

    #[error("[MBK-1201] invalid backup frequency {token:?}: {details}")]
    InvalidFrequency { token: String, details: String },

    #[error("[MBK-2001] filesystem stats failure for {path}: {details}")]
    FsStats { path: PathBuf, details: String },

    #[error(
        "[MBK-2002] insufficient disk space: estimated {estimated_mb:.2} MB needed, {available_mb:.2} MB available"
    )]
    InsufficientSpace {
        estimated_mb: f64,
        available_mb: f64,
    },

    #[error("[MBK-2101] source folder {path} does not exist")]
    MissingSource { path: PathBuf },

    #[error("[MBK-3001] archive failure at {path}: {details}")]
    Archive { path: PathBuf, details: String },

    #[error("[MBK-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MbkError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "MBK-1001",
            Self::ConfigParse { .. } => "MBK-1002",
            Self::UnsupportedPlatform { .. } => "MBK-1101",
            Self::MissingEnvVar { .. } => "MBK-1102",
            Self::InvalidFrequency { .. } => "MBK-1201",
            Self::FsStats { .. } => "MBK-2001",
            Self::InsufficientSpace { .. } => "MBK-2002",
            Self::MissingSource { .. } => "MBK-2101",
            Self::Archive { .. } => "MBK-3001",
            Self::Io { .. } => "MBK-3002",
        }
    }

    /// Whether the failure is contained to one backup cycle.
    ///
    /// Fatal errors halt before the scheduling loop starts; recoverable ones
    /// only abort the current cycle, which is logged and the loop proceeds.
    #[must_use]
    pub const fn is_cycle_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FsStats { .. }
                | Self::InsufficientSpace { .. }
                | Self::MissingSource { .. }
                | Self::Archive { .. }
                | Self::Io { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<toml::de::Error> for MbkError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
