//! Platform abstraction: save-data location per OS family and free-space stats.

#![allow(missing_docs)]

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::errors::{MbkError, Result};

/// The three OS families with a known save-data layout.
///
/// Anything else is a fatal configuration error: without a resolvable source
/// directory the backup loop cannot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Windows,
    Macos,
    Linux,
}

impl PlatformFamily {
    /// Environment variable holding the per-family base directory.
    #[must_use]
    pub const fn base_env_var(self) -> &'static str {
        match self {
            Self::Windows => "APPDATA",
            Self::Macos | Self::Linux => "HOME",
        }
    }
}

/// OS abstraction used by the path resolver and the space estimator.
///
/// Kept narrow on purpose: the orchestrator only ever needs the save-data
/// location and a free-byte count for the filesystem it writes to.
pub trait Platform: Send + Sync {
    fn family(&self) -> PlatformFamily;
    fn env_var(&self, name: &str) -> Option<OsString>;
    fn free_space(&self, path: &Path) -> Result<u64>;
}

/// Resolve the Monika After Story persistent-data directory for `platform`.
///
/// - Windows: `%APPDATA%\RenPy\Monika After Story`
/// - macOS:   `$HOME/Library/RenPy/Monika After Story`
/// - Linux:   `$HOME/.renpy/Monika After Story`
///
/// A missing base environment variable is fatal and never retried.
pub fn resolve_source_dir(platform: &dyn Platform) -> Result<PathBuf> {
    let family = platform.family();
    let var = family.base_env_var();
    let base = platform
        .env_var(var)
        .filter(|value| !value.is_empty())
        .ok_or(MbkError::MissingEnvVar { name: var })?;
    let base = PathBuf::from(base);

    let dir = match family {
        PlatformFamily::Windows => base.join("RenPy").join("Monika After Story"),
        PlatformFamily::Macos => base
            .join("Library")
            .join("RenPy")
            .join("Monika After Story"),
        PlatformFamily::Linux => base.join(".renpy").join("Monika After Story"),
    };
    Ok(dir)
}

/// Platform implementation backed by the real host OS.
#[derive(Debug)]
pub struct HostPlatform {
    family: PlatformFamily,
}

impl HostPlatform {
    #[must_use]
    pub const fn new(family: PlatformFamily) -> Self {
        Self { family }
    }
}

impl Platform for HostPlatform {
    fn family(&self) -> PlatformFamily {
        self.family
    }

    fn env_var(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn free_space(&self, path: &Path) -> Result<u64> {
        query_free_space(path)
    }
}

/// Detect the active platform implementation.
pub fn detect_platform() -> Result<Arc<dyn Platform>> {
    #[cfg(target_os = "linux")]
    {
        Ok(Arc::new(HostPlatform::new(PlatformFamily::Linux)))
    }
    #[cfg(target_os = "macos")]
    {
        Ok(Arc::new(HostPlatform::new(PlatformFamily::Macos)))
    }
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(HostPlatform::new(PlatformFamily::Windows)))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        Err(MbkError::UnsupportedPlatform {
            details: format!("no save-data layout known for {}", std::env::consts::OS),
        })
    }
}

/// Available bytes on the filesystem containing `path`.
#[cfg(unix)]
fn query_free_space(path: &Path) -> Result<u64> {
    let stat = nix::sys::statvfs::statvfs(path).map_err(|error| MbkError::FsStats {
        path: path.to_path_buf(),
        details: error.to_string(),
    })?;
    Ok(stat.blocks_available().saturating_mul(stat.fragment_size()))
}

#[cfg(not(unix))]
fn query_free_space(path: &Path) -> Result<u64> {
    Err(MbkError::FsStats {
        path: path.to_path_buf(),
        details: "free-space query is only implemented for unix hosts".to_string(),
    })
}

/// In-memory mock implementation for deterministic tests.
#[derive(Debug, Clone)]
pub struct MockPlatform {
    family: PlatformFamily,
    env: std::collections::HashMap<String, OsString>,
    free_bytes: Option<u64>,
}

impl MockPlatform {
    #[must_use]
    pub fn new(family: PlatformFamily) -> Self {
        Self {
            family,
            env: std::collections::HashMap::new(),
            free_bytes: Some(u64::MAX),
        }
    }

    #[must_use]
    pub fn with_env(mut self, name: &str, value: impl Into<OsString>) -> Self {
        self.env.insert(name.to_string(), value.into());
        self
    }

    /// `None` makes `free_space` fail, simulating a stats error.
    #[must_use]
    pub const fn with_free_bytes(mut self, free: Option<u64>) -> Self {
        self.free_bytes = free;
        self
    }
}

impl Platform for MockPlatform {
    fn family(&self) -> PlatformFamily {
        self.family
    }

    fn env_var(&self, name: &str) -> Option<OsString> {
        self.env.get(name).cloned()
    }

    fn free_space(&self, path: &Path) -> Result<u64> {
        self.free_bytes.ok_or_else(|| MbkError::FsStats {
            path: path.to_path_buf(),
            details: "mock stats unavailable".to_string(),
        })
    }
}
