//! Compressed-size estimation and free-space pre-check.

use std::path::Path;
use std::sync::Arc;

use walkdir::WalkDir;

use crate::core::errors::{MbkError, Result};
use crate::platform::pal::Platform;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Result of a pre-archive space check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceCheck {
    /// Predicted archive size in bytes (safety ratio already applied).
    pub estimated_bytes: f64,
    /// Free bytes on the filesystem that will receive the archive.
    pub available_bytes: u64,
}

impl SpaceCheck {
    /// Whether the archive is expected to fit.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_sufficient(&self) -> bool {
        (self.available_bytes as f64) >= self.estimated_bytes
    }

    /// The per-cycle error carrying both figures in MB for diagnostics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn insufficiency(&self) -> MbkError {
        MbkError::InsufficientSpace {
            estimated_mb: self.estimated_bytes / BYTES_PER_MB,
            available_mb: self.available_bytes as f64 / BYTES_PER_MB,
        }
    }
}

/// Estimates archive sizes and queries free space through the platform layer.
pub struct SpaceEstimator {
    platform: Arc<dyn Platform>,
    safety_ratio: f64,
}

impl SpaceEstimator {
    #[must_use]
    pub fn new(platform: Arc<dyn Platform>, safety_ratio: f64) -> Self {
        Self {
            platform,
            safety_ratio,
        }
    }

    /// Sum of all file sizes under `dir`, recursively. Symlinks are not
    /// followed; the save-data tree is assumed acyclic.
    pub fn tree_size(&self, dir: &Path) -> Result<u64> {
        let mut total: u64 = 0;
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                match err.into_io_error() {
                    Some(source) => MbkError::Io { path, source },
                    None => MbkError::FsStats {
                        path,
                        details: "walk entry unavailable".to_string(),
                    },
                }
            })?;
            if entry.file_type().is_file() {
                let meta = entry
                    .metadata()
                    .map_err(|err| MbkError::FsStats {
                        path: entry.path().to_path_buf(),
                        details: err.to_string(),
                    })?;
                total = total.saturating_add(meta.len());
            }
        }
        Ok(total)
    }

    /// Predicted compressed size: `safety_ratio × tree_size`.
    #[allow(clippy::cast_precision_loss)]
    pub fn estimate(&self, dir: &Path) -> Result<f64> {
        Ok(self.tree_size(dir)? as f64 * self.safety_ratio)
    }

    /// Run the full pre-check: estimate `source`, report free space at `target`.
    pub fn check(&self, source: &Path, target: &Path) -> Result<SpaceCheck> {
        Ok(SpaceCheck {
            estimated_bytes: self.estimate(source)?,
            available_bytes: self.platform.free_space(target)?,
        })
    }
}
