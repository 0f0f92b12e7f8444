//! One full backup cycle: resolve, pre-check, archive, record.
//!
//! The orchestrator is built once per process with everything fatal resolved
//! up front (platform, source directory). `run_cycle` then never fails the
//! caller: every per-cycle error is captured in the returned outcome after
//! being logged and dispatched to the notification channels.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::backup::archive::{archive_basename, unique_archive_path, write_archive};
use crate::backup::estimate::SpaceEstimator;
use crate::core::config::Config;
use crate::core::errors::{MbkError, Result};
use crate::daemon::notifications::{NotificationEvent, NotificationManager};
use crate::logger::backup_log::{BackupLogWriter, CycleLogEntry};
use crate::platform::pal::{Platform, resolve_source_dir};

/// The result of one backup cycle.
#[derive(Debug)]
pub struct CycleOutcome {
    /// Cycle ordinal; 0 marks a manual/immediate backup outside the schedule.
    pub sequence: u64,
    /// Final archive path on success, the contained error otherwise.
    pub result: Result<PathBuf>,
}

impl CycleOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Archive path when the cycle succeeded.
    #[must_use]
    pub fn archive(&self) -> Option<&Path> {
        self.result.as_deref().ok()
    }

    /// Contained error when the cycle failed.
    #[must_use]
    pub fn error(&self) -> Option<&MbkError> {
        self.result.as_ref().err()
    }
}

/// Runs backup cycles against a resolved source directory.
pub struct BackupOrchestrator {
    source_dir: PathBuf,
    archive_dir: PathBuf,
    estimator: SpaceEstimator,
    log: BackupLogWriter,
    notifier: NotificationManager,
}

impl BackupOrchestrator {
    /// Build an orchestrator from configuration.
    ///
    /// Resolving the source directory happens here, so a missing environment
    /// variable aborts startup instead of failing every cycle.
    pub fn new(platform: Arc<dyn Platform>, config: &Config) -> Result<Self> {
        let source_dir = resolve_source_dir(platform.as_ref())?;
        Ok(Self {
            source_dir,
            archive_dir: config.paths.archive_dir(),
            estimator: SpaceEstimator::new(platform, config.estimate.safety_ratio),
            log: BackupLogWriter::new(config.paths.log_file(), config.log.max_size_bytes),
            notifier: NotificationManager::from_config(&config.notifications, config.locale),
        })
    }

    /// The save-data directory backups are taken from.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// The directory receiving timestamped archives.
    #[must_use]
    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Notification channels shared with the scheduling loop.
    #[must_use]
    pub const fn notifier(&self) -> &NotificationManager {
        &self.notifier
    }

    /// Execute one backup cycle and record its outcome.
    ///
    /// The cycle log always receives an entry, success or failure. The error,
    /// if any, stays inside the outcome so the scheduling loop keeps running.
    pub fn run_cycle(&self, sequence: u64) -> CycleOutcome {
        let result = self.try_cycle();

        match &result {
            Ok(archive) => {
                self.log.append(&CycleLogEntry::success(sequence, archive.clone()));
                self.notifier.notify(&NotificationEvent::BackupCompleted {
                    sequence,
                    archive: archive.display().to_string(),
                });
            }
            Err(err) => {
                self.log.append(&CycleLogEntry::failure(sequence, err.to_string()));
                self.notifier.notify(&NotificationEvent::BackupFailed {
                    sequence,
                    code: err.code().to_string(),
                    message: err.to_string(),
                });
            }
        }

        CycleOutcome { sequence, result }
    }

    fn try_cycle(&self) -> Result<PathBuf> {
        if !self.source_dir.is_dir() {
            return Err(MbkError::MissingSource {
                path: self.source_dir.clone(),
            });
        }

        fs::create_dir_all(&self.archive_dir)
            .map_err(|source| MbkError::io(&self.archive_dir, source))?;

        // Free space is measured where the archive will land, after the
        // directory exists so statvfs has something to stat.
        let check = self.estimator.check(&self.source_dir, &self.archive_dir)?;
        if !check.is_sufficient() {
            return Err(check.insufficiency());
        }

        let base = archive_basename(&Local::now());
        let dest = unique_archive_path(&self.archive_dir, &base);
        write_archive(&self.source_dir, &dest)?;
        Ok(dest)
    }
}
