//! Rotating plain-text cycle log.
//!
//! One human-readable block per backup attempt, appended to a single UTF-8
//! file. Before each append the current size is checked against the rotation
//! threshold; an oversized file is renamed to `<name>.bak` (replacing any
//! prior backup log) and a fresh file is started.
//!
//! Logging is strictly best-effort: a cycle outcome is reported to the
//! console and notification channels even when the log storage is unwritable.

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::core::errors::{MbkError, Result};

const SEPARATOR: &str = "====================";

/// One append-only record of a backup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleLogEntry {
    /// Cycle ordinal; 0 is the manual/immediate convention.
    pub sequence: u64,
    /// Archive path for a successful attempt, `None` for a failed one.
    pub target: Option<PathBuf>,
    /// Error text for a failed attempt.
    pub error: Option<String>,
    /// Creation instant of the entry.
    pub timestamp: DateTime<Local>,
}

impl CycleLogEntry {
    /// Record a completed archive.
    #[must_use]
    pub fn success(sequence: u64, target: PathBuf) -> Self {
        Self {
            sequence,
            target: Some(target),
            error: None,
            timestamp: Local::now(),
        }
    }

    /// Record a failed attempt with its error text.
    #[must_use]
    pub fn failure(sequence: u64, error: String) -> Self {
        Self {
            sequence,
            target: None,
            error: Some(error),
            timestamp: Local::now(),
        }
    }

    /// Render the entry as its log block.
    #[must_use]
    pub fn render(&self) -> String {
        let stamp = self.timestamp.format("%Y-%m-%d %H:%M:%S");
        let mut block = format!("{SEPARATOR}\n");
        match &self.target {
            Some(target) => {
                let _ = writeln!(
                    block,
                    "{stamp} backup #{} target: {}",
                    self.sequence,
                    target.display()
                );
            }
            None => {
                let _ = writeln!(block, "{stamp} backup #{} failed", self.sequence);
            }
        }
        if let Some(error) = &self.error {
            let _ = writeln!(block, "error: {error}");
        }
        block.push('\n');
        block
    }
}

/// Append-only cycle log with size-bounded rotation.
pub struct BackupLogWriter {
    path: PathBuf,
    max_size_bytes: u64,
}

impl BackupLogWriter {
    #[must_use]
    pub const fn new(path: PathBuf, max_size_bytes: u64) -> Self {
        Self {
            path,
            max_size_bytes,
        }
    }

    /// Path of the active log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry, rotating first when the file is oversized.
    ///
    /// Never fails the caller; storage errors degrade to a stderr note.
    pub fn append(&self, entry: &CycleLogEntry) {
        if let Err(err) = self.try_append(entry) {
            eprintln!("[MBK-LOG] cycle log write failed: {err}");
        }
    }

    fn try_append(&self, entry: &CycleLogEntry) -> Result<()> {
        self.rotate_if_oversized()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| MbkError::io(parent, source))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| MbkError::io(&self.path, source))?;
        file.write_all(entry.render().as_bytes())
            .map_err(|source| MbkError::io(&self.path, source))
    }

    fn rotate_if_oversized(&self) -> Result<()> {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(()), // no file yet
        };
        if size <= self.max_size_bytes {
            return Ok(());
        }

        let bak = self.bak_path();
        // rename does not replace existing targets on every OS.
        let _ = fs::remove_file(&bak);
        fs::rename(&self.path, &bak).map_err(|source| MbkError::io(&self.path, source))
    }

    /// Path the oversized log is rotated to.
    #[must_use]
    pub fn bak_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer(dir: &Path, max: u64) -> BackupLogWriter {
        BackupLogWriter::new(dir.join("Monika.log.txt"), max)
    }

    #[test]
    fn success_block_names_sequence_and_target() {
        let entry = CycleLogEntry::success(3, PathBuf::from("/b/20260830_142500.zip"));
        let block = entry.render();
        assert!(block.starts_with(SEPARATOR));
        assert!(block.contains("backup #3"));
        assert!(block.contains("20260830_142500.zip"));
        assert!(block.ends_with("\n\n"));
    }

    #[test]
    fn failure_block_carries_error_text() {
        let entry = CycleLogEntry::failure(
            5,
            "insufficient disk space: estimated 812.50 MB needed, 120.25 MB available".to_string(),
        );
        let block = entry.render();
        assert!(block.contains("backup #5 failed"));
        assert!(block.contains("812.50 MB"));
        assert!(block.contains("120.25 MB"));
    }

    #[test]
    fn append_creates_dirs_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = BackupLogWriter::new(
            dir.path().join("Log").join("Monika.log.txt"),
            500 * 1024,
        );
        log.append(&CycleLogEntry::success(1, PathBuf::from("/b/a.zip")));

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("backup #1"));
    }

    #[test]
    fn entries_accumulate_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let log = writer(dir.path(), 500 * 1024);
        for seq in 1..=4u64 {
            log.append(&CycleLogEntry::success(seq, PathBuf::from("/b/a.zip")));
        }
        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.matches(SEPARATOR).count(), 4);
        assert!(!log.bak_path().exists());
    }

    #[test]
    fn oversized_log_rotates_to_bak_before_append() {
        let dir = tempfile::tempdir().unwrap();
        let log = writer(dir.path(), 64);
        fs::write(log.path(), vec![b'x'; 100]).unwrap();

        log.append(&CycleLogEntry::success(2, PathBuf::from("/b/a.zip")));

        let bak = fs::read_to_string(log.bak_path()).unwrap();
        assert_eq!(bak, "x".repeat(100));
        let fresh = fs::read_to_string(log.path()).unwrap();
        assert!(fresh.contains("backup #2"));
        assert_eq!(fresh.matches(SEPARATOR).count(), 1);
    }

    #[test]
    fn rotation_overwrites_prior_bak() {
        let dir = tempfile::tempdir().unwrap();
        let log = writer(dir.path(), 64);
        fs::write(log.bak_path(), b"old backup log").unwrap();
        fs::write(log.path(), vec![b'y'; 100]).unwrap();

        log.append(&CycleLogEntry::success(1, PathBuf::from("/b/a.zip")));

        let bak = fs::read_to_string(log.bak_path()).unwrap();
        assert_eq!(bak, "y".repeat(100));
    }

    #[test]
    fn exact_threshold_does_not_rotate() {
        let dir = tempfile::tempdir().unwrap();
        let log = writer(dir.path(), 100);
        fs::write(log.path(), vec![b'z'; 100]).unwrap();

        log.append(&CycleLogEntry::success(1, PathBuf::from("/b/a.zip")));
        assert!(!log.bak_path().exists());
    }

    #[test]
    fn unwritable_storage_never_panics() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file in the way").unwrap();

        // Parent of the log path is a regular file; every write must fail.
        let log = BackupLogWriter::new(blocker.join("Monika.log.txt"), 500 * 1024);
        log.append(&CycleLogEntry::failure(1, "boom".to_string()));
    }
}
