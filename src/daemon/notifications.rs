//! User notification channels: desktop, file, and stderr.
//!
//! Dispatches backup outcomes through configured channels with min-level
//! filtering. Every channel is fire-and-forget — a notification failure must
//! never disturb a backup cycle.

#![allow(missing_docs)]

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::core::config::Locale;

// ──────────────────── notification level ────────────────────

/// Severity level for notification filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ──────────────────── notification events ────────────────────

/// A structured notification event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    BackupCompleted {
        sequence: u64,
        archive: String,
    },
    BackupFailed {
        sequence: u64,
        code: String,
        message: String,
    },
    SchedulerStopped {
        reason: String,
        backups_completed: u64,
    },
}

impl NotificationEvent {
    /// The severity level of this event (for min-level filtering).
    #[must_use]
    pub const fn level(&self) -> NotificationLevel {
        match self {
            Self::BackupCompleted { .. } => NotificationLevel::Info,
            Self::SchedulerStopped { .. } => NotificationLevel::Warning,
            Self::BackupFailed { .. } => NotificationLevel::Error,
        }
    }

    /// Short human-readable summary line.
    #[must_use]
    pub fn summary(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::BackupCompleted { sequence: 0, .. }, Locale::En) => {
                "Immediate backup completed successfully.".to_string()
            }
            (Self::BackupCompleted { sequence: 0, .. }, Locale::Zh) => "已进行即时备份".to_string(),
            (Self::BackupCompleted { sequence, archive }, Locale::En) => {
                format!("Backup #{sequence} completed: {archive}")
            }
            (Self::BackupCompleted { sequence, archive }, Locale::Zh) => {
                format!("已成功备份并压缩到 {archive}（第 {sequence} 次）")
            }
            (Self::BackupFailed { sequence, message, .. }, Locale::En) => {
                format!("Backup #{sequence} failed: {message}")
            }
            (Self::BackupFailed { sequence, message, .. }, Locale::Zh) => {
                format!("第 {sequence} 次备份失败: {message}")
            }
            (
                Self::SchedulerStopped {
                    reason,
                    backups_completed,
                },
                Locale::En,
            ) => format!("Backup schedule stopped ({reason}) after {backups_completed} backups"),
            (
                Self::SchedulerStopped {
                    reason,
                    backups_completed,
                },
                Locale::Zh,
            ) => format!("备份已停止（{reason}），共完成 {backups_completed} 次"),
        }
    }

    /// Desktop popup title.
    #[must_use]
    pub const fn title(locale: Locale) -> &'static str {
        match locale {
            Locale::En => "About Monika",
            Locale::Zh => "莫妮卡~",
        }
    }
}

// ──────────────────── configuration ────────────────────

/// Top-level notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationConfig {
    /// Master switch for all notifications.
    pub enabled: bool,
    /// Which channel names to activate.
    pub channels: Vec<String>,
    pub desktop: DesktopConfig,
    pub file: FileConfig,
    pub stderr: StderrConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channels: vec!["desktop".to_string(), "stderr".to_string()],
            desktop: DesktopConfig::default(),
            file: FileConfig::default(),
            stderr: StderrConfig::default(),
        }
    }
}

/// Desktop notification settings (notify-send on Linux, osascript on macOS).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DesktopConfig {
    pub enabled: bool,
    pub min_level: NotificationLevel,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_level: NotificationLevel::Info,
        }
    }
}

/// File notification settings (append-only JSONL).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub path: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Monika_backup").join("notifications.jsonl"),
        }
    }
}

/// Stderr notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StderrConfig {
    pub min_level: NotificationLevel,
}

impl Default for StderrConfig {
    fn default() -> Self {
        Self {
            min_level: NotificationLevel::Warning,
        }
    }
}

// ──────────────────── JSONL record ────────────────────

/// A single notification record written to the JSONL file.
#[derive(Debug, Serialize)]
struct NotificationRecord {
    ts: String,
    level: NotificationLevel,
    summary: String,
    #[serde(flatten)]
    event: NotificationEvent,
}

// ──────────────────── notification channels ────────────────────

/// A notification channel that can dispatch events.
trait Channel: Send + Sync {
    fn name(&self) -> &'static str;
    fn send(&self, event: &NotificationEvent);
}

// ──── Desktop (notify-send / osascript) ────

struct DesktopChannel {
    min_level: NotificationLevel,
    locale: Locale,
}

impl Channel for DesktopChannel {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn send(&self, event: &NotificationEvent) {
        if event.level() < self.min_level {
            return;
        }
        // Failed cycles are reported on the console and in the cycle log,
        // never as popups.
        if matches!(event, NotificationEvent::BackupFailed { .. }) {
            return;
        }

        let title = NotificationEvent::title(self.locale);
        let summary = event.summary(self.locale);
        let urgency = match event.level() {
            NotificationLevel::Error => "critical",
            NotificationLevel::Warning => "normal",
            NotificationLevel::Info => "low",
        };

        #[cfg(target_os = "linux")]
        {
            let _ = Command::new("notify-send")
                .arg("--urgency")
                .arg(urgency)
                .arg("--expire-time=3000")
                .arg("--app-name=mbk")
                .arg(title)
                .arg(&summary)
                .spawn();
        }

        #[cfg(target_os = "macos")]
        {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                summary.replace('"', "\\\""),
                title.replace('"', "\\\"")
            );
            let _ = Command::new("osascript").arg("-e").arg(&script).spawn();
        }

        // On other platforms, desktop notifications are a no-op.
        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let _ = (urgency, title, summary);
        }
    }
}

// ──── File (append-only JSONL) ────

struct FileChannel {
    path: PathBuf,
    locale: Locale,
}

impl Channel for FileChannel {
    fn name(&self) -> &'static str {
        "file"
    }

    fn send(&self, event: &NotificationEvent) {
        let record = NotificationRecord {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level: event.level(),
            summary: event.summary(self.locale),
            event: event.clone(),
        };

        let Ok(json) = serde_json::to_string(&record) else {
            return;
        };

        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{json}");
        }
    }
}

// ──── Stderr ────

struct StderrChannel {
    min_level: NotificationLevel,
    locale: Locale,
}

impl Channel for StderrChannel {
    fn name(&self) -> &'static str {
        "stderr"
    }

    fn send(&self, event: &NotificationEvent) {
        if event.level() < self.min_level {
            return;
        }
        eprintln!(
            "[MBK-NOTIFY] [{}] {}",
            event.level(),
            event.summary(self.locale)
        );
    }
}

// ──────────────────── notification manager ────────────────────

/// Coordinates dispatching notification events to all enabled channels.
///
/// Cheap to call: desktop channels spawn a child process, the file channel
/// appends a line, stderr writes a line. Failures never propagate.
pub struct NotificationManager {
    channels: Vec<Box<dyn Channel>>,
    enabled: bool,
}

impl NotificationManager {
    /// Build a manager from configuration.
    #[must_use]
    pub fn from_config(config: &NotificationConfig, locale: Locale) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        let mut channels: Vec<Box<dyn Channel>> = Vec::new();
        for channel_name in &config.channels {
            match channel_name.as_str() {
                "desktop" if config.desktop.enabled => {
                    channels.push(Box::new(DesktopChannel {
                        min_level: config.desktop.min_level,
                        locale,
                    }));
                }
                "file" => {
                    channels.push(Box::new(FileChannel {
                        path: config.file.path.clone(),
                        locale,
                    }));
                }
                "stderr" => {
                    channels.push(Box::new(StderrChannel {
                        min_level: config.stderr.min_level,
                        locale,
                    }));
                }
                _ => {
                    // Unknown or disabled channel name — skip silently.
                }
            }
        }

        Self {
            channels,
            enabled: true,
        }
    }

    /// Create a disabled (no-op) manager.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            channels: Vec::new(),
            enabled: false,
        }
    }

    /// Dispatch a notification event to all enabled channels.
    pub fn notify(&self, event: &NotificationEvent) {
        if !self.enabled {
            return;
        }
        for channel in &self.channels {
            channel.send(event);
        }
    }

    /// Number of active channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Whether the manager is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// List the names of active channels.
    #[must_use]
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }
}

// ──────────────────── tests ────────────────────
