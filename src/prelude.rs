//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use monika_backup::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, Locale};
pub use crate::core::errors::{MbkError, Result};

// Platform
pub use crate::platform::pal::{Platform, PlatformFamily, detect_platform, resolve_source_dir};

// Backup
pub use crate::backup::frequency::Frequency;
pub use crate::backup::orchestrator::{BackupOrchestrator, CycleOutcome};

// Daemon
pub use crate::daemon::loop_main::{ScheduleArgs, Scheduler, StopPrompt, StopReason};
pub use crate::daemon::signals::SignalHandler;
