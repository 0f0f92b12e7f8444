//! Scheduling loop: wait an interval, run a cycle, repeat.
//!
//! Single-threaded by design. The wait is sliced into short sleeps so a
//! cancellation signal surfaces within a fraction of a second, at which point
//! the operator is asked to confirm. A declined confirmation clears the flag
//! and restarts the full interval.
//!
//! Per-cycle errors never leave the orchestrator; the loop only ever stops
//! for a confirmed cancellation or a reached backup limit.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

use crate::backup::frequency::Frequency;
use crate::backup::orchestrator::{BackupOrchestrator, CycleOutcome};
use crate::core::config::Locale;
use crate::daemon::notifications::NotificationEvent;
use crate::daemon::signals::SignalHandler;

/// Granularity of the interruptible wait.
const POLL_SLICE: Duration = Duration::from_millis(250);

/// Arguments for a scheduled run.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleArgs {
    /// Interval between backup cycles.
    pub frequency: Frequency,
    /// Stop after this many scheduled backups; `None` runs until cancelled.
    /// The immediate backup (sequence 0) never counts toward the limit.
    pub max_backups: Option<u64>,
    /// Run one backup right away before the first wait.
    pub immediate: bool,
}

/// Why the scheduling loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured backup limit was reached.
    LimitReached,
    /// The operator confirmed a cancellation.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LimitReached => write!(f, "backup limit reached"),
            Self::Cancelled => write!(f, "cancelled by operator"),
        }
    }
}

enum WaitOutcome {
    Elapsed,
    Interrupted,
}

/// Asks the operator whether a requested cancellation should stop the loop.
pub trait StopPrompt {
    /// `true` stops the schedule; `false` resumes waiting.
    fn confirm_stop(&mut self) -> bool;
}

/// Interactive y/n confirmation on the controlling terminal.
///
/// Any answer other than yes or no reprompts; an unreadable stdin counts as
/// yes, since there is no operator left to resume for.
pub struct TerminalPrompt {
    locale: Locale,
}

impl TerminalPrompt {
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }
}

impl StopPrompt for TerminalPrompt {
    fn confirm_stop(&mut self) -> bool {
        let question = match self.locale {
            Locale::En => "Stop the backup schedule? (y/n): ",
            Locale::Zh => "要停止备份吗？(y/n): ",
        };

        let stdin = io::stdin();
        loop {
            eprint!("{question}");
            let _ = io::stderr().flush();

            let mut answer = String::new();
            if stdin.lock().read_line(&mut answer).is_err() || answer.is_empty() {
                return true;
            }
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => {}
            }
        }
    }
}

/// Drives backup cycles on the configured schedule.
pub struct Scheduler {
    orchestrator: BackupOrchestrator,
    signals: SignalHandler,
    args: ScheduleArgs,
}

impl Scheduler {
    #[must_use]
    pub const fn new(
        orchestrator: BackupOrchestrator,
        signals: SignalHandler,
        args: ScheduleArgs,
    ) -> Self {
        Self {
            orchestrator,
            signals,
            args,
        }
    }

    /// Run the schedule until the limit is reached or a cancellation is
    /// confirmed through `prompt`.
    pub fn run(&mut self, prompt: &mut dyn StopPrompt) -> StopReason {
        let mut completed: u64 = 0;

        if self.args.immediate {
            let outcome = self.orchestrator.run_cycle(0);
            report_outcome(&outcome);
        }

        loop {
            if let Some(max) = self.args.max_backups
                && completed >= max
            {
                return self.stop(StopReason::LimitReached, completed);
            }

            eprintln!("[MBK-SCHED] next backup in {}", self.args.frequency);
            match self.wait_interval() {
                WaitOutcome::Interrupted => {
                    if prompt.confirm_stop() {
                        return self.stop(StopReason::Cancelled, completed);
                    }
                    // Declined: clear the flag and start a fresh interval.
                    self.signals.reset();
                    continue;
                }
                WaitOutcome::Elapsed => {}
            }

            completed += 1;
            let outcome = self.orchestrator.run_cycle(completed);
            report_outcome(&outcome);
        }
    }

    fn wait_interval(&self) -> WaitOutcome {
        let interval = self.args.frequency.as_duration();
        let start = Instant::now();
        loop {
            if self.signals.is_cancelled() {
                return WaitOutcome::Interrupted;
            }
            let elapsed = start.elapsed();
            if elapsed >= interval {
                return WaitOutcome::Elapsed;
            }
            thread::sleep((interval - elapsed).min(POLL_SLICE));
        }
    }

    fn stop(&self, reason: StopReason, completed: u64) -> StopReason {
        eprintln!("[MBK-SCHED] stopping: {reason} ({completed} backups completed)");
        self.orchestrator
            .notifier()
            .notify(&NotificationEvent::SchedulerStopped {
                reason: reason.to_string(),
                backups_completed: completed,
            });
        reason
    }
}

fn report_outcome(outcome: &CycleOutcome) {
    match &outcome.result {
        Ok(archive) => eprintln!(
            "[MBK-SCHED] backup #{} completed: {}",
            outcome.sequence,
            archive.display()
        ),
        Err(err) => eprintln!("[MBK-SCHED] backup #{} failed: {err}", outcome.sequence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, PathsConfig};
    use crate::platform::pal::{MockPlatform, PlatformFamily};
    use std::collections::VecDeque;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    struct ScriptedPrompt {
        answers: VecDeque<bool>,
    }

    impl ScriptedPrompt {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
            }
        }
    }

    impl StopPrompt for ScriptedPrompt {
        fn confirm_stop(&mut self) -> bool {
            self.answers.pop_front().expect("unexpected stop prompt")
        }
    }

    fn save_tree(home: &Path) {
        let source = home.join(".renpy").join("Monika After Story");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("persistent"), b"save data").unwrap();
    }

    fn scheduler(home: &Path, root: &Path, args: ScheduleArgs) -> (Scheduler, SignalHandler) {
        let platform = MockPlatform::new(PlatformFamily::Linux).with_env("HOME", home.as_os_str());
        let config = Config {
            paths: PathsConfig {
                backup_root: root.join("Monika_backup"),
                ..Default::default()
            },
            ..Default::default()
        };
        let orchestrator = BackupOrchestrator::new(Arc::new(platform), &config).unwrap();
        let signals = SignalHandler::detached();
        (
            Scheduler::new(orchestrator, signals.clone(), args),
            signals,
        )
    }

    fn archive_count(root: &Path) -> usize {
        let dir = root.join("Monika_backup").join("Monika_backup");
        match fs::read_dir(dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[test]
    fn limit_stops_after_exact_count() {
        let home = tempfile::tempdir().unwrap();
        save_tree(home.path());
        let root = tempfile::tempdir().unwrap();

        let args = ScheduleArgs {
            frequency: Frequency::parse("0.001m").unwrap(),
            max_backups: Some(2),
            immediate: false,
        };
        let (mut sched, _signals) = scheduler(home.path(), root.path(), args);
        let reason = sched.run(&mut ScriptedPrompt::new(&[]));

        assert_eq!(reason, StopReason::LimitReached);
        assert_eq!(archive_count(root.path()), 2);
    }

    #[test]
    fn immediate_backup_is_not_counted() {
        let home = tempfile::tempdir().unwrap();
        save_tree(home.path());
        let root = tempfile::tempdir().unwrap();

        let args = ScheduleArgs {
            frequency: Frequency::parse("0.001m").unwrap(),
            max_backups: Some(1),
            immediate: true,
        };
        let (mut sched, _signals) = scheduler(home.path(), root.path(), args);
        let reason = sched.run(&mut ScriptedPrompt::new(&[]));

        assert_eq!(reason, StopReason::LimitReached);
        // One immediate (sequence 0) plus one scheduled.
        assert_eq!(archive_count(root.path()), 2);
    }

    #[test]
    fn zero_limit_stops_before_any_wait() {
        let home = tempfile::tempdir().unwrap();
        save_tree(home.path());
        let root = tempfile::tempdir().unwrap();

        let args = ScheduleArgs {
            frequency: Frequency::parse("1h").unwrap(),
            max_backups: Some(0),
            immediate: false,
        };
        let (mut sched, _signals) = scheduler(home.path(), root.path(), args);
        let start = Instant::now();
        let reason = sched.run(&mut ScriptedPrompt::new(&[]));

        assert_eq!(reason, StopReason::LimitReached);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(archive_count(root.path()), 0);
    }

    #[test]
    fn confirmed_cancellation_stops_without_backup() {
        let home = tempfile::tempdir().unwrap();
        save_tree(home.path());
        let root = tempfile::tempdir().unwrap();

        let args = ScheduleArgs {
            frequency: Frequency::parse("1h").unwrap(),
            max_backups: None,
            immediate: false,
        };
        let (mut sched, signals) = scheduler(home.path(), root.path(), args);
        signals.request_cancel();

        let reason = sched.run(&mut ScriptedPrompt::new(&[true]));
        assert_eq!(reason, StopReason::Cancelled);
        assert_eq!(archive_count(root.path()), 0);
    }

    #[test]
    fn declined_cancellation_resumes_the_schedule() {
        let home = tempfile::tempdir().unwrap();
        save_tree(home.path());
        let root = tempfile::tempdir().unwrap();

        let args = ScheduleArgs {
            frequency: Frequency::parse("0.001m").unwrap(),
            max_backups: Some(1),
            immediate: false,
        };
        let (mut sched, signals) = scheduler(home.path(), root.path(), args);
        signals.request_cancel();

        let mut prompt = ScriptedPrompt::new(&[false]);
        let reason = sched.run(&mut prompt);

        // After the declined stop the loop waits a fresh interval and runs
        // the one allowed backup.
        assert_eq!(reason, StopReason::LimitReached);
        assert_eq!(archive_count(root.path()), 1);
        assert!(!signals.is_cancelled(), "flag must be cleared on decline");
        assert!(prompt.answers.is_empty(), "prompt must be consulted once");
    }

    #[test]
    fn failing_cycles_do_not_stop_the_loop() {
        let home = tempfile::tempdir().unwrap(); // no save tree, every cycle fails
        let root = tempfile::tempdir().unwrap();

        let args = ScheduleArgs {
            frequency: Frequency::parse("0.001m").unwrap(),
            max_backups: Some(3),
            immediate: false,
        };
        let (mut sched, _signals) = scheduler(home.path(), root.path(), args);
        let reason = sched.run(&mut ScriptedPrompt::new(&[]));

        assert_eq!(reason, StopReason::LimitReached);
        assert_eq!(archive_count(root.path()), 0);

        let log = fs::read_to_string(
            root.path()
                .join("Monika_backup")
                .join("Log")
                .join("Monika.log.txt"),
        )
        .unwrap();
        assert_eq!(log.matches("failed").count(), 3);
    }

    #[test]
    fn stop_reason_display() {
        assert_eq!(StopReason::LimitReached.to_string(), "backup limit reached");
        assert_eq!(StopReason::Cancelled.to_string(), "cancelled by operator");
    }
}
