//! Signal handling: SIGINT/SIGTERM request a cancellation of the schedule.
//!
//! Uses the `signal-hook` crate for safe signal registration. The scheduling
//! loop polls `SignalHandler` between sleep slices rather than blocking on
//! signals, so a Ctrl-C mid-wait surfaces within one slice.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Thread-safe cancellation state shared between the signal handler and the
/// scheduling loop.
///
/// The flag uses `Ordering::Relaxed`: the loop polls it every slice and no
/// ordering with other atomics is required.
#[derive(Clone)]
pub struct SignalHandler {
    cancel_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a new handler and register OS signal hooks.
    ///
    /// SIGINT and SIGTERM both raise the cancellation flag. Registration is
    /// best-effort; a failure is noted on stderr but not fatal, since the loop
    /// can still be stopped by reaching its backup limit.
    #[must_use]
    pub fn new() -> Self {
        let handler = Self::detached();
        handler.register_signals();
        handler
    }

    /// Create a handler with no OS hooks. The flag can only be raised
    /// programmatically, which is what tests and the one-shot mode want.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Programmatically request cancellation.
    pub fn request_cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Clear the flag after a declined stop confirmation, so the loop can
    /// resume waiting and react to the next Ctrl-C.
    pub fn reset(&self) {
        self.cancel_flag.store(false, Ordering::Relaxed);
    }

    fn register_signals(&self) {
        if let Err(e) = signal_hook::flag::register(SIGINT, Arc::clone(&self.cancel_flag)) {
            eprintln!("[MBK-SIGNAL] failed to register SIGINT: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&self.cancel_flag)) {
            eprintln!("[MBK-SIGNAL] failed to register SIGTERM: {e}");
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
