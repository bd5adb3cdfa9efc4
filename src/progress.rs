//! Progress reporting during a transfer.
//!
//! No progress-bar crate appears anywhere in the surrounding ecosystem
//! for this kind of tool, so this is a small trait plus a plain
//! `std::io`-backed terminal implementation rather than an added
//! dependency.

use std::io::{self, Write};
use std::time::Instant;

/// Something that can be told about transfer progress.
///
/// Implementations must not block the async runtime for long; the
/// terminal implementation below does a single buffered write per call.
pub trait ProgressReporter {
    /// Advance the completed-unit counter by `n`.
    fn advance(&mut self, n: u64);
    /// Replace the current status line's description.
    fn describe(&mut self, text: &str);
    /// Finalize output (e.g. move to a fresh line). Called once, at the
    /// end of a folder's transfer.
    fn close(&mut self);
}

/// Writes a single overwritten status line to standard error: current
/// count, total, and elapsed time.
pub struct TerminalProgress {
    total: u64,
    done: u64,
    label: String,
    started: Instant,
}

impl TerminalProgress {
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            total,
            done: 0,
            label: String::new(),
            started: Instant::now(),
        }
    }

    fn render(&self) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = io::stderr();
        let _ = write!(
            stderr,
            "\r\x1b[K{} {}/{} ({:.0}s)",
            self.label, self.done, self.total, elapsed
        );
        let _ = stderr.flush();
    }
}

impl ProgressReporter for TerminalProgress {
    fn advance(&mut self, n: u64) {
        self.done = self.done.saturating_add(n);
        self.render();
    }

    fn describe(&mut self, text: &str) {
        self.label = text.to_string();
        self.render();
    }

    fn close(&mut self) {
        let mut stderr = io::stderr();
        let _ = writeln!(stderr);
        let _ = stderr.flush();
    }
}

/// A no-op reporter, for tests and library callers that don't want
/// terminal output.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn advance(&mut self, _n: u64) {}
    fn describe(&mut self, _text: &str) {}
    fn close(&mut self) {}
}
