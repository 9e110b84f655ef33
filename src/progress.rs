// src/progress.rs

//! Progress reporting for batch downloads
//!
//! The `ProgressTracker` trait is what the artifact store talks to while a
//! batch of wheels is being fetched. Implementations:
//! - `CliProgress`: an indicatif bar for interactive terminals
//! - `LogProgress`: periodic tracing lines for non-interactive runs
//! - `SilentProgress`: no-op for tests and `--quiet`

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Core trait for progress tracking
///
/// Implementations must be thread-safe; downloads report from worker threads.
pub trait ProgressTracker: Send + Sync {
    /// Set the current status message
    fn set_message(&self, message: &str);

    /// Increment progress by the given amount
    fn increment(&self, amount: u64);

    /// Finish progress successfully with a message
    fn finish_with_message(&self, message: &str);

    /// Report a failed item without finishing the whole operation
    fn report_failure(&self, message: &str);
}

/// Silent progress tracker (no-op)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl SilentProgress {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressTracker for SilentProgress {
    fn set_message(&self, _message: &str) {}

    fn increment(&self, _amount: u64) {}

    fn finish_with_message(&self, _message: &str) {}

    fn report_failure(&self, _message: &str) {}
}

/// Logging progress tracker
///
/// Logs progress updates to tracing at info level, roughly ten times over
/// the whole operation.
#[derive(Debug)]
pub struct LogProgress {
    name: String,
    position: AtomicU64,
    length: u64,
    /// Log interval - only log every N increments to avoid spam
    log_interval: u64,
}

impl LogProgress {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            position: AtomicU64::new(0),
            length,
            log_interval: std::cmp::max(1, length / 10),
        }
    }

    fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }
}

impl ProgressTracker for LogProgress {
    fn set_message(&self, message: &str) {
        debug!("{}: {}", self.name, message);
    }

    fn increment(&self, amount: u64) {
        let old_pos = self.position.fetch_add(amount, Ordering::Relaxed);
        let new_pos = old_pos + amount;

        if self.length > 0 && new_pos / self.log_interval > old_pos / self.log_interval {
            let percent = (new_pos * 100) / self.length;
            info!("{}: {}% ({}/{})", self.name, percent, new_pos, self.length);
        }
    }

    fn finish_with_message(&self, message: &str) {
        info!("{}: {} ({}/{})", self.name, message, self.position(), self.length);
    }

    fn report_failure(&self, message: &str) {
        warn!("{}: {}", self.name, message);
    }
}

/// Terminal progress bar counting finished downloads
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    pub fn new(message: &str, length: u64) -> Self {
        let bar = ProgressBar::new(length);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.set_message(message.to_string());
        Self { bar }
    }
}

impl ProgressTracker for CliProgress {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn increment(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn finish_with_message(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn report_failure(&self, message: &str) {
        self.bar.println(format!("  [FAILED] {}", message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_counts() {
        let progress = LogProgress::new("download", 4);

        progress.set_message("numpy-1.24.0-cp311-cp311-manylinux_2_17_x86_64.whl");
        progress.increment(1);
        progress.report_failure("numpy-1.24.0.whl: timed out");
        progress.increment(3);
        assert_eq!(progress.position(), 4);

        progress.finish_with_message("complete");
    }

    #[test]
    fn test_log_progress_zero_length() {
        let progress = LogProgress::new("download", 0);
        progress.increment(2);
        assert_eq!(progress.position(), 2);
    }

    #[test]
    fn test_cli_progress_counts() {
        let progress = CliProgress::new("wheels", 2);
        progress.set_message("six-1.16.0-py2.py3-none-any.whl");
        progress.increment(1);
        assert_eq!(progress.bar.position(), 1);
        progress.finish_with_message("done");
        assert!(progress.bar.is_finished());
    }
}
