//! Progress tracking and reporting for batch downloads

use super::DownloadOutcome;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Width of the console progress bar, in characters
pub const BAR_WIDTH: usize = 40;

/// Progress callback for batch operations
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Events emitted while a batch runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    BatchStarted {
        total: usize,
        workers: usize,
    },
    ItemResolved {
        index: usize,
        filename: String,
    },
    ItemNotMirrored {
        index: usize,
        project_id: u64,
        file_id: u64,
    },
    RetryAttempt {
        index: usize,
        attempt: usize,
        max_attempts: usize,
    },
    /// Emitted in completion order; `completed` counts finished items so far
    ItemFinished {
        index: usize,
        completed: usize,
        total: usize,
        outcome: DownloadOutcome,
    },
    Warning {
        message: String,
    },
    BatchFinished {
        total: usize,
        failed: usize,
    },
}

/// Render `[=====     ] 12.50%` for `completed` out of `total`
pub fn progress_bar_line(completed: usize, total: usize) -> String {
    let fraction = if total == 0 {
        1.0
    } else {
        completed.min(total) as f64 / total as f64
    };
    let filled = (fraction * BAR_WIDTH as f64) as usize;
    format!(
        "[{:<width$}] {:.2}%",
        "=".repeat(filled),
        fraction * 100.0,
        width = BAR_WIDTH
    )
}

/// Trait for progress reporting with more granular control
pub trait ProgressReporter: Send + Sync {
    fn on_batch_started(&self, _total: usize, _workers: usize) {}
    fn on_item_resolved(&self, _index: usize, _filename: &str) {}
    fn on_item_not_mirrored(&self, _index: usize, _project_id: u64, _file_id: u64) {}
    fn on_retry_attempt(&self, _index: usize, _attempt: usize, _max_attempts: usize) {}
    fn on_item_finished(&self, _index: usize, _completed: usize, _total: usize, _outcome: &DownloadOutcome) {}
    fn on_warning(&self, _message: &str) {}
    fn on_batch_finished(&self, _total: usize, _failed: usize) {}
}

/// Extension trait to convert ProgressReporter to ProgressCallback
pub trait IntoProgressCallback {
    fn into_callback(self) -> ProgressCallback;
}

impl<T: ProgressReporter + 'static> IntoProgressCallback for T {
    fn into_callback(self) -> ProgressCallback {
        Arc::new(move |event| match event {
            ProgressEvent::BatchStarted { total, workers } => self.on_batch_started(total, workers),
            ProgressEvent::ItemResolved { index, filename } => self.on_item_resolved(index, &filename),
            ProgressEvent::ItemNotMirrored { index, project_id, file_id } => {
                self.on_item_not_mirrored(index, project_id, file_id)
            }
            ProgressEvent::RetryAttempt { index, attempt, max_attempts } => {
                self.on_retry_attempt(index, attempt, max_attempts)
            }
            ProgressEvent::ItemFinished { index, completed, total, outcome } => {
                self.on_item_finished(index, completed, total, &outcome)
            }
            ProgressEvent::Warning { message } => self.on_warning(&message),
            ProgressEvent::BatchFinished { total, failed } => self.on_batch_finished(total, failed),
        })
    }
}

/// Console reporter drawing a single, overwritten progress line on stdout
///
/// Output goes through one lock so concurrent events never interleave, and the
/// bar never moves backwards even if completion events arrive out of order.
#[derive(Debug, Default)]
pub struct ConsoleProgressReporter {
    pub verbose: bool,
    bar: Mutex<BarState>,
}

#[derive(Debug, Default)]
struct BarState {
    completed: usize,
    total: usize,
}

impl ConsoleProgressReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            bar: Mutex::new(BarState::default()),
        }
    }

    fn with_output<F: FnOnce(&mut BarState, &mut io::StdoutLock<'_>)>(&self, f: F) {
        let mut bar = self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let stdout = io::stdout();
        let mut out = stdout.lock();
        f(&mut bar, &mut out);
        let _ = out.flush();
    }

    /// Print a full line above the bar, then redraw the bar
    fn message(&self, text: &str) {
        self.with_output(|bar, out| {
            let _ = writeln!(out, "\r{:<width$}", text, width = BAR_WIDTH + 10);
            let _ = write!(out, "{}", progress_bar_line(bar.completed, bar.total));
        });
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_batch_started(&self, total: usize, workers: usize) {
        self.with_output(|bar, out| {
            if self.verbose {
                let _ = writeln!(out, "📥 Downloading {} files with {} workers", total, workers);
            }
            *bar = BarState { completed: 0, total };
            let _ = write!(out, "\r{}", progress_bar_line(0, total));
        });
    }

    fn on_item_not_mirrored(&self, index: usize, project_id: u64, file_id: u64) {
        if self.verbose {
            self.message(&format!("⚠️  #{} {}:{} is not on the mirror", index + 1, project_id, file_id));
        }
    }

    fn on_retry_attempt(&self, index: usize, attempt: usize, max_attempts: usize) {
        if self.verbose {
            self.message(&format!("🔄 Retry {}/{} for #{}", attempt, max_attempts, index + 1));
        }
    }

    fn on_item_finished(&self, index: usize, completed: usize, total: usize, outcome: &DownloadOutcome) {
        self.with_output(|bar, out| {
            bar.total = total;
            if completed > bar.completed {
                bar.completed = completed;
            }
            if self.verbose {
                let line = match outcome {
                    DownloadOutcome::Success { filename, .. } => format!("✅ #{} {}", index + 1, filename),
                    DownloadOutcome::DownloadFailed { filename, attempts, .. } => {
                        format!("❌ #{} {} failed after {} attempts", index + 1, filename, attempts)
                    }
                    DownloadOutcome::ResolutionFailed(_) => format!("❌ #{} could not be resolved", index + 1),
                };
                let _ = writeln!(out, "\r{:<width$}", line, width = BAR_WIDTH + 10);
            }
            let _ = write!(out, "\r{}", progress_bar_line(bar.completed, bar.total));
        });
    }

    fn on_warning(&self, message: &str) {
        self.message(&format!("⚠️  {}", message));
    }

    fn on_batch_finished(&self, _total: usize, _failed: usize) {
        self.with_output(|_, out| {
            let _ = writeln!(out);
        });
    }
}

/// Null progress reporter that does nothing
#[derive(Debug, Default)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {}

/// Composite progress reporter that forwards events to multiple reporters
pub struct CompositeProgressReporter {
    reporters: Vec<Box<dyn ProgressReporter>>,
}

impl std::fmt::Debug for CompositeProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeProgressReporter")
            .field("reporters_count", &self.reporters.len())
            .finish()
    }
}

impl CompositeProgressReporter {
    pub fn new() -> Self {
        Self { reporters: Vec::new() }
    }

    pub fn add_reporter<R: ProgressReporter + 'static>(mut self, reporter: R) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }
}

impl Default for CompositeProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CompositeProgressReporter {
    fn on_batch_started(&self, total: usize, workers: usize) {
        for reporter in &self.reporters {
            reporter.on_batch_started(total, workers);
        }
    }

    fn on_item_resolved(&self, index: usize, filename: &str) {
        for reporter in &self.reporters {
            reporter.on_item_resolved(index, filename);
        }
    }

    fn on_item_not_mirrored(&self, index: usize, project_id: u64, file_id: u64) {
        for reporter in &self.reporters {
            reporter.on_item_not_mirrored(index, project_id, file_id);
        }
    }

    fn on_retry_attempt(&self, index: usize, attempt: usize, max_attempts: usize) {
        for reporter in &self.reporters {
            reporter.on_retry_attempt(index, attempt, max_attempts);
        }
    }

    fn on_item_finished(&self, index: usize, completed: usize, total: usize, outcome: &DownloadOutcome) {
        for reporter in &self.reporters {
            reporter.on_item_finished(index, completed, total, outcome);
        }
    }

    fn on_warning(&self, message: &str) {
        for reporter in &self.reporters {
            reporter.on_warning(message);
        }
    }

    fn on_batch_finished(&self, total: usize, failed: usize) {
        for reporter in &self.reporters {
            reporter.on_batch_finished(total, failed);
        }
    }
}
