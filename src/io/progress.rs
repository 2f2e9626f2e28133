//! Progress display for batches of generation runs

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;
use std::time::Duration;

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    let template = format!(
        "[{{elapsed_precise}}] Runs: [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
    );
    ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Tracks completed runs with a single progress bar
pub struct ProgressManager {
    bar: Option<ProgressBar>,
    completed: usize,
    failed: usize,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a manager with no bar shown yet
    pub const fn new() -> Self {
        Self {
            bar: None,
            completed: 0,
            failed: 0,
        }
    }

    /// Show a bar for `run_count` runs
    pub fn initialize(&mut self, run_count: usize) {
        let bar = ProgressBar::new(run_count as u64);
        bar.set_style(BATCH_STYLE.clone());
        self.bar = Some(bar);
        self.completed = 0;
        self.failed = 0;
    }

    /// Announce the seed about to run
    pub fn start_run(&self, seed: u64) {
        if let Some(ref bar) = self.bar {
            bar.set_message(format!("seed {seed}"));
        }
    }

    /// Record a finished run
    pub fn complete_run(&mut self, seed: u64, rooms: usize, elapsed: Duration) {
        self.completed += 1;
        if let Some(ref bar) = self.bar {
            bar.set_message(format!(
                "seed {seed}: {rooms} rooms in {}ms",
                elapsed.as_millis()
            ));
            bar.inc(1);
        }
    }

    /// Record a run that ended with an error
    pub fn fail_run(&mut self, seed: u64) {
        self.failed += 1;
        if let Some(ref bar) = self.bar {
            bar.set_message(format!("seed {seed}: failed"));
            bar.inc(1);
        }
    }

    /// Runs recorded as completed and as failed
    pub const fn counts(&self) -> (usize, usize) {
        (self.completed, self.failed)
    }

    /// Close the bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_with_message(format!(
                "{} runs complete, {} failed",
                self.completed, self.failed
            ));
        }
    }
}
