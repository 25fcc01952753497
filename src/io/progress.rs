//! Multi-file progress tracking with a batch bar for large sets

use crate::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::LazyLock;

/// Coordinates progress display for batch operations
///
/// Every file gets its own bar counting tiles or samples. Once the batch
/// holds more files than can be shown individually, an extra bar counts
/// finished files and completed file bars are removed from the screen.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    file_count: usize,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static ITEM_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:30.cyan/blue}] {pos}/{len} {prefix}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Files: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            file_count: 0,
        }
    }

    /// Prepare for `file_count` files
    pub fn initialize(&mut self, file_count: usize) {
        self.file_count = file_count;

        // Switch to batch mode for large file sets to avoid terminal spam
        if file_count > MAX_INDIVIDUAL_PROGRESS_BARS {
            let batch_bar = ProgressBar::new(file_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }
    }

    /// Whether finished file bars are cleared to keep the display short
    pub const fn is_batched(&self) -> bool {
        self.file_count > MAX_INDIVIDUAL_PROGRESS_BARS
    }

    /// Add a bar for one file; its length is set by whoever drives it
    pub fn start_file(&self, path: &Path, message: &str) -> ProgressBar {
        let display_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let bar = self.multi_progress.add(ProgressBar::new(0));
        bar.set_style(ITEM_STYLE.clone());
        bar.set_message(message.to_string());
        bar.set_prefix(display_name);
        bar
    }

    /// Mark a file bar as completed and advance the batch bar
    pub fn complete_file(&self, bar: &ProgressBar) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }

        if self.is_batched() {
            bar.finish_and_clear();
            self.multi_progress.remove(bar);
        } else {
            bar.set_message("✓".to_string());
            bar.finish();
        }
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All files processed");
        }
        let _ = self.multi_progress.clear();
    }
}
