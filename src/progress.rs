//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche della run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: progress bar `indicatif` su stderr (nascosta in modalità JSON)
//! - `OptimizationStats`: contatori cumulativi della run
//!
//! ## Statistiche tracciate:
//! - **files_processed**: file la cui pipeline ha raggiunto uno stato terminale
//! - **files_completed** / **files_failed**
//! - **artifacts_written**: file `.gz` / `.br` prodotti
//! - **total_original_size** / **total_final_size**: byte prima e dopo downlevel + minify
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:04] [========================================] 42/42 (100%) [OK] main.js
//! ```

use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for an optimization run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        ) {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Progress manager that draws nothing
    pub fn hidden(total_files: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total_files);
        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Files reported so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Statistics tracker for a run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OptimizationStats {
    pub files_processed: usize,
    pub files_completed: usize,
    pub files_failed: usize,
    pub artifacts_written: usize,
    pub total_original_size: u64,
    pub total_final_size: u64,
}

impl OptimizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_completed(&mut self, original_size: u64, final_size: u64, artifacts: usize) {
        self.files_processed += 1;
        self.files_completed += 1;
        self.artifacts_written += artifacts;
        self.total_original_size += original_size;
        self.total_final_size += final_size;
    }

    pub fn add_failed(&mut self) {
        self.files_processed += 1;
        self.files_failed += 1;
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.total_original_size, self.total_final_size)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Completed: {} | Failed: {} | Artifacts: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_completed,
            self.files_failed,
            self.artifacts_written,
            FileManager::format_size(self.total_original_size.saturating_sub(self.total_final_size)),
            self.overall_reduction_percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let mut stats = OptimizationStats::new();
        stats.add_completed(1000, 400, 2);
        stats.add_completed(1000, 600, 2);
        stats.add_failed();

        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_completed, 2);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.artifacts_written, 4);
        assert_eq!(stats.overall_reduction_percent(), 50.0);
        assert!(stats.format_summary().contains("Failed: 1"));
    }

    #[test]
    fn test_hidden_progress_counts() {
        let progress = ProgressManager::hidden(2);
        progress.update("[OK] a.js");
        progress.update("[OK] b.js");
        progress.finish("done");
        assert_eq!(progress.position(), 2);
    }
}
