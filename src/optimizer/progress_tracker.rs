//! # Progress Tracking Module
//!
//! Tracker thread-safe condiviso da tutte le pipeline di una run.
//! Gestisce sia output JSON che progress bar tradizionale.

use crate::{
    config::Config,
    json_output::JsonMessage,
    optimizer::FileReport,
    pipeline::PipelineResult,
    progress::{OptimizationStats, ProgressManager},
    utils::display_name,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tracker progress unificato per tutte le pipeline della run
#[derive(Clone)]
pub struct ProgressTracker {
    pub total_files: usize,
    json_output: bool,
    stats: Arc<Mutex<OptimizationStats>>,
    progress_manager: ProgressManager,
}

impl ProgressTracker {
    /// Crea un nuovo tracker
    pub fn new(total_files: usize, config: &Config) -> Self {
        let progress_manager = if config.show_progress && !config.json_output {
            ProgressManager::new(total_files as u64)
        } else {
            ProgressManager::hidden(total_files as u64)
        };

        Self {
            total_files,
            json_output: config.json_output,
            stats: Arc::new(Mutex::new(OptimizationStats::new())),
            progress_manager,
        }
    }

    /// Registra la fine della pipeline di un file
    pub async fn handle_file_completion(&self, report: &FileReport) {
        {
            let mut stats = self.stats.lock().await;
            match report.result {
                PipelineResult::Completed => {
                    stats.add_completed(report.original_size, report.final_size, report.artifacts.len())
                }
                PipelineResult::Failed { .. } => stats.add_failed(),
            }
        }

        if self.json_output {
            JsonMessage::file_complete(report).emit();
        }

        let name = display_name(report.file.path());
        let message = match report.result {
            PipelineResult::Completed => format!("[OK] {}", name),
            PipelineResult::Failed { stage, .. } => format!("[ERROR] {}: {} failed", name, stage),
        };
        self.progress_manager.update(&message);
    }

    /// Finalizza progress bar
    pub fn finish(&self, summary: &str) {
        self.progress_manager.finish(summary);
    }

    /// Ottieni statistiche per report finale
    pub async fn get_stats(&self) -> OptimizationStats {
        self.stats.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageError;
    use crate::file_manager::CandidateFile;
    use crate::stages::TransformStage;

    #[tokio::test]
    async fn test_tracker_counts_outcomes_from_many_tasks() {
        let config = Config {
            show_progress: false,
            ..Default::default()
        };
        let tracker = ProgressTracker::new(3, &config);

        let mut handles = Vec::new();
        for (name, ok) in [("a.js", true), ("b.js", false), ("c.js", true)] {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                let result = if ok {
                    PipelineResult::Completed
                } else {
                    PipelineResult::Failed {
                        stage_index: 0,
                        stage: TransformStage::Downlevel,
                        error: StageError::ToolUnavailable("babel".to_string()),
                    }
                };
                let report = FileReport {
                    file: CandidateFile::new(name),
                    original_size: 100,
                    final_size: if ok { 40 } else { 100 },
                    artifacts: Vec::new(),
                    result,
                };
                tracker.handle_file_completion(&report).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = tracker.get_stats().await;
        assert_eq!(stats.files_processed, 3);
        assert_eq!(stats.files_completed, 2);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.total_original_size, 200);
        assert_eq!(stats.total_final_size, 80);
    }
}
