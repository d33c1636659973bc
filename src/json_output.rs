//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per il processo padre
//! (CLI di packaging, script di CI) che mappa il risultato su un exit code.
//!
//! ## Tipi di messaggi:
//! - `start`: inizio run (directory, piattaforma, stage, numero file)
//! - `file_complete`: fine pipeline di un file (ok o fallita, con stage)
//! - `complete`: fine run con statistiche finali
//! - `error`: errore che termina la run

use crate::optimizer::FileReport;
use crate::pipeline::PipelineResult;
use crate::progress::OptimizationStats;
use crate::stages::TransformStage;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Inizio della run
    Start {
        build_dir: PathBuf,
        target_platform: String,
        stages: Vec<TransformStage>,
        total_files: usize,
        workers: usize,
    },

    /// Fine della pipeline di un file
    FileComplete {
        path: PathBuf,
        completed: bool,
        failed_stage: Option<TransformStage>,
        stage_index: Option<usize>,
        original_size: u64,
        final_size: u64,
        artifacts: Vec<PathBuf>,
        error: Option<String>,
    },

    /// Run completata (anche con file falliti)
    Complete {
        files_processed: usize,
        files_completed: usize,
        files_failed: usize,
        artifacts_written: usize,
        total_original_size: u64,
        total_final_size: u64,
        reduction_percent: f64,
        duration_seconds: f64,
    },

    /// Errore che termina la run
    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(
        build_dir: PathBuf,
        target_platform: String,
        stages: Vec<TransformStage>,
        total_files: usize,
        workers: usize,
    ) -> Self {
        Self::Start {
            build_dir,
            target_platform,
            stages,
            total_files,
            workers,
        }
    }

    pub fn file_complete(report: &FileReport) -> Self {
        let (failed_stage, stage_index, error) = match report.result {
            PipelineResult::Completed => (None, None, None),
            PipelineResult::Failed {
                stage_index,
                stage,
                ref error,
            } => (Some(stage), Some(stage_index), Some(error.to_string())),
        };

        Self::FileComplete {
            path: report.file.path().to_path_buf(),
            completed: report.result.is_completed(),
            failed_stage,
            stage_index,
            original_size: report.original_size,
            final_size: report.final_size,
            artifacts: report.artifacts.clone(),
            error,
        }
    }

    pub fn complete(stats: &OptimizationStats, duration_seconds: f64) -> Self {
        Self::Complete {
            files_processed: stats.files_processed,
            files_completed: stats.files_completed,
            files_failed: stats.files_failed,
            artifacts_written: stats.artifacts_written,
            total_original_size: stats.total_original_size,
            total_final_size: stats.total_final_size,
            reduction_percent: stats.overall_reduction_percent(),
            duration_seconds,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}
