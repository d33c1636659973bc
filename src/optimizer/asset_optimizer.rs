//! # Asset Optimizer Main Orchestrator
//!
//! Orchestratore principale: classifica i file una sola volta, lancia una
//! `FilePipeline` per ogni candidato e aspetta che tutte raggiungano uno
//! stato terminale.
//!
//! ## Flusso di esecuzione:
//! 1. **Validazione**: config verificata in `AssetOptimizer::new`
//! 2. **Discovery**: snapshot unico dei candidati (`FileManager`)
//! 3. **Fan-out**: un task tokio per file, tutti lanciati subito
//! 4. **Concorrenza**: un `Semaphore` da `workers` permessi limita le
//!    pipeline attive (processi esterni e file descriptor)
//! 5. **Join**: `join_all` aspetta ogni task; un fallimento non cancella gli altri
//! 6. **Aggregazione**: `Succeeded` solo se ogni file è `Completed`
//!
//! ## Deadline:
//! Con `deadline_secs` impostato, allo scadere tutti i task ancora attivi
//! vengono abortiti; i processi figli sono lanciati con `kill_on_drop` e
//! quindi terminano insieme al task.
//!
//! ## Esempio:
//! ```rust,no_run
//! # async fn demo() -> Result<(), capbox_optimizer::OptimizeError> {
//! use capbox_optimizer::{AssetOptimizer, Config};
//!
//! let optimizer = AssetOptimizer::new(Config::from_env())?;
//! let report = optimizer.run().await?.into_result()?;
//! println!("{} files optimized", report.files.len());
//! # Ok(())
//! # }
//! ```

use crate::{
    config::Config,
    error::OptimizeError,
    external_tool::{ExternalTool, SystemTool},
    file_manager::{CandidateFile, FileManager},
    json_output::JsonMessage,
    optimizer::progress_tracker::ProgressTracker,
    pipeline::{FilePipeline, PipelineResult},
    stages::{StageContext, TransformStage},
};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Per-file record of one run
#[derive(Debug)]
pub struct FileReport {
    pub file: CandidateFile,
    /// Size before the first stage
    pub original_size: u64,
    /// Size after the last stage that ran
    pub final_size: u64,
    /// Sibling artifacts written for this file
    pub artifacts: Vec<PathBuf>,
    pub result: PipelineResult,
}

/// Every file's outcome, in candidate (path) order
#[derive(Debug, Default)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub duration: Duration,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.result.is_completed())
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }
}

/// Run-level result
#[derive(Debug)]
pub enum AggregateOutcome {
    /// Every candidate file completed its pipeline
    Succeeded(RunReport),
    /// At least one file failed; every other file still reached a terminal state
    Failed(RunReport),
}

impl AggregateOutcome {
    fn from_report(report: RunReport) -> Self {
        if report.failed_count() == 0 {
            Self::Succeeded(report)
        } else {
            Self::Failed(report)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn report(&self) -> &RunReport {
        match self {
            Self::Succeeded(report) | Self::Failed(report) => report,
        }
    }

    /// First failed file in candidate order
    pub fn first_failure(&self) -> Option<&FileReport> {
        self.report().failed().next()
    }

    /// Any failure becomes `OptimizeError::Aggregate` carrying the first failed file
    pub fn into_result(self) -> Result<RunReport, OptimizeError> {
        let mut report = match self {
            Self::Succeeded(report) => return Ok(report),
            Self::Failed(report) => report,
        };

        let failed_files = report.failed_count();
        let position = report
            .files
            .iter()
            .position(|f| !f.result.is_completed())
            .ok_or_else(|| OptimizeError::Config("failed run without a failed file".to_string()))?;

        let first = report.files.swap_remove(position);
        match first.result {
            PipelineResult::Failed { stage_index, error, .. } => Err(OptimizeError::Aggregate {
                file: first.file.into_path(),
                stage_index,
                source: error,
                failed_files,
            }),
            PipelineResult::Completed => Err(OptimizeError::Config("failed run without a failed file".to_string())),
        }
    }
}

/// Orchestratore principale
pub struct AssetOptimizer {
    config: Config,
    tool: Arc<dyn ExternalTool>,
}

impl AssetOptimizer {
    /// Orchestrator running real external tools
    pub fn new(config: Config) -> Result<Self, OptimizeError> {
        Self::with_tool(config, Arc::new(SystemTool::new()))
    }

    /// Orchestrator with a custom external tool implementation
    pub fn with_tool(config: Config, tool: Arc<dyn ExternalTool>) -> Result<Self, OptimizeError> {
        config
            .validate()
            .map_err(|e| OptimizeError::Config(e.to_string()))?;
        Ok(Self { config, tool })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Optimize the project's build directory (`project_root` + `webDir`)
    pub async fn run(&self) -> Result<AggregateOutcome, OptimizeError> {
        let build_dir = self.config.build_dir().await?;
        self.run_in(&build_dir).await
    }

    /// Optimize every candidate file under `root`
    pub async fn run_in(&self, root: &Path) -> Result<AggregateOutcome, OptimizeError> {
        let start_time = Instant::now();
        let absolute_root = std::path::absolute(root).map_err(|e| OptimizeError::from_io(root, e))?;
        let root = absolute_root.as_path();

        let files = {
            let root = root.to_path_buf();
            let blacklist = self.config.blacklist.clone();
            tokio::task::spawn_blocking(move || FileManager::find_candidate_files(&root, &blacklist)).await??
        };

        let stages = FilePipeline::stages_for(self.config.compress());
        self.emit_start_message(root, &stages, files.len());

        let tracker = ProgressTracker::new(files.len(), &self.config);
        let files = self.process_files_concurrently(files, stages, tracker.clone()).await?;

        let report = RunReport {
            files,
            duration: start_time.elapsed(),
        };

        let stats = tracker.get_stats().await;
        tracker.finish(&stats.format_summary());
        if self.config.json_output {
            JsonMessage::complete(&stats, report.duration.as_secs_f64()).emit();
        } else {
            info!("=== Optimization Complete ===");
            info!("{}", stats.format_summary());
            info!("Duration: {:.2}s", report.duration.as_secs_f64());
        }

        let outcome = AggregateOutcome::from_report(report);
        if !outcome.is_success() {
            let report = outcome.report();
            error!("{} of {} files failed:", report.failed_count(), report.files.len());
            for failed in report.failed() {
                if let PipelineResult::Failed { stage, ref error, .. } = failed.result {
                    error!("  • {} ({}): {}", failed.file, stage, error);
                }
            }
        }

        Ok(outcome)
    }

    fn emit_start_message(&self, root: &Path, stages: &[TransformStage], total_files: usize) {
        if self.config.json_output {
            JsonMessage::start(
                root.to_path_buf(),
                self.config.target_platform.clone(),
                stages.to_vec(),
                total_files,
                self.config.workers,
            )
            .emit();
            return;
        }

        info!("Starting asset optimization in: {}", root.display());
        let names: Vec<&str> = stages.iter().map(|s| s.name()).collect();
        info!("Platform: {:?} | Stages: {}", self.config.target_platform, names.join(" → "));
        info!("Found {} JS files to process ({} workers)", total_files, self.config.workers);
    }

    fn stage_context(&self) -> StageContext {
        let cwd = std::path::absolute(&self.config.project_root)
            .ok()
            .filter(|root| root.is_dir());
        StageContext::new(self.tool.clone(), self.config.tools.clone(), cwd)
    }

    /// Fan out one pipeline per file and wait for all of them
    async fn process_files_concurrently(
        &self,
        files: Vec<CandidateFile>,
        stages: Vec<TransformStage>,
        tracker: ProgressTracker,
    ) -> Result<Vec<FileReport>, OptimizeError> {
        let pipeline = Arc::new(FilePipeline::new(stages, self.stage_context()));
        let semaphore = Arc::new(Semaphore::new(self.config.workers));

        let mut tasks = Vec::with_capacity(files.len());
        let mut abort_handles = Vec::with_capacity(files.len());

        for file in files {
            let pipeline = pipeline.clone();
            let semaphore = semaphore.clone();
            let tracker = tracker.clone();

            let task = tokio::spawn(async move {
                // Released when the task finishes
                let _permit = semaphore.acquire_owned().await.ok();
                let report = Self::process_single_file(&pipeline, file).await;
                tracker.handle_file_completion(&report).await;
                report
            });

            abort_handles.push(task.abort_handle());
            tasks.push(task);
        }

        let joined = match self.config.deadline_secs.map(Duration::from_secs) {
            Some(deadline) => match tokio::time::timeout(deadline, join_all(tasks)).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Deadline of {:?} reached, cancelling running pipelines", deadline);
                    for handle in &abort_handles {
                        handle.abort();
                    }
                    return Err(OptimizeError::DeadlineExceeded(deadline));
                }
            },
            None => join_all(tasks).await,
        };

        joined
            .into_iter()
            .map(|result| result.map_err(OptimizeError::from))
            .collect()
    }

    /// Run the pipeline for one file and record sizes and artifacts
    async fn process_single_file(pipeline: &FilePipeline, file: CandidateFile) -> FileReport {
        let original_size = FileManager::file_size(file.path()).await.unwrap_or(0);
        let result = pipeline.run(&file).await;
        let final_size = FileManager::file_size(file.path()).await.unwrap_or(original_size);

        let stages_run = match result {
            PipelineResult::Completed => pipeline.stages().len(),
            PipelineResult::Failed { stage_index, .. } => stage_index,
        };
        let artifacts = pipeline.stages()[..stages_run]
            .iter()
            .filter_map(|stage| stage.artifact_path(file.path()))
            .collect();

        debug!("{} finished: {:?}", file, result);
        FileReport {
            file,
            original_size,
            final_size,
            artifacts,
            result,
        }
    }
}
