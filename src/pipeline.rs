//! # File Pipeline Module
//!
//! Compone la sequenza ordinata di stage per un singolo file e la esegue.
//!
//! ## Regole:
//! - Gli stage girano strettamente in ordine, ognuno vede il file già
//!   trasformato dal precedente
//! - Il primo stage che fallisce interrompe la pipeline di quel file; il file
//!   resta nello stato parziale lasciato dallo stage fallito (nessun rollback)
//! - Lista stage: sempre `[Downlevel, Minify]`, con `[CompressGzip, CompressBrotli]`
//!   in coda solo se `Config::compress()` (piattaforma esattamente `pwa`)
//! - Una pipeline senza stage è un no-op che ritorna `Completed`

use crate::error::StageError;
use crate::file_manager::CandidateFile;
use crate::stages::{StageContext, TransformStage};
use tracing::{debug, error};

/// Outcome of one file's pipeline
#[derive(Debug)]
pub enum PipelineResult {
    Completed,
    /// `stage_index` is the position of the first stage that failed
    Failed {
        stage_index: usize,
        stage: TransformStage,
        error: StageError,
    },
}

impl PipelineResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Ordered stage list applied to one file at a time
#[derive(Clone)]
pub struct FilePipeline {
    stages: Vec<TransformStage>,
    context: StageContext,
}

impl FilePipeline {
    pub fn new(stages: Vec<TransformStage>, context: StageContext) -> Self {
        Self { stages, context }
    }

    /// Stage list, with the compression stages appended when `compress` is set
    pub fn stages_for(compress: bool) -> Vec<TransformStage> {
        let mut stages = vec![TransformStage::Downlevel, TransformStage::Minify];
        if compress {
            stages.extend([TransformStage::CompressGzip, TransformStage::CompressBrotli]);
        }
        stages
    }

    pub fn stages(&self) -> &[TransformStage] {
        &self.stages
    }

    /// Run every stage on `file`, stopping at the first failure
    pub async fn run(&self, file: &CandidateFile) -> PipelineResult {
        for (stage_index, stage) in self.stages.iter().enumerate() {
            debug!("[{}/{}] {} -> {}", stage_index + 1, self.stages.len(), stage, file);

            if let Err(error) = stage.apply(file.path(), &self.context).await {
                error!("Stage {} ({}) failed for {}: {}", stage_index, stage, file, error);
                return PipelineResult::Failed {
                    stage_index,
                    stage: *stage,
                    error,
                };
            }
        }

        PipelineResult::Completed
    }
}
