//! # Transform Stages Module
//!
//! Ogni stage applica una trasformazione a un singolo file `.js`.
//!
//! ## Stage disponibili:
//!
//! | Stage | Esecuzione | Output |
//! |-------|------------|--------|
//! | `Downlevel` | tool esterno (babel, preset `@babel/env`, compact) | riscrive il file |
//! | `Minify` | tool esterno (uglifyjs `--compress --mangle`) | riscrive il file |
//! | `CompressGzip` | tool esterno (ngzip su stdout) | `<file>.gz` |
//! | `CompressBrotli` | in-process (crate `brotli`) | `<file>.br` |
//!
//! ## Contratto:
//! - Gli stage esterni falliscono con `StageError::ExternalTool` su exit code
//!   diverso da zero e con `StageError::ToolUnavailable` se il tool non esiste
//! - Gli stage di compressione non modificano mai il file sorgente
//! - Brotli è deterministico: stessi byte in ingresso, stessi byte in uscita
//! - La compressione Brotli gira su `spawn_blocking` per non bloccare le
//!   pipeline degli altri file

use crate::args;
use crate::config::ToolSet;
use crate::error::StageError;
use crate::external_tool::ExternalTool;
use crate::utils::{display_name, sibling_artifact};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Brotli quality (0-11)
pub const BROTLI_QUALITY: u32 = 11;
/// Brotli window size, log2
pub const BROTLI_LG_WINDOW: u32 = 22;
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Everything a stage needs besides the file itself
#[derive(Clone)]
pub struct StageContext {
    pub tool: Arc<dyn ExternalTool>,
    pub tools: ToolSet,
    /// Working directory for external tools
    pub cwd: Option<PathBuf>,
}

impl StageContext {
    pub fn new(tool: Arc<dyn ExternalTool>, tools: ToolSet, cwd: Option<PathBuf>) -> Self {
        Self { tool, tools, cwd }
    }
}

/// One step of a file's transformation chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStage {
    Downlevel,
    Minify,
    CompressGzip,
    CompressBrotli,
}

impl fmt::Display for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TransformStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Downlevel => "downlevel",
            Self::Minify => "minify",
            Self::CompressGzip => "gzip",
            Self::CompressBrotli => "brotli",
        }
    }

    /// Sibling artifact written by the stage, if any
    pub fn artifact_path(&self, file: &Path) -> Option<PathBuf> {
        match self {
            Self::CompressGzip => Some(sibling_artifact(file, "gz")),
            Self::CompressBrotli => Some(sibling_artifact(file, "br")),
            Self::Downlevel | Self::Minify => None,
        }
    }

    /// Apply the stage to `file`
    pub async fn apply(&self, file: &Path, ctx: &StageContext) -> Result<(), StageError> {
        let name = display_name(file);
        match self {
            Self::Downlevel => {
                info!("Optimizing {} file...", name);
                let path = path_arg(file)?;
                let args = args![path, "--out-file", path, "--presets=@babel/env", "--compact=true", "--quiet"];
                run_external(ctx, &ctx.tools.downlevel, args).await?;
            }
            Self::Minify => {
                info!("Uglyfying {} file...", name);
                let path = path_arg(file)?;
                let args = args![path, "-o", path, "--compress", "--mangle"];
                run_external(ctx, &ctx.tools.minify, args).await?;
            }
            Self::CompressGzip => {
                info!("Gzipping {} file...", name);
                let args = args![path_arg(file)?];
                let output = run_external(ctx, &ctx.tools.gzip, args).await?;
                tokio::fs::write(sibling_artifact(file, "gz"), output).await?;
            }
            Self::CompressBrotli => {
                info!("Brotling {} file...", name);
                let bytes = tokio::fs::read(file).await?;
                let compressed = tokio::task::spawn_blocking(move || brotli_compress(&bytes))
                    .await
                    .map_err(|e| StageError::Codec(e.to_string()))??;
                tokio::fs::write(sibling_artifact(file, "br"), compressed).await?;
            }
        }
        Ok(())
    }
}

fn path_arg(file: &Path) -> Result<&str, StageError> {
    file.to_str().ok_or_else(|| {
        StageError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Path is not valid UTF-8: {:?}", file),
        ))
    })
}

/// Run `tool` (through the configured runner) and return its stdout
async fn run_external(ctx: &StageContext, tool: &str, args: Vec<String>) -> Result<Vec<u8>, StageError> {
    let (program, mut full_args) = ctx.tools.command(tool);
    full_args.extend(args);

    let output = ctx.tool.invoke(&program, &full_args, ctx.cwd.as_deref()).await?;
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(StageError::ExternalTool {
            tool: tool.to_string(),
            code: output.code,
            stderr: output.stderr_text(),
        })
    }
}

/// Deterministic Brotli encoding of `bytes`
pub fn brotli_compress(bytes: &[u8]) -> Result<Vec<u8>, StageError> {
    let mut writer = brotli::CompressorWriter::new(
        Vec::with_capacity(bytes.len() / 2 + 64),
        BROTLI_BUFFER_SIZE,
        BROTLI_QUALITY,
        BROTLI_LG_WINDOW,
    );
    writer
        .write_all(bytes)
        .and_then(|_| writer.flush())
        .map_err(|e| StageError::Codec(e.to_string()))?;
    Ok(writer.into_inner())
}
