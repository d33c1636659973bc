//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della pipeline.
//!
//! ## Responsabilità:
//! - `StageError`: errori di un singolo stage su un singolo file
//! - `OptimizeError`: errori a livello di run (classificazione, config, aggregato)
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `NotFound`: root o file di configurazione mancante (fatale, prima di ogni stage)
//! - `Permission`: sottoalbero non leggibile durante la traversal (fatale)
//! - `ExternalTool` / `ToolUnavailable`: tool esterno fallito o non trovato
//! - `Codec`: compressione in-process fallita
//! - `Aggregate`: almeno una pipeline per file è fallita
//! - `DeadlineExceeded`: la run ha superato `deadline_secs`
//!
//! ## Esempio:
//! ```rust,ignore
//! if !root.exists() {
//!     return Err(OptimizeError::NotFound(root.to_path_buf()));
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Failure of one transform stage on one file
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("{tool} exited with {}: {stderr}", display_code(.code))]
    ExternalTool {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Tool not found: {0}")]
    ToolUnavailable(String),

    #[error("Compression codec error: {0}")]
    Codec(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Run-level errors for the asset optimization pipeline
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Permission denied while reading {}: {source}", .path.display())]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("External tool error: {0}")]
    Tool(#[from] StageError),

    #[error(
        "Optimization failed for {} at stage {stage_index} ({failed_files} file(s) failed): {source}",
        .file.display()
    )]
    Aggregate {
        file: PathBuf,
        stage_index: usize,
        #[source]
        source: StageError,
        failed_files: usize,
    },

    #[error("Optimization did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Pipeline task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl OptimizeError {
    /// Map an I/O error raised while touching `path` onto the run taxonomy
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.into()),
            std::io::ErrorKind::PermissionDenied => Self::Permission {
                path: path.into(),
                source: err,
            },
            _ => Self::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_from_io_maps_kinds() {
        let err = OptimizeError::from_io("/nope", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, OptimizeError::NotFound(p) if p == PathBuf::from("/nope")));

        let err = OptimizeError::from_io("/locked", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, OptimizeError::Permission { .. }));

        let err = OptimizeError::from_io("/x", io::Error::from(io::ErrorKind::Interrupted));
        assert!(matches!(err, OptimizeError::Io(_)));
    }

    #[test]
    fn test_external_tool_message() {
        let err = StageError::ExternalTool {
            tool: "uglifyjs".to_string(),
            code: Some(2),
            stderr: "Unexpected token".to_string(),
        };
        assert_eq!(err.to_string(), "uglifyjs exited with exit code 2: Unexpected token");
    }
}
