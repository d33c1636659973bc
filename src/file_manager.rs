//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file da ottimizzare.
//!
//! ## Responsabilità:
//! - Traversal ricorsiva della directory di build (snapshot unico per run)
//! - Classificazione: solo file `.js` non presenti in blacklist
//! - Utilità per dimensioni file e percentuali
//!
//! ## Regole di classificazione:
//! - L'estensione è ciò che segue l'ultimo `.` del nome file e deve essere esattamente `js`
//! - Un file senza `.` non è mai candidato
//! - La blacklist contiene nomi file (non path) e vale in qualunque sottodirectory
//! - I symlink non vengono seguiti (niente cicli)
//!
//! ## Errori:
//! - Root inesistente: `OptimizeError::NotFound`
//! - Sottoalbero non leggibile: `OptimizeError::Permission`, la classificazione viene abortita
//!
//! ## Esempio:
//! ```rust,no_run
//! use capbox_optimizer::file_manager::FileManager;
//! use std::collections::BTreeSet;
//! use std::path::Path;
//!
//! let blacklist: BTreeSet<String> = ["polyfills.js".to_string()].into();
//! let files = FileManager::find_candidate_files(Path::new("www"), &blacklist)?;
//! # Ok::<(), capbox_optimizer::OptimizeError>(())
//! ```

use crate::error::OptimizeError;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Extension (after the last `.`) a file needs to be optimized
pub const CANDIDATE_EXTENSION: &str = "js";

/// A file selected for the optimization pipeline, identified by its path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateFile(PathBuf);

impl CandidateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for CandidateFile {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CandidateFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Manages file discovery and size bookkeeping
pub struct FileManager;

impl FileManager {
    /// Find every candidate file under `root`, sorted by path.
    ///
    /// The whole tree is walked before returning, so artifacts written by
    /// later stages are never picked up as new candidates.
    pub fn find_candidate_files(
        root: &Path,
        blacklist: &BTreeSet<String>,
    ) -> Result<Vec<CandidateFile>, OptimizeError> {
        if !root.exists() {
            return Err(OptimizeError::NotFound(root.to_path_buf()));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                match e.into_io_error() {
                    Some(io) => OptimizeError::from_io(path, io),
                    None => OptimizeError::Config(format!("Traversal failed at {}", path.display())),
                }
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            if Self::is_candidate(entry.path(), blacklist) {
                files.push(CandidateFile::new(entry.into_path()));
            }
        }

        files.sort();
        Ok(files)
    }

    /// Check whether a single path qualifies for optimization
    pub fn is_candidate(path: &Path, blacklist: &BTreeSet<String>) -> bool {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };

        match file_name.rsplit_once('.') {
            Some((_, ext)) => ext == CANDIDATE_EXTENSION && !blacklist.contains(file_name),
            None => false,
        }
    }

    /// Current on-disk size of a file
    pub async fn file_size(path: &Path) -> std::io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
