//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione della pipeline.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri della run
//! - Legge `CAPACITOR_PROJECT_ROOT` e `CAPBOX_PLATFORM` dall'ambiente
//! - Legge `webDir` da `capacitor.config.json` nella root del progetto
//! - Fornisce valori di default sensati e validazione
//!
//! ## Parametri di configurazione:
//! - `project_root`: root del progetto Capacitor
//! - `web_dir`: override della directory di build (default: `webDir` del progetto)
//! - `target_platform`: solo `pwa` aggiunge gli stage di compressione
//! - `blacklist`: nomi file esclusi (default: `polyfills.js`, `sw-toolbox.js`)
//! - `workers`: pipeline concorrenti (default: numero di CPU)
//! - `deadline_secs`: deadline opzionale per l'intera run
//! - `tools`: comandi esterni per downlevel, minify e gzip
//!
//! ## Esempio:
//! ```rust
//! use capbox_optimizer::Config;
//!
//! let config = Config {
//!     target_platform: "pwa".to_string(),
//!     workers: 8,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::OptimizeError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Environment variable holding the project root
pub const PROJECT_ROOT_ENV: &str = "CAPACITOR_PROJECT_ROOT";
/// Environment variable holding the target platform
pub const PLATFORM_ENV: &str = "CAPBOX_PLATFORM";
/// Project configuration document, relative to the project root
pub const PROJECT_CONFIG_FILE: &str = "capacitor.config.json";
/// The only platform that gets `.gz` / `.br` artifacts
pub const PWA_PLATFORM: &str = "pwa";
/// Upper bound on concurrent pipelines (`Semaphore::MAX_PERMITS`)
pub const MAX_WORKERS: usize = tokio::sync::Semaphore::MAX_PERMITS;
/// File names never optimized, wherever they live
pub const DEFAULT_BLACKLIST: [&str; 2] = ["polyfills.js", "sw-toolbox.js"];

/// External commands used by the shelled-out stages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSet {
    /// Package runner prefixed to every tool (`npx`); `None` runs tools directly
    pub runner: Option<String>,
    /// Syntax down-conversion tool
    pub downlevel: String,
    /// Minifier
    pub minify: String,
    /// Gzip-compatible compressor writing to stdout
    pub gzip: String,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self {
            runner: Some("npx".to_string()),
            downlevel: "babel".to_string(),
            minify: "uglifyjs".to_string(),
            gzip: "ngzip".to_string(),
        }
    }
}

impl ToolSet {
    /// Split a tool invocation into (program, leading arguments)
    pub fn command(&self, tool: &str) -> (String, Vec<String>) {
        match self.runner {
            Some(ref runner) => (runner.clone(), vec![tool.to_string()]),
            None => (tool.to_string(), Vec::new()),
        }
    }
}

/// Subset of `capacitor.config.json` the pipeline needs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub web_dir: PathBuf,
}

impl ProjectConfig {
    /// Load the project configuration document from `project_root`
    pub async fn load(project_root: &Path) -> Result<Self, OptimizeError> {
        let path = project_root.join(PROJECT_CONFIG_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| OptimizeError::from_io(&path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| OptimizeError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Configuration for one optimization run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the Capacitor project
    pub project_root: PathBuf,
    /// Build output directory; `None` means read `webDir` from the project config
    pub web_dir: Option<PathBuf>,
    /// Target platform identifier (`pwa`, `android`, ...)
    pub target_platform: String,
    /// File names excluded from optimization
    pub blacklist: BTreeSet<String>,
    /// Maximum number of file pipelines running at once
    pub workers: usize,
    /// Optional deadline for the whole run, in seconds
    pub deadline_secs: Option<u64>,
    /// External tool commands
    pub tools: ToolSet,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            web_dir: None,
            target_platform: String::new(),
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            workers: default_workers(),
            deadline_secs: None,
            tools: ToolSet::default(),
            json_output: false,
            show_progress: true,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Config {
    /// Defaults overlaid with `CAPACITOR_PROJECT_ROOT` and `CAPBOX_PLATFORM`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = std::env::var(PROJECT_ROOT_ENV) {
            config.project_root = PathBuf::from(root);
        }
        if let Ok(platform) = std::env::var(PLATFORM_ENV) {
            config.target_platform = platform;
        }
        config
    }

    /// Whether the compression stages are appended to every pipeline
    pub fn compress(&self) -> bool {
        self.target_platform == PWA_PLATFORM
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.workers > MAX_WORKERS {
            return Err(anyhow::anyhow!("Number of workers must not exceed {}", MAX_WORKERS));
        }

        if self.deadline_secs == Some(0) {
            return Err(anyhow::anyhow!("Deadline must be at least one second"));
        }

        if self.tools.downlevel.is_empty() || self.tools.minify.is_empty() || self.tools.gzip.is_empty() {
            return Err(anyhow::anyhow!("Tool commands must not be empty"));
        }

        if self.blacklist.iter().any(|name| name.contains('/') || name.contains('\\')) {
            return Err(anyhow::anyhow!("Blacklist entries must be file names, not paths"));
        }

        Ok(())
    }

    /// Resolve the directory to optimize: `project_root` joined with the web dir.
    ///
    /// The result is absolute, so tools launched from another working
    /// directory still find the files.
    pub async fn build_dir(&self) -> Result<PathBuf, OptimizeError> {
        if !self.project_root.exists() {
            return Err(OptimizeError::NotFound(self.project_root.clone()));
        }
        let project_root = std::path::absolute(&self.project_root)
            .map_err(|e| OptimizeError::from_io(&self.project_root, e))?;

        let web_dir = match self.web_dir {
            Some(ref dir) => dir.clone(),
            None => ProjectConfig::load(&project_root).await?.web_dir,
        };

        Ok(project_root.join(web_dir))
    }

    /// Load configuration from file; a missing file is an error
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(OptimizeError::NotFound(path.to_path_buf()).into());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.blacklist.contains("polyfills.js"));
        assert!(config.blacklist.contains("sw-toolbox.js"));
        assert_eq!(config.blacklist.len(), 2);
        assert!(config.workers > 0);
        assert!(config.deadline_secs.is_none());
        assert!(!config.compress());
        assert_eq!(config.tools.runner.as_deref(), Some("npx"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 2;
        config.deadline_secs = Some(0);
        assert!(config.validate().is_err());

        config.deadline_secs = Some(30);
        config.workers = MAX_WORKERS;
        assert!(config.validate().is_ok());
        config.workers = MAX_WORKERS + 1;
        assert!(config.validate().is_err());

        config.workers = 2;
        config.blacklist.insert("vendor/polyfills.js".to_string());
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_from_file_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("typo.json");

        let err = Config::from_file(&missing).await.unwrap_err();
        match err.downcast_ref::<OptimizeError>() {
            Some(OptimizeError::NotFound(path)) => assert_eq!(path, &missing),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_build_dir_is_absolute_for_relative_root() {
        let config = Config {
            project_root: PathBuf::from("."),
            web_dir: Some(PathBuf::from("www")),
            ..Default::default()
        };

        let build_dir = config.build_dir().await.unwrap();
        assert!(build_dir.is_absolute());
        assert!(build_dir.ends_with("www"));
    }

    #[test]
    fn test_compress_is_literal_pwa() {
        let mut config = Config::default();
        for platform in ["android", "ios", "PWA", "pwa ", ""] {
            config.target_platform = platform.to_string();
            assert!(!config.compress(), "{:?} must not compress", platform);
        }
        config.target_platform = "pwa".to_string();
        assert!(config.compress());
    }

    #[test]
    fn test_tool_command_with_and_without_runner() {
        let tools = ToolSet::default();
        assert_eq!(tools.command("uglifyjs"), ("npx".to_string(), vec!["uglifyjs".to_string()]));

        let direct = ToolSet { runner: None, ..ToolSet::default() };
        assert_eq!(direct.command("gzip"), ("gzip".to_string(), Vec::<String>::new()));
    }

    #[tokio::test]
    async fn test_build_dir_reads_web_dir() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILE),
            r#"{ "appId": "io.example.app", "appName": "example", "webDir": "www" }"#,
        )
        .await
        .unwrap();

        let config = Config {
            project_root: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        assert_eq!(config.build_dir().await.unwrap(), temp_dir.path().join("www"));

        let overridden = Config {
            web_dir: Some(PathBuf::from("dist")),
            ..config
        };
        assert_eq!(overridden.build_dir().await.unwrap(), temp_dir.path().join("dist"));
    }

    #[tokio::test]
    async fn test_build_dir_missing_project_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            project_root: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        match config.build_dir().await {
            Err(OptimizeError::NotFound(path)) => {
                assert_eq!(path, temp_dir.path().join(PROJECT_CONFIG_FILE));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_build_dir_missing_root() {
        let config = Config {
            project_root: PathBuf::from("/definitely/not/a/project"),
            ..Default::default()
        };
        assert!(matches!(config.build_dir().await, Err(OptimizeError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("capbox.json");

        let original_config = Config {
            target_platform: "pwa".to_string(),
            workers: 3,
            deadline_secs: Some(120),
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.target_platform, "pwa");
        assert_eq!(loaded_config.workers, 3);
        assert_eq!(loaded_config.deadline_secs, Some(120));
        assert_eq!(loaded_config.tools, ToolSet::default());
        assert_eq!(loaded_config.blacklist, original_config.blacklist);
    }
}
