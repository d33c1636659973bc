//! # Android Release Module
//!
//! Genera la build di release Android con il wrapper Gradle del progetto
//! nativo (`<project_root>/android`). È una pipeline indipendente
//! dall'ottimizzazione degli asset: una sola chiamata bloccante a
//! `gradlew assembleRelease` (`./gradlew` fuori da Windows).

use crate::error::{OptimizeError, StageError};
use crate::external_tool::ExternalTool;
use crate::platform::PlatformCommands;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Native project directory, relative to the project root
pub const ANDROID_DIR: &str = "android";
/// Gradle task producing the release package
pub const RELEASE_TASK: &str = "assembleRelease";

/// Runs the Gradle release build of the native Android project
pub struct AndroidBuilder {
    android_dir: PathBuf,
    tool: Arc<dyn ExternalTool>,
}

impl AndroidBuilder {
    pub fn new(project_root: &Path, tool: Arc<dyn ExternalTool>) -> Self {
        Self {
            android_dir: project_root.join(ANDROID_DIR),
            tool,
        }
    }

    pub fn android_dir(&self) -> &Path {
        &self.android_dir
    }

    /// Run `assembleRelease` in the native project directory
    pub async fn assemble_release(&self) -> Result<(), OptimizeError> {
        if !self.android_dir.is_dir() {
            return Err(OptimizeError::NotFound(self.android_dir.clone()));
        }

        info!("Generating android build...");
        let (program, args) = PlatformCommands::instance().gradle_invocation(RELEASE_TASK);
        let output = self.tool.invoke(&program, &args, Some(&self.android_dir)).await?;

        if !output.success() {
            return Err(StageError::ExternalTool {
                tool: program,
                code: output.code,
                stderr: output.stderr_text(),
            }
            .into());
        }

        info!("Android built successfully!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_tool::ToolOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records the single gradle call and answers with a fixed exit code
    struct RecordingTool {
        code: i32,
        seen: Mutex<Option<(String, Vec<String>, Option<PathBuf>)>>,
    }

    #[async_trait]
    impl ExternalTool for RecordingTool {
        async fn invoke(&self, program: &str, args: &[String], cwd: Option<&Path>) -> Result<ToolOutput, StageError> {
            *self.seen.lock().unwrap() = Some((program.to_string(), args.to_vec(), cwd.map(Path::to_path_buf)));
            Ok(ToolOutput {
                code: Some(self.code),
                stdout: Vec::new(),
                stderr: b"BUILD FAILED".to_vec(),
            })
        }
    }

    fn recording(code: i32) -> Arc<RecordingTool> {
        Arc::new(RecordingTool {
            code,
            seen: Mutex::new(None),
        })
    }

    #[tokio::test]
    async fn test_runs_gradle_in_android_dir() {
        let project = TempDir::new().unwrap();
        std::fs::create_dir(project.path().join("android")).unwrap();
        let tool = recording(0);

        AndroidBuilder::new(project.path(), tool.clone())
            .assemble_release()
            .await
            .unwrap();

        let (program, args, cwd) = tool.seen.lock().unwrap().clone().unwrap();
        assert!(program.contains("gradlew"));
        assert_eq!(args, vec!["assembleRelease".to_string()]);
        assert_eq!(cwd, Some(project.path().join("android")));
    }

    #[tokio::test]
    async fn test_gradle_failure_is_reported() {
        let project = TempDir::new().unwrap();
        std::fs::create_dir(project.path().join("android")).unwrap();

        let result = AndroidBuilder::new(project.path(), recording(1)).assemble_release().await;
        match result {
            Err(OptimizeError::Tool(StageError::ExternalTool { code, stderr, .. })) => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "BUILD FAILED");
            }
            other => panic!("expected ExternalTool, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_android_project() {
        let project = TempDir::new().unwrap();
        let tool = recording(0);

        let result = AndroidBuilder::new(project.path(), tool.clone()).assemble_release().await;
        assert!(matches!(result, Err(OptimizeError::NotFound(p)) if p == project.path().join("android")));
        assert!(tool.seen.lock().unwrap().is_none());
    }
}
