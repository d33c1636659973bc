//! # External Tool Capability
//!
//! Gli stage di downlevel, minify e gzip delegano a tool esterni (babel,
//! uglifyjs, ngzip). Questo modulo astrae il lancio del processo dietro il
//! trait `ExternalTool` così che i test possano sostituire un tool finto con
//! exit code controllati, senza spawnare processi reali.
//!
//! ## Implementazioni:
//! - `SystemTool`: risolve il binario con `ToolPathResolver` e lo lancia con
//!   `tokio::process::Command` (`kill_on_drop`, così una pipeline abortita
//!   termina anche il suo sottoprocesso)

use crate::error::StageError;
use crate::tool_resolver::ToolPathResolver;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured result of one external process run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stderr as trimmed text, for error messages
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Capability to run an external program to completion.
///
/// A non-zero exit is reported through [`ToolOutput::code`], not as an error;
/// `Err` means the program could not be located or spawned at all.
#[async_trait]
pub trait ExternalTool: Send + Sync {
    async fn invoke(&self, program: &str, args: &[String], cwd: Option<&Path>) -> Result<ToolOutput, StageError>;
}

/// Runs real processes on the host
#[derive(Debug, Clone, Default)]
pub struct SystemTool {
    search_path: Option<String>,
}

impl SystemTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `search_path` instead of the process `PATH` when resolving programs
    pub fn with_search_path(search_path: impl Into<String>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

#[async_trait]
impl ExternalTool for SystemTool {
    async fn invoke(&self, program: &str, args: &[String], cwd: Option<&Path>) -> Result<ToolOutput, StageError> {
        let mut resolver = ToolPathResolver::new(cwd);
        if let Some(ref search_path) = self.search_path {
            resolver = resolver.with_search_path(search_path.clone());
        }

        let program_path = resolver
            .resolve_tool(program)
            .ok_or_else(|| StageError::ToolUnavailable(program.to_string()))?;

        let mut command = Command::new(&program_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        debug!("Running {:?} {}", program_path, args.join(" "));
        let start_time = Instant::now();
        let output = command.output().await?;
        let elapsed = start_time.elapsed();

        let output = ToolOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        };

        if output.success() {
            debug!("{} completed successfully in {:?}", program, elapsed);
        } else {
            warn!("{} failed after {:?} ({:?})", program, elapsed, output.code);
        }

        Ok(output)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scriptable stand-in for the JavaScript toolchain.
    //!
    //! Recognises the default `ToolSet` commands and mimics them on disk:
    //! `babel` prefixes the file with `dl:`, `uglifyjs` with `min:`, `ngzip`
    //! prints `gz:` + content on stdout.

    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Invocation {
        pub tool: String,
        pub args: Vec<String>,
    }

    #[derive(Default)]
    pub struct FakeTool {
        calls: Mutex<Vec<Invocation>>,
        failures: Vec<(String, String, i32)>,
        missing: Vec<String>,
        delay: Option<Duration>,
    }

    impl FakeTool {
        pub fn new() -> Self {
            Self::default()
        }

        /// Exit with `code` when `tool` runs on a file whose name is `file_name`
        pub fn fail_on(mut self, tool: &str, file_name: &str, code: i32) -> Self {
            self.failures.push((tool.to_string(), file_name.to_string(), code));
            self
        }

        /// Report `tool` as not installed
        pub fn without(mut self, tool: &str) -> Self {
            self.missing.push(tool.to_string());
            self
        }

        /// Sleep before every invocation
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }

        pub fn calls_for(&self, tool: &str) -> usize {
            self.calls().iter().filter(|c| c.tool == tool).count()
        }

        fn file_name(path: &str) -> String {
            Path::new(path).file_name().unwrap().to_string_lossy().into_owned()
        }

        fn rewrite(input: &str, output: &str, prefix: &str) -> ToolOutput {
            let content = std::fs::read(input).unwrap();
            let mut rewritten = prefix.as_bytes().to_vec();
            rewritten.extend_from_slice(&content);
            std::fs::write(output, rewritten).unwrap();
            ToolOutput { code: Some(0), ..Default::default() }
        }
    }

    #[async_trait]
    impl ExternalTool for FakeTool {
        async fn invoke(&self, program: &str, args: &[String], _cwd: Option<&Path>) -> Result<ToolOutput, StageError> {
            let (tool, args) = if program == "npx" {
                (args[0].clone(), args[1..].to_vec())
            } else {
                (program.to_string(), args.to_vec())
            };

            self.calls.lock().unwrap().push(Invocation {
                tool: tool.clone(),
                args: args.clone(),
            });

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.missing.contains(&tool) {
                return Err(StageError::ToolUnavailable(tool));
            }

            let target = args.first().map(|a| Self::file_name(a)).unwrap_or_default();
            if let Some((_, _, code)) = self.failures.iter().find(|(t, f, _)| *t == tool && *f == target) {
                return Ok(ToolOutput {
                    code: Some(*code),
                    stdout: Vec::new(),
                    stderr: format!("{} failed on {}", tool, target).into_bytes(),
                });
            }

            Ok(match tool.as_str() {
                "babel" => Self::rewrite(&args[0], &args[2], "dl:"),
                "uglifyjs" => Self::rewrite(&args[0], &args[2], "min:"),
                "ngzip" => {
                    let mut stdout = b"gz:".to_vec();
                    stdout.extend_from_slice(&std::fs::read(&args[0]).unwrap());
                    ToolOutput { code: Some(0), stdout, stderr: Vec::new() }
                }
                _ => ToolOutput { code: Some(0), ..Default::default() },
            })
        }
    }
}
