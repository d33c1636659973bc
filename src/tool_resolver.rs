//! # Tool Path Resolver
//!
//! This module finds the executables the pipeline shells out to:
//! - Explicit paths (`./gradlew`) relative to the working directory
//! - The working directory itself (wrapper scripts on Windows)
//! - `node_modules/.bin` of the project and its parents
//! - System-installed tools on `PATH`

use crate::platform::PlatformCommands;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How many parent directories are searched for `node_modules/.bin`
const MAX_ANCESTORS: usize = 10;

/// Tool path resolver for project-local and system tools
#[derive(Debug, Clone, Default)]
pub struct ToolPathResolver {
    /// Directory the tool will run in, also the start of the `node_modules` search
    base_dir: Option<PathBuf>,
    /// Overrides the `PATH` environment variable (used by tests)
    search_path: Option<String>,
}

impl ToolPathResolver {
    /// Create a resolver anchored at `base_dir`
    pub fn new(base_dir: Option<&Path>) -> Self {
        Self {
            base_dir: base_dir.map(Path::to_path_buf),
            search_path: None,
        }
    }

    /// Use `search_path` instead of the process `PATH`
    pub fn with_search_path(mut self, search_path: impl Into<String>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        let platform = PlatformCommands::instance();
        let command = platform.get_command(tool_name);
        let candidate = Path::new(command);

        if candidate.is_absolute() || candidate.components().count() > 1 {
            let resolved = match self.base_dir {
                Some(ref base) if candidate.is_relative() => base.join(candidate),
                _ => candidate.to_path_buf(),
            };
            debug!("Resolving explicit tool path: {} -> {:?}", tool_name, resolved);
            return resolved.is_file().then_some(resolved);
        }

        if let Some(ref base) = self.base_dir {
            if let Some(local) = Self::find_in_dir(base, command) {
                debug!("Using tool from working directory: {} -> {:?}", tool_name, local);
                return Some(local);
            }

            if let Some(bundled) = self.find_in_node_modules(base, command) {
                debug!("Using project tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        if let Some(system_path) = self.find_in_system_path(command) {
            debug!("Using system tool: {} -> {:?}", tool_name, system_path);
            return Some(system_path);
        }

        debug!("Tool not found: {}", tool_name);
        None
    }

    /// Look for `node_modules/.bin/<tool>` in `start` and its ancestors
    fn find_in_node_modules(&self, start: &Path, command: &str) -> Option<PathBuf> {
        start
            .ancestors()
            .take(MAX_ANCESTORS)
            .find_map(|dir| Self::find_in_dir(&dir.join("node_modules").join(".bin"), command))
    }

    /// Find tool in system PATH
    fn find_in_system_path(&self, command: &str) -> Option<PathBuf> {
        let path_var = match self.search_path {
            Some(ref path) => path.clone(),
            None => env::var_os("PATH")?.to_str()?.to_string(),
        };

        path_var
            .split(PlatformCommands::instance().path_separator())
            .filter(|dir| !dir.is_empty())
            .find_map(|dir| Self::find_in_dir(Path::new(dir), command))
    }

    fn find_in_dir(dir: &Path, command: &str) -> Option<PathBuf> {
        PlatformCommands::instance()
            .executable_suffixes()
            .iter()
            .map(|suffix| dir.join(format!("{}{}", command, suffix)))
            .find(|path| path.is_file())
    }

    /// Check if a specific tool is available
    pub fn is_tool_available(&self, tool_name: &str) -> bool {
        self.resolve_tool(tool_name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_prefers_project_node_modules() {
        let project = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        let bin = project.path().join("node_modules").join(".bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("uglifyjs"), "#!/bin/sh\n").unwrap();
        fs::write(system.path().join("uglifyjs"), "#!/bin/sh\n").unwrap();

        let www = project.path().join("www");
        fs::create_dir_all(&www).unwrap();

        let resolver = ToolPathResolver::new(Some(&www))
            .with_search_path(system.path().to_string_lossy().into_owned());
        assert_eq!(resolver.resolve_tool("uglifyjs"), Some(bin.join("uglifyjs")));
    }

    #[test]
    fn test_falls_back_to_search_path() {
        let project = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        fs::write(system.path().join("ngzip"), "#!/bin/sh\n").unwrap();

        let resolver = ToolPathResolver::new(Some(project.path()))
            .with_search_path(system.path().to_string_lossy().into_owned());
        assert_eq!(resolver.resolve_tool("ngzip"), Some(system.path().join("ngzip")));
        assert!(!resolver.is_tool_available("babel"));
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_relative_path() {
        let android = TempDir::new().unwrap();
        let resolver = ToolPathResolver::new(Some(android.path())).with_search_path("");
        assert!(resolver.resolve_tool("./gradlew").is_none());

        fs::write(android.path().join("gradlew"), "#!/bin/sh\n").unwrap();
        assert_eq!(resolver.resolve_tool("./gradlew"), Some(android.path().join("./gradlew")));
    }
}
