//! # Platform-specific utilities
//!
//! Questo modulo centralizza la logica cross-platform per i comandi esterni:
//! nomi eseguibili (`npx` vs `npx.cmd`), separatore del `PATH` e forma di
//! invocazione del wrapper Gradle.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Platform-specific command naming
pub struct PlatformCommands {
    commands: HashMap<&'static str, &'static str>,
    executable_suffixes: &'static [&'static str],
    path_separator: char,
}

impl PlatformCommands {
    /// Get the singleton instance
    pub fn instance() -> &'static Self {
        static INSTANCE: OnceLock<PlatformCommands> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let is_windows = cfg!(windows);
        let mut commands = HashMap::new();

        if is_windows {
            // Node shims on Windows are batch files
            commands.insert("npx", "npx.cmd");
            commands.insert("gradlew", "gradlew.bat");
        } else {
            commands.insert("npx", "npx");
            commands.insert("gradlew", "./gradlew");
        }

        Self {
            commands,
            executable_suffixes: if is_windows { &[".cmd", ".exe", ".bat", ""] } else { &[""] },
            path_separator: if is_windows { ';' } else { ':' },
        }
    }

    /// Get the platform-specific command name
    pub fn get_command<'a>(&self, base_name: &'a str) -> &'a str {
        self.commands.get(base_name).copied().unwrap_or(base_name)
    }

    /// Suffixes tried when looking a program up on disk
    pub fn executable_suffixes(&self) -> &'static [&'static str] {
        self.executable_suffixes
    }

    /// Separator between entries of the `PATH` variable
    pub fn path_separator(&self) -> char {
        self.path_separator
    }

    /// Program and arguments that run a Gradle task through the project wrapper.
    ///
    /// Windows runs the `gradlew.bat` wrapper found in the working directory,
    /// elsewhere the script is executed directly as `./gradlew <task>`.
    pub fn gradle_invocation(&self, task: &str) -> (String, Vec<String>) {
        (self.get_command("gradlew").to_string(), vec![task.to_string()])
    }

    /// Get system information for debugging
    pub fn system_info() -> SystemInfo {
        SystemInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        }
    }
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl std::fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_commands() {
        let platform = PlatformCommands::instance();

        let npx = platform.get_command("npx");
        assert!(npx.starts_with("npx"));

        // Unknown names pass through
        assert_eq!(platform.get_command("uglifyjs"), "uglifyjs");
    }

    #[cfg(unix)]
    #[test]
    fn test_gradle_invocation_unix() {
        let (program, args) = PlatformCommands::instance().gradle_invocation("assembleRelease");
        assert_eq!(program, "./gradlew");
        assert_eq!(args, vec!["assembleRelease".to_string()]);
        assert_eq!(PlatformCommands::instance().path_separator(), ':');
    }

    #[cfg(windows)]
    #[test]
    fn test_gradle_invocation_windows() {
        let (program, _) = PlatformCommands::instance().gradle_invocation("assembleRelease");
        assert_eq!(program, "gradlew.bat");
    }

    #[test]
    fn test_system_info() {
        let info = PlatformCommands::system_info();
        assert!(!info.os.is_empty());
        assert!(!info.to_string().is_empty());
    }
}
