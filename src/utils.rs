//! # Utility Functions Module
//!
//! Small helpers shared by the stages and the orchestrator: argument
//! vector building and sibling artifact naming.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Converts any iterable of string-like items to `Vec<String>`.
///
/// # Example
/// ```rust
/// use capbox_optimizer::utils::to_string_vec;
///
/// let args = to_string_vec(["--compress", "--mangle"]);
/// assert_eq!(args, vec!["--compress".to_string(), "--mangle".to_string()]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Builds an argument vector from heterogeneous displayable items.
///
/// ```rust
/// use capbox_optimizer::args;
///
/// let file = "app.js";
/// let args = args!["uglifyjs", file, "-o", file];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        $crate::utils::to_string_vec([$($item.to_string()),*])
    };
}

/// Path of a sibling artifact: the source path with `.suffix` appended.
///
/// `main.js` + `gz` gives `main.js.gz` (the original extension is kept).
pub fn sibling_artifact(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// File name used in log lines, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
