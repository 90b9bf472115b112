// Cache path utilities.
// Maps storage keys onto files inside the platform cache directory.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Get the base cache directory (~/.cache/hubbub on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hubbub").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Directory holding one file per storage key.
pub fn entries_dir(base: &Path) -> PathBuf {
    base.join("entries")
}

/// Path to the file backing a storage key.
pub fn entry_path(base: &Path, key: &str) -> PathBuf {
    entries_dir(base).join(format!("{}.json", sanitize_name(key)))
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            _ => c,
        })
        .collect()
}
