//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

fn is_pattern(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// Expand file list entries relative to `base`.
///
/// Entries without glob metacharacters are kept as written, existing or
/// not. Patterns are replaced by their sorted matches; a pattern that
/// matches nothing only warns. Returns the offending entry when a pattern
/// is malformed.
pub fn expand_patterns(base: &Path, entries: &[String]) -> Result<Vec<String>, String> {
    let mut results = Vec::new();

    for entry in entries {
        if !is_pattern(entry) {
            results.push(entry.clone());
            continue;
        }

        let full_pattern = base.join(entry);
        let paths = glob(&full_pattern.to_string_lossy()).map_err(|_| entry.clone())?;

        let mut matched: Vec<String> = paths
            .filter_map(|path| match path {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .map(|path| to_slash(&relative_path(base, &path)))
            .collect();

        if matched.is_empty() {
            tracing::warn!("pattern `{}` matched no files", entry);
        }
        matched.sort();
        results.extend(matched);
    }

    let mut seen = std::collections::BTreeSet::new();
    results.retain(|entry| seen.insert(entry.clone()));
    Ok(results)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a path with forward slashes, the way file lists spell them.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Show `path` relative to the current directory when that is shorter.
pub fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd))
        .filter(|rel| !rel.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
