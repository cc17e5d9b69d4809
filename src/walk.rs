use std::fs;
use std::path::{Path, PathBuf};

use crate::media::ExtensionFilter;

/// Files found under a root directory.
#[derive(Debug, Default)]
pub struct WalkResult {
    /// Accepted regular files, sorted by path
    pub files: Vec<PathBuf>,
    /// Regular files rejected by the extension filter
    pub skipped: u64,
}

/// Recursively collect regular files under `root` that pass `filter`.
/// Unreadable directories are logged and skipped.
pub fn collect_files(root: &Path, filter: &ExtensionFilter) -> WalkResult {
    let mut result = WalkResult::default();
    collect_files_recursive(root, filter, &mut result);
    result.files.sort();
    result
}

fn collect_files_recursive(dir: &Path, filter: &ExtensionFilter, result: &mut WalkResult) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot read directory {}: {}", dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        // Symlinked directories are not descended into; symlinked files are kept
        if file_type.is_dir() {
            collect_files_recursive(&path, filter, result);
        } else if path.is_file() {
            if filter.accepts(&path) {
                result.files.push(path);
            } else {
                tracing::debug!("Skipping {} (extension doesn't match)", path.display());
                result.skipped += 1;
            }
        }
    }
}
