//! Source tree discovery

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Walk the configured source directories and collect every file.
///
/// Respects `.gitignore` rules and always skips `node_modules`. Returned
/// paths are relative to `root`, sorted and free of duplicates (source
/// directories may nest). Missing source directories are skipped.
pub fn discover_sources(root: &Path, source_dirs: &[String]) -> Vec<PathBuf> {
    let mut files = BTreeSet::new();

    for dir in source_dirs {
        let base = root.join(dir);
        if !base.is_dir() {
            debug!("Source directory {} not found, skipping", base.display());
            continue;
        }

        let walker = ignore::WalkBuilder::new(&base)
            .standard_filters(true)
            .hidden(false)
            .require_git(false)
            .build();

        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(_) => continue,
            };

            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.path();
            if path_contains_node_modules(path) {
                continue;
            }

            if let Some(relative) = relative_to(root, path) {
                files.insert(relative);
            }
        }
    }

    files.into_iter().collect()
}

/// Express `path` relative to `root`, accepting already-relative paths
pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_relative() {
        return Some(path.to_path_buf());
    }
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

fn path_contains_node_modules(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == "node_modules")
}
