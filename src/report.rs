//! Full build output summary

use crate::error::{KilnError, KilnResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extensions of debug artifacts left out of the summary
const HIDDEN_EXTENSIONS: &[&str] = &["map"];

/// One output file and its size
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReportEntry {
    /// Path relative to the output root
    pub output_path: PathBuf,
    /// File size in bytes
    pub size_bytes: u64,
}

/// Scan `out_root` and list its files, largest first.
///
/// The scan visits entries in file-name order and the sort is stable, so
/// equal sizes keep scan order. Source maps are left out.
pub fn summarize(out_root: &Path) -> KilnResult<Vec<BuildReportEntry>> {
    if !out_root.is_dir() {
        return Err(KilnError::io(
            format!("scanning {}", out_root.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "output directory missing"),
        ));
    }

    let walker = ignore::WalkBuilder::new(out_root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut entries = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        let hidden = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| HIDDEN_EXTENSIONS.contains(&e));
        if hidden {
            continue;
        }

        let metadata = entry
            .metadata()
            .map_err(|e| KilnError::Internal(format!("stat {}: {}", path.display(), e)))?;
        entries.push(BuildReportEntry {
            output_path: path.strip_prefix(out_root).unwrap_or(path).to_path_buf(),
            size_bytes: metadata.len(),
        });
    }

    entries.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
    Ok(entries)
}

/// Human readable size, e.g. `512 B`, `1.50 KB`, `2.00 MB`
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let value = bytes as f64;
    if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Table rows: padded path column, right-aligned size column
pub fn render_rows(entries: &[BuildReportEntry]) -> Vec<String> {
    let width = entries
        .iter()
        .map(|e| e.output_path.display().to_string().len())
        .max()
        .unwrap_or(0);

    entries
        .iter()
        .map(|e| {
            format!(
                "{:<width$}  {:>10}",
                e.output_path.display(),
                format_size(e.size_bytes),
                width = width
            )
        })
        .collect()
}
