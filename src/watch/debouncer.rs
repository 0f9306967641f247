//! Per-path repeat-change sequencing
//!
//! Not a temporal debounce: every raw event for a path produces its own
//! partial build. Repeats of the same path are only labeled with a rising
//! counter so the notifier can rewrite one console line.

use std::path::{Path, PathBuf};

/// A sequenced filesystem change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Changed path, relative to the project root
    pub path: PathBuf,
    /// 0 on the first change after a different path, +1 per repeat
    pub sequence: u32,
}

/// Sequence for `new_path` given the previous event
pub fn next_sequence(previous_path: Option<&Path>, previous_counter: u32, new_path: &Path) -> u32 {
    match previous_path {
        Some(prev) if prev == new_path => previous_counter.saturating_add(1),
        _ => 0,
    }
}

/// Turns raw change events into sequenced `WatchEvent`s
#[derive(Debug, Clone, Default)]
pub struct WatchDebouncer {
    last_path: Option<PathBuf>,
    counter: u32,
    tooling: Vec<String>,
    watch_roots: Vec<PathBuf>,
}

impl WatchDebouncer {
    /// Create a debouncer that ignores the given tooling file names when
    /// they sit at the project root or directly inside one of `watch_roots`
    pub fn new(tooling: Vec<String>, watch_roots: &[String]) -> Self {
        Self {
            last_path: None,
            counter: 0,
            tooling,
            watch_roots: watch_roots.iter().map(PathBuf::from).collect(),
        }
    }

    /// Whether `path` is one of the build tool's own files.
    ///
    /// Nested files with a tooling name (`src/content/build.ts`) are
    /// ordinary sources.
    pub fn is_tooling(&self, path: &Path) -> bool {
        let named = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.tooling.iter().any(|t| t == name));
        if !named {
            return false;
        }

        let parent = path.parent().unwrap_or(Path::new(""));
        parent.as_os_str().is_empty() || self.watch_roots.iter().any(|root| root == parent)
    }

    /// Sequence one raw event. Tooling files yield `None` and leave the
    /// state untouched.
    pub fn on_fs_event(&mut self, path: &Path) -> Option<WatchEvent> {
        if self.is_tooling(path) {
            return None;
        }

        let sequence = next_sequence(self.last_path.as_deref(), self.counter, path);
        if sequence == 0 {
            self.last_path = Some(path.to_path_buf());
        }
        self.counter = sequence;

        Some(WatchEvent {
            path: path.to_path_buf(),
            sequence,
        })
    }
}
