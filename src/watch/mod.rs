//! Filesystem watching
//!
//! `notify` delivers events on its own thread. A blocking bridge task
//! filters them down to file creations and modifications under the
//! watched source directories and forwards root-relative paths to a tokio
//! channel; `WatchDebouncer` sequences them on the async side.

pub mod debouncer;

pub use debouncer::{next_sequence, WatchDebouncer, WatchEvent};

use crate::error::KilnResult;
use crate::walker::relative_to;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Capacity of the raw path channel
const CHANNEL_CAPACITY: usize = 256;

/// Directory names whose contents never trigger rebuilds
const IGNORED_DIRS: &[&str] = &["node_modules", ".git", ".kiln"];

/// Running watcher; dropping it stops watching
pub struct WatcherHandle {
    _watcher: RecommendedWatcher,
    _bridge: JoinHandle<()>,
    watched: Vec<PathBuf>,
}

impl WatcherHandle {
    /// Directories being watched
    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }
}

/// Watch the existing `source_dirs` under `root` recursively.
///
/// Returns the handle and a receiver of changed paths relative to `root`.
pub fn start_watcher(
    root: &Path,
    source_dirs: &[String],
) -> KilnResult<(WatcherHandle, mpsc::Receiver<PathBuf>)> {
    let (std_tx, std_rx) = std::sync::mpsc::channel::<notify::Result<Event>>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = std_tx.send(res);
    })?;

    let mut watched = Vec::new();
    for dir in source_dirs {
        let path = root.join(dir);
        if !path.is_dir() {
            debug!("Not watching missing directory {}", path.display());
            continue;
        }
        watcher.watch(&path, RecursiveMode::Recursive)?;
        watched.push(path);
    }

    let (tx, rx) = mpsc::channel::<PathBuf>(CHANNEL_CAPACITY);
    let root = root.to_path_buf();

    let bridge = tokio::task::spawn_blocking(move || {
        while let Ok(result) = std_rx.recv() {
            let event = match result {
                Ok(event) => event,
                Err(e) => {
                    warn!("File watcher error: {}", e);
                    continue;
                }
            };
            for path in changed_paths(&root, event) {
                if tx.blocking_send(path).is_err() {
                    return;
                }
            }
        }
    });

    Ok((
        WatcherHandle {
            _watcher: watcher,
            _bridge: bridge,
            watched,
        },
        rx,
    ))
}

/// Root-relative file paths an event reports as created or modified
fn changed_paths(root: &Path, event: Event) -> Vec<PathBuf> {
    if !is_change(&event.kind) {
        return Vec::new();
    }

    event
        .paths
        .into_iter()
        .filter(|p| p.is_file())
        .filter_map(|p| relative_to(root, &p))
        .filter(|p| !is_ignored(p))
        .collect()
}

fn is_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

fn is_ignored(path: &Path) -> bool {
    path.components()
        .any(|c| IGNORED_DIRS.iter().any(|d| c.as_os_str() == *d))
}
