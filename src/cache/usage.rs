//! Persisted style-class usage per source file
//!
//! The cache is the only state that outlives a single build. Partial builds
//! for different files run concurrently, so every load-compare-store cycle
//! happens while holding `lock`; without it two near-simultaneous edits
//! could interleave their read-modify-write and drop one file's update.

use super::tokens::TokenSet;
use crate::error::{KilnError, KilnResult};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Mapping from project-relative source path to its class tokens
pub type UsageMap = BTreeMap<String, TokenSet>;

/// Style-class usage cache backed by a single JSON record
#[derive(Debug)]
pub struct StyleUsageCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl StyleUsageCache {
    /// Create a cache persisted at `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the persisted record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted mapping.
    ///
    /// Missing or malformed storage yields an empty mapping.
    pub fn load(&self) -> UsageMap {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return UsageMap::new(),
        };

        match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(e) => {
                debug!(
                    "Ignoring malformed usage cache {}: {}",
                    self.path.display(),
                    e
                );
                UsageMap::new()
            }
        }
    }

    /// Compare `tokens` with the stored set for `source`, then store them.
    ///
    /// Returns true when the sets differ. An absent entry compares equal to
    /// an empty set. The entry is overwritten and the whole record persisted
    /// before returning, whatever the outcome of the comparison.
    pub async fn has_changed(&self, source: &str, tokens: &TokenSet) -> KilnResult<bool> {
        let _guard = self.lock.lock().await;

        let mut map = self.load();
        let changed = match map.get(source) {
            Some(previous) => previous != tokens,
            None => !tokens.is_empty(),
        };

        map.insert(source.to_string(), tokens.clone());
        self.store(&map)?;

        debug!(
            "Usage cache {} for {} ({} tokens)",
            if changed { "changed" } else { "unchanged" },
            source,
            tokens.len()
        );
        Ok(changed)
    }

    /// Current contents, read under the lock so it never observes a partial write
    pub async fn snapshot(&self) -> UsageMap {
        let _guard = self.lock.lock().await;
        self.load()
    }

    /// Remove the persisted record. Returns false if there was nothing to remove.
    pub async fn clear(&self) -> KilnResult<bool> {
        let _guard = self.lock.lock().await;

        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(KilnError::io(
                format!("removing usage cache {}", self.path.display()),
                e,
            )),
        }
    }

    /// Atomically replace the record: temp file in the same directory, then rename
    fn store(&self, map: &UsageMap) -> KilnResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .map_err(|e| KilnError::io(format!("creating {}", dir.display()), e))?;

        let content = serde_json::to_string_pretty(map)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| KilnError::io("creating temporary usage cache", e))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.as_file().flush())
            .map_err(|e| KilnError::io("writing usage cache", e))?;
        tmp.persist(&self.path).map_err(|e| {
            warn!("Failed to persist usage cache: {}", e);
            KilnError::io(format!("persisting {}", self.path.display()), e.error)
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn set(tokens: &[&str]) -> TokenSet {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn cache_in(temp: &TempDir) -> StyleUsageCache {
        StyleUsageCache::new(temp.path().join(".kiln").join("style-usage.json"))
    }

    #[test]
    fn load_missing_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(cache_in(&temp).load().is_empty());
    }

    #[test]
    fn load_malformed_is_empty() {
        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp);
        std::fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
        std::fs::write(cache.path(), "{ not json").unwrap();
        assert!(cache.load().is_empty());

        std::fs::write(cache.path(), r#"{"src/a.tsx": 42}"#).unwrap();
        assert!(cache.load().is_empty());
    }

    #[tokio::test]
    async fn empty_tokens_without_entry_unchanged() {
        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp);
        assert!(!cache.has_changed("src/a.tsx", &set(&[])).await.unwrap());
    }

    #[tokio::test]
    async fn new_tokens_without_entry_changed() {
        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp);
        assert!(cache.has_changed("src/a.tsx", &set(&["a"])).await.unwrap());
    }

    #[tokio::test]
    async fn second_call_with_same_tokens_unchanged() {
        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp);
        let tokens = set(&["flex", "p-4"]);
        assert!(cache.has_changed("src/a.tsx", &tokens).await.unwrap());
        assert!(!cache.has_changed("src/a.tsx", &tokens).await.unwrap());
    }

    #[tokio::test]
    async fn order_independent() {
        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp);
        let first: TokenSet = ["a", "b"].iter().map(|t| t.to_string()).collect();
        let second: TokenSet = ["b", "a"].iter().map(|t| t.to_string()).collect();
        cache.has_changed("src/a.tsx", &first).await.unwrap();
        assert!(!cache.has_changed("src/a.tsx", &second).await.unwrap());
    }

    #[tokio::test]
    async fn emptied_entry_changed() {
        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp);
        cache.has_changed("src/a.tsx", &set(&["a"])).await.unwrap();
        assert!(cache.has_changed("src/a.tsx", &set(&[])).await.unwrap());
        assert!(cache.load()["src/a.tsx"].is_empty());
    }

    #[tokio::test]
    async fn persists_across_instances() {
        let temp = TempDir::new().unwrap();
        cache_in(&temp)
            .has_changed("src/a.tsx", &set(&["x", "y"]))
            .await
            .unwrap();

        let reopened = cache_in(&temp);
        assert_eq!(reopened.load()["src/a.tsx"], set(&["x", "y"]));
        assert!(!reopened
            .has_changed("src/a.tsx", &set(&["y", "x"]))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let temp = TempDir::new().unwrap();
        let cache = Arc::new(cache_in(&temp));

        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let tokens = set(&[&format!("tok-{i}")]);
                cache.has_changed(&format!("src/c{i}.tsx"), &tokens).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        let map = cache.snapshot().await;
        assert_eq!(map.len(), 16);
        for i in 0..16 {
            assert!(map[&format!("src/c{i}.tsx")].contains(&format!("tok-{i}")));
        }
    }

    #[tokio::test]
    async fn clear_removes_record() {
        let temp = TempDir::new().unwrap();
        let cache = cache_in(&temp);
        assert!(!cache.clear().await.unwrap());

        cache.has_changed("src/a.tsx", &set(&["a"])).await.unwrap();
        assert!(cache.clear().await.unwrap());
        assert!(cache.load().is_empty());
        // A reset cache treats the next sighting as new
        assert!(cache.has_changed("src/a.tsx", &set(&["a"])).await.unwrap());
    }
}
