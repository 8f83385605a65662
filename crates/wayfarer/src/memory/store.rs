//! Key-value takeaway store.
//!
//! Takeaways are short interpretations of files and directories, keyed by
//! path, written when the agent finishes with a file or directory and read
//! back when it lists a directory again. The store is external state: the
//! core only fetches and sets.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;

/// Boxed future returned by [`TakeawayStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Path-keyed takeaway storage.
pub trait TakeawayStore: Send + Sync {
    fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;
    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()>;
}

/// Process-lifetime store backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store.
    pub fn with_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl TakeawayStore for InMemoryStore {
    fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.entries.lock().await.get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.entries
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        })
    }
}

/// Store persisted as a single JSON object, rewritten atomically on every
/// `set` so takeaways survive across sessions.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Load `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => HashMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(
            "Loaded {} takeaways from {}",
            entries.len(),
            path.display()
        );
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TakeawayStore for JsonFileStore {
    fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.entries.lock().await.get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut entries = self.entries.lock().await;
            let mut next = entries.clone();
            next.insert(key.to_string(), value.to_string());
            let json = serde_json::to_string_pretty(&next)?;

            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            let tmp_path = self.path.with_extension("json.tmp");
            tokio::fs::write(&tmp_path, json).await?;
            tokio::fs::rename(&tmp_path, &self.path).await?;
            *entries = next;
            debug!("Stored takeaway for '{key}'");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_fetch_and_set() {
        let store = InMemoryStore::new();
        assert_eq!(store.fetch("a").await.unwrap(), None);
        store.set("a", "takeaway").await.unwrap();
        assert_eq!(store.fetch("a").await.unwrap().as_deref(), Some("takeaway"));
        store.set("a", "newer").await.unwrap();
        assert_eq!(store.fetch("a").await.unwrap().as_deref(), Some("newer"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn json_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/takeaways.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(store.fetch("src").await.unwrap(), None);
        store.set("src", "the source tree").await.unwrap();
        store.set("src/main.rs", "entry point").await.unwrap();

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.fetch("src/main.rs").await.unwrap().as_deref(),
            Some("entry point")
        );
        assert!(!dir.path().join("state/takeaways.json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_write_leaves_entries_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/takeaways.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        // A plain file where the parent directory should go.
        std::fs::write(dir.path().join("state"), "").unwrap();

        assert!(store.set("src", "the source tree").await.is_err());
        assert_eq!(store.fetch("src").await.unwrap(), None);
    }

    #[tokio::test]
    async fn json_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("takeaways.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path).await,
            Err(StoreError::Json(_))
        ));
    }
}
