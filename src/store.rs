// src/store.rs
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::Mutex;

use crate::article::Article;

/// External seen-set. Keys are (namespace, uid); a uid marked seen is
/// never re-emitted as new by the pipeline. Records have no expiry.
#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn contains(&self, namespace: &str, uid: &str) -> Result<bool>;
    async fn save(&self, namespace: &str, articles: &[Article]) -> Result<()>;
}

/// One JSON map per namespace (uid → seen-timestamp) under a state
/// directory. Durable across restarts; writes are serialized behind a
/// lock so two schedulers flushing at once cannot interleave a
/// read-modify-write.
pub struct JsonFileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    // The namespace doubles as the file name.
    fn namespace_path(&self, namespace: &str) -> PathBuf {
        let safe: String = namespace
            .chars()
            .map(|c| if c == '/' || c == ':' { '_' } else { c })
            .collect();
        self.root.join(format!("{safe}.json"))
    }

    async fn read_namespace(&self, path: &Path) -> BTreeMap<String, DateTime<Utc>> {
        match fs::read_to_string(path).await {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "unreadable seen-set; starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        }
    }
}

#[async_trait]
impl DedupStore for JsonFileStore {
    async fn contains(&self, namespace: &str, uid: &str) -> Result<bool> {
        let path = self.namespace_path(namespace);
        Ok(self.read_namespace(&path).await.contains_key(uid))
    }

    async fn save(&self, namespace: &str, articles: &[Article]) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let path = self.namespace_path(namespace);
        let mut seen = self.read_namespace(&path).await;
        let now = Utc::now();
        for article in articles {
            seen.entry(article.uid.clone()).or_insert(now);
        }

        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating state dir {}", self.root.display()))?;
        let body = serde_json::to_vec_pretty(&seen).context("encoding seen-set")?;
        fs::write(&path, body)
            .await
            .with_context(|| format!("writing seen-set {}", path.display()))?;
        Ok(())
    }
}

/// In-process store for tests and dry runs.
pub struct MemoryStore {
    seen: std::sync::Mutex<HashSet<(String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            seen: std::sync::Mutex::new(HashSet::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DedupStore for MemoryStore {
    async fn contains(&self, namespace: &str, uid: &str) -> Result<bool> {
        Ok(self
            .seen
            .lock()
            .unwrap()
            .contains(&(namespace.to_string(), uid.to_string())))
    }

    async fn save(&self, namespace: &str, articles: &[Article]) -> Result<()> {
        let mut seen = self.seen.lock().unwrap();
        for article in articles {
            seen.insert((namespace.to_string(), article.uid.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Article {
        Article::new(title.into(), "src".into(), format!("https://x.example/{title}"))
    }

    #[tokio::test]
    async fn file_store_round_trips_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let arts = vec![article("a"), article("b")];

        assert!(!store.contains("ns", &arts[0].uid).await.unwrap());
        store.save("ns", &arts).await.unwrap();
        assert!(store.contains("ns", &arts[0].uid).await.unwrap());

        // A fresh instance over the same directory sees the same records.
        let reopened = JsonFileStore::new(dir.path());
        assert!(reopened.contains("ns", &arts[1].uid).await.unwrap());
        assert!(!reopened.contains("other", &arts[1].uid).await.unwrap());
    }

    #[tokio::test]
    async fn save_keeps_first_seen_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let arts = vec![article("a")];
        store.save("ns", &arts).await.unwrap();

        let path = store.namespace_path("ns");
        let first: BTreeMap<String, DateTime<Utc>> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        store.save("ns", &arts).await.unwrap();
        let second: BTreeMap<String, DateTime<Utc>> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn memory_store_namespaces_are_disjoint() {
        let store = MemoryStore::new();
        let arts = vec![article("a")];
        store.save("one", &arts).await.unwrap();
        assert!(store.contains("one", &arts[0].uid).await.unwrap());
        assert!(!store.contains("two", &arts[0].uid).await.unwrap());
    }
}
