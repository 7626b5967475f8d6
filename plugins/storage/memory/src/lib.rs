use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::sync::RwLock;

use clock_api::util::deadline_ms;
use clock_api::{HashEntry, HashStore, StoreFuture, now_ms};

// ═══════════════════════════════════════════════════════════════
//  MemoryStoreConfig
// ═══════════════════════════════════════════════════════════════

fn default_initial_capacity() -> usize {
    1024
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MemoryStoreConfig {
    /// Pre-allocated number of hash keys.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryStore
// ═══════════════════════════════════════════════════════════════

#[derive(Default)]
struct Inner {
    hashes: HashMap<String, BTreeMap<String, String>>,
    /// Deadlines (Unix ms), only for keys that have one.
    expiry: HashMap<String, i64>,
}

impl Inner {
    fn is_expired(&self, key: &str, now: i64) -> bool {
        self.expiry.get(key).is_some_and(|&at| at <= now)
    }

    fn live(&self, key: &str, now: i64) -> Option<&BTreeMap<String, String>> {
        if self.is_expired(key, now) {
            return None;
        }
        self.hashes.get(key)
    }

    /// Drop `key` if its deadline has passed.
    fn purge(&mut self, key: &str, now: i64) {
        if self.is_expired(key, now) {
            self.hashes.remove(key);
            self.expiry.remove(key);
        }
    }
}

/// In-process hash store: one namespace, lazy expiry, no eviction.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new(config: &MemoryStoreConfig) -> Self {
        Self {
            inner: RwLock::new(Inner {
                hashes: HashMap::with_capacity(config.initial_capacity),
                expiry: HashMap::new(),
            }),
        }
    }

    /// Number of live (non-expired) keys.
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        let now = now_ms();
        inner.hashes.keys().filter(|k| !inner.is_expired(k, now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove every expired key now instead of on next access.
    pub async fn purge_expired(&self) -> usize {
        let mut inner = self.inner.write().await;
        let now = now_ms();
        let expired: Vec<String> = inner
            .expiry
            .iter()
            .filter(|&(_, &at)| at <= now)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            inner.hashes.remove(key);
            inner.expiry.remove(key);
        }
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "purged expired keys");
        }
        expired.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&MemoryStoreConfig::default())
    }
}

impl HashStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn set_hash<'a>(
        &'a self,
        key: &'a str,
        entries: &'a [HashEntry],
        ttl: Option<Duration>,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            if entries.is_empty() {
                return Ok(());
            }
            let mut inner = self.inner.write().await;
            inner.purge(key, now_ms());
            let hash = inner.hashes.entry(key.to_string()).or_default();
            for entry in entries {
                hash.insert(entry.name.clone(), entry.value.clone());
            }
            if let Some(ttl) = ttl {
                inner.expiry.insert(key.to_string(), deadline_ms(ttl));
            }
            Ok(())
        })
    }

    fn get_hash<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Vec<HashEntry>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            let entries = inner
                .live(key, now_ms())
                .map(|hash| {
                    hash.iter()
                        .map(|(name, value)| HashEntry::new(name.as_str(), value.as_str()))
                        .collect()
                })
                .unwrap_or_default();
            Ok(entries)
        })
    }

    fn get_field<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let inner = self.inner.read().await;
            Ok(inner.live(key, now_ms()).and_then(|hash| hash.get(field).cloned()))
        })
    }

    fn expire<'a>(&'a self, key: &'a str, at_ms: i64) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            inner.purge(key, now_ms());
            if !inner.hashes.contains_key(key) {
                return Ok(false);
            }
            inner.expiry.insert(key.to_string(), at_ms);
            Ok(true)
        })
    }

    fn flush(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut inner = self.inner.write().await;
            let keys = inner.hashes.len();
            inner.hashes.clear();
            inner.expiry.clear();
            tracing::debug!(keys, "memory store flushed");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> Vec<HashEntry> {
        pairs.iter().copied().map(HashEntry::from).collect()
    }

    #[tokio::test]
    async fn set_merges_fields() {
        let store = MemoryStore::default();
        store.set_hash("k", &entries(&[("a", "1"), ("b", "2")]), None).await.unwrap();
        store.set_hash("k", &entries(&[("b", "3"), ("c", "4")]), None).await.unwrap();

        let got = store.get_hash("k").await.unwrap();
        assert_eq!(got, entries(&[("a", "1"), ("b", "3"), ("c", "4")]));
        assert_eq!(store.get_field("k", "b").await.unwrap().as_deref(), Some("3"));
        assert_eq!(store.get_field("k", "z").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_key_reads_empty() {
        let store = MemoryStore::default();
        assert!(store.get_hash("nope").await.unwrap().is_empty());
        assert_eq!(store.get_field("nope", "a").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn empty_write_creates_no_key() {
        let store = MemoryStore::default();
        store.set_hash("k", &[], Some(Duration::from_secs(60))).await.unwrap();

        assert!(store.is_empty().await);
        assert!(!store.expire("k", now_ms() + 10_000).await.unwrap());
    }

    #[tokio::test]
    async fn huge_ttl_keeps_key_alive() {
        let store = MemoryStore::default();
        store
            .set_hash("k", &entries(&[("a", "1")]), Some(Duration::from_secs(u64::MAX / 2)))
            .await
            .unwrap();
        assert_eq!(store.get_field("k", "a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn expire_missing_key_is_false() {
        let store = MemoryStore::default();
        assert!(!store.expire("nope", now_ms() + 10_000).await.unwrap());
    }

    #[tokio::test]
    async fn past_deadline_hides_key() {
        let store = MemoryStore::default();
        store.set_hash("k", &entries(&[("a", "1")]), None).await.unwrap();
        assert!(store.expire("k", now_ms() - 1).await.unwrap());

        assert!(store.get_hash("k").await.unwrap().is_empty());
        assert_eq!(store.get_field("k", "a").await.unwrap(), None);
        assert_eq!(store.len().await, 0);
        // expired key counts as missing
        assert!(!store.expire("k", now_ms() + 10_000).await.unwrap());
    }

    #[tokio::test]
    async fn future_deadline_keeps_key() {
        let store = MemoryStore::default();
        store.set_hash("k", &entries(&[("a", "1")]), None).await.unwrap();
        assert!(store.expire("k", now_ms() + 60_000).await.unwrap());
        assert_eq!(store.get_hash("k").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ttl_on_set_expires() {
        let store = MemoryStore::default();
        store
            .set_hash("k", &entries(&[("a", "1")]), Some(Duration::from_millis(5)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(store.get_hash("k").await.unwrap().is_empty());
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn rewrite_after_expiry_starts_fresh() {
        let store = MemoryStore::default();
        store.set_hash("k", &entries(&[("a", "1")]), None).await.unwrap();
        store.expire("k", now_ms() - 1).await.unwrap();
        store.set_hash("k", &entries(&[("b", "2")]), None).await.unwrap();

        assert_eq!(store.get_hash("k").await.unwrap(), entries(&[("b", "2")]));
    }

    #[tokio::test]
    async fn flush_clears_everything() {
        let store = MemoryStore::default();
        store.set_hash("a", &entries(&[("x", "1")]), None).await.unwrap();
        store.set_hash("b", &entries(&[("x", "1")]), Some(Duration::from_secs(60))).await.unwrap();
        assert_eq!(store.len().await, 2);

        store.flush().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[test]
    fn config_defaults() {
        let cfg: MemoryStoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.initial_capacity, 1024);
    }
}
