//! Minimal map-backed `HashStore` for unit tests of the cache layers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use crate::record::HashEntry;
use crate::store::{HashStore, StoreFuture};

#[derive(Default)]
pub(crate) struct MapStore {
    hashes: Mutex<HashMap<String, BTreeMap<String, String>>>,
    ttls: Mutex<HashMap<String, Duration>>,
}

impl MapStore {
    pub(crate) fn fields(&self, key: &str) -> BTreeMap<String, String> {
        self.hashes.lock().unwrap().get(key).cloned().unwrap_or_default()
    }

    pub(crate) fn ttl(&self, key: &str) -> Option<Duration> {
        self.ttls.lock().unwrap().get(key).copied()
    }

    pub(crate) fn key_count(&self) -> usize {
        self.hashes.lock().unwrap().len()
    }
}

impl HashStore for MapStore {
    fn name(&self) -> &str {
        "map"
    }

    fn set_hash<'a>(
        &'a self,
        key: &'a str,
        entries: &'a [HashEntry],
        ttl: Option<Duration>,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut hashes = self.hashes.lock().unwrap();
            let hash = hashes.entry(key.to_string()).or_default();
            for e in entries {
                hash.insert(e.name.clone(), e.value.clone());
            }
            if let Some(ttl) = ttl {
                self.ttls.lock().unwrap().insert(key.to_string(), ttl);
            }
            Ok(())
        })
    }

    fn get_hash<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Vec<HashEntry>> {
        Box::pin(async move {
            Ok(self
                .fields(key)
                .into_iter()
                .map(HashEntry::from)
                .collect())
        })
    }

    fn get_field<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.fields(key).get(field).cloned()) })
    }

    fn expire<'a>(&'a self, key: &'a str, _at_ms: i64) -> StoreFuture<'a, bool> {
        Box::pin(async move { Ok(self.hashes.lock().unwrap().contains_key(key)) })
    }

    fn flush(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.hashes.lock().unwrap().clear();
            self.ttls.lock().unwrap().clear();
            Ok(())
        })
    }
}
