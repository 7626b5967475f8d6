use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;
use crate::record::HashEntry;
use crate::store::HashStore;

/// Typed convenience layer over a `HashStore`.
///
/// Every hash field value is one serde value stored as a JSON document,
/// so many records can share a single hash key (one field per record id).
/// `key_prefix` is prepended to every key the layer touches.
pub struct TypedCache {
    store: Arc<dyn HashStore>,
    key_prefix: String,
}

impl TypedCache {
    pub fn new(store: Arc<dyn HashStore>) -> Self {
        Self { store, key_prefix: String::new() }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    /// Serialize every item and write them into `key` with one `set_hash`.
    pub async fn hash_set_all<'i, T, I>(&self, key: &str, items: I, ttl: Option<Duration>) -> Result<usize, StoreError>
    where
        T: Serialize + 'i,
        I: IntoIterator<Item = (&'i str, &'i T)>,
    {
        let entries = items
            .into_iter()
            .map(|(field, value)| -> Result<HashEntry, StoreError> {
                Ok(HashEntry::new(field, serde_json::to_string(value)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let key = self.key(key);
        self.store.set_hash(&key, &entries, ttl).await?;
        tracing::debug!(key = %key, fields = entries.len(), "hash_set_all");
        Ok(entries.len())
    }

    /// One field of `key`, deserialized. `None` if key or field is missing.
    pub async fn hash_get<T: DeserializeOwned>(&self, key: &str, field: &str) -> Result<Option<T>, StoreError> {
        let key = self.key(key);
        match self.store.get_field(&key, field).await? {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .map_err(|e| StoreError::from(e).with_context(format!("{key}/{field}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Every field of `key`, deserialized, in store order.
    pub async fn hash_get_all<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<(String, T)>, StoreError> {
        let key = self.key(key);
        let entries = self.store.get_hash(&key).await?;
        entries
            .into_iter()
            .map(|e| -> Result<(String, T), StoreError> {
                let value = serde_json::from_str(&e.value)
                    .map_err(|err| StoreError::from(err).with_context(format!("{key}/{}", e.name)))?;
                Ok((e.name, value))
            })
            .collect()
    }

    /// Set an absolute deadline on `key`. `false` if the key does not exist.
    pub async fn expire_at(&self, key: &str, at_ms: i64) -> Result<bool, StoreError> {
        self.store.expire(&self.key(key), at_ms).await
    }

    pub async fn flush(&self) -> Result<(), StoreError> {
        self.store.flush().await
    }
}
