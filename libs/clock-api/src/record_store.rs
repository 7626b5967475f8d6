use std::sync::Arc;
use std::time::Duration;

use crate::codec;
use crate::error::StoreError;
use crate::record::ClockRecord;
use crate::store::HashStore;

/// One hash key per record (`{prefix}{id}`), fields written by the codec.
pub struct RecordStore {
    store: Arc<dyn HashStore>,
    key_prefix: String,
}

impl RecordStore {
    pub fn new(store: Arc<dyn HashStore>, key_prefix: impl Into<String>) -> Self {
        Self { store, key_prefix: key_prefix.into() }
    }

    pub fn key(&self, id: &str) -> String {
        format!("{}{id}", self.key_prefix)
    }

    pub async fn store(&self, id: &str, clock: &ClockRecord, ttl: Option<Duration>) -> Result<(), StoreError> {
        let key = self.key(id);
        let entries = codec::encode(clock);
        self.store.set_hash(&key, &entries, ttl).await
    }

    /// `None` when the key holds no fields (missing or expired).
    pub async fn load(&self, id: &str) -> Result<Option<ClockRecord>, StoreError> {
        let key = self.key(id);
        let entries = self.store.get_hash(&key).await?;
        if entries.is_empty() {
            return Ok(None);
        }
        let clock = codec::decode(&entries).map_err(|e| e.with_context(&key))?;
        Ok(Some(clock))
    }

    pub async fn flush(&self) -> Result<(), StoreError> {
        self.store.flush().await
    }
}
