use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::StoreError;
use crate::record::HashEntry;

/// Boxed future returned by every `HashStore` method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Hash-capable key-value store client.
///
/// One instance addresses one logical namespace (a Redis database, a
/// separate in-memory map). Callers issue one operation at a time;
/// connection handling and any retry logic belong to the backend.
pub trait HashStore: Send + Sync {
    /// Short backend label for logs.
    fn name(&self) -> &str;

    /// Upsert `entries` into the hash at `key`. With `ttl` the key expires
    /// that long after the write.
    fn set_hash<'a>(
        &'a self,
        key: &'a str,
        entries: &'a [HashEntry],
        ttl: Option<Duration>,
    ) -> StoreFuture<'a, ()>;

    /// All fields of the hash at `key`; empty if the key does not exist.
    fn get_hash<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Vec<HashEntry>>;

    /// A single field of the hash at `key`.
    fn get_field<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>>;

    /// Expire `key` at `at_ms` (Unix ms). Returns `false` if the key is missing.
    fn expire<'a>(&'a self, key: &'a str, at_ms: i64) -> StoreFuture<'a, bool>;

    /// Drop every key of the namespace.
    fn flush(&self) -> StoreFuture<'_, ()>;
}
