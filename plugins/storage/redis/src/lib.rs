mod config;

use std::collections::BTreeMap;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use clock_api::{HashEntry, HashStore, StoreError, StoreFuture};

pub use config::RedisConfig;

// ════════════════════════════════════════════════════════════════
//  Error mapping
// ════════════════════════════════════════════════════════════════

/// Connectivity problems become `Io`, unparseable replies `Format`,
/// server-side error replies `Logic`. The command name is the context.
fn store_error(command: &str, e: RedisError) -> StoreError {
    let message = format!("{command}: {e}");
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        StoreError::io(message)
    } else if e.kind() == redis::ErrorKind::TypeError {
        StoreError::format_err(message)
    } else {
        StoreError::new(message)
    }
}

// ════════════════════════════════════════════════════════════════
//  RedisStore
// ════════════════════════════════════════════════════════════════

/// `HashStore` over one multiplexed connection to a Redis-compatible
/// server. Handles are cheap clones of the same connection; there is no
/// pool and no reconnect.
pub struct RedisStore {
    conn: MultiplexedConnection,
    label: String,
}

impl RedisStore {
    pub async fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        let addr = config.addr();
        let client = Client::open(config.connection_info()).map_err(|e| store_error("OPEN", e))?;
        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let conn = tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| StoreError::io(format!("connect to {addr}: timed out after {}ms", config.connect_timeout_ms)))?
            .map_err(|e| store_error("CONNECT", e).with_context(&addr))?;

        tracing::info!(addr = %addr, database = config.database, "redis store connected");
        Ok(Self {
            conn,
            label: format!("redis://{addr}/{}", config.database),
        })
    }
}

impl HashStore for RedisStore {
    fn name(&self) -> &str {
        &self.label
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
            let items: Vec<(&str, &str)> = entries
                .iter()
                .map(|e| (e.name.as_str(), e.value.as_str()))
                .collect();
            let mut conn = self.conn.clone();
            let _: () = conn
                .hset_multiple(key, items.as_slice())
                .await
                .map_err(|e| store_error("HMSET", e))?;

            if let Some(ttl) = ttl {
                let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
                let _: bool = redis::cmd("PEXPIRE")
                    .arg(key)
                    .arg(ms)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| store_error("PEXPIRE", e))?;
            }
            Ok(())
        })
    }

    fn get_hash<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Vec<HashEntry>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let fields: BTreeMap<String, String> =
                conn.hgetall(key).await.map_err(|e| store_error("HGETALL", e))?;
            Ok(fields.into_iter().map(HashEntry::from).collect())
        })
    }

    fn get_field<'a>(&'a self, key: &'a str, field: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let value: Option<String> = conn.hget(key, field).await.map_err(|e| store_error("HGET", e))?;
            Ok(value)
        })
    }

    fn expire<'a>(&'a self, key: &'a str, at_ms: i64) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let set: bool = redis::cmd("PEXPIREAT")
                .arg(key)
                .arg(at_ms)
                .query_async(&mut conn)
                .await
                .map_err(|e| store_error("PEXPIREAT", e))?;
            Ok(set)
        })
    }

    fn flush(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let mut conn = self.conn.clone();
            let _: () = redis::cmd("FLUSHDB")
                .query_async(&mut conn)
                .await
                .map_err(|e| store_error("FLUSHDB", e))?;
            tracing::debug!(store = %self.label, "flushed");
            Ok(())
        })
    }
}
