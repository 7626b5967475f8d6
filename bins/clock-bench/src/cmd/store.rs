use std::sync::Arc;

use clock_api::HashStore;
use storage_memory::MemoryStore;
use storage_redis::RedisStore;

use super::config::{Backend, StoreSection};
use super::error::BenchError;

/// Open a store handle for one logical database.
///
/// The memory backend has no databases: every call returns a fresh,
/// separate namespace, which gives each layout its own map.
pub async fn open_store(section: &StoreSection, database: u32) -> Result<Arc<dyn HashStore>, BenchError> {
    let store: Arc<dyn HashStore> = match section.backend {
        Backend::Memory => Arc::new(MemoryStore::new(&section.memory)),
        Backend::Redis => {
            let config = section.redis.clone().with_database(database);
            let store = RedisStore::connect(&config)
                .await
                .map_err(|e| e.with_context(format!("database {database}")))?;
            Arc::new(store)
        }
    };
    tracing::info!(store = %store.name(), "store opened");
    Ok(store)
}
