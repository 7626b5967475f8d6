pub mod cache;
pub mod codec;
pub mod error;
pub mod record;
pub mod record_store;
pub mod store;
pub mod util;

#[cfg(test)]
mod testing;

pub use cache::TypedCache;
pub use codec::{decode, encode};
pub use error::{ErrorKind, StoreError};
pub use record::{ClockRecord, HashEntry};
pub use record_store::RecordStore;
pub use store::{HashStore, StoreFuture};
pub use util::now_ms;
