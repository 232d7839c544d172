//! Fieldstore Storage - Caches and Directory Sharding
//!
//! Two independent building blocks sit on top of `fieldstore-core`:
//!
//! - [`cache`]: refresh-on-expiry caches over slowly changing backing-store
//!   tables (preferences, enumerated string/id pairs).
//! - [`shard`]: allocation of writable leaf directories in a bounded-fanout
//!   numbered tree, one tree per media kind.
//!
//! Both are synchronous. Callers that live on an async runtime wrap them in
//! `spawn_blocking` the same way they wrap any other blocking I/O.
//!
//! [`store`] holds the record-store traits the background jobs work against.

pub mod cache;
pub mod shard;
pub mod store;

pub use cache::{
    BidirectionalMap, CacheStats, KeyValueSource, PreferenceLookup, PreferenceStore,
    RefreshGate, SourceError, StaticProperties, StringIdCache, StringIdSource, ValueCache,
};
pub use shard::{ShardState, ShardedDirectoryAllocator};
pub use store::{ImageStore, RegistrationStore};
