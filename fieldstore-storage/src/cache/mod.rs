//! Refresh-on-expiry caches over backing-store tables.
//!
//! Every cache here holds a full copy of a small table and reloads it in one
//! query once its refresh interval has elapsed. Lookups never block on the
//! backing store unless a refresh is due.
//!
//! # Design
//!
//! - The live map is an immutable snapshot behind an `Arc`. A refresh builds
//!   a brand new map and swaps the pointer, so readers never observe a
//!   partially populated map.
//! - A refresh is double-checked: the staleness test is repeated under a
//!   per-cache mutex, so concurrent callers that notice the same expiry cause
//!   exactly one backing-store query.
//! - A failed refresh logs, keeps the previous snapshot and leaves the
//!   refresh timestamp untouched, so the next lookup retries.
//!
//! # Example
//!
//! ```ignore
//! let cache = ValueCache::new(
//!     "campaign privacy states",
//!     Arc::new(privacy_state_source),
//!     Arc::new(SystemClock),
//!     Duration::from_secs(300),
//! )?;
//!
//! let description = cache.lookup("shared")?;
//! ```

pub mod bidirectional;
pub mod freshness;
pub mod preference;
mod snapshot;
pub mod string_id_cache;
pub mod traits;
pub mod value_cache;

pub use bidirectional::BidirectionalMap;
pub use freshness::RefreshGate;
pub use preference::{PreferenceStore, StaticProperties};
pub use string_id_cache::StringIdCache;
pub use traits::{CacheStats, KeyValueSource, PreferenceLookup, SourceError, StringIdSource};
pub use value_cache::ValueCache;
