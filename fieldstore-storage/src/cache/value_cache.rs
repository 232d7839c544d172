//! String-to-string cache over a backing-store table.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use fieldstore_core::{CacheError, Clock, FieldstoreResult};

use super::snapshot::RefreshingSnapshot;
use super::traits::{CacheStats, KeyValueSource};

/// Caches an entire key/value table and reloads it once per interval.
pub struct ValueCache {
    source: Arc<dyn KeyValueSource>,
    snapshot: RefreshingSnapshot<HashMap<String, String>>,
}

impl ValueCache {
    /// Create a cache that loads lazily on first lookup.
    ///
    /// Fails if `refresh_interval` is below the minimum.
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn KeyValueSource>,
        clock: Arc<dyn Clock>,
        refresh_interval: Duration,
    ) -> FieldstoreResult<Self> {
        Ok(Self {
            source,
            snapshot: RefreshingSnapshot::new(name, clock, refresh_interval)?,
        })
    }

    pub fn name(&self) -> &str {
        self.snapshot.name()
    }

    /// Value for `key`, refreshing first if the snapshot is stale.
    pub fn lookup(&self, key: &str) -> FieldstoreResult<String> {
        let map = self.current();
        match map.get(key) {
            Some(value) => {
                self.snapshot.record_hit();
                Ok(value.clone())
            }
            None => {
                self.snapshot.record_miss();
                Err(CacheError::Miss {
                    cache: self.name().to_string(),
                    key: key.to_string(),
                }
                .into())
            }
        }
    }

    /// All known keys, refreshing first if the snapshot is stale.
    pub fn keys(&self) -> BTreeSet<String> {
        self.current().keys().cloned().collect()
    }

    /// Reload now if the refresh interval has elapsed.
    ///
    /// Returns true if a new snapshot was installed.
    pub fn refresh_if_stale(&self) -> bool {
        self.snapshot.refresh_if_stale(|| self.build())
    }

    /// Entries in the live snapshot, without triggering a refresh.
    pub fn snapshot_len(&self) -> usize {
        self.snapshot.snapshot().len()
    }

    pub fn stats(&self) -> CacheStats {
        self.snapshot.stats(self.snapshot_len())
    }

    fn current(&self) -> Arc<HashMap<String, String>> {
        self.snapshot.load(|| self.build())
    }

    fn build(&self) -> Result<HashMap<String, String>, super::SourceError> {
        let pairs = self.source.load_pairs()?;
        let mut map = HashMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            if let Some(previous) = map.insert(key.clone(), value) {
                tracing::debug!(
                    cache = %self.name(),
                    key = %key,
                    discarded = %previous,
                    "Duplicate key in backing store; keeping the later row"
                );
            }
        }
        Ok(map)
    }
}

impl std::fmt::Debug for ValueCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCache")
            .field("name", &self.name())
            .field("entries", &self.snapshot_len())
            .finish()
    }
}
