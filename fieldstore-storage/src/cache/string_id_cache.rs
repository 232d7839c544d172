//! Bidirectional string/id cache for enumeration tables.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use fieldstore_core::{CacheError, Clock, FieldstoreResult};

use super::bidirectional::BidirectionalMap;
use super::snapshot::RefreshingSnapshot;
use super::traits::{CacheStats, SourceError, StringIdSource};

/// Caches a label/id enumeration and resolves it in both directions.
pub struct StringIdCache {
    source: Arc<dyn StringIdSource>,
    snapshot: RefreshingSnapshot<BidirectionalMap<String, i64>>,
}

impl StringIdCache {
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn StringIdSource>,
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

    /// Id for `label`.
    pub fn lookup_id(&self, label: &str) -> FieldstoreResult<i64> {
        let map = self.current();
        match map.get_by_key(label) {
            Some(id) => {
                self.snapshot.record_hit();
                Ok(*id)
            }
            None => Err(self.miss(label)),
        }
    }

    /// Label for `id`.
    pub fn reverse_lookup(&self, id: i64) -> FieldstoreResult<String> {
        let map = self.current();
        match map.get_by_value(&id) {
            Some(label) => {
                self.snapshot.record_hit();
                Ok(label.clone())
            }
            None => Err(self.miss(&id.to_string())),
        }
    }

    /// All known labels.
    pub fn keys(&self) -> BTreeSet<String> {
        self.current().keys().cloned().collect()
    }

    pub fn refresh_if_stale(&self) -> bool {
        self.snapshot.refresh_if_stale(|| self.build())
    }

    pub fn snapshot_len(&self) -> usize {
        self.snapshot.snapshot().len()
    }

    pub fn stats(&self) -> CacheStats {
        self.snapshot.stats(self.snapshot_len())
    }

    fn current(&self) -> Arc<BidirectionalMap<String, i64>> {
        self.snapshot.load(|| self.build())
    }

    fn miss(&self, key: &str) -> fieldstore_core::FieldstoreError {
        self.snapshot.record_miss();
        CacheError::Miss {
            cache: self.name().to_string(),
            key: key.to_string(),
        }
        .into()
    }

    fn build(&self) -> Result<BidirectionalMap<String, i64>, SourceError> {
        let pairs = self.source.load_pairs()?;
        let mut map = BidirectionalMap::with_capacity(pairs.len());
        for (label, id) in pairs {
            if map.insert(label.clone(), id) {
                tracing::debug!(
                    cache = %self.name(),
                    label = %label,
                    id,
                    "Duplicate label or id in backing store; keeping the later row"
                );
            }
        }
        Ok(map)
    }
}

impl std::fmt::Debug for StringIdCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringIdCache")
            .field("name", &self.name())
            .field("entries", &self.snapshot_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldstore_core::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Rows {
        rows: Mutex<Vec<(String, i64)>>,
        calls: AtomicUsize,
    }

    impl Rows {
        fn new(rows: &[(&str, i64)]) -> Arc<Self> {
            Arc::new(Self {
                rows: Mutex::new(rows.iter().map(|(l, i)| (l.to_string(), *i)).collect()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl StringIdSource for Rows {
        fn load_pairs(&self) -> Result<Vec<(String, i64)>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    fn cache(rows: Arc<Rows>) -> StringIdCache {
        StringIdCache::new(
            "campaign running states",
            rows,
            Arc::new(ManualClock::starting_now()),
            Duration::from_secs(300),
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let cache = cache(Rows::new(&[("running", 1), ("stopped", 2)]));
        for label in ["running", "stopped"] {
            let id = cache.lookup_id(label).unwrap();
            assert_eq!(cache.reverse_lookup(id).unwrap(), label);
        }
    }

    #[test]
    fn test_unknown_in_either_direction_misses() {
        let cache = cache(Rows::new(&[("running", 1)]));
        assert!(cache.lookup_id("paused").unwrap_err().is_client_error());
        assert!(cache.reverse_lookup(99).unwrap_err().is_client_error());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_one_query_serves_both_directions() {
        let rows = Rows::new(&[("running", 1)]);
        let cache = cache(rows.clone());
        cache.lookup_id("running").unwrap();
        cache.reverse_lookup(1).unwrap();
        cache.keys();
        assert_eq!(rows.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reused_id_keeps_later_label() {
        let cache = cache(Rows::new(&[("old", 7), ("new", 7)]));
        assert_eq!(cache.reverse_lookup(7).unwrap(), "new");
        assert!(cache.lookup_id("old").is_err());
        assert_eq!(cache.snapshot_len(), 1);
    }
}
