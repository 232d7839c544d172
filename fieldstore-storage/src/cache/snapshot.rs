//! Shared refresh machinery for the snapshot caches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use fieldstore_core::{CacheError, Clock, FieldstoreResult};

use super::freshness::RefreshGate;
use super::traits::{CacheStats, SourceError};

/// An immutable map snapshot that is rebuilt when its gate goes stale.
pub(crate) struct RefreshingSnapshot<M> {
    name: String,
    clock: Arc<dyn Clock>,
    current: RwLock<Arc<M>>,
    gate: RwLock<RefreshGate>,
    /// Serializes reloads. Held across the single backing-store query.
    refresh_lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
}

impl<M: Default> RefreshingSnapshot<M> {
    pub(crate) fn new(
        name: impl Into<String>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> FieldstoreResult<Self> {
        Ok(Self {
            name: name.into(),
            clock,
            current: RwLock::new(Arc::new(M::default())),
            gate: RwLock::new(RefreshGate::new(interval)?),
            refresh_lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            refresh_failures: AtomicU64::new(0),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn is_stale(&self) -> bool {
        let now = self.clock.now();
        self.gate
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_stale(now)
    }

    /// Reload if stale, then return the live snapshot.
    pub(crate) fn load<F>(&self, build: F) -> Arc<M>
    where
        F: FnOnce() -> Result<M, SourceError>,
    {
        self.refresh_if_stale(build);
        self.snapshot()
    }

    /// The live snapshot, without checking staleness.
    pub(crate) fn snapshot(&self) -> Arc<M> {
        Arc::clone(&self.current.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Reload from the backing store if the refresh interval has elapsed.
    ///
    /// Returns true if this call installed a new snapshot.
    pub(crate) fn refresh_if_stale<F>(&self, build: F) -> bool
    where
        F: FnOnce() -> Result<M, SourceError>,
    {
        if !self.is_stale() {
            return false;
        }

        let _guard = self.refresh_lock.lock().unwrap_or_else(|e| e.into_inner());

        // Another caller may have finished the reload while we waited.
        if !self.is_stale() {
            return false;
        }

        let started = self.clock.now();
        match build() {
            Ok(map) => {
                *self.current.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(map);
                self.gate
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .mark_refreshed(self.clock.now());
                self.refreshes.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    cache = %self.name,
                    started_at = %started,
                    "Cache snapshot refreshed"
                );
                true
            }
            Err(e) => {
                self.refresh_failures.fetch_add(1, Ordering::Relaxed);
                let err = CacheError::BackingStoreUnavailable {
                    cache: self.name.clone(),
                    reason: e.to_string(),
                };
                tracing::error!(error = %err, "Aborting cache refresh; keeping previous snapshot");
                false
            }
        }
    }

    pub(crate) fn stats(&self, entry_count: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: entry_count as u64,
            refreshes: self.refreshes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
}
