//! Refresh timing for expiring caches.
//!
//! A [`RefreshGate`] owns nothing but a timestamp and an interval. It answers
//! one question, "is a refresh due?", and is updated only by the cache that
//! owns it after a successful reload.

use fieldstore_core::{ConfigError, Timestamp, MIN_REFRESH_INTERVAL};
use std::time::Duration;

/// Refresh timestamp plus interval for one cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshGate {
    /// `None` until the first successful refresh.
    last_refreshed_at: Option<Timestamp>,
    refresh_interval: Duration,
}

impl RefreshGate {
    /// Create a gate that is immediately stale.
    ///
    /// Intervals below [`MIN_REFRESH_INTERVAL`] are rejected.
    pub fn new(refresh_interval: Duration) -> Result<Self, ConfigError> {
        if refresh_interval < MIN_REFRESH_INTERVAL {
            return Err(ConfigError::RefreshIntervalTooLow {
                interval_ms: refresh_interval.as_millis(),
                minimum_ms: MIN_REFRESH_INTERVAL.as_millis(),
            });
        }
        Ok(Self {
            last_refreshed_at: None,
            refresh_interval,
        })
    }

    /// True if never refreshed or `now >= last_refreshed_at + refresh_interval`.
    pub fn is_stale(&self, now: Timestamp) -> bool {
        match self.last_refreshed_at {
            None => true,
            Some(last) => match chrono::Duration::from_std(self.refresh_interval) {
                Ok(interval) => match last.checked_add_signed(interval) {
                    Some(due) => now >= due,
                    None => false,
                },
                Err(_) => false,
            },
        }
    }

    /// Record a successful refresh at `now`.
    pub fn mark_refreshed(&mut self, now: Timestamp) {
        self.last_refreshed_at = Some(now);
    }

    pub fn last_refreshed_at(&self) -> Option<Timestamp> {
        self.last_refreshed_at
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}
