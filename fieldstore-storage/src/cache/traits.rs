//! Backing-store traits and cache statistics.
//!
//! Caches depend only on these narrow, synchronous traits. The relational
//! layer that actually answers the queries lives outside this crate.

use fieldstore_core::{ConfigError, FieldstoreResult};
use thiserror::Error;

/// Failure reported by a backing store while loading a table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

/// Source of string-to-string pairs, e.g. the preference table.
pub trait KeyValueSource: Send + Sync {
    /// Load every pair in one query.
    fn load_pairs(&self) -> Result<Vec<(String, String)>, SourceError>;
}

/// Source of string-to-integer pairs, e.g. an enumeration table.
pub trait StringIdSource: Send + Sync {
    /// Load every pair in one query.
    fn load_pairs(&self) -> Result<Vec<(String, i64)>, SourceError>;
}

/// Read access to configuration values.
///
/// Implemented by [`PreferenceStore`](super::PreferenceStore); consumed by the
/// directory allocator so it can be tested with a plain map.
pub trait PreferenceLookup: Send + Sync {
    fn lookup(&self, key: &str) -> FieldstoreResult<String>;

    /// Look up `key` and parse it as an unsigned integer.
    fn lookup_u32(&self, key: &str) -> FieldstoreResult<u32> {
        let raw = self.lookup(key)?;
        raw.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::InvalidValue {
                field: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Look up `key` and parse it as a boolean (`true`/`false`).
    fn lookup_bool(&self, key: &str) -> FieldstoreResult<bool> {
        let raw = self.lookup(key)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                field: key.to_string(),
                value: raw,
                reason: "expected true or false".to_string(),
            }
            .into()),
        }
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the snapshot.
    pub hits: u64,
    /// Lookups for unknown keys.
    pub misses: u64,
    /// Entries in the live snapshot.
    pub entry_count: u64,
    /// Successful reloads.
    pub refreshes: u64,
    /// Reloads that failed and kept the previous snapshot.
    pub refresh_failures: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldstore_core::{CacheError, FieldstoreError};
    use std::collections::HashMap;

    struct MapLookup(HashMap<&'static str, &'static str>);

    impl PreferenceLookup for MapLookup {
        fn lookup(&self, key: &str) -> FieldstoreResult<String> {
            self.0.get(key).map(|v| v.to_string()).ok_or_else(|| {
                CacheError::Miss {
                    cache: "map".to_string(),
                    key: key.to_string(),
                }
                .into()
            })
        }
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);
        assert!((CacheStats::default().hit_rate() - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_typed_lookups() {
        let prefs = MapLookup(HashMap::from([
            ("fanout", " 1000 "),
            ("ssl", "TRUE"),
            ("broken", "lots"),
        ]));

        assert_eq!(prefs.lookup_u32("fanout").unwrap(), 1000);
        assert!(prefs.lookup_bool("ssl").unwrap());

        let err = prefs.lookup_u32("broken").unwrap_err();
        assert!(matches!(
            err,
            FieldstoreError::Config(ConfigError::InvalidValue { .. })
        ));
        assert!(prefs.lookup_bool("broken").is_err());
        assert!(prefs.lookup_u32("missing").unwrap_err().is_client_error());
    }
}
