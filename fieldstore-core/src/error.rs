//! Error types for fieldstore operations

use std::path::PathBuf;
use thiserror::Error;

/// Cache lookup and refresh errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Unknown key in {cache}: {key}")]
    Miss { cache: String, key: String },

    #[error("Backing store for {cache} unavailable: {reason}")]
    BackingStoreUnavailable { cache: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Refresh interval {interval_ms}ms is below the {minimum_ms}ms minimum")]
    RefreshIntervalTooLow { interval_ms: u128, minimum_ms: u128 },

    #[error("Root directory does not exist: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Root path is not a directory: {path}")]
    RootNotDirectory { path: PathBuf },
}

/// Directory sharding errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShardError {
    #[error("Directory structure under {root} is full")]
    StructureExhausted { root: PathBuf },

    #[error("Potential breach of directory structure at {path}: {reason}")]
    IntegrityViolation { path: PathBuf, reason: String },

    #[error("Filesystem error at {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

/// Session store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Generated session token already exists")]
    TokenCollision,
}

/// Errors reported by external stores (registrations, images).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store operation {operation} failed: {reason}")]
    OperationFailed { operation: String, reason: String },

    #[error("Invalid content for {id}: {reason}")]
    InvalidContent { id: String, reason: String },
}

/// Master error type for all fieldstore errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldstoreError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Shard error: {0}")]
    Shard(#[from] ShardError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl FieldstoreError {
    /// True when the error stems from caller input rather than server state.
    ///
    /// An unknown cache key means the request named something that does not
    /// exist, so it maps to a client error at the HTTP boundary.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Cache(CacheError::Miss { .. }))
    }

    /// True for errors that indicate corrupted shared state.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            Self::Shard(ShardError::IntegrityViolation { .. })
                | Self::Session(SessionError::TokenCollision)
        )
    }
}

/// Result type alias for fieldstore operations.
pub type FieldstoreResult<T> = Result<T, FieldstoreError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_miss_display() {
        let err = CacheError::Miss {
            cache: "campaign privacy states".to_string(),
            key: "hidden".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("campaign privacy states"));
        assert!(msg.contains("hidden"));
    }

    #[test]
    fn test_config_error_display_interval_too_low() {
        let err = ConfigError::RefreshIntervalTooLow {
            interval_ms: 10,
            minimum_ms: 1000,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("10ms"));
        assert!(msg.contains("1000ms"));
    }

    #[test]
    fn test_shard_error_display_exhausted() {
        let err = ShardError::StructureExhausted {
            root: PathBuf::from("/data/images"),
        };
        assert!(format!("{}", err).contains("/data/images"));
    }

    #[test]
    fn test_fieldstore_error_from_variants() {
        let cache = FieldstoreError::from(CacheError::Miss {
            cache: "c".to_string(),
            key: "k".to_string(),
        });
        assert!(matches!(cache, FieldstoreError::Cache(_)));

        let config = FieldstoreError::from(ConfigError::MissingRequired {
            field: "image_directory".to_string(),
        });
        assert!(matches!(config, FieldstoreError::Config(_)));

        let shard = FieldstoreError::from(ShardError::Io {
            path: PathBuf::from("/tmp"),
            reason: "denied".to_string(),
        });
        assert!(matches!(shard, FieldstoreError::Shard(_)));

        let session = FieldstoreError::from(SessionError::TokenCollision);
        assert!(matches!(session, FieldstoreError::Session(_)));

        let store = FieldstoreError::from(StoreError::InvalidContent {
            id: "img-1".to_string(),
            reason: "truncated".to_string(),
        });
        assert!(matches!(store, FieldstoreError::Store(_)));
    }

    #[test]
    fn test_classification() {
        let miss = FieldstoreError::from(CacheError::Miss {
            cache: "c".to_string(),
            key: "k".to_string(),
        });
        assert!(miss.is_client_error());
        assert!(!miss.is_integrity_violation());

        let breach = FieldstoreError::from(ShardError::IntegrityViolation {
            path: PathBuf::from("/data/x"),
            reason: "not a number".to_string(),
        });
        assert!(breach.is_integrity_violation());
        assert!(!breach.is_client_error());

        let collision = FieldstoreError::from(SessionError::TokenCollision);
        assert!(collision.is_integrity_violation());

        let unavailable = FieldstoreError::from(CacheError::BackingStoreUnavailable {
            cache: "c".to_string(),
            reason: "down".to_string(),
        });
        assert!(!unavailable.is_client_error());
    }
}
