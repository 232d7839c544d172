//! Fieldstore Core - Shared Types
//!
//! Pure data structures shared by the cache, sharding and session layers.
//! This crate performs no I/O; every other fieldstore crate depends on it.

pub mod clock;
pub mod error;
pub mod identity;
pub mod keys;
pub mod media;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{
    CacheError, ConfigError, FieldstoreError, FieldstoreResult, SessionError, ShardError,
    StoreError,
};
pub use identity::{Timestamp, UserSnapshot};
pub use media::{ImageSize, MediaKind};

use std::time::Duration;

// ============================================================================
// LIMITS
// ============================================================================

/// Smallest refresh interval any expiring cache accepts.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(1000);

/// Number of random bytes in a session token (128 bits).
pub const SESSION_TOKEN_BYTES: usize = 16;
