//! Constants for the fieldstore server
//!
//! This module contains all default timings used by the session store and
//! the background sweeps.

// ============================================================================
// PREFERENCES
// ============================================================================

/// Default refresh interval for the preference cache in seconds (5 minutes)
pub const DEFAULT_PREFERENCE_REFRESH_SECS: u64 = 300;

/// Default location of the static build properties bundle
pub const DEFAULT_PROPERTIES_PATH: &str = "/etc/fieldstore/build.toml";

// ============================================================================
// SESSIONS
// ============================================================================

/// Idle time after which a session token expires (15 minutes)
pub const DEFAULT_SESSION_LIFETIME_SECS: u64 = 900;

/// How often expired session tokens are swept (1 minute)
pub const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;

// ============================================================================
// REGISTRATIONS
// ============================================================================

/// Age after which an un-activated registration is deleted (24 hours)
pub const DEFAULT_REGISTRATION_LIFETIME_SECS: u64 = 86_400;

/// How often expired registrations are swept (1 hour)
pub const DEFAULT_REGISTRATION_SWEEP_SECS: u64 = 3_600;

// ============================================================================
// IMAGE PROCESSING
// ============================================================================

/// Delay before the first scan for unprocessed images, and the period after
pub const DEFAULT_IMAGE_SCAN_SECS: u64 = 30;

/// How long the image worker sleeps when its queue is empty (5 minutes)
pub const DEFAULT_IMAGE_IDLE_SECS: u64 = 300;

// ============================================================================
// LOGGING
// ============================================================================

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "fieldstore_server=debug,fieldstore_storage=info,info";
