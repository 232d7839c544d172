//! Server Configuration Module
//!
//! Timings for the caches, the session store and the background sweeps.
//! Configuration is loaded from environment variables with defaults taken
//! from [`crate::constants`].

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_IMAGE_IDLE_SECS, DEFAULT_IMAGE_SCAN_SECS, DEFAULT_PREFERENCE_REFRESH_SECS,
    DEFAULT_PROPERTIES_PATH, DEFAULT_REGISTRATION_LIFETIME_SECS, DEFAULT_REGISTRATION_SWEEP_SECS,
    DEFAULT_SESSION_LIFETIME_SECS, DEFAULT_SESSION_SWEEP_SECS,
};

// ============================================================================
// SERVER CONFIGURATION
// ============================================================================

/// Configuration for the caching layer and its background tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Static build properties bundle (TOML).
    pub properties_path: PathBuf,

    /// Refresh interval of the preference cache.
    pub preference_refresh: Duration,

    /// Idle time after which a session token expires.
    pub session_lifetime: Duration,

    /// Period of the session sweep.
    pub session_sweep_period: Duration,

    /// Age after which an un-activated registration is deleted.
    pub registration_lifetime: Duration,

    /// Period of the registration sweep.
    pub registration_sweep_period: Duration,

    /// First delay and period of the unprocessed-image scan.
    pub image_scan_period: Duration,

    /// Sleep of the image worker when its queue is empty.
    pub image_idle: Duration,

    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            properties_path: PathBuf::from(DEFAULT_PROPERTIES_PATH),
            preference_refresh: Duration::from_secs(DEFAULT_PREFERENCE_REFRESH_SECS),
            session_lifetime: Duration::from_secs(DEFAULT_SESSION_LIFETIME_SECS),
            session_sweep_period: Duration::from_secs(DEFAULT_SESSION_SWEEP_SECS),
            registration_lifetime: Duration::from_secs(DEFAULT_REGISTRATION_LIFETIME_SECS),
            registration_sweep_period: Duration::from_secs(DEFAULT_REGISTRATION_SWEEP_SECS),
            image_scan_period: Duration::from_secs(DEFAULT_IMAGE_SCAN_SECS),
            image_idle: Duration::from_secs(DEFAULT_IMAGE_IDLE_SECS),
            log_json: true,
        }
    }
}

impl ServerConfig {
    /// Create ServerConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `FIELDSTORE_PROPERTIES_PATH`: Build properties TOML (default: /etc/fieldstore/build.toml)
    /// - `FIELDSTORE_PREFERENCE_REFRESH_SECS`: Preference cache refresh (default: 300)
    /// - `FIELDSTORE_SESSION_LIFETIME_SECS`: Session idle lifetime (default: 900)
    /// - `FIELDSTORE_SESSION_SWEEP_SECS`: Session sweep period (default: 60)
    /// - `FIELDSTORE_REGISTRATION_LIFETIME_SECS`: Registration lifetime (default: 86400)
    /// - `FIELDSTORE_REGISTRATION_SWEEP_SECS`: Registration sweep period (default: 3600)
    /// - `FIELDSTORE_IMAGE_SCAN_SECS`: Unprocessed image scan period (default: 30)
    /// - `FIELDSTORE_IMAGE_IDLE_SECS`: Image worker idle sleep (default: 300)
    /// - `FIELDSTORE_LOG_JSON`: JSON log output (default: true)
    ///
    /// Values that fail to parse fall back to their defaults.
    pub fn from_env() -> Self {
        let properties_path = std::env::var("FIELDSTORE_PROPERTIES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PROPERTIES_PATH));

        let log_json = std::env::var("FIELDSTORE_LOG_JSON")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            properties_path,
            preference_refresh: secs_from_env(
                "FIELDSTORE_PREFERENCE_REFRESH_SECS",
                DEFAULT_PREFERENCE_REFRESH_SECS,
            ),
            session_lifetime: secs_from_env(
                "FIELDSTORE_SESSION_LIFETIME_SECS",
                DEFAULT_SESSION_LIFETIME_SECS,
            ),
            session_sweep_period: secs_from_env(
                "FIELDSTORE_SESSION_SWEEP_SECS",
                DEFAULT_SESSION_SWEEP_SECS,
            ),
            registration_lifetime: secs_from_env(
                "FIELDSTORE_REGISTRATION_LIFETIME_SECS",
                DEFAULT_REGISTRATION_LIFETIME_SECS,
            ),
            registration_sweep_period: secs_from_env(
                "FIELDSTORE_REGISTRATION_SWEEP_SECS",
                DEFAULT_REGISTRATION_SWEEP_SECS,
            ),
            image_scan_period: secs_from_env("FIELDSTORE_IMAGE_SCAN_SECS", DEFAULT_IMAGE_SCAN_SECS),
            image_idle: secs_from_env("FIELDSTORE_IMAGE_IDLE_SECS", DEFAULT_IMAGE_IDLE_SECS),
            log_json,
        }
    }

    /// Create a configuration for development/testing with short periods.
    pub fn development() -> Self {
        Self {
            preference_refresh: Duration::from_secs(5),
            session_lifetime: Duration::from_secs(120),
            session_sweep_period: Duration::from_secs(10),
            registration_lifetime: Duration::from_secs(600),
            registration_sweep_period: Duration::from_secs(60),
            image_scan_period: Duration::from_secs(5),
            image_idle: Duration::from_secs(30),
            log_json: false,
            ..Self::default()
        }
    }
}

fn secs_from_env(var: &str, default: u64) -> Duration {
    Duration::from_secs(
        std::env::var(var)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(default),
    )
}
