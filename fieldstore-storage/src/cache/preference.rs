//! Server preferences: the preference table plus static build properties.
//!
//! Dynamic keys behave exactly like any [`ValueCache`] lookup. The static
//! keys listed in [`fieldstore_core::keys::STATIC_KEYS`] are answered from a
//! properties bundle read once at startup and never hit the backing store.
//!
//! The bundle is a TOML file:
//!
//! ```toml
//! [build]
//! name = "fieldstore"
//! version = "2.16.0"
//! build = "a1b2c3d"
//! ssl_enabled = true
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use fieldstore_core::keys::{
    is_static_key, APPLICATION_BUILD, APPLICATION_NAME, APPLICATION_VERSION, SSL_ENABLED,
};
use fieldstore_core::{CacheError, ConfigError, FieldstoreError, FieldstoreResult};
use serde::Deserialize;

use super::traits::{CacheStats, PreferenceLookup};
use super::value_cache::ValueCache;

#[derive(Debug, Deserialize)]
struct PropertiesFile {
    #[serde(default)]
    build: BuildSection,
}

#[derive(Debug, Default, Deserialize)]
struct BuildSection {
    name: Option<String>,
    version: Option<String>,
    build: Option<String>,
    ssl_enabled: Option<bool>,
}

/// Build properties fixed for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticProperties {
    values: HashMap<String, String>,
}

impl StaticProperties {
    /// Read the properties bundle from a TOML file.
    pub fn load(path: &Path) -> FieldstoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidValue {
            field: "properties_path".to_string(),
            value: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&raw).map_err(|e| {
            let reason = match e {
                ConfigError::InvalidValue { reason, .. } => reason,
                other => other.to_string(),
            };
            FieldstoreError::from(ConfigError::InvalidValue {
                field: "properties_path".to_string(),
                value: path.display().to_string(),
                reason,
            })
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: PropertiesFile = toml::from_str(raw).map_err(|e| ConfigError::InvalidValue {
            field: "properties".to_string(),
            value: String::new(),
            reason: e.to_string(),
        })?;

        let section = file.build;
        let mut values = HashMap::new();
        if let Some(name) = section.name {
            values.insert(APPLICATION_NAME.to_string(), name);
        }
        if let Some(version) = section.version {
            values.insert(APPLICATION_VERSION.to_string(), version);
        }
        if let Some(build) = section.build {
            values.insert(APPLICATION_BUILD.to_string(), build);
        }
        if let Some(ssl) = section.ssl_enabled {
            values.insert(SSL_ENABLED.to_string(), ssl.to_string());
        }
        Ok(Self { values })
    }

    /// Build from explicit pairs. Keys that are not static keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| -> (String, String) { (k.into(), v.into()) })
            .filter(|(k, _)| is_static_key(k))
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Preference cache with static build properties merged in.
#[derive(Debug)]
pub struct PreferenceStore {
    dynamic: ValueCache,
    statics: StaticProperties,
}

impl PreferenceStore {
    pub fn new(dynamic: ValueCache, statics: StaticProperties) -> Self {
        Self { dynamic, statics }
    }

    /// Value for `key`. Static keys never touch the backing store.
    pub fn lookup(&self, key: &str) -> FieldstoreResult<String> {
        if is_static_key(key) {
            return self
                .statics
                .get(key)
                .map(str::to_string)
                .ok_or_else(|| {
                    CacheError::Miss {
                        cache: self.dynamic.name().to_string(),
                        key: key.to_string(),
                    }
                    .into()
                });
        }
        self.dynamic.lookup(key)
    }

    /// Dynamic keys plus the static keys present in the bundle.
    pub fn keys(&self) -> BTreeSet<String> {
        let mut keys = self.dynamic.keys();
        keys.extend(self.statics.values.keys().cloned());
        keys
    }

    pub fn statics(&self) -> &StaticProperties {
        &self.statics
    }

    pub fn stats(&self) -> CacheStats {
        self.dynamic.stats()
    }
}

impl PreferenceLookup for PreferenceStore {
    fn lookup(&self, key: &str) -> FieldstoreResult<String> {
        PreferenceStore::lookup(self, key)
    }
}
