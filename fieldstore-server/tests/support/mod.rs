//! Shared setup for the server integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use fieldstore_server::{ServerBackends, ServerConfig, ServerState};
use fieldstore_storage::StaticProperties;
use fieldstore_test_utils::*;

pub struct Harness {
    pub state: ServerState,
    pub clock: Arc<ManualClock>,
    pub preferences: Arc<MockKeyValueSource>,
    pub registrations: Arc<InMemoryRegistrationStore>,
    pub images: Arc<InMemoryImageStore>,
    pub privacy_states: Arc<MockStringIdSource>,
}

/// Test configuration with short sweep periods.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        preference_refresh: Duration::from_secs(60),
        session_lifetime: Duration::from_secs(15 * 60),
        session_sweep_period: Duration::from_secs(60),
        registration_lifetime: Duration::from_secs(24 * 3600),
        registration_sweep_period: Duration::from_secs(3600),
        image_scan_period: Duration::from_secs(30),
        image_idle: Duration::from_secs(300),
        log_json: false,
        ..ServerConfig::default()
    }
}

/// Start a server whose media roots live under `base`.
pub fn start(base: &Path, fanout: u32, file_depth: u32, document_depth: u32) -> Harness {
    start_with_config(base, fanout, file_depth, document_depth, test_config())
}

pub fn start_with_config(
    base: &Path,
    fanout: u32,
    file_depth: u32,
    document_depth: u32,
    config: ServerConfig,
) -> Harness {
    let mut rows = vec![
        (keys::MAX_FILES_PER_DIR.to_string(), fanout.to_string()),
        (keys::FILE_HIERARCHY_DEPTH.to_string(), file_depth.to_string()),
        (keys::DOCUMENT_DEPTH.to_string(), document_depth.to_string()),
    ];
    for kind in MediaKind::ALL {
        let root = base.join(kind.as_str());
        std::fs::create_dir_all(&root).unwrap();
        rows.push((kind.root_key().to_string(), root.display().to_string()));
    }

    let clock = Arc::new(ManualClock::starting_now());
    let preferences = Arc::new(MockKeyValueSource::new(rows));
    let registrations = Arc::new(InMemoryRegistrationStore::new());
    let images = Arc::new(InMemoryImageStore::new());
    let privacy_states = Arc::new(MockStringIdSource::new([("private", 1), ("shared", 2)]));

    let statics =
        StaticProperties::from_toml_str(&fixtures::build_properties("2.17.0")).unwrap();
    let backends = ServerBackends {
        preferences: preferences.clone(),
        registrations: registrations.clone(),
        images: images.clone(),
        enumerations: vec![(
            "privacy_states".to_string(),
            privacy_states.clone() as Arc<dyn StringIdSource>,
        )],
    };

    let state = ServerState::start_with_statics(config, backends, statics, clock.clone()).unwrap();

    Harness {
        state,
        clock,
        preferences,
        registrations,
        images,
        privacy_states,
    }
}

/// Write an empty file called `name` into `dir`.
pub fn store_file(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"").unwrap();
}

/// Sorted entry names of `dir`.
pub fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
