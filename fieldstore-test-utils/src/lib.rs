//! Fieldstore Test Utilities
//!
//! Centralized test infrastructure for the fieldstore workspace:
//! - Mock backing stores with failure switches and call counters
//! - Proptest generators for users and cache tables
//! - Test fixtures for common scenarios
//! - Custom assertions for fieldstore-specific errors

// Re-export core types for convenience
pub use fieldstore_core::{
    keys, CacheError, Clock, ConfigError, FieldstoreError, FieldstoreResult, ImageSize,
    ManualClock, MediaKind, SessionError, ShardError, StoreError, Timestamp, UserSnapshot,
};
pub use fieldstore_storage::{
    ImageStore, KeyValueSource, PreferenceLookup, RegistrationStore, SourceError,
    StringIdSource,
};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ============================================================================
// MOCK SOURCES
// ============================================================================

/// Shared behaviour of the mock table sources.
#[derive(Debug)]
struct MockTable<V> {
    rows: Mutex<Vec<(String, V)>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl<V: Clone> MockTable<V> {
    fn new(rows: Vec<(String, V)>) -> Self {
        Self {
            rows: Mutex::new(rows),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    fn load(&self) -> Result<Vec<(String, V)>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("mock source switched off".to_string()));
        }
        Ok(locked(&self.rows).clone())
    }
}

/// In-memory string/string table.
#[derive(Debug)]
pub struct MockKeyValueSource {
    table: MockTable<String>,
}

impl MockKeyValueSource {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table: MockTable::new(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Upsert one row.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let mut rows = locked(&self.table.rows);
        match rows.iter_mut().find(|(k, _)| *k == key) {
            Some(row) => row.1 = value,
            None => rows.push((key, value)),
        }
    }

    pub fn remove(&self, key: &str) {
        locked(&self.table.rows).retain(|(k, _)| k != key);
    }

    /// Make every following load fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.table.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of loads so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.table.calls.load(Ordering::SeqCst)
    }
}

impl KeyValueSource for MockKeyValueSource {
    fn load_pairs(&self) -> Result<Vec<(String, String)>, SourceError> {
        self.table.load()
    }
}

/// In-memory string/id table.
#[derive(Debug)]
pub struct MockStringIdSource {
    table: MockTable<i64>,
}

impl MockStringIdSource {
    pub fn new<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        Self {
            table: MockTable::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Replace the whole table.
    pub fn replace<I, K>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        *locked(&self.table.rows) = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
    }

    pub fn set_failing(&self, failing: bool) {
        self.table.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.table.calls.load(Ordering::SeqCst)
    }
}

impl StringIdSource for MockStringIdSource {
    fn load_pairs(&self) -> Result<Vec<(String, i64)>, SourceError> {
        self.table.load()
    }
}

/// Plain-map preferences for components that only need [`PreferenceLookup`].
#[derive(Debug, Default)]
pub struct MapPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl MapPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl ToString) {
        locked(&self.values).insert(key.into(), value.to_string());
    }
}

impl PreferenceLookup for MapPreferences {
    fn lookup(&self, key: &str) -> FieldstoreResult<String> {
        locked(&self.values).get(key).cloned().ok_or_else(|| {
            CacheError::Miss {
                cache: "map preferences".to_string(),
                key: key.to_string(),
            }
            .into()
        })
    }
}

// ============================================================================
// IN-MEMORY STORES
// ============================================================================

/// Pending registrations kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryRegistrationStore {
    pending: Mutex<BTreeMap<String, Timestamp>>,
    failing: AtomicBool,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, username: impl Into<String>, requested_at: Timestamp) {
        locked(&self.pending).insert(username.into(), requested_at);
    }

    /// Activation removes the pending record.
    pub fn activate(&self, username: &str) -> bool {
        locked(&self.pending).remove(username).is_some()
    }

    pub fn pending(&self) -> Vec<String> {
        locked(&self.pending).keys().cloned().collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl RegistrationStore for InMemoryRegistrationStore {
    fn delete_expired(&self, older_than: Timestamp) -> FieldstoreResult<u64> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::OperationFailed {
                operation: "delete_expired".to_string(),
                reason: "registration store switched off".to_string(),
            }
            .into());
        }
        let mut pending = locked(&self.pending);
        let before = pending.len();
        pending.retain(|_, requested_at| *requested_at >= older_than);
        Ok((before - pending.len()) as u64)
    }
}

#[derive(Debug, Default, Clone)]
struct StoredImage {
    valid: bool,
    variants: BTreeSet<ImageSize>,
    processed: bool,
}

/// Uploaded images kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryImageStore {
    images: Mutex<BTreeMap<String, StoredImage>>,
    broken_variants: Mutex<BTreeSet<String>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a well-formed, unprocessed upload.
    pub fn upload(&self, image_id: impl Into<String>) {
        locked(&self.images).insert(
            image_id.into(),
            StoredImage {
                valid: true,
                ..Default::default()
            },
        );
    }

    /// Add an upload whose content fails validation.
    pub fn upload_corrupt(&self, image_id: impl Into<String>) {
        locked(&self.images).insert(image_id.into(), StoredImage::default());
    }

    /// Make variant creation fail for `image_id`.
    pub fn break_variants(&self, image_id: impl Into<String>) {
        locked(&self.broken_variants).insert(image_id.into());
    }

    pub fn is_processed(&self, image_id: &str) -> bool {
        locked(&self.images)
            .get(image_id)
            .is_some_and(|image| image.processed)
    }

    pub fn variants(&self, image_id: &str) -> Vec<ImageSize> {
        locked(&self.images)
            .get(image_id)
            .map(|image| image.variants.iter().copied().collect())
            .unwrap_or_default()
    }

    fn with_image<T>(
        &self,
        image_id: &str,
        f: impl FnOnce(&mut StoredImage) -> FieldstoreResult<T>,
    ) -> FieldstoreResult<T> {
        let mut images = locked(&self.images);
        let image = images
            .get_mut(image_id)
            .ok_or_else(|| StoreError::InvalidContent {
                id: image_id.to_string(),
                reason: "unknown image".to_string(),
            })?;
        f(image)
    }
}

impl ImageStore for InMemoryImageStore {
    fn unprocessed_images(&self) -> FieldstoreResult<Vec<String>> {
        Ok(locked(&self.images)
            .iter()
            .filter(|(_, image)| !image.processed)
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn validate(&self, image_id: &str) -> FieldstoreResult<()> {
        self.with_image(image_id, |image| {
            if image.valid {
                Ok(())
            } else {
                Err(StoreError::InvalidContent {
                    id: image_id.to_string(),
                    reason: "not a decodable image".to_string(),
                }
                .into())
            }
        })
    }

    fn size_exists(&self, image_id: &str, size: ImageSize) -> FieldstoreResult<bool> {
        self.with_image(image_id, |image| Ok(image.variants.contains(&size)))
    }

    fn create_size(&self, image_id: &str, size: ImageSize) -> FieldstoreResult<()> {
        if locked(&self.broken_variants).contains(image_id) {
            return Err(StoreError::OperationFailed {
                operation: format!("create_size({})", size),
                reason: "disk full".to_string(),
            }
            .into());
        }
        self.with_image(image_id, |image| {
            image.variants.insert(size);
            Ok(())
        })
    }

    fn mark_processed(&self, image_id: &str) -> FieldstoreResult<()> {
        self.with_image(image_id, |image| {
            image.processed = true;
            Ok(())
        })
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for fieldstore types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a lowercase username.
    pub fn arb_username() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{2,15}"
    }

    /// Generate a Timestamp (DateTime<Utc>).
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        // Generate timestamps within a reasonable range (2020-2030)
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(chrono::Utc::now)
        })
    }

    /// Generate a UserSnapshot with zero to two roles.
    pub fn arb_user_snapshot() -> impl Strategy<Value = UserSnapshot> {
        (
            arb_username(),
            proptest::option::of("[A-Z][a-z]{2,10}"),
            prop::collection::btree_set(
                prop_oneof![Just("participant"), Just("analyst"), Just("author")],
                0..=2,
            ),
            arb_timestamp(),
        )
            .prop_map(|(username, full_name, roles, created_at)| {
                let email = format!("{}@example.org", username);
                let mut user = UserSnapshot::new(username, email);
                user.full_name = full_name;
                user.roles = roles.into_iter().map(str::to_string).collect();
                user.created_at = created_at;
                user
            })
    }

    /// Generate a string/id table whose keys and ids are both unique.
    pub fn arb_string_id_table() -> impl Strategy<Value = Vec<(String, i64)>> {
        prop::collection::btree_set("[a-z_]{1,12}", 0..32).prop_map(|keys| {
            keys.into_iter()
                .enumerate()
                .map(|(i, key)| (key, i as i64 + 1))
                .collect()
        })
    }

    /// Generate a preference table of dynamic keys.
    pub fn arb_preference_table() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::btree_map("[a-z_]{1,16}", "[ -~]{0,24}", 0..16).prop_map(|map| {
            map.into_iter()
                .filter(|(key, _)| !keys::is_static_key(key))
                .collect()
        })
    }

    /// Generate a MediaKind variant.
    pub fn arb_media_kind() -> impl Strategy<Value = MediaKind> {
        prop::sample::select(MediaKind::ALL.to_vec())
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common test scenarios.

    use super::*;
    use std::path::Path;

    /// A participant with no display name.
    pub fn participant() -> UserSnapshot {
        UserSnapshot::new("participant1", "participant1@example.org").with_role("participant")
    }

    /// An analyst with a display name.
    pub fn analyst() -> UserSnapshot {
        UserSnapshot::new("analyst1", "analyst1@example.org")
            .with_full_name("Ada Analyst")
            .with_role("analyst")
    }

    /// Preferences placing every media kind under `base/<kind>` with the
    /// given fanout and depths. The kind directories are created.
    pub fn media_preferences(
        base: &Path,
        fanout: u32,
        file_depth: u32,
        document_depth: u32,
    ) -> MapPreferences {
        let prefs = MapPreferences::new()
            .with(keys::MAX_FILES_PER_DIR, fanout)
            .with(keys::FILE_HIERARCHY_DEPTH, file_depth)
            .with(keys::DOCUMENT_DEPTH, document_depth);
        for kind in MediaKind::ALL {
            let root = base.join(kind.as_str());
            std::fs::create_dir_all(&root).unwrap_or_else(|e| {
                panic!("failed to create {}: {}", root.display(), e)
            });
            prefs.set(kind.root_key(), root.display());
        }
        prefs
    }

    /// Build-properties TOML with the given version.
    pub fn build_properties(version: &str) -> String {
        format!(
            "[build]\nname = \"fieldstore\"\nversion = \"{}\"\n\
             build = \"test\"\nssl_enabled = false\n",
            version
        )
    }

    /// A temporary directory for shard trees.
    pub fn shard_root() -> tempfile::TempDir {
        tempfile::tempdir().unwrap_or_else(|e| panic!("failed to create temp dir: {}", e))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for fieldstore-specific validation.

    use super::*;

    /// Assert that a FieldstoreResult is a cache miss for `key`.
    #[track_caller]
    pub fn assert_cache_miss<T: std::fmt::Debug>(result: &FieldstoreResult<T>, key: &str) {
        match result {
            Err(FieldstoreError::Cache(CacheError::Miss { key: k, .. })) => {
                assert_eq!(k, key, "Wrong key in cache miss");
            }
            other => panic!("Expected cache miss for {}, got: {:?}", key, other),
        }
    }

    /// Assert that a FieldstoreResult is a Config error.
    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &FieldstoreResult<T>) {
        match result {
            Err(FieldstoreError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    /// Assert that a FieldstoreResult reports a full directory structure.
    #[track_caller]
    pub fn assert_structure_exhausted<T: std::fmt::Debug>(result: &FieldstoreResult<T>) {
        match result {
            Err(FieldstoreError::Shard(ShardError::StructureExhausted { .. })) => {}
            other => panic!("Expected StructureExhausted, got: {:?}", other),
        }
    }

    /// Assert that a FieldstoreResult is in the integrity class.
    #[track_caller]
    pub fn assert_integrity_violation<T: std::fmt::Debug>(result: &FieldstoreResult<T>) {
        match result {
            Err(e) if e.is_integrity_violation() => {}
            other => panic!("Expected integrity violation, got: {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::assertions::*;
    use super::*;
    use fieldstore_storage::ShardedDirectoryAllocator;
    use std::sync::Arc;

    #[test]
    fn test_mock_source_counts_failed_loads() {
        let source = MockKeyValueSource::new([("a", "1")]);
        assert_eq!(source.load_pairs().unwrap().len(), 1);

        source.set_failing(true);
        assert!(source.load_pairs().is_err());
        assert_eq!(source.calls(), 2);

        source.set_failing(false);
        source.set("a", "2");
        source.set("b", "3");
        source.remove("b");
        assert_eq!(
            source.load_pairs().unwrap(),
            vec![("a".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_registration_store_keeps_recent() {
        let store = InMemoryRegistrationStore::new();
        let now = chrono::Utc::now();
        store.register("old", now - chrono::Duration::days(2));
        store.register("new", now);
        store.register("activated", now - chrono::Duration::days(3));
        assert!(store.activate("activated"));

        assert_eq!(store.delete_expired(now - chrono::Duration::days(1)).unwrap(), 1);
        assert_eq!(store.pending(), vec!["new".to_string()]);
    }

    #[test]
    fn test_image_store_reports_unprocessed() {
        let store = InMemoryImageStore::new();
        store.upload("a");
        store.upload_corrupt("b");
        assert!(store.validate("a").is_ok());
        assert!(store.validate("b").is_err());
        assert!(store.validate("missing").is_err());

        store.create_size("a", ImageSize::Icon).unwrap();
        assert!(store.size_exists("a", ImageSize::Icon).unwrap());
        store.mark_processed("a").unwrap();
        assert_eq!(store.unprocessed_images().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn test_media_preferences_drive_allocator() {
        let base = fixtures::shard_root();
        let prefs = fixtures::media_preferences(base.path(), 100, 2, 1);
        let allocator = ShardedDirectoryAllocator::new(Arc::new(prefs));

        let dir = allocator.directory_for(MediaKind::Video).unwrap();
        assert_eq!(dir, base.path().join("video").join("00").join("00"));
        let dir = allocator.directory_for(MediaKind::Document).unwrap();
        assert_eq!(dir, base.path().join("document").join("00"));
    }

    #[test]
    fn test_map_preferences_miss() {
        let prefs = MapPreferences::new().with(keys::MAX_FILES_PER_DIR, 5);
        assert_eq!(prefs.lookup_u32(keys::MAX_FILES_PER_DIR).unwrap(), 5);
        assert_cache_miss(&prefs.lookup("absent"), "absent");
    }
}
