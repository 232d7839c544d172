//! Preference keys understood by the server.
//!
//! Dynamic keys are served from the preference table and refreshed on
//! expiry. Static keys come from the build properties bundle and never
//! reach the backing store.

// ============================================================================
// DYNAMIC KEYS
// ============================================================================

/// Maximum numerically-named entries per shard directory (fanout).
pub const MAX_FILES_PER_DIR: &str = "max_files_per_dir";

/// Depth of the shard tree for image, audio, video and generic files.
pub const FILE_HIERARCHY_DEPTH: &str = "file_hierarchy_depth";

/// Depth of the shard tree for documents.
pub const DOCUMENT_DEPTH: &str = "document_depth";

pub const IMAGE_DIRECTORY: &str = "image_directory";
pub const AUDIO_DIRECTORY: &str = "audio_directory";
pub const VIDEO_DIRECTORY: &str = "video_directory";
pub const DOCUMENT_DIRECTORY: &str = "document_directory";
pub const FILE_DIRECTORY: &str = "file_directory";

// ============================================================================
// STATIC KEYS
// ============================================================================

pub const APPLICATION_NAME: &str = "application_name";
pub const APPLICATION_VERSION: &str = "application_version";
pub const APPLICATION_BUILD: &str = "application_build";
pub const SSL_ENABLED: &str = "ssl_enabled";

/// All keys answered from the static build properties.
pub const STATIC_KEYS: [&str; 4] = [
    APPLICATION_NAME,
    APPLICATION_VERSION,
    APPLICATION_BUILD,
    SSL_ENABLED,
];

/// Returns true if `key` is served from static build properties.
pub fn is_static_key(key: &str) -> bool {
    STATIC_KEYS.contains(&key)
}
