//! Record stores consumed by the background jobs.
//!
//! Like the cache sources these are synchronous and owned by the relational
//! layer. Jobs call them from the blocking pool.

use fieldstore_core::{FieldstoreResult, ImageSize, Timestamp};

/// Pending (un-activated) user registrations.
pub trait RegistrationStore: Send + Sync {
    /// Delete registrations requested before `older_than` that were never
    /// activated. Returns how many were removed.
    fn delete_expired(&self, older_than: Timestamp) -> FieldstoreResult<u64>;
}

/// Uploaded images and their derived size variants.
pub trait ImageStore: Send + Sync {
    /// Ids of images whose variants have not been produced yet.
    fn unprocessed_images(&self) -> FieldstoreResult<Vec<String>>;

    /// Check that the uploaded image content is readable and well formed.
    fn validate(&self, image_id: &str) -> FieldstoreResult<()>;

    fn size_exists(&self, image_id: &str, size: ImageSize) -> FieldstoreResult<bool>;

    /// Produce and persist the `size` variant of the image.
    fn create_size(&self, image_id: &str, size: ImageSize) -> FieldstoreResult<()>;

    fn mark_processed(&self, image_id: &str) -> FieldstoreResult<()>;
}
