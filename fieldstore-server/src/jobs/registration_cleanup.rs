//! Deletion of registrations that were never activated.

use std::sync::Arc;
use std::time::Duration;

use fieldstore_core::{Clock, ConfigError, FieldstoreResult};
use fieldstore_storage::RegistrationStore;

use super::periodic::SweepTask;

/// Removes pending registrations older than `lifetime`.
pub struct RegistrationCleanup {
    store: Arc<dyn RegistrationStore>,
    clock: Arc<dyn Clock>,
    lifetime: chrono::Duration,
}

impl RegistrationCleanup {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        clock: Arc<dyn Clock>,
        lifetime: Duration,
    ) -> FieldstoreResult<Self> {
        let lifetime =
            chrono::Duration::from_std(lifetime).map_err(|e| ConfigError::InvalidValue {
                field: "registration_lifetime".to_string(),
                value: format!("{}s", lifetime.as_secs()),
                reason: e.to_string(),
            })?;
        Ok(Self {
            store,
            clock,
            lifetime,
        })
    }
}

impl SweepTask for RegistrationCleanup {
    fn name(&self) -> &'static str {
        "registration_cleanup"
    }

    fn run_once(&self) -> FieldstoreResult<u64> {
        let cutoff = self.clock.now() - self.lifetime;
        let removed = self.store.delete_expired(cutoff)?;
        if removed > 0 {
            tracing::info!(removed, cutoff = %cutoff, "Expired registrations deleted");
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for RegistrationCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationCleanup")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
