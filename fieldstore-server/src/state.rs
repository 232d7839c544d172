//! Shared server state.
//!
//! [`ServerState`] is the composition root: it builds every cache, the
//! directory allocator and the session bin from one [`ServerConfig`], then
//! spawns the background jobs that keep them tidy. Request handlers hold an
//! `Arc<ServerState>`; nothing in the server is a global.

use std::collections::HashMap;
use std::sync::Arc;

use fieldstore_core::{Clock, FieldstoreResult};
use fieldstore_storage::{
    ImageStore, KeyValueSource, PreferenceStore, RegistrationStore, ShardedDirectoryAllocator,
    StaticProperties, StringIdCache, StringIdSource, ValueCache,
};

use crate::config::ServerConfig;
use crate::jobs::{
    spawn_image_worker, spawn_sweep, ImageProcessor, ImageQueue, RegistrationCleanup,
    SessionSweep, SweepHandle, SweepMetricsSnapshot, SweepSchedule, TaskHandle,
    UnprocessedImageScan,
};
use crate::session::SessionTokenBin;

/// Name of the preference cache in logs and errors.
pub const PREFERENCE_CACHE_NAME: &str = "preferences";

/// Backing stores the server reads from.
pub struct ServerBackends {
    pub preferences: Arc<dyn KeyValueSource>,
    pub registrations: Arc<dyn RegistrationStore>,
    pub images: Arc<dyn ImageStore>,
    /// Enumeration tables, one string/id cache each, keyed by name.
    pub enumerations: Vec<(String, Arc<dyn StringIdSource>)>,
}

/// Application-wide state shared across request handlers.
pub struct ServerState {
    pub config: ServerConfig,
    pub preferences: Arc<PreferenceStore>,
    pub directories: Arc<ShardedDirectoryAllocator>,
    pub sessions: Arc<SessionTokenBin>,
    pub image_processor: Arc<ImageProcessor>,
    enumerations: HashMap<String, Arc<StringIdCache>>,
    sweeps: Vec<SweepHandle>,
    image_worker: TaskHandle,
}

impl ServerState {
    /// Build the state, reading static properties from
    /// `config.properties_path`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: ServerConfig,
        backends: ServerBackends,
        clock: Arc<dyn Clock>,
    ) -> FieldstoreResult<Self> {
        let statics = StaticProperties::load(&config.properties_path)?;
        Self::start_with_statics(config, backends, statics, clock)
    }

    /// Build the state from already loaded static properties.
    pub fn start_with_statics(
        config: ServerConfig,
        backends: ServerBackends,
        statics: StaticProperties,
        clock: Arc<dyn Clock>,
    ) -> FieldstoreResult<Self> {
        let dynamic = ValueCache::new(
            PREFERENCE_CACHE_NAME,
            backends.preferences,
            Arc::clone(&clock),
            config.preference_refresh,
        )?;
        let preferences = Arc::new(PreferenceStore::new(dynamic, statics));
        let directories = Arc::new(ShardedDirectoryAllocator::new(preferences.clone()));

        let mut enumerations = HashMap::with_capacity(backends.enumerations.len());
        for (name, source) in backends.enumerations {
            let cache = StringIdCache::new(
                name.clone(),
                source,
                Arc::clone(&clock),
                config.preference_refresh,
            )?;
            enumerations.insert(name, Arc::new(cache));
        }

        let sessions = Arc::new(SessionTokenBin::new(
            Arc::clone(&clock),
            config.session_lifetime,
        ));

        let registration_cleanup = RegistrationCleanup::new(
            backends.registrations,
            Arc::clone(&clock),
            config.registration_lifetime,
        )?;

        let image_queue = Arc::new(ImageQueue::new());
        let image_processor = Arc::new(ImageProcessor::new(
            Arc::clone(&backends.images),
            Arc::clone(&image_queue),
        ));

        // Everything fallible is done; spawn the jobs.
        let sweeps = vec![
            spawn_sweep(
                Arc::new(SessionSweep::new(Arc::clone(&sessions))),
                SweepSchedule::every(config.session_sweep_period),
            ),
            spawn_sweep(
                Arc::new(registration_cleanup),
                SweepSchedule::every(config.registration_sweep_period),
            ),
            spawn_sweep(
                Arc::new(UnprocessedImageScan::new(backends.images, image_queue)),
                SweepSchedule::every(config.image_scan_period),
            ),
        ];
        let image_worker = spawn_image_worker(Arc::clone(&image_processor), config.image_idle);

        tracing::info!(
            enumerations = enumerations.len(),
            jobs = sweeps.len() + 1,
            "Server state started"
        );

        Ok(Self {
            config,
            preferences,
            directories,
            sessions,
            image_processor,
            enumerations,
            sweeps,
            image_worker,
        })
    }

    /// String/id cache for the enumeration table `name`.
    pub fn enumeration(&self, name: &str) -> Option<&Arc<StringIdCache>> {
        self.enumerations.get(name)
    }

    pub fn image_queue(&self) -> &Arc<ImageQueue> {
        self.image_processor.queue()
    }

    /// Metrics of every periodic sweep, by task name.
    pub fn sweep_metrics(&self) -> Vec<(&'static str, SweepMetricsSnapshot)> {
        self.sweeps
            .iter()
            .map(|sweep| (sweep.name(), sweep.metrics()))
            .collect()
    }

    /// Stop every background job and wait for it to exit. Idempotent.
    pub async fn shutdown(&self) {
        for sweep in &self.sweeps {
            sweep.shutdown();
        }
        self.image_worker.shutdown();

        for sweep in &self.sweeps {
            sweep.join().await;
        }
        self.image_worker.join().await;

        tracing::info!("Server state shut down");
    }

    /// True once every background job has exited.
    pub fn is_shut_down(&self) -> bool {
        self.sweeps.iter().all(SweepHandle::is_finished) && self.image_worker.is_finished()
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("sessions", &self.sessions)
            .field("enumerations", &self.enumerations.keys().collect::<Vec<_>>())
            .field("sweeps", &self.sweeps.len())
            .finish_non_exhaustive()
    }
}
