//! Fieldstore Server - Sessions, Background Jobs and Wiring
//!
//! Ties the storage building blocks together for a running server:
//!
//! - [`session`]: token store with sliding expiration
//! - [`jobs`]: periodic sweeps and the image worker
//! - [`state`]: composition root holding every cache and job handle
//! - [`config`] / [`telemetry`]: environment-driven configuration and logging

pub mod config;
pub mod constants;
pub mod jobs;
pub mod session;
pub mod state;
pub mod telemetry;

pub use config::ServerConfig;
pub use jobs::{
    spawn_image_worker, spawn_sweep, ImageProcessor, ImageQueue, RegistrationCleanup,
    SessionSweep, SweepHandle, SweepMetricsSnapshot, SweepSchedule, SweepTask, TaskHandle,
    UnprocessedImageScan,
};
pub use session::{SessionRecord, SessionTokenBin};
pub use state::{ServerBackends, ServerState};
pub use telemetry::{init_tracing, TelemetryConfig};
