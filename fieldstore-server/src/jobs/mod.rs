//! Background Jobs for the fieldstore server
//!
//! This module contains background tasks that run periodically:
//!
//! - `session_sweep`: Evicts idle session tokens
//! - `registration_cleanup`: Deletes registrations never activated
//! - `image_processor`: Scans for unprocessed images and feeds the worker
//!   that creates their size variants
//!
//! # Usage
//!
//! Jobs are spawned by [`ServerState`](crate::state::ServerState) during
//! startup and stopped by its `shutdown()`:
//!
//! ```ignore
//! use fieldstore_server::jobs::{spawn_sweep, SessionSweep, SweepSchedule};
//!
//! let handle = spawn_sweep(
//!     Arc::new(SessionSweep::new(Arc::clone(&sessions))),
//!     SweepSchedule::every(Duration::from_secs(60)),
//! );
//!
//! // On shutdown
//! handle.shutdown();
//! handle.join().await;
//! ```

pub mod image_processor;
pub mod periodic;
pub mod registration_cleanup;
pub mod session_sweep;

// Re-export commonly used types
pub use image_processor::{
    spawn_image_worker, ImageMetricsSnapshot, ImageProcessor, ImageQueue, UnprocessedImageScan,
};
pub use periodic::{
    spawn_sweep, SweepHandle, SweepMetrics, SweepMetricsSnapshot, SweepSchedule, SweepTask,
    TaskHandle,
};
pub use registration_cleanup::RegistrationCleanup;
pub use session_sweep::SessionSweep;
