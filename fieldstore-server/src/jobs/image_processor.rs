//! Asynchronous image post-processing.
//!
//! Uploads land in an [`ImageQueue`]. A dedicated worker drains the queue,
//! producing every missing [`ImageSize`] variant of each image and marking
//! it processed. When the queue is empty the worker sleeps until new work
//! arrives, the idle period runs out, or shutdown is requested.
//!
//! The [`UnprocessedImageScan`] sweep picks up images the worker never saw
//! (for example uploads made before a restart).
//!
//! Processing is idempotent: variants that already exist are skipped, so an
//! image queued twice costs only a few existence checks.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use fieldstore_core::{FieldstoreResult, ImageSize};
use fieldstore_storage::ImageStore;
use tokio::sync::{watch, Notify};

use super::periodic::{SweepTask, TaskHandle};

// ============================================================================
// QUEUE
// ============================================================================

/// Double-ended queue of image ids awaiting processing.
#[derive(Debug, Default)]
pub struct ImageQueue {
    pending: Mutex<VecDeque<String>>,
    arrived: Notify,
}

impl ImageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fresh upload ahead of everything else and wake the worker.
    pub fn queue_image(&self, image_id: impl Into<String>) {
        self.lock().push_front(image_id.into());
        self.arrived.notify_one();
    }

    /// Append the ids not already queued. Returns how many were added.
    pub fn queue_images<I>(&self, image_ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let added = {
            let mut pending = self.lock();
            let mut seen: HashSet<String> = pending.iter().cloned().collect();
            let before = pending.len();
            for id in image_ids {
                if seen.insert(id.clone()) {
                    pending.push_back(id);
                }
            }
            pending.len() - before
        };

        if added > 0 {
            self.arrived.notify_one();
        }
        added
    }

    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait until work is queued. A wake-up issued while nobody was waiting
    /// is kept for the next call.
    pub async fn notified(&self) {
        self.arrived.notified().await;
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// PROCESSOR
// ============================================================================

/// Counters for the image worker.
#[derive(Debug, Default)]
pub struct ImageMetrics {
    pub processed: AtomicU64,
    pub failed: AtomicU64,
    pub variants_created: AtomicU64,
}

impl ImageMetrics {
    pub fn snapshot(&self) -> ImageMetricsSnapshot {
        ImageMetricsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            variants_created: self.variants_created.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of image worker counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageMetricsSnapshot {
    pub processed: u64,
    pub failed: u64,
    pub variants_created: u64,
}

/// Produces size variants for queued images.
pub struct ImageProcessor {
    store: Arc<dyn ImageStore>,
    queue: Arc<ImageQueue>,
    metrics: ImageMetrics,
}

impl ImageProcessor {
    pub fn new(store: Arc<dyn ImageStore>, queue: Arc<ImageQueue>) -> Self {
        Self {
            store,
            queue,
            metrics: ImageMetrics::default(),
        }
    }

    pub fn queue(&self) -> &Arc<ImageQueue> {
        &self.queue
    }

    pub fn metrics(&self) -> ImageMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Validate, create missing variants, mark processed.
    ///
    /// Any failing step is logged and the image is abandoned; it stays
    /// unprocessed in the store and the next scan queues it again.
    pub fn process_image(&self, image_id: &str) -> bool {
        match self.try_process(image_id) {
            Ok(created) => {
                self.metrics.processed.fetch_add(1, Ordering::Relaxed);
                self.metrics
                    .variants_created
                    .fetch_add(created, Ordering::Relaxed);
                tracing::debug!(image_id, created, "Image processed");
                true
            }
            Err((step, e)) => {
                self.metrics.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(image_id, step, error = %e, "Image processing abandoned");
                false
            }
        }
    }

    fn try_process(
        &self,
        image_id: &str,
    ) -> Result<u64, (&'static str, fieldstore_core::FieldstoreError)> {
        self.store
            .validate(image_id)
            .map_err(|e| ("validate", e))?;

        let mut created = 0;
        for size in ImageSize::ALL {
            let exists = self
                .store
                .size_exists(image_id, size)
                .map_err(|e| ("size_exists", e))?;
            if !exists {
                self.store
                    .create_size(image_id, size)
                    .map_err(|e| ("create_size", e))?;
                created += 1;
            }
        }

        self.store
            .mark_processed(image_id)
            .map_err(|e| ("mark_processed", e))?;
        Ok(created)
    }

    /// Process queued images until the queue is empty or `stop` is raised.
    /// Returns how many images were taken off the queue.
    pub fn drain(&self, stop: &watch::Receiver<bool>) -> u64 {
        let mut taken = 0;
        while !*stop.borrow() {
            let Some(image_id) = self.queue.pop() else {
                break;
            };
            taken += 1;
            self.process_image(&image_id);
        }
        taken
    }
}

impl std::fmt::Debug for ImageProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageProcessor")
            .field("queued", &self.queue.len())
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// WORKER
// ============================================================================

/// Spawn the worker that drains `processor`'s queue.
///
/// `idle` bounds the sleep between drains when nothing wakes the worker.
pub fn spawn_image_worker(processor: Arc<ImageProcessor>, idle: Duration) -> TaskHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let join = tokio::spawn(worker_loop(processor, idle, shutdown_rx));
    TaskHandle::new("image_processor", shutdown_tx, join)
}

async fn worker_loop(
    processor: Arc<ImageProcessor>,
    idle: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tracing::info!(idle_secs = idle.as_secs(), "Image worker started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let worker = Arc::clone(&processor);
        let stop = shutdown_rx.clone();
        match tokio::task::spawn_blocking(move || worker.drain(&stop)).await {
            Ok(0) => tracing::trace!("Image queue empty"),
            Ok(taken) => tracing::info!(taken, "Image queue drained"),
            Err(e) => tracing::error!(error = %e, "Image drain panicked"),
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }

            _ = processor.queue().notified() => {}

            _ = tokio::time::sleep(idle) => {}
        }
    }

    let snapshot = processor.metrics();
    tracing::info!(
        processed = snapshot.processed,
        failed = snapshot.failed,
        "Image worker stopped"
    );
}

// ============================================================================
// SCAN
// ============================================================================

/// Sweep that queues every unprocessed image the store knows about.
pub struct UnprocessedImageScan {
    store: Arc<dyn ImageStore>,
    queue: Arc<ImageQueue>,
}

impl UnprocessedImageScan {
    pub fn new(store: Arc<dyn ImageStore>, queue: Arc<ImageQueue>) -> Self {
        Self { store, queue }
    }
}

impl SweepTask for UnprocessedImageScan {
    fn name(&self) -> &'static str {
        "unprocessed_image_scan"
    }

    fn run_once(&self) -> FieldstoreResult<u64> {
        let unprocessed = self.store.unprocessed_images()?;
        let added = self.queue.queue_images(unprocessed);
        if added > 0 {
            tracing::info!(added, queued = self.queue.len(), "Unprocessed images queued");
        }
        Ok(added as u64)
    }
}

impl std::fmt::Debug for UnprocessedImageScan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnprocessedImageScan")
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}
