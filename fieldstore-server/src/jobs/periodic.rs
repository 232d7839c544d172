//! Periodic Sweep Runner
//!
//! Every background sweep in the server (session eviction, registration
//! expiry, the unprocessed-image scan) is a [`SweepTask`] driven by
//! [`spawn_sweep`]. The runner owns the timer and the shutdown signal; the
//! task only implements one synchronous pass.
//!
//! A pass that returns an error or panics is logged and counted. The timer
//! keeps firing regardless; only shutdown stops it.
//!
//! # Example
//!
//! ```ignore
//! let handle = spawn_sweep(
//!     Arc::new(SessionSweep::new(Arc::clone(&sessions))),
//!     SweepSchedule::every(Duration::from_secs(60)),
//! );
//!
//! // On shutdown
//! handle.shutdown();
//! handle.join().await;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fieldstore_core::FieldstoreResult;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// One pass of a periodic background job.
pub trait SweepTask: Send + Sync + 'static {
    /// Stable name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Run one pass. Returns the number of items handled.
    fn run_once(&self) -> FieldstoreResult<u64>;
}

// ============================================================================
// SCHEDULE
// ============================================================================

/// When a sweep first fires and how often after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    pub first_delay: Duration,
    pub period: Duration,
}

impl SweepSchedule {
    /// Periods below one millisecond are raised to one millisecond.
    pub fn new(first_delay: Duration, period: Duration) -> Self {
        Self {
            first_delay,
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// First firing after one full period.
    pub fn every(period: Duration) -> Self {
        Self::new(period, period)
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for one sweep since it was spawned.
#[derive(Debug, Default)]
pub struct SweepMetrics {
    /// Passes started
    pub runs: AtomicU64,

    /// Items reported by successful passes
    pub items: AtomicU64,

    /// Passes that returned an error or panicked
    pub failures: AtomicU64,
}

impl SweepMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> SweepMetricsSnapshot {
        SweepMetricsSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            items: self.items.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sweep metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepMetricsSnapshot {
    pub runs: u64,
    pub items: u64,
    pub failures: u64,
}

// ============================================================================
// HANDLES
// ============================================================================

/// Shutdown signal and join handle for a spawned background loop.
///
/// Dropping the handle also stops the loop, since the loop treats a closed
/// shutdown channel as a shutdown request.
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl TaskHandle {
    pub(crate) fn new(
        name: &'static str,
        shutdown_tx: watch::Sender<bool>,
        join: JoinHandle<()>,
    ) -> Self {
        Self {
            name,
            shutdown_tx,
            join: Mutex::new(Some(join)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ask the loop to stop. Idempotent and never fails.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Wait for the loop to exit. Returns immediately on later calls.
    pub async fn join(&self) {
        let join = self
            .join
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(join) = join {
            if let Err(e) = join.await {
                tracing::error!(task = self.name, error = %e, "Background task ended abnormally");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }
}

/// Handle to a running sweep.
#[derive(Debug)]
pub struct SweepHandle {
    task: TaskHandle,
    metrics: Arc<SweepMetrics>,
}

impl SweepHandle {
    pub fn name(&self) -> &'static str {
        self.task.name()
    }

    /// Ask the sweep to stop. Safe before the first firing and when repeated.
    pub fn shutdown(&self) {
        self.task.shutdown();
    }

    pub async fn join(&self) {
        self.task.join().await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn metrics(&self) -> SweepMetricsSnapshot {
        self.metrics.snapshot()
    }
}

// ============================================================================
// BACKGROUND LOOP
// ============================================================================

/// Spawn `task` on the current tokio runtime.
///
/// Each pass runs on the blocking pool since tasks talk to synchronous
/// backing stores.
pub fn spawn_sweep(task: Arc<dyn SweepTask>, schedule: SweepSchedule) -> SweepHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let metrics = Arc::new(SweepMetrics::new());
    let name = task.name();

    let join = tokio::spawn(sweep_loop(
        task,
        schedule,
        Arc::clone(&metrics),
        shutdown_rx,
    ));

    SweepHandle {
        task: TaskHandle::new(name, shutdown_tx, join),
        metrics,
    }
}

async fn sweep_loop(
    task: Arc<dyn SweepTask>,
    schedule: SweepSchedule,
    metrics: Arc<SweepMetrics>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + schedule.first_delay, schedule.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        task = task.name(),
        first_delay_secs = schedule.first_delay.as_secs(),
        period_secs = schedule.period.as_secs(),
        "Sweep task started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!(task = task.name(), "Sweep task shutting down");
                    break;
                }
            }

            _ = ticker.tick() => {
                run_pass(&task, &metrics).await;
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        task = task.name(),
        runs = snapshot.runs,
        items = snapshot.items,
        failures = snapshot.failures,
        "Sweep task completed"
    );
}

/// Run one pass, logging and counting any failure.
async fn run_pass(task: &Arc<dyn SweepTask>, metrics: &SweepMetrics) {
    metrics.runs.fetch_add(1, Ordering::Relaxed);
    let name = task.name();
    let worker = Arc::clone(task);

    match tokio::task::spawn_blocking(move || worker.run_once()).await {
        Ok(Ok(items)) => {
            metrics.items.fetch_add(items, Ordering::Relaxed);
            if items > 0 {
                tracing::info!(task = name, items, "Sweep pass completed");
            } else {
                tracing::trace!(task = name, "Sweep pass completed with nothing to do");
            }
        }
        Ok(Err(e)) => {
            metrics.failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!(task = name, error = %e, "Sweep pass failed");
        }
        Err(e) => {
            metrics.failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!(task = name, error = %e, "Sweep pass panicked");
        }
    }
}
