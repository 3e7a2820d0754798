//! Observability and Metrics
//!
//! Counters for the accept loop. Each [`Acceptor`](crate::transport::acceptor::Acceptor)
//! owns its own instance; clone the `Arc` out of it to observe from elsewhere.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Accept-loop counters
#[derive(Debug)]
pub struct AcceptorMetrics {
    /// Readiness waits that returned at least one event
    pub wakeups: AtomicU64,
    /// Waits interrupted by a signal and retried
    pub interrupted_waits: AtomicU64,
    /// Connections handed to the connection handler
    pub connections_accepted: AtomicU64,
    /// Accept errors other than would-block
    pub accept_errors: AtomicU64,
    /// Readiness events carrying error or hang-up flags
    pub readiness_faults: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl AcceptorMetrics {
    pub fn new() -> Self {
        Self {
            wakeups: AtomicU64::new(0),
            interrupted_waits: AtomicU64::new(0),
            connections_accepted: AtomicU64::new(0),
            accept_errors: AtomicU64::new(0),
            readiness_faults: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn wakeup(&self) {
        self.wakeups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn interrupted_wait(&self) {
        self.interrupted_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_accepted(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accept_error(&self) {
        self.accept_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn readiness_fault(&self) {
        self.readiness_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> AcceptorMetricsSnapshot {
        AcceptorMetricsSnapshot {
            wakeups: self.wakeups.load(Ordering::Relaxed),
            interrupted_waits: self.interrupted_waits.load(Ordering::Relaxed),
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            accept_errors: self.accept_errors.load(Ordering::Relaxed),
            readiness_faults: self.readiness_faults.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            wakeups = snapshot.wakeups,
            interrupted_waits = snapshot.interrupted_waits,
            connections_accepted = snapshot.connections_accepted,
            accept_errors = snapshot.accept_errors,
            readiness_faults = snapshot.readiness_faults,
            uptime_seconds = snapshot.uptime_seconds,
            "Acceptor metrics snapshot"
        );
    }
}

impl Default for AcceptorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptorMetricsSnapshot {
    pub wakeups: u64,
    pub interrupted_waits: u64,
    pub connections_accepted: u64,
    pub accept_errors: u64,
    pub readiness_faults: u64,
    pub uptime_seconds: u64,
}
