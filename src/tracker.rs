//! Live statistics for chunk processing.
//!
//! Display-only counters behind atomics; the final run summary is computed
//! from the collected result set, not from this tracker.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Statistics tracker for chunk processing.
#[derive(Debug)]
pub struct StatsTracker {
    start_time: Instant,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    /// Total latency of successful chunks in microseconds.
    total_latency_us: AtomicU64,
    /// Completions in the last second (for chunks/sec display).
    recent: Mutex<VecDeque<Instant>>,
}

impl StatsTracker {
    /// Create a new statistics tracker.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            recent: Mutex::new(VecDeque::new()),
        }
    }

    /// Record a successfully compressed chunk.
    pub fn record_success(&self, latency: Duration) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.record_recent();
    }

    /// Record a chunk that fell back to its original text.
    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        self.record_recent();
    }

    fn record_recent(&self) {
        let now = Instant::now();
        let mut recent = self.recent.lock();
        recent.push_back(now);

        let cutoff = now - Duration::from_secs(1);
        while let Some(front) = recent.front() {
            if *front < cutoff {
                recent.pop_front();
            } else {
                break;
            }
        }
    }

    /// Chunks completed in the last second.
    pub fn chunks_per_second(&self) -> f64 {
        let cutoff = Instant::now() - Duration::from_secs(1);
        let mut recent = self.recent.lock();
        while let Some(front) = recent.front() {
            if *front < cutoff {
                recent.pop_front();
            } else {
                break;
            }
        }
        recent.len() as f64
    }

    /// Get the current statistics snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        let success = self.success_count.load(Ordering::Relaxed);
        let failure = self.failure_count.load(Ordering::Relaxed);
        let total_latency = self.total_latency_us.load(Ordering::Relaxed);

        let avg_latency_ms = if success > 0 {
            (total_latency as f64 / success as f64) / 1000.0
        } else {
            0.0
        };

        StatsSnapshot {
            elapsed: self.start_time.elapsed(),
            success_count: success,
            failure_count: failure,
            avg_latency_ms,
            current_rate: self.chunks_per_second(),
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of current statistics.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    /// Elapsed time since start.
    pub elapsed: Duration,
    /// Successfully compressed chunks.
    pub success_count: u64,
    /// Chunks that fell back to original text.
    pub failure_count: u64,
    /// Average latency of successful chunks in milliseconds.
    pub avg_latency_ms: f64,
    /// Chunks completed in the last second.
    pub current_rate: f64,
}
