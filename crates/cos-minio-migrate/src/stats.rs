//! Run statistics aggregation.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Thread-safe counters for one migration run.
///
/// `total` is set once before dispatch; the other counters are bumped by
/// workers as items complete. Observational only; never gates behavior.
#[derive(Debug, Default)]
pub struct RunStats {
    total: AtomicUsize,
    success: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StatsSnapshot {
    /// Items that reached a successful terminal state (fresh transfers
    /// plus skip fast-path hits).
    pub fn completed(&self) -> usize {
        self.success + self.skipped
    }

    /// Success rate in percent; 0 when the run was empty.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed() as f64 / self.total as f64 * 100.0
        }
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_total(&self, total: usize) {
        self.total.store(total, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_add_up() {
        let stats = RunStats::new();
        stats.set_total(4);
        stats.record_success();
        stats.record_success();
        stats.record_skipped();
        stats.record_failed();

        let snap = stats.snapshot();
        assert_eq!(snap.total, snap.success + snap.failed + snap.skipped);
        assert_eq!(snap.completed(), 3);
        assert!((snap.success_rate() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_run_rate_is_zero() {
        let snap = RunStats::new().snapshot();
        assert_eq!(snap.success_rate(), 0.0);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;

        let stats = Arc::new(RunStats::new());
        stats.set_total(64);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = stats.clone();
                std::thread::spawn(move || {
                    for _ in 0..8 {
                        stats.record_success();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.snapshot().success, 64);
    }
}
