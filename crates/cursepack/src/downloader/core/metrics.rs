//! Counters for a batch run
//!
//! Updated from every worker concurrently, so each field is an atomic and
//! readers take a [`DownloadMetricsSnapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

/// Batch statistics using atomic counters for thread-safe updates across workers
#[derive(Debug, Default)]
pub struct DownloadMetrics {
    pub items_started: AtomicU64,
    pub resolved: AtomicU64,
    pub not_mirrored: AtomicU64,
    pub lookup_failures: AtomicU64,
    pub fetch_attempts: AtomicU64,
    pub retries_attempted: AtomicU64,
    pub successful_downloads: AtomicU64,
    pub failed_downloads: AtomicU64,
    pub total_bytes: AtomicU64,
}

impl DownloadMetrics {
    pub fn record_item_started(&self) {
        self.items_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_resolved(&self) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_mirrored(&self) {
        self.not_mirrored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup_failed(&self) {
        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_attempt(&self) {
        self.fetch_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_download_completed(&self, size: u64) {
        self.successful_downloads.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(size, Ordering::Relaxed);
    }

    pub fn record_download_failed(&self) {
        self.failed_downloads.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> DownloadMetricsSnapshot {
        DownloadMetricsSnapshot {
            items_started: self.items_started.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            not_mirrored: self.not_mirrored.load(Ordering::Relaxed),
            lookup_failures: self.lookup_failures.load(Ordering::Relaxed),
            fetch_attempts: self.fetch_attempts.load(Ordering::Relaxed),
            retries_attempted: self.retries_attempted.load(Ordering::Relaxed),
            successful_downloads: self.successful_downloads.load(Ordering::Relaxed),
            failed_downloads: self.failed_downloads.load(Ordering::Relaxed),
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of download metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadMetricsSnapshot {
    pub items_started: u64,
    pub resolved: u64,
    pub not_mirrored: u64,
    pub lookup_failures: u64,
    pub fetch_attempts: u64,
    pub retries_attempted: u64,
    pub successful_downloads: u64,
    pub failed_downloads: u64,
    pub total_bytes: u64,
}

impl DownloadMetricsSnapshot {
    /// Calculate success rate (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.items_started == 0 {
            0.0
        } else {
            self.successful_downloads as f64 / self.items_started as f64
        }
    }

    /// Calculate average file size
    pub fn average_size(&self) -> f64 {
        if self.successful_downloads == 0 {
            0.0
        } else {
            self.total_bytes as f64 / self.successful_downloads as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_derives_rates() {
        let metrics = DownloadMetrics::default();
        for _ in 0..4 {
            metrics.record_item_started();
        }
        metrics.record_download_completed(100);
        metrics.record_download_completed(300);
        metrics.record_download_failed();
        metrics.record_not_mirrored();

        let snap = metrics.snapshot();
        assert_eq!(snap.successful_downloads, 2);
        assert_eq!(snap.total_bytes, 400);
        assert!((snap.success_rate() - 0.5).abs() < f64::EPSILON);
        assert!((snap.average_size() - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_snapshot_has_zero_rates() {
        let snap = DownloadMetricsSnapshot::default();
        assert_eq!(snap.success_rate(), 0.0);
        assert_eq!(snap.average_size(), 0.0);
    }
}
