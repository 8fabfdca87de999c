//! Main entry point for batch downloads
//!
//! The call chain flows as follows:
//!
//! User Code
//! ↓
//! BatchDownloader (this file)
//! ↓
//! Scheduler (batch/scheduler.rs), one RetryingTask per item (batch/task.rs)
//! ↓
//! ArtifactResolver + ArtifactFetcher (mirror.rs), CurseMaven by default (backends/)

use crate::downloader::{
    batch::{Batch, BatchReport, PathClaims, RetryingTask, Scheduler},
    backends::CurseMaven,
    config::DownloadConfig,
    core::{DownloadMetrics, ProgressCallback, ProgressEvent, Result},
    mirror::{ArtifactFetcher, ArtifactResolver},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Resolves and downloads whole batches against a mirror
pub struct BatchDownloader {
    resolver: Arc<dyn ArtifactResolver>,
    fetcher: Arc<dyn ArtifactFetcher>,
    config: DownloadConfig,
}

impl BatchDownloader {
    /// Create a downloader backed by the CurseMaven mirror named in `config`
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let mirror = Arc::new(CurseMaven::new(config.clone())?);
        Ok(Self {
            resolver: mirror.clone(),
            fetcher: mirror,
            config,
        })
    }

    /// Create a downloader with custom backends
    pub fn with_backends(
        resolver: Arc<dyn ArtifactResolver>,
        fetcher: Arc<dyn ArtifactFetcher>,
        config: DownloadConfig,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            config,
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Run every item of `batch` to a terminal outcome.
    ///
    /// Per-item failures never make this fail; they are reported in
    /// [`BatchReport::errors`]. Only batch-level problems (the target folders
    /// cannot be created) return `Err`, and they do so before any download starts.
    pub async fn run_batch(&self, batch: &Batch, progress: Option<ProgressCallback>) -> Result<BatchReport> {
        let started = Instant::now();
        batch.placement().create_directories().await?;

        let scheduler = Scheduler::new(self.config.worker_count().min(batch.len().max(1)));
        info!("Starting batch of {} items with {} workers", batch.len(), scheduler.workers());

        if let Some(ref callback) = progress {
            callback(ProgressEvent::BatchStarted {
                total: batch.len(),
                workers: scheduler.workers(),
            });
        }

        let metrics = Arc::new(DownloadMetrics::default());
        let claims = Arc::new(PathClaims::default());
        let task = Arc::new(
            RetryingTask::new(
                self.resolver.clone(),
                self.fetcher.clone(),
                batch.placement().clone(),
                &self.config,
            )
            .with_metrics(metrics.clone())
            .with_claims(claims.clone())
            .with_progress(progress.clone()),
        );

        let outcomes = scheduler.run(task, batch.requests(), progress.clone()).await;

        let report = BatchReport::new(
            batch.requests(),
            outcomes,
            claims.collisions(),
            metrics.snapshot(),
            started.elapsed(),
        );

        info!(
            "Batch finished: {} of {} succeeded, {} failed in {:.1}s",
            report.succeeded(),
            report.total(),
            report.failed(),
            report.duration.as_secs_f64()
        );

        if let Some(ref callback) = progress {
            callback(ProgressEvent::BatchFinished {
                total: report.total(),
                failed: report.failed(),
            });
        }

        Ok(report)
    }
}
