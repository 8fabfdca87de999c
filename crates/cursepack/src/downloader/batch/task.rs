//! One item, from identifier pair to terminal outcome
//!
//! Resolution runs first and at most once successfully; its answer is reused by
//! every download attempt. An authoritative "not on the mirror" ends the item
//! immediately. Lookup errors and download errors are retried with a fixed
//! pause, up to `max_attempts` tries each.

use super::{PathClaims, PlacementRules};
use crate::downloader::{
    config::DownloadConfig,
    core::{
        AssetRequest, DownloadMetrics, DownloadOutcome, ProgressCallback, ProgressEvent, Resolution,
        ResolutionFailure, ResolvedAsset,
    },
    mirror::{ArtifactFetcher, ArtifactResolver},
};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, info_span, warn, Instrument};

/// Runs the resolve-then-fetch sequence for single items
pub struct RetryingTask {
    resolver: Arc<dyn ArtifactResolver>,
    fetcher: Arc<dyn ArtifactFetcher>,
    placement: PlacementRules,
    max_attempts: usize,
    retry_delay: Duration,
    metrics: Arc<DownloadMetrics>,
    claims: Arc<PathClaims>,
    progress: Option<ProgressCallback>,
}

impl RetryingTask {
    pub fn new(
        resolver: Arc<dyn ArtifactResolver>,
        fetcher: Arc<dyn ArtifactFetcher>,
        placement: PlacementRules,
        config: &DownloadConfig,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            placement,
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay,
            metrics: Arc::new(DownloadMetrics::default()),
            claims: Arc::new(PathClaims::default()),
            progress: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<DownloadMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_claims(mut self, claims: Arc<PathClaims>) -> Self {
        self.claims = claims;
        self
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref callback) = self.progress {
            callback(event);
        }
    }

    /// Pauses between attempts; one fewer than the attempt budget
    fn delays(&self) -> impl Iterator<Item = Duration> {
        FixedInterval::new(self.retry_delay).take(self.max_attempts - 1)
    }

    /// Run item `index` to its terminal outcome. Never fails: errors become outcomes.
    pub async fn run(&self, index: usize, request: AssetRequest) -> DownloadOutcome {
        let span = info_span!("item", index, project_id = request.project_id, file_id = request.file_id);
        self.run_item(index, request).instrument(span).await
    }

    async fn run_item(&self, index: usize, request: AssetRequest) -> DownloadOutcome {
        self.metrics.record_item_started();

        let filename = match self.resolve(index, &request).await {
            Ok(name) => name,
            Err(failure) => return DownloadOutcome::ResolutionFailed(failure),
        };

        let asset = ResolvedAsset::new(request, filename);
        let kind = asset.placement_kind();
        let destination = self.placement.target_path(&asset);

        if let Some(first_index) = self.claims.claim(&destination, index) {
            warn!("Items #{} and #{} both resolve to {}", first_index, index, destination.display());
            self.emit(ProgressEvent::Warning {
                message: format!(
                    "#{} and #{} both resolve to {}",
                    first_index + 1,
                    index + 1,
                    destination.display()
                ),
            });
        }

        let mut delays = self.delays();
        let mut attempt = 1;
        loop {
            self.metrics.record_fetch_attempt();
            match self.fetcher.fetch(&asset, &destination).await {
                Ok(bytes) => {
                    self.metrics.record_download_completed(bytes);
                    debug!("Downloaded {} ({} bytes, attempt {})", asset.resolved_filename, bytes, attempt);
                    return DownloadOutcome::Success {
                        filename: asset.resolved_filename,
                        kind,
                        bytes,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    if e.is_recoverable() {
                        debug!("Attempt {}/{} for {} failed: {}", attempt, self.max_attempts, asset.resolved_filename, e);
                    } else {
                        warn!("Attempt {}/{} for {} failed: {}", attempt, self.max_attempts, asset.resolved_filename, e);
                    }

                    let Some(delay) = delays.next() else {
                        self.metrics.record_download_failed();
                        return DownloadOutcome::DownloadFailed {
                            filename: asset.resolved_filename,
                            attempts: attempt,
                            last_error: e.to_string(),
                        };
                    };

                    attempt += 1;
                    self.pause_before_retry(index, attempt, delay).await;
                }
            }
        }
    }

    /// Look the item up on the mirror, retrying only failed lookups
    async fn resolve(&self, index: usize, request: &AssetRequest) -> Result<String, ResolutionFailure> {
        let mut delays = self.delays();
        let mut attempt = 1;
        loop {
            match self.resolver.resolve(request.project_id, request.file_id).await {
                Ok(Resolution::Found(name)) => {
                    self.metrics.record_resolved();
                    self.emit(ProgressEvent::ItemResolved {
                        index,
                        filename: name.clone(),
                    });
                    return Ok(name);
                }
                Ok(Resolution::NotFound) => {
                    self.metrics.record_not_mirrored();
                    debug!("{} is not mirrored", request.id_pair());
                    self.emit(ProgressEvent::ItemNotMirrored {
                        index,
                        project_id: request.project_id,
                        file_id: request.file_id,
                    });
                    return Err(ResolutionFailure::NotMirrored);
                }
                Err(e) => {
                    warn!("Lookup {}/{} for {} failed: {}", attempt, self.max_attempts, request.id_pair(), e);

                    let Some(delay) = delays.next() else {
                        self.metrics.record_lookup_failed();
                        return Err(ResolutionFailure::Unreachable {
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    };

                    attempt += 1;
                    self.pause_before_retry(index, attempt, delay).await;
                }
            }
        }
    }

    async fn pause_before_retry(&self, index: usize, attempt: usize, delay: Duration) {
        self.metrics.record_retry();
        self.emit(ProgressEvent::RetryAttempt {
            index,
            attempt,
            max_attempts: self.max_attempts,
        });
        tokio::time::sleep(delay).await;
    }
}
