//! Downloader module
//!
//! This module contains the download engine: configuration, core types, the
//! mirror seam and its CurseMaven backend, and the batch scheduler.

pub mod backends;
pub mod batch;
pub mod config;
pub mod core;
pub mod engine;
pub mod mirror;

// Re-export main types for convenience
pub use backends::CurseMaven;
pub use batch::{Batch, BatchReport, NamingCollision, PlacementRules, RetryingTask, Scheduler};
pub use config::{DownloadConfig, DownloadConfigBuilder};
pub use core::{
    AssetRequest, CompositeProgressReporter, ConsoleProgressReporter, DownloadError, DownloadMetrics,
    DownloadMetricsSnapshot, DownloadOutcome, ErrorRecord, FailureKind, IntoProgressCallback,
    NullProgressReporter, ProgressCallback, ProgressEvent, ProgressReporter, Resolution, ResolutionFailure,
    ResolvedAsset, ResourceKind, Result,
};
pub use engine::BatchDownloader;
pub use mirror::{ArtifactFetcher, ArtifactResolver};
