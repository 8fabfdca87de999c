//! CurseForge modpack downloader library
//!
//! This library resolves the `projectID`/`fileID` pairs of a CurseForge
//! modpack export against the CurseMaven mirror, downloads them with a bounded
//! worker pool and per-item retries, places each file by kind, and reports
//! what has to be fetched by hand.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cursepack::{Batch, BatchDownloader, AssetRequest, DownloadConfig, FailureSummary, PlacementRules};
//!
//! # async fn example() -> cursepack::Result<()> {
//! let downloader = BatchDownloader::new(DownloadConfig::default())?;
//!
//! let batch = Batch::new(
//!     vec![AssetRequest::new(238222, 4712345), AssetRequest::new(394468, 4645340)],
//!     PlacementRules::under("/games/my-pack"),
//! );
//!
//! let report = downloader.run_batch(&batch, None).await?;
//! print!("{}", FailureSummary::from_report(&report));
//! # Ok(())
//! # }
//! ```
//!
//! Whole modpack archives go through [`ModpackInstallBuilder`]:
//!
//! ```rust,no_run
//! # async fn example() -> cursepack::Result<()> {
//! let installed = cursepack::ModpackInstallBuilder::new("All the Mods.zip")
//!     .destination("/games/atm")
//!     .with_console_progress()
//!     .report(true)
//!     .install()
//!     .await?;
//! println!("{} of {} files failed", installed.summary.failed(), installed.batch.total());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Mirror resolution**: "not mirrored" is an answer, not an error, and is never retried
//! - **Retry logic**: fixed-delay retries for lookups and downloads
//! - **Bounded concurrency**: worker pool sized from the CPU count
//! - **Placement**: mods, resource packs and shader packs land in their own folders
//! - **Progress tracking**: events plus a console progress bar
//! - **Fallback report**: grouped console summary and an offline HTML page with manual links

pub mod downloader;
pub mod integrations;
pub mod parse_modpack;
pub mod report;

// Re-export commonly used types for convenience
pub use downloader::{
    AssetRequest, Batch, BatchDownloader, BatchReport, DownloadConfig, DownloadConfigBuilder, DownloadError,
    DownloadOutcome, PlacementRules, ProgressCallback, ProgressEvent, ResourceKind, Result,
};
pub use integrations::{InstallReport, ModpackInstallBuilder};
pub use parse_modpack::Modpack;
pub use report::{FailureSummary, FallbackReport};
