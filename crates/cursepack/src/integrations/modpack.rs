//! High-level modpack install API
//!
//! Provides a fluent API for turning a CurseForge modpack export into a ready
//! instance folder: files from the mirror, overrides, README and, on request,
//! the offline page for whatever could not be fetched.

use crate::downloader::core::FileOperation;
use crate::downloader::{
    BatchDownloader, BatchReport, ConsoleProgressReporter, DownloadConfig, DownloadError, IntoProgressCallback,
    ProgressCallback, ProgressEvent, Result,
};
use crate::parse_modpack::{extract_overrides, write_readme, Modpack};
use crate::report::{FailureSummary, REPORT_FILE_NAME};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// What an install produced
#[derive(Debug)]
pub struct InstallReport {
    pub modpack_name: String,
    pub destination: PathBuf,
    pub batch: BatchReport,
    pub summary: FailureSummary,
    /// Fallback page, when one was requested and something failed
    pub report_page: Option<PathBuf>,
    pub overrides: Vec<PathBuf>,
    pub readme: PathBuf,
}

/// Fluent API builder for modpack installs
pub struct ModpackInstallBuilder {
    modpack_path: PathBuf,
    destination: Option<PathBuf>,
    config: Option<DownloadConfig>,
    progress_callback: Option<ProgressCallback>,
    write_report: bool,
}

impl ModpackInstallBuilder {
    /// Create a new builder for the given modpack zip
    pub fn new<P: AsRef<Path>>(modpack_path: P) -> Self {
        Self {
            modpack_path: modpack_path.as_ref().to_path_buf(),
            destination: None,
            config: None,
            progress_callback: None,
            write_report: false,
        }
    }

    /// Set the instance folder; defaults to a folder named after the zip, next to it
    pub fn destination<P: AsRef<Path>>(mut self, destination: P) -> Self {
        self.destination = Some(destination.as_ref().to_path_buf());
        self
    }

    /// Use this configuration instead of [`DownloadConfig::from_env`]
    pub fn config(mut self, config: DownloadConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use the console progress bar
    pub fn with_console_progress(mut self) -> Self {
        self.progress_callback = Some(ConsoleProgressReporter::new(false).into_callback());
        self
    }

    /// Use a custom progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Write `download_remaining.html` into the instance when items fail
    pub fn report(mut self, write_report: bool) -> Self {
        self.write_report = write_report;
        self
    }

    /// Execute the install
    pub async fn install(self) -> Result<InstallReport> {
        let modpack = Modpack::open(&self.modpack_path)?;
        let destination = self
            .destination
            .unwrap_or_else(|| self.modpack_path.with_extension(""));

        let config = match self.config {
            Some(config) => config,
            None => DownloadConfig::from_env()?,
        };
        let downloader = BatchDownloader::new(config)?;

        info!(
            "Installing '{}' ({} files) into {}",
            modpack.manifest.name,
            modpack.manifest.files.len(),
            destination.display()
        );

        let batch = modpack.to_batch(&destination);
        let report = downloader.run_batch(&batch, self.progress_callback).await?;
        let summary = FailureSummary::from_report(&report);

        let report_page = if self.write_report && !summary.is_empty() {
            let path = destination.join(REPORT_FILE_NAME);
            let page = summary.fallback_report().with_folders(batch.placement()).render();
            tokio::fs::write(&path, page)
                .await
                .map_err(|e| DownloadError::file_system(&path, FileOperation::Write, e))?;
            Some(path)
        } else {
            None
        };

        let overrides = match modpack.manifest.overrides.clone() {
            Some(subfolder) => {
                let zip_path = modpack.path.clone();
                let dest = destination.clone();
                tokio::task::spawn_blocking(move || extract_overrides(&zip_path, &subfolder, &dest))
                    .await
                    .map_err(|e| {
                        DownloadError::file_system(&destination, FileOperation::Write, std::io::Error::other(e))
                    })??
            }
            None => Vec::new(),
        };

        let readme = write_readme(&modpack, batch.len(), &destination)?;

        Ok(InstallReport {
            modpack_name: modpack.manifest.name,
            destination,
            batch: report,
            summary,
            report_page,
            overrides,
            readme,
        })
    }
}
