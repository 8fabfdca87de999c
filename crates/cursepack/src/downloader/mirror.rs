//! Seams between the batch engine and the mirror
//!
//! The scheduler only talks to these traits. [`CurseMaven`](crate::downloader::backends::CurseMaven)
//! implements both over HTTP; tests substitute scripted implementations.

use crate::downloader::core::{Resolution, ResolvedAsset, Result};
use async_trait::async_trait;
use std::path::Path;

/// Turns a `project:file` pair into the artifact's canonical filename
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    /// `Ok(Resolution::NotFound)` is an authoritative answer and must not be retried;
    /// `Err` means the lookup itself failed and may succeed later.
    async fn resolve(&self, project_id: u64, file_id: u64) -> Result<Resolution>;
}

/// Downloads one resolved artifact
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Stream the artifact to `destination` and return the number of bytes written.
    ///
    /// `destination` only ever holds a complete body: on error nothing is left there.
    async fn fetch(&self, asset: &ResolvedAsset, destination: &Path) -> Result<u64>;
}
