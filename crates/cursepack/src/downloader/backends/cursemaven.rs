//! CurseMaven mirror backend
//!
//! Lookup: `GET {mirror}/test/{project}/{file}` answers with a plain-text page; a
//! line starting with `Found: ` carries the CDN URL of the file. A `HEAD` on that
//! URL (following redirects) gives the canonical filename. The page is scanned
//! whatever the status, unless the status is a transient one (5xx, 408, 429).
//!
//! Download: `GET {mirror}/{group}/{name}-{project}/{file}/{name}-{project}-{file}.jar`.
//!
//! Lookups are capped by `timeout` as a whole. Downloads are not: a large file
//! may take as long as it needs while bytes keep arriving within `read_timeout`.

use super::content_disposition::{last_path_segment, parse_content_disposition_filename, sanitize_filename};
use crate::downloader::{
    config::DownloadConfig,
    core::{is_transient_status, DownloadError, FileOperation, Resolution, ResolvedAsset, Result},
    mirror::{ArtifactFetcher, ArtifactResolver},
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header::CONTENT_DISPOSITION, Client};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, trace};

const FOUND_MARKER: &str = "Found: ";

/// HTTP client for the CurseMaven mirror
pub struct CurseMaven {
    client: Client,
    config: DownloadConfig,
    staging_seq: AtomicU64,
}

impl CurseMaven {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|source| DownloadError::HttpRequest {
                url: config.mirror_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            config,
            staging_seq: AtomicU64::new(0),
        })
    }

    /// Existence-check page for a `project:file` pair
    pub fn lookup_url(&self, project_id: u64, file_id: u64) -> String {
        format!("{}/test/{}/{}", self.config.mirror_url, project_id, file_id)
    }

    /// Direct download URL for a resolved artifact
    pub fn artifact_url(&self, name: &str, project_id: u64, file_id: u64) -> String {
        let artifact_id = format!("{}-{}", name, project_id);
        let version = file_id.to_string();
        format!(
            "{}/{}/{}/{}/{}-{}.jar",
            self.config.mirror_url, self.config.group_path, artifact_id, version, artifact_id, version
        )
    }

    /// Scan the lookup page for the located-artifact line
    fn find_cdn_url(body: &str) -> Option<&str> {
        body.lines()
            .find_map(|line| line.strip_prefix(FOUND_MARKER))
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Ask the CDN for the file's name: `Content-Disposition` first, final URL second
    async fn discover_filename(&self, cdn_url: &str) -> Result<String> {
        let response = self.client.head(cdn_url).timeout(self.config.timeout).send().await?;

        let advertised = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_disposition_filename);

        let name = match advertised {
            Some(name) => name,
            None => last_path_segment(response.url()).ok_or_else(|| DownloadError::MissingFilename {
                url: response.url().to_string(),
            })?,
        };

        sanitize_filename(&name).ok_or_else(|| DownloadError::MissingFilename {
            url: cdn_url.to_string(),
        })
    }

    fn staging_path(&self, destination: &Path) -> PathBuf {
        let seq = self.staging_seq.fetch_add(1, Ordering::Relaxed);
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        destination.with_file_name(format!("{}.{}.part", name, seq))
    }

    async fn stream_to(&self, url: &str, staging: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let file = fs::File::create(staging)
            .await
            .map_err(|e| DownloadError::file_system(staging, FileOperation::Create, e))?;
        let mut writer = BufWriter::with_capacity(self.config.chunk_size, file);

        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| DownloadError::file_system(staging, FileOperation::Write, e))?;
            written += chunk.len() as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| DownloadError::file_system(staging, FileOperation::Write, e))?;

        Ok(written)
    }
}

#[async_trait]
impl ArtifactResolver for CurseMaven {
    async fn resolve(&self, project_id: u64, file_id: u64) -> Result<Resolution> {
        let lookup_url = self.lookup_url(project_id, file_id);
        debug!("Looking up {}:{} at {}", project_id, file_id, lookup_url);

        let response = self.client.get(&lookup_url).timeout(self.config.timeout).send().await?;
        let status = response.status();
        if is_transient_status(status.as_u16()) {
            return Err(DownloadError::HttpStatus {
                url: lookup_url,
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            debug!("Lookup for {}:{} answered {}", project_id, file_id, status);
        }
        let body = response.text().await?;

        let Some(cdn_url) = Self::find_cdn_url(&body) else {
            trace!("No '{}' line for {}:{}", FOUND_MARKER.trim(), project_id, file_id);
            return Ok(Resolution::NotFound);
        };

        let name = self.discover_filename(cdn_url).await?;
        debug!("Resolved {}:{} to {}", project_id, file_id, name);
        Ok(Resolution::Found(name))
    }
}

#[async_trait]
impl ArtifactFetcher for CurseMaven {
    async fn fetch(&self, asset: &ResolvedAsset, destination: &Path) -> Result<u64> {
        let url = self.artifact_url(
            &asset.resolved_filename,
            asset.request.project_id,
            asset.request.file_id,
        );

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::file_system(parent, FileOperation::CreateDir, e))?;
        }

        let staging = self.staging_path(destination);
        debug!("Downloading {} to {}", url, destination.display());

        match self.stream_to(&url, &staging).await {
            Ok(size) => {
                fs::rename(&staging, destination)
                    .await
                    .map_err(|e| DownloadError::file_system(destination, FileOperation::Move, e))?;
                Ok(size)
            }
            Err(e) => {
                let _ = fs::remove_file(&staging).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::config::DownloadConfigBuilder;
    use crate::downloader::core::AssetRequest;
    use std::time::Duration;
    use tempfile::tempdir;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn mirror_for(server: &MockServer) -> CurseMaven {
        let config = DownloadConfigBuilder::new().mirror_url(server.uri()).build().unwrap();
        CurseMaven::new(config).unwrap()
    }

    #[test]
    fn artifact_url_repeats_coordinate_and_version() {
        let config = DownloadConfig::default();
        let mirror = CurseMaven::new(config).unwrap();
        assert_eq!(
            mirror.artifact_url("jei-1.20.1.jar", 238222, 4712866),
            "https://cursemaven.com/curse/maven/jei-1.20.1.jar-238222/4712866/jei-1.20.1.jar-238222-4712866.jar"
        );
        assert_eq!(mirror.lookup_url(1, 10), "https://cursemaven.com/test/1/10");
    }

    #[test]
    fn found_marker_must_start_the_line() {
        let body = "Checking...\nNot Found: nope\nFound: https://cdn/x/A.jar\nFound: https://cdn/y/B.jar";
        assert_eq!(CurseMaven::find_cdn_url(body), Some("https://cdn/x/A.jar"));
        assert_eq!(CurseMaven::find_cdn_url("Not Found: https://cdn/x"), None);
        assert_eq!(CurseMaven::find_cdn_url("Found: "), None);
    }

    #[tokio::test]
    async fn resolve_prefers_content_disposition() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test/1/10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("Searching...\nFound: {}/files/1/10/download\n", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/files/1/10/download"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("content-disposition", "attachment; filename=\"ModA.jar\""),
            )
            .mount(&server)
            .await;

        let resolution = mirror_for(&server).resolve(1, 10).await.unwrap();
        assert_eq!(resolution, Resolution::Found("ModA.jar".to_string()));
    }

    #[tokio::test]
    async fn resolve_falls_back_to_final_url_after_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test/3/30"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("Found: {}/redirect/30", server.uri())))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/redirect/30"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("{}/edge/files/Pack%20HD.zip", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/edge/files/Pack%20HD.zip"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let resolution = mirror_for(&server).resolve(3, 30).await.unwrap();
        assert_eq!(resolution, Resolution::Found("Pack HD.zip".to_string()));
    }

    #[tokio::test]
    async fn resolve_without_marker_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test/2/20"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Searching...\nNothing here\n"))
            .mount(&server)
            .await;

        let resolution = mirror_for(&server).resolve(2, 20).await.unwrap();
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn lookup_404_page_without_marker_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test/2/20"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
            .mount(&server)
            .await;

        let resolution = mirror_for(&server).resolve(2, 20).await.unwrap();
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn lookup_rate_limit_is_a_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test/2/20"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = mirror_for(&server).resolve(2, 20).await.unwrap_err();
        assert!(matches!(err, DownloadError::HttpStatus { status: 429, .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn lookup_server_error_is_a_transient_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test/2/20"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = mirror_for(&server).resolve(2, 20).await.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.category(), "http_status");
    }

    #[tokio::test]
    async fn fetch_streams_body_into_place() {
        let server = MockServer::start().await;
        let body = vec![7u8; 20_000];
        Mock::given(method("GET"))
            .and(path("/curse/maven/ModA.jar-1/10/ModA.jar-1-10.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let destination = dir.path().join("mods").join("ModA.jar");
        let asset = ResolvedAsset::new(AssetRequest::new(1, 10), "ModA.jar".to_string());

        let size = mirror_for(&server).fetch(&asset, &destination).await.unwrap();

        assert_eq!(size, body.len() as u64);
        assert_eq!(tokio::fs::read(&destination).await.unwrap(), body);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("mods")).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "staging file must be renamed away");
    }

    #[tokio::test]
    async fn slow_download_outlives_the_lookup_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/curse/maven/Big.zip-1/10/Big.zip-1-10.jar"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1u8; 2048])
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let config = DownloadConfigBuilder::new()
            .mirror_url(server.uri())
            .timeout(Duration::from_secs(1))
            .read_timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        let dir = tempdir().unwrap();
        let destination = dir.path().join("Big.zip");
        let asset = ResolvedAsset::new(AssetRequest::new(1, 10), "Big.zip".to_string());

        let size = CurseMaven::new(config).unwrap().fetch(&asset, &destination).await.unwrap();

        assert_eq!(size, 2048);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_nothing_behind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let destination = dir.path().join("ModA.jar");
        let asset = ResolvedAsset::new(AssetRequest::new(1, 10), "ModA.jar".to_string());

        let err = mirror_for(&server).fetch(&asset, &destination).await.unwrap_err();

        assert!(matches!(err, DownloadError::HttpStatus { status: 500, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
