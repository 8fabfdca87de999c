//! Configuration types for the downloader system

use crate::downloader::core::{DownloadError, Result};
use std::time::Duration;

/// Default public CurseForge mirror
pub const DEFAULT_MIRROR_URL: &str = "https://cursemaven.com";
/// Maven group path the mirror publishes every artifact under
pub const DEFAULT_GROUP_PATH: &str = "curse/maven";

/// Configuration for download operations
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Base URL of the mirror, without trailing slash
    pub mirror_url: String,
    pub group_path: String,
    /// Attempts per item, for the lookup and for the download each
    pub max_attempts: usize,
    /// Fixed pause between two attempts
    pub retry_delay: Duration,
    /// Workers per detected core; downloads block on the network, not the CPU
    pub workers_per_core: usize,
    /// Hard worker count, overrides `workers_per_core`
    pub max_workers: Option<usize>,
    /// Size of a single write while streaming a body to disk
    pub chunk_size: usize,
    /// Whole-request cap for the lookup page and the filename probe
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Longest silence tolerated while a body streams; downloads have no total cap
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl DownloadConfig {
    /// Defaults overlaid with `CURSEPACK_*` environment variables
    ///
    /// Recognized: `CURSEPACK_MIRROR_URL`, `CURSEPACK_MAX_ATTEMPTS`,
    /// `CURSEPACK_RETRY_DELAY_SECS`, `CURSEPACK_WORKERS`, `CURSEPACK_TIMEOUT_SECS`,
    /// `CURSEPACK_READ_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let mut builder = DownloadConfigBuilder::new();

        if let Some(url) = lookup("CURSEPACK_MIRROR_URL") {
            builder = builder.mirror_url(url);
        }
        if let Some(raw) = lookup("CURSEPACK_MAX_ATTEMPTS") {
            builder = builder.max_attempts(parse_number("CURSEPACK_MAX_ATTEMPTS", &raw)?);
        }
        if let Some(raw) = lookup("CURSEPACK_RETRY_DELAY_SECS") {
            let secs = parse_number("CURSEPACK_RETRY_DELAY_SECS", &raw)?;
            builder = builder.retry_delay(Duration::from_secs(secs as u64));
        }
        if let Some(raw) = lookup("CURSEPACK_WORKERS") {
            builder = builder.max_workers(parse_number("CURSEPACK_WORKERS", &raw)?);
        }
        if let Some(raw) = lookup("CURSEPACK_TIMEOUT_SECS") {
            let secs = parse_number("CURSEPACK_TIMEOUT_SECS", &raw)?;
            builder = builder.timeout(Duration::from_secs(secs as u64));
        }
        if let Some(raw) = lookup("CURSEPACK_READ_TIMEOUT_SECS") {
            let secs = parse_number("CURSEPACK_READ_TIMEOUT_SECS", &raw)?;
            builder = builder.read_timeout(Duration::from_secs(secs as u64));
        }

        builder.build()
    }

    /// Size of the worker pool for this machine, never zero
    pub fn worker_count(&self) -> usize {
        self.max_workers
            .unwrap_or_else(|| num_cpus::get() * self.workers_per_core)
            .max(1)
    }
}

fn parse_number(field: &str, raw: &str) -> Result<usize> {
    raw.trim().parse::<usize>().map_err(|_| {
        DownloadError::configuration(
            field,
            format!("'{}' is not a whole number", raw),
            Some("Use a non-negative integer"),
        )
    })
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            mirror_url: DEFAULT_MIRROR_URL.to_string(),
            group_path: DEFAULT_GROUP_PATH.to_string(),
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
            workers_per_core: 5,
            max_workers: None,
            chunk_size: 8192,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            user_agent: format!("cursepack/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Fluent builder for [`DownloadConfig`]
#[derive(Debug, Clone, Default)]
pub struct DownloadConfigBuilder {
    config: DownloadConfig,
}

impl DownloadConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. one read with [`DownloadConfig::from_env`]
    pub fn from_config(config: DownloadConfig) -> Self {
        Self { config }
    }

    pub fn mirror_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.mirror_url = url.into();
        self
    }

    pub fn group_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.group_path = path.into();
        self
    }

    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    pub fn workers_per_core(mut self, workers: usize) -> Self {
        self.config.workers_per_core = workers;
        self
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.max_workers = Some(workers);
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, agent: S) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Validate and produce the configuration
    pub fn build(mut self) -> Result<DownloadConfig> {
        let trimmed = self.config.mirror_url.trim_end_matches('/').to_string();
        url::Url::parse(&trimmed).map_err(|source| DownloadError::InvalidUrl {
            url: trimmed.clone(),
            suggestion: "Mirror URL must be absolute, e.g. https://cursemaven.com".to_string(),
            source,
        })?;
        self.config.mirror_url = trimmed;
        self.config.group_path = self.config.group_path.trim_matches('/').to_string();

        if self.config.max_attempts == 0 {
            return Err(DownloadError::configuration(
                "max_attempts",
                "at least one attempt is required",
                Some("Set max_attempts to 1 or more"),
            ));
        }
        if self.config.chunk_size == 0 {
            return Err(DownloadError::configuration("chunk_size", "chunk size must be positive", None));
        }
        for (field, value) in [
            ("timeout", self.config.timeout),
            ("connect_timeout", self.config.connect_timeout),
            ("read_timeout", self.config.read_timeout),
        ] {
            if value.is_zero() {
                return Err(DownloadError::configuration(
                    field,
                    "a zero timeout would fail every request",
                    Some("Use at least one second"),
                ));
            }
        }
        if self.config.max_workers == Some(0) || (self.config.max_workers.is_none() && self.config.workers_per_core == 0) {
            return Err(DownloadError::configuration(
                "max_workers",
                "the worker pool cannot be empty",
                Some("Use at least one worker"),
            ));
        }

        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_mirror_contract() {
        let config = DownloadConfig::default();
        assert_eq!(config.mirror_url, "https://cursemaven.com");
        assert_eq!(config.group_path, "curse/maven");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert!(config.worker_count() >= config.workers_per_core);
    }

    #[test]
    fn builder_normalizes_urls() {
        let config = DownloadConfigBuilder::new()
            .mirror_url("http://localhost:8080/")
            .group_path("/curse/maven/")
            .build()
            .unwrap();
        assert_eq!(config.mirror_url, "http://localhost:8080");
        assert_eq!(config.group_path, "curse/maven");
    }

    #[test]
    fn builder_rejects_bad_values() {
        assert!(DownloadConfigBuilder::new().mirror_url("not a url").build().is_err());
        assert!(DownloadConfigBuilder::new().max_attempts(0).build().is_err());
        assert!(DownloadConfigBuilder::new().chunk_size(0).build().is_err());
        assert!(DownloadConfigBuilder::new().max_workers(0).build().is_err());
        assert!(DownloadConfigBuilder::new().read_timeout(Duration::ZERO).build().is_err());
    }

    #[test]
    fn explicit_worker_count_wins() {
        let config = DownloadConfigBuilder::new().max_workers(3).build().unwrap();
        assert_eq!(config.worker_count(), 3);
    }

    #[test]
    fn environment_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CURSEPACK_MIRROR_URL", "http://127.0.0.1:9000"),
            ("CURSEPACK_MAX_ATTEMPTS", "2"),
            ("CURSEPACK_RETRY_DELAY_SECS", "0"),
            ("CURSEPACK_WORKERS", "7"),
            ("CURSEPACK_TIMEOUT_SECS", "15"),
            ("CURSEPACK_READ_TIMEOUT_SECS", "300"),
        ]);
        let config = DownloadConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.mirror_url, "http://127.0.0.1:9000");
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.retry_delay, Duration::ZERO);
        assert_eq!(config.worker_count(), 7);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.read_timeout, Duration::from_secs(300));
    }

    #[test]
    fn malformed_environment_value_is_a_configuration_error() {
        let err = DownloadConfig::from_lookup(|k| (k == "CURSEPACK_WORKERS").then(|| "many".to_string()))
            .unwrap_err();
        assert_eq!(err.category(), "configuration");
    }
}
