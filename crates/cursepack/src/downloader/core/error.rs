//! Error types for the modpack downloader with context and recovery information
//!
//! Per-item failures (a mod that is not mirrored, a flaky download) are never
//! surfaced through this type past the batch boundary: the scheduler turns them
//! into [`DownloadOutcome`](super::DownloadOutcome) values. `DownloadError` is what
//! a single resolve or fetch attempt returns, and what batch-level setup
//! (configuration, manifest loading) fails with.

use std::error::Error;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for the downloader with context and recovery information
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Transport-level HTTP failure (connection reset, DNS, TLS, body read)
    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered, but not with a success status
    #[error("HTTP request to '{url}' returned status {status}")]
    HttpStatus {
        url: String,
        status: u16,
    },

    /// Network timeout
    #[error("Request to '{url}' timed out (try increasing timeout or check network)")]
    NetworkTimeout {
        url: String,
    },

    /// File system I/O errors with file context
    #[error("File operation failed: {operation} '{path}'")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// URL parsing errors with helpful suggestions
    #[error("Invalid URL '{url}': {suggestion}")]
    InvalidUrl {
        url: String,
        suggestion: String,
        #[source]
        source: url::ParseError,
    },

    /// The mirror's lookup page pointed somewhere we cannot name a file after
    #[error("Could not determine a filename for '{url}'")]
    MissingFilename {
        url: String,
    },

    /// A placement folder could not be created, so nothing was scheduled
    #[error("Cannot create target folder '{path}'")]
    TargetFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
        suggestion: Option<String>,
    },

    /// The modpack manifest is missing or malformed; fatal to the whole batch
    #[error("Invalid modpack manifest in '{path}': {reason}")]
    Manifest {
        path: PathBuf,
        reason: String,
    },

    /// Reading the modpack archive itself failed
    #[error("Modpack archive '{path}' could not be read")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// Types of file operations for error context
#[derive(Debug, Clone, PartialEq)]
pub enum FileOperation {
    Read,
    Write,
    Create,
    Move,
    CreateDir,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Create => write!(f, "creating"),
            FileOperation::Move => write!(f, "moving"),
            FileOperation::CreateDir => write!(f, "creating directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

/// Statuses worth asking again for: server errors, request timeout, rate limiting
pub fn is_transient_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

impl DownloadError {
    /// Wrap an I/O error with the path and operation that produced it
    pub fn file_system<P: Into<PathBuf>>(path: P, operation: FileOperation, source: std::io::Error) -> Self {
        DownloadError::FileSystem {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Build a configuration error for a specific field
    pub fn configuration<S: Into<String>>(field: &str, message: S, suggestion: Option<&str>) -> Self {
        DownloadError::Configuration {
            message: message.into(),
            field: Some(field.to_string()),
            suggestion: suggestion.map(str::to_string),
        }
    }

    /// Check if error is recoverable (worth another attempt)
    pub fn is_recoverable(&self) -> bool {
        match self {
            DownloadError::HttpRequest { .. } => true,
            DownloadError::HttpStatus { status, .. } => is_transient_status(*status),
            DownloadError::NetworkTimeout { .. } => true,
            DownloadError::FileSystem { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::UnexpectedEof
            ),
            DownloadError::MissingFilename { .. } => true,
            DownloadError::TargetFolder { .. } => false,
            DownloadError::InvalidUrl { .. } => false,
            DownloadError::Configuration { .. } => false,
            DownloadError::Manifest { .. } => false,
            DownloadError::Archive { .. } => false,
        }
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            DownloadError::HttpRequest { .. } => "http_request",
            DownloadError::HttpStatus { .. } => "http_status",
            DownloadError::NetworkTimeout { .. } => "network_timeout",
            DownloadError::FileSystem { .. } => "file_system",
            DownloadError::InvalidUrl { .. } => "invalid_url",
            DownloadError::MissingFilename { .. } => "missing_filename",
            DownloadError::TargetFolder { .. } => "target_folder",
            DownloadError::Configuration { .. } => "configuration",
            DownloadError::Manifest { .. } => "manifest",
            DownloadError::Archive { .. } => "archive",
        }
    }

    /// Whether this error stopped the batch before any item was scheduled
    pub fn is_batch_level(&self) -> bool {
        matches!(
            self,
            DownloadError::Configuration { .. }
                | DownloadError::InvalidUrl { .. }
                | DownloadError::TargetFolder { .. }
                | DownloadError::Manifest { .. }
                | DownloadError::Archive { .. }
        )
    }

    /// Get user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            DownloadError::NetworkTimeout { .. } => {
                Some("Check your internet connection or try increasing the timeout value")
            }
            DownloadError::InvalidUrl { suggestion, .. } => Some(suggestion),
            DownloadError::Configuration { suggestion, .. } => suggestion.as_deref(),
            DownloadError::TargetFolder { .. } => Some("Choose an output folder you can write to"),
            DownloadError::Manifest { .. } | DownloadError::Archive { .. } => {
                Some("Select a CurseForge modpack export (.zip containing manifest.json)")
            }
            _ => None,
        }
    }

    /// Create a detailed error report for debugging
    pub fn detailed_report(&self) -> String {
        let mut report = format!("Error: {}\n", self);
        report.push_str(&format!("Category: {}\n", self.category()));
        report.push_str(&format!("Recoverable: {}\n", self.is_recoverable()));

        if let Some(suggestion) = self.suggestion() {
            report.push_str(&format!("Suggestion: {}\n", suggestion));
        }

        if let Some(source) = self.source() {
            report.push_str(&format!("Root cause: {}\n", source));
        }

        report
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(error: reqwest::Error) -> Self {
        let url = error.url().map(|u| u.to_string()).unwrap_or_else(|| "<unknown>".to_string());

        if error.is_timeout() {
            DownloadError::NetworkTimeout { url }
        } else if let Some(status) = error.status() {
            DownloadError::HttpStatus {
                url,
                status: status.as_u16(),
            }
        } else {
            DownloadError::HttpRequest { url, source: error }
        }
    }
}
