//! Core types used throughout the downloader system
//!
//! This module contains the fundamental types that all other modules depend on.
//! By organizing these in a core module, we make the dependency relationships clear.

pub mod error;
pub mod metrics;
pub mod progress;

pub use error::{is_transient_status, DownloadError, FileOperation, Result};
pub use metrics::{DownloadMetrics, DownloadMetricsSnapshot};
pub use progress::{
    progress_bar_line, CompositeProgressReporter, ConsoleProgressReporter, IntoProgressCallback,
    NullProgressReporter, ProgressCallback, ProgressEvent, ProgressReporter,
};

use std::fmt;

/// Classification of a modpack file, controlling which folder it lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ResourceKind {
    Mod,
    ResourcePack,
    ShaderPack,
    /// Could not be read from the modpack's metadata
    #[default]
    Unknown,
}

impl ResourceKind {
    /// Every kind, in the order summaries list them
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Mod,
        ResourceKind::ResourcePack,
        ResourceKind::ShaderPack,
        ResourceKind::Unknown,
    ];

    /// Map a CurseForge category tag (the `mc-mods` in `/minecraft/mc-mods/jei`) to a kind
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "mc-mods" => ResourceKind::Mod,
            "texture-packs" => ResourceKind::ResourcePack,
            "shaders" => ResourceKind::ShaderPack,
            _ => ResourceKind::Unknown,
        }
    }

    /// Classify from a project page URL; the tag is the second-to-last path segment
    pub fn from_project_url(url: &str) -> Self {
        let parts: Vec<&str> = url.trim_end_matches('/').split('/').collect();
        if parts.len() < 2 {
            return ResourceKind::Unknown;
        }
        Self::from_tag(parts[parts.len() - 2])
    }

    /// Kind used to pick the target folder for a resolved file.
    ///
    /// A declared kind always wins. Without one, a `.zip` name is assumed to be a
    /// resource pack and anything else a mod. This is a naming heuristic, not
    /// content inspection: the mirror gives us no stronger signal.
    pub fn placement(self, resolved_name: &str) -> Self {
        match self {
            ResourceKind::Unknown => {
                if resolved_name.to_ascii_lowercase().ends_with(".zip") {
                    ResourceKind::ResourcePack
                } else {
                    ResourceKind::Mod
                }
            }
            declared => declared,
        }
    }

    /// Label used in console summaries and the report page
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Mod => "MOD",
            ResourceKind::ResourcePack => "RESOURCE PACK",
            ResourceKind::ShaderPack => "SHADER",
            ResourceKind::Unknown => "UNDEFINED",
        }
    }

    /// [`label`](Self::label) centered in 13 columns, for monospace report cells
    pub fn padded_label(self) -> &'static str {
        match self {
            ResourceKind::Mod => "     MOD     ",
            ResourceKind::ResourcePack => "RESOURCE PACK",
            ResourceKind::ShaderPack => "   SHADER    ",
            ResourceKind::Unknown => "  UNDEFINED  ",
        }
    }

    /// Report page color
    pub fn color(self) -> &'static str {
        match self {
            ResourceKind::Mod => "#1976D2",
            ResourceKind::ResourcePack => "#FF8F00",
            ResourceKind::ShaderPack => "#7B1FA2",
            ResourceKind::Unknown => "#757575",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One file of the batch, as declared by the modpack
///
/// Immutable once built; its position in the batch is its identity in reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub project_id: u64,
    pub file_id: u64,
    /// Display name from the modpack's modlist, if any
    pub declared_name: Option<String>,
    /// CurseForge project page, if any
    pub declared_url: Option<String>,
    pub declared_kind: ResourceKind,
}

impl AssetRequest {
    pub fn new(project_id: u64, file_id: u64) -> Self {
        Self {
            project_id,
            file_id,
            declared_name: None,
            declared_url: None,
            declared_kind: ResourceKind::Unknown,
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.declared_name = Some(name.into());
        self
    }

    pub fn with_url<S: Into<String>>(mut self, url: S) -> Self {
        self.declared_url = Some(url.into());
        self
    }

    pub fn with_kind(mut self, kind: ResourceKind) -> Self {
        self.declared_kind = kind;
        self
    }

    /// The raw `project:file` pair shown when nothing better is known
    pub fn id_pair(&self) -> String {
        format!("{}:{}", self.project_id, self.file_id)
    }

    /// Name for humans: the modlist name, else the id pair
    pub fn display_name(&self) -> String {
        self.declared_name.clone().unwrap_or_else(|| self.id_pair())
    }

    /// Manual download page: `{project url}/download/{file id}`
    pub fn manual_download_url(&self) -> Option<String> {
        self.declared_url
            .as_deref()
            .map(|url| format!("{}/download/{}", url.trim_end_matches('/'), self.file_id))
    }
}

/// A request plus the filename the mirror resolved it to
///
/// Built once per item, after which the name is never changed; every fetch
/// attempt for the item reuses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub request: AssetRequest,
    pub resolved_filename: String,
}

impl ResolvedAsset {
    pub fn new(request: AssetRequest, resolved_filename: String) -> Self {
        Self { request, resolved_filename }
    }

    /// Kind used for placement, see [`ResourceKind::placement`]
    pub fn placement_kind(&self) -> ResourceKind {
        self.request.declared_kind.placement(&self.resolved_filename)
    }
}

/// Answer of the mirror's lookup endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    /// Authoritative: the mirror has no record of this file
    NotFound,
}

/// Why an item could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// The mirror answered and does not carry the file
    NotMirrored,
    /// Every lookup attempt hit a transport or server error
    Unreachable { attempts: usize, last_error: String },
}

/// Terminal result for one item of the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success {
        filename: String,
        kind: ResourceKind,
        bytes: u64,
        attempts: usize,
    },
    ResolutionFailed(ResolutionFailure),
    DownloadFailed {
        filename: String,
        attempts: usize,
        last_error: String,
    },
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }

    /// Failure class for error records; `None` for successes
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            DownloadOutcome::Success { .. } => None,
            DownloadOutcome::ResolutionFailed(ResolutionFailure::NotMirrored) => Some(FailureKind::NotMirrored),
            DownloadOutcome::ResolutionFailed(ResolutionFailure::Unreachable { attempts, .. }) => {
                Some(FailureKind::ResolutionUnreachable { attempts: *attempts })
            }
            DownloadOutcome::DownloadFailed { filename, attempts, .. } => Some(FailureKind::RetriesExhausted {
                filename: filename.clone(),
                attempts: *attempts,
            }),
        }
    }
}

/// Failure class carried by an [`ErrorRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    NotMirrored,
    ResolutionUnreachable { attempts: usize },
    RetriesExhausted { filename: String, attempts: usize },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotMirrored => write!(f, "not available on the mirror"),
            FailureKind::ResolutionUnreachable { attempts } => {
                write!(f, "mirror lookup failed after {} attempts", attempts)
            }
            FailureKind::RetriesExhausted { filename, attempts } => {
                write!(f, "{} failed to download after {} attempts", filename, attempts)
            }
        }
    }
}

/// A failed item, addressed by its index in the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub index: usize,
    pub request: AssetRequest,
    pub failure: FailureKind,
}
