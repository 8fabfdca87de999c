//! Batch types: the request list, where files go, and what came back
//!
//! [`task`] runs one item to a terminal outcome; [`scheduler`] runs a whole
//! batch through a bounded worker pool.

pub mod scheduler;
pub mod task;

pub use scheduler::Scheduler;
pub use task::RetryingTask;

use crate::downloader::core::{
    AssetRequest, DownloadError, DownloadMetricsSnapshot, DownloadOutcome, ErrorRecord,
    ResolutionFailure, ResolvedAsset, ResourceKind, Result,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::fs;

/// Target folder for each resource kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRules {
    pub mods_dir: PathBuf,
    pub resourcepacks_dir: PathBuf,
    pub shaderpacks_dir: PathBuf,
}

impl PlacementRules {
    pub fn new<P: Into<PathBuf>>(mods_dir: P, resourcepacks_dir: P, shaderpacks_dir: P) -> Self {
        Self {
            mods_dir: mods_dir.into(),
            resourcepacks_dir: resourcepacks_dir.into(),
            shaderpacks_dir: shaderpacks_dir.into(),
        }
    }

    /// The standard `mods/`, `resourcepacks/` and `shaderpacks/` layout of a game folder
    pub fn under<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self::new(root.join("mods"), root.join("resourcepacks"), root.join("shaderpacks"))
    }

    /// Folder for a placement kind; unknown kinds land with the mods
    pub fn directory_for(&self, kind: ResourceKind) -> &Path {
        match kind {
            ResourceKind::ResourcePack => &self.resourcepacks_dir,
            ResourceKind::ShaderPack => &self.shaderpacks_dir,
            ResourceKind::Mod | ResourceKind::Unknown => &self.mods_dir,
        }
    }

    /// Where a resolved asset is written
    pub fn target_path(&self, asset: &ResolvedAsset) -> PathBuf {
        self.directory_for(asset.placement_kind()).join(&asset.resolved_filename)
    }

    /// Create all three folders
    pub async fn create_directories(&self) -> Result<()> {
        for dir in [&self.mods_dir, &self.resourcepacks_dir, &self.shaderpacks_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| DownloadError::TargetFolder {
                    path: dir.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// The ordered request list of one run plus its placement rules
#[derive(Debug, Clone)]
pub struct Batch {
    requests: Vec<AssetRequest>,
    placement: PlacementRules,
}

impl Batch {
    pub fn new(requests: Vec<AssetRequest>, placement: PlacementRules) -> Self {
        Self { requests, placement }
    }

    pub fn requests(&self) -> &[AssetRequest] {
        &self.requests
    }

    pub fn placement(&self) -> &PlacementRules {
        &self.placement
    }

    pub fn get(&self, index: usize) -> Option<&AssetRequest> {
        self.requests.get(index)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Two items that resolved to the same file in the same folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingCollision {
    pub first_index: usize,
    pub second_index: usize,
    pub path: PathBuf,
}

/// Target paths already taken by an item of the running batch
#[derive(Debug, Default)]
pub struct PathClaims {
    claimed: Mutex<HashMap<PathBuf, usize>>,
    collisions: Mutex<Vec<NamingCollision>>,
}

impl PathClaims {
    /// Claim `path` for `index`; returns the earlier owner on a collision
    pub fn claim(&self, path: &Path, index: usize) -> Option<usize> {
        let mut claimed = self.claimed.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match claimed.get(path) {
            Some(&first_index) => {
                self.collisions
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(NamingCollision {
                        first_index,
                        second_index: index,
                        path: path.to_path_buf(),
                    });
                Some(first_index)
            }
            None => {
                claimed.insert(path.to_path_buf(), index);
                None
            }
        }
    }

    /// Collisions seen so far, ordered by the later item's index
    pub fn collisions(&self) -> Vec<NamingCollision> {
        let mut collisions = self
            .collisions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        collisions.sort_by_key(|c| c.second_index);
        collisions
    }
}

/// Everything a finished batch produced
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One outcome per request, at the request's index
    pub outcomes: Vec<DownloadOutcome>,
    /// Failed items in index order
    pub errors: Vec<ErrorRecord>,
    pub collisions: Vec<NamingCollision>,
    pub metrics: DownloadMetricsSnapshot,
    pub duration: Duration,
}

impl BatchReport {
    /// Assemble a report; error records are derived from the outcomes
    pub fn new(
        requests: &[AssetRequest],
        outcomes: Vec<DownloadOutcome>,
        collisions: Vec<NamingCollision>,
        metrics: DownloadMetricsSnapshot,
        duration: Duration,
    ) -> Self {
        let errors = outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| {
                outcome.failure_kind().map(|failure| ErrorRecord {
                    index,
                    request: requests[index].clone(),
                    failure,
                })
            })
            .collect();

        Self {
            outcomes,
            errors,
            collisions,
            metrics,
            duration,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn resolution_failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DownloadOutcome::ResolutionFailed(_)))
            .count()
    }

    pub fn not_mirrored(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DownloadOutcome::ResolutionFailed(ResolutionFailure::NotMirrored)))
            .count()
    }

    pub fn download_failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, DownloadOutcome::DownloadFailed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_follows_declared_kind_then_zip_heuristic() {
        let rules = PlacementRules::under("/pack");
        let pack = ResolvedAsset::new(AssetRequest::new(3, 30), "Pack.zip".into());
        let shader = ResolvedAsset::new(
            AssetRequest::new(4, 40).with_kind(ResourceKind::ShaderPack),
            "BSL.zip".into(),
        );
        let jar = ResolvedAsset::new(AssetRequest::new(1, 10), "ModA.jar".into());

        assert_eq!(rules.target_path(&pack), PathBuf::from("/pack/resourcepacks/Pack.zip"));
        assert_eq!(rules.target_path(&shader), PathBuf::from("/pack/shaderpacks/BSL.zip"));
        assert_eq!(rules.target_path(&jar), PathBuf::from("/pack/mods/ModA.jar"));
    }

    #[test]
    fn second_claim_on_a_path_is_a_collision() {
        let claims = PathClaims::default();
        let path = Path::new("/pack/mods/same.jar");
        assert_eq!(claims.claim(path, 0), None);
        assert_eq!(claims.claim(Path::new("/pack/mods/other.jar"), 1), None);
        assert_eq!(claims.claim(path, 5), Some(0));
        assert_eq!(
            claims.collisions(),
            vec![NamingCollision {
                first_index: 0,
                second_index: 5,
                path: path.to_path_buf()
            }]
        );
    }

    #[test]
    fn report_counts_every_outcome_class() {
        let requests = vec![AssetRequest::new(1, 10), AssetRequest::new(2, 20), AssetRequest::new(3, 30)];
        let outcomes = vec![
            DownloadOutcome::Success {
                filename: "a.jar".into(),
                kind: ResourceKind::Mod,
                bytes: 3,
                attempts: 1,
            },
            DownloadOutcome::ResolutionFailed(ResolutionFailure::NotMirrored),
            DownloadOutcome::DownloadFailed {
                filename: "c.jar".into(),
                attempts: 5,
                last_error: "503".into(),
            },
        ];
        let report = BatchReport::new(&requests, outcomes, Vec::new(), Default::default(), Duration::ZERO);

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded() + report.resolution_failed() + report.download_failed(), 3);
        assert_eq!(report.not_mirrored(), 1);
        assert_eq!(report.errors.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(report.errors[0].request, requests[1]);
    }

    #[tokio::test]
    async fn create_directories_makes_all_three() {
        let dir = tempfile::tempdir().unwrap();
        let rules = PlacementRules::under(dir.path());
        rules.create_directories().await.unwrap();
        assert!(rules.mods_dir.is_dir());
        assert!(rules.resourcepacks_dir.is_dir());
        assert!(rules.shaderpacks_dir.is_dir());
    }
}
