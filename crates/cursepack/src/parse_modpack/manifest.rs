//! CurseForge modpack archive: `manifest.json` and the optional `modlist.html`

use super::modlist::{parse_modlist_html, ModlistEntry};
use crate::downloader::{AssetRequest, Batch, DownloadError, PlacementRules, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MODLIST_FILE: &str = "modlist.html";

/// Raw `manifest.json` as exported by CurseForge
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModpackManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub minecraft: Option<MinecraftInfo>,
    /// Folder inside the archive whose contents are copied over the instance
    #[serde(default)]
    pub overrides: Option<String>,
    #[serde(default)]
    pub files: Vec<ManifestFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MinecraftInfo {
    #[serde(default)]
    pub version: String,
    #[serde(rename = "modLoaders", default)]
    pub mod_loaders: Vec<ModLoader>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModLoader {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub primary: bool,
}

/// One `files[]` entry. The `required` flag is not read: optional files are
/// downloaded like every other one.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestFile {
    #[serde(rename = "projectID")]
    pub project_id: Option<u64>,
    #[serde(rename = "fileID")]
    pub file_id: Option<u64>,
}

impl ModpackManifest {
    /// Parse and check a manifest; `source` names the archive in errors
    pub fn from_json(json: &str, source: &Path) -> Result<Self> {
        let manifest: ModpackManifest = serde_json::from_str(json).map_err(|e| DownloadError::Manifest {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(position) = manifest
            .files
            .iter()
            .position(|f| f.project_id.is_none() || f.file_id.is_none())
        {
            return Err(DownloadError::Manifest {
                path: source.to_path_buf(),
                reason: format!("file entry #{} has no projectID or fileID", position + 1),
            });
        }

        Ok(manifest)
    }

    /// Id of the loader marked primary, if any
    pub fn primary_loader(&self) -> Option<&str> {
        self.minecraft
            .as_ref()?
            .mod_loaders
            .iter()
            .find(|loader| loader.primary)
            .map(|loader| loader.id.as_str())
    }

    /// `"1.20.1 - forge-47.2.0"`, or empty when the manifest has no `minecraft` block
    pub fn minecraft_version(&self) -> String {
        match &self.minecraft {
            Some(minecraft) => format!("{} - {}", minecraft.version, self.primary_loader().unwrap_or_default()),
            None => String::new(),
        }
    }
}

/// An opened modpack archive
#[derive(Debug, Clone)]
pub struct Modpack {
    pub path: PathBuf,
    pub manifest: ModpackManifest,
    /// Links from `modlist.html`; empty when the archive has none
    pub modlist: Vec<ModlistEntry>,
}

impl Modpack {
    /// Open a modpack zip. Fails if it is not a zip or has no valid `manifest.json`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DownloadError::Archive {
            path: path.to_path_buf(),
            source: zip::result::ZipError::Io(e),
        })?;
        let mut archive = ZipArchive::new(file).map_err(|source| DownloadError::Archive {
            path: path.to_path_buf(),
            source,
        })?;

        let json = read_entry(&mut archive, MANIFEST_FILE, path)?.ok_or_else(|| DownloadError::Manifest {
            path: path.to_path_buf(),
            reason: format!("archive has no {}", MANIFEST_FILE),
        })?;
        let manifest = ModpackManifest::from_json(&json, path)?;

        let modlist = match read_entry(&mut archive, MODLIST_FILE, path)? {
            Some(html) => parse_modlist_html(&html),
            None => Vec::new(),
        };

        debug!(
            "Opened modpack '{}' {} with {} files and {} modlist entries",
            manifest.name,
            manifest.version,
            manifest.files.len(),
            modlist.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            manifest,
            modlist,
        })
    }

    /// Whether the modlist can be matched to the manifest files one to one
    pub fn modlist_matches(&self) -> bool {
        !self.modlist.is_empty() && self.modlist.len() == self.manifest.files.len()
    }

    /// One request per manifest file, in manifest order
    pub fn requests(&self) -> Vec<AssetRequest> {
        let annotate = self.modlist_matches();
        if !self.modlist.is_empty() && !annotate {
            warn!(
                "modlist has {} entries but the manifest lists {} files; ignoring names and kinds",
                self.modlist.len(),
                self.manifest.files.len()
            );
        }

        self.manifest
            .files
            .iter()
            .enumerate()
            .filter_map(|(index, file)| {
                let request = AssetRequest::new(file.project_id?, file.file_id?);
                Some(match self.modlist.get(index).filter(|_| annotate) {
                    Some(entry) => request
                        .with_name(entry.name.clone())
                        .with_url(entry.url.clone())
                        .with_kind(entry.kind),
                    None => request,
                })
            })
            .collect()
    }

    /// The download batch for an instance rooted at `output_dir`
    pub fn to_batch<P: AsRef<Path>>(&self, output_dir: P) -> Batch {
        Batch::new(self.requests(), PlacementRules::under(output_dir))
    }
}

/// Read a whole text entry; `Ok(None)` when the archive does not have it
fn read_entry(archive: &mut ZipArchive<File>, name: &str, path: &Path) -> Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(source) => {
            return Err(DownloadError::Archive {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .map_err(|e| DownloadError::Manifest {
            path: path.to_path_buf(),
            reason: format!("{} is not readable UTF-8 text: {}", name, e),
        })?;
    Ok(Some(contents))
}
