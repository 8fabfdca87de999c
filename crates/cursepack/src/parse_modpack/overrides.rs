//! Overrides extraction and the instance README

use super::manifest::Modpack;
use crate::downloader::core::FileOperation;
use crate::downloader::{DownloadError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

pub const README_FILE_NAME: &str = "README_MODPACK.txt";

/// Copy every file under `subfolder` of the archive into `dest_dir`, keeping
/// the layout below `subfolder`. A subfolder of `.` copies the whole archive.
///
/// Directory entries and entries whose path would escape `dest_dir` are skipped.
/// Returns the written paths.
pub fn extract_overrides(zip_path: &Path, subfolder: &str, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let archive_error = |source: zip::result::ZipError| DownloadError::Archive {
        path: zip_path.to_path_buf(),
        source,
    };

    let file = File::open(zip_path).map_err(|e| DownloadError::file_system(zip_path, FileOperation::Read, e))?;
    let mut archive = ZipArchive::new(file).map_err(archive_error)?;

    let subfolder = subfolder.trim_matches('/');
    let mut written = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(archive_error)?;
        if entry.is_dir() {
            continue;
        }

        let Some(entry_path) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!("Skipping override entry with unsafe path: {}", entry.name());
            continue;
        };

        let relative = if subfolder == "." {
            entry_path
        } else {
            match entry_path.strip_prefix(subfolder) {
                Ok(rest) if !rest.as_os_str().is_empty() => rest.to_path_buf(),
                _ => continue,
            }
        };

        let target = dest_dir.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| DownloadError::file_system(parent, FileOperation::CreateDir, e))?;
        }

        let mut out = File::create(&target).map_err(|e| DownloadError::file_system(&target, FileOperation::Create, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| DownloadError::file_system(&target, FileOperation::Write, e))?;
        written.push(target);
    }

    debug!("Extracted {} override files to {}", written.len(), dest_dir.display());
    Ok(written)
}

/// Text of the instance README: pack name, version, author, game version and file count
pub fn readme_contents(modpack: &Modpack, total_resources: usize) -> String {
    let manifest = &modpack.manifest;
    let mut description = format!("{} - {}", manifest.name, manifest.version);
    if !manifest.author.is_empty() {
        description.push_str(&format!(" by {}", manifest.author));
    }

    format!(
        "{}\n\nMinecraft {}\nTotal resources (mods, resourcepacks and shaders) downloaded: {}",
        description,
        manifest.minecraft_version(),
        total_resources
    )
}

/// Write [`readme_contents`] to `{dest_dir}/README_MODPACK.txt`
pub fn write_readme(modpack: &Modpack, total_resources: usize, dest_dir: &Path) -> Result<PathBuf> {
    let path = dest_dir.join(README_FILE_NAME);
    fs::write(&path, readme_contents(modpack, total_resources))
        .map_err(|e| DownloadError::file_system(&path, FileOperation::Write, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_modpack::manifest::{ModpackManifest, MANIFEST_FILE};
    use crate::parse_modpack::tests::write_modpack;

    fn fixture(dir: &Path) -> PathBuf {
        let zip_path = dir.join("pack.zip");
        write_modpack(
            &zip_path,
            &[
                (MANIFEST_FILE, r#"{ "files": [] }"#),
                ("overrides/config/jei.toml", "enabled = true"),
                ("overrides/options.txt", "fov:0.5"),
                ("overrides-extra/nope.txt", "no"),
                ("../escape.txt", "bad"),
            ],
        );
        zip_path
    }

    #[test]
    fn copies_only_the_overrides_folder() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = fixture(dir.path());
        let dest = dir.path().join("instance");

        let written = extract_overrides(&zip_path, "overrides/", &dest).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(fs::read_to_string(dest.join("config/jei.toml")).unwrap(), "enabled = true");
        assert_eq!(fs::read_to_string(dest.join("options.txt")).unwrap(), "fov:0.5");
        assert!(!dest.join("nope.txt").exists());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn dot_copies_everything_safe() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = fixture(dir.path());
        let dest = dir.path().join("all");

        let written = extract_overrides(&zip_path, ".", &dest).unwrap();

        assert_eq!(written.len(), 4);
        assert!(dest.join(MANIFEST_FILE).exists());
        assert!(dest.join("overrides-extra/nope.txt").exists());
    }

    #[test]
    fn readme_mentions_author_only_when_known() {
        let mut modpack = Modpack {
            path: PathBuf::from("pack.zip"),
            manifest: ModpackManifest::from_json(
                r#"{ "name": "Pack", "version": "1.0", "author": "Ann",
                     "minecraft": { "version": "1.19.2", "modLoaders": [ { "id": "fabric-0.14", "primary": true } ] } }"#,
                Path::new("pack.zip"),
            )
            .unwrap(),
            modlist: Vec::new(),
        };

        assert_eq!(
            readme_contents(&modpack, 42),
            "Pack - 1.0 by Ann\n\nMinecraft 1.19.2 - fabric-0.14\nTotal resources (mods, resourcepacks and shaders) downloaded: 42"
        );

        modpack.manifest.author.clear();
        assert!(readme_contents(&modpack, 0).starts_with("Pack - 1.0\n\n"));
    }
}
