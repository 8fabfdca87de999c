//! CurseForge modpack archives
//!
//! A modpack export is a zip with a `manifest.json` listing `projectID`/`fileID`
//! pairs, an optional `modlist.html` with display names and project links, and
//! an overrides folder copied over the instance as-is. [`Modpack`] turns the
//! first two into a download [`Batch`](crate::downloader::Batch).

pub mod manifest;
pub mod modlist;
pub mod overrides;

pub use manifest::{ManifestFile, MinecraftInfo, ModLoader, Modpack, ModpackManifest, MANIFEST_FILE, MODLIST_FILE};
pub use modlist::{parse_modlist_html, ModlistEntry};
pub use overrides::{extract_overrides, readme_contents, write_readme, README_FILE_NAME};
