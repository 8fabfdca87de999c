//! High-level convenience APIs for common workflows
//!
//! This module provides simplified APIs that handle the most common use cases,
//! reducing the amount of boilerplate code users need to write.

pub mod modpack;

// Re-export main convenience APIs
pub use modpack::{InstallReport, ModpackInstallBuilder};
