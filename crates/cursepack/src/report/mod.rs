//! Failure aggregation for a finished batch
//!
//! [`FailureSummary`] turns the error records of a [`BatchReport`] into the
//! console summary (count, share of the batch, failures grouped by kind) and
//! the entries of the offline [`FallbackReport`] page. Nothing here touches the
//! network or the filesystem.

pub mod html;

pub use html::{escape_html, FallbackReport, REPORT_FILE_NAME};

use crate::downloader::{BatchReport, ErrorRecord, FailureKind, ResourceKind};
use std::fmt;

/// One item that has to be fetched by hand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackEntry {
    /// Position in the batch
    pub index: usize,
    pub kind: ResourceKind,
    /// Modlist name, else the resolved filename, else the id pair
    pub name: String,
    pub id_pair: String,
    pub manual_url: Option<String>,
    pub failure: FailureKind,
}

impl FallbackEntry {
    pub fn from_record(record: &ErrorRecord) -> Self {
        let request = &record.request;
        let (kind, resolved_name) = match &record.failure {
            FailureKind::RetriesExhausted { filename, .. } => {
                (request.declared_kind.placement(filename), Some(filename.clone()))
            }
            FailureKind::NotMirrored | FailureKind::ResolutionUnreachable { .. } => (request.declared_kind, None),
        };

        let name = request
            .declared_name
            .clone()
            .or(resolved_name)
            .unwrap_or_else(|| request.id_pair());

        Self {
            index: record.index,
            kind,
            name,
            id_pair: request.id_pair(),
            manual_url: request.manual_download_url(),
            failure: record.failure.clone(),
        }
    }

    /// Link target if one can be derived, else the raw id pair
    pub fn link_or_id(&self) -> &str {
        self.manual_url.as_deref().unwrap_or(&self.id_pair)
    }
}

/// Failed items of one batch, in batch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureSummary {
    pub total: usize,
    pub entries: Vec<FallbackEntry>,
}

impl FailureSummary {
    pub fn new(total: usize, records: &[ErrorRecord]) -> Self {
        let mut entries: Vec<FallbackEntry> = records.iter().map(FallbackEntry::from_record).collect();
        entries.sort_by_key(|e| e.index);
        Self { total, entries }
    }

    pub fn from_report(report: &BatchReport) -> Self {
        Self::new(report.total(), &report.errors)
    }

    pub fn failed(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Share of the batch that failed, 0-100
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.failed() as f64 * 100.0 / self.total as f64
    }

    /// Entries grouped by kind, kinds in [`ResourceKind::ALL`] order, empty groups omitted
    pub fn by_kind(&self) -> Vec<(ResourceKind, Vec<&FallbackEntry>)> {
        ResourceKind::ALL
            .iter()
            .filter_map(|&kind| {
                let group: Vec<&FallbackEntry> = self.entries.iter().filter(|e| e.kind == kind).collect();
                (!group.is_empty()).then_some((kind, group))
            })
            .collect()
    }

    pub fn fallback_report(&self) -> FallbackReport<'_> {
        FallbackReport::new(&self.entries)
    }
}

impl fmt::Display for FailureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "All {} items downloaded", self.total);
        }

        writeln!(
            f,
            "{} of {} items failed ({:.1}%)",
            self.failed(),
            self.total,
            self.percentage()
        )?;

        for (kind, group) in self.by_kind() {
            writeln!(f)?;
            writeln!(f, "{} ({})", kind.label(), group.len())?;
            for entry in group {
                writeln!(f, "  #{:<4} {:<40} {}", entry.index + 1, entry.name, entry.failure)?;
                writeln!(f, "        {}", entry.link_or_id())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::{AssetRequest, DownloadOutcome, ResolutionFailure};
    use std::time::Duration;

    fn example_report() -> BatchReport {
        let requests = vec![
            AssetRequest::new(1, 10).with_kind(ResourceKind::Mod),
            AssetRequest::new(2, 20),
            AssetRequest::new(3, 30),
        ];
        let outcomes = vec![
            DownloadOutcome::Success {
                filename: "ModA.jar".into(),
                kind: ResourceKind::Mod,
                bytes: 10,
                attempts: 1,
            },
            DownloadOutcome::ResolutionFailed(ResolutionFailure::NotMirrored),
            DownloadOutcome::Success {
                filename: "Pack.zip".into(),
                kind: ResourceKind::ResourcePack,
                bytes: 10,
                attempts: 1,
            },
        ];
        BatchReport::new(&requests, outcomes, Vec::new(), Default::default(), Duration::ZERO)
    }

    #[test]
    fn one_of_three_failed() {
        let summary = FailureSummary::from_report(&example_report());

        assert_eq!(summary.failed(), 1);
        assert!((summary.percentage() - 33.333).abs() < 0.01);

        let text = summary.to_string();
        assert!(text.starts_with("1 of 3 items failed (33.3%)"));
        assert!(text.contains("UNDEFINED (1)"));
        assert!(text.contains("2:20"));
    }

    #[test]
    fn manual_link_needs_a_declared_url() {
        let records = vec![
            ErrorRecord {
                index: 0,
                request: AssetRequest::new(238222, 4712345)
                    .with_name("Just Enough Items")
                    .with_url("https://www.curseforge.com/minecraft/mc-mods/jei/")
                    .with_kind(ResourceKind::Mod),
                failure: FailureKind::NotMirrored,
            },
            ErrorRecord {
                index: 1,
                request: AssetRequest::new(5, 50),
                failure: FailureKind::RetriesExhausted {
                    filename: "Faithful.zip".into(),
                    attempts: 5,
                },
            },
        ];
        let summary = FailureSummary::new(2, &records);

        assert_eq!(
            summary.entries[0].link_or_id(),
            "https://www.curseforge.com/minecraft/mc-mods/jei/download/4712345"
        );
        assert_eq!(summary.entries[1].link_or_id(), "5:50");
        assert_eq!(summary.entries[1].name, "Faithful.zip");
        assert_eq!(summary.entries[1].kind, ResourceKind::ResourcePack);
    }

    #[test]
    fn groups_follow_kind_order() {
        let records: Vec<ErrorRecord> = [ResourceKind::ShaderPack, ResourceKind::Mod, ResourceKind::ShaderPack]
            .into_iter()
            .enumerate()
            .map(|(index, kind)| ErrorRecord {
                index,
                request: AssetRequest::new(index as u64, 1).with_kind(kind),
                failure: FailureKind::NotMirrored,
            })
            .collect();
        let summary = FailureSummary::new(10, &records);

        let groups: Vec<(ResourceKind, usize)> =
            summary.by_kind().into_iter().map(|(kind, group)| (kind, group.len())).collect();
        assert_eq!(groups, vec![(ResourceKind::Mod, 1), (ResourceKind::ShaderPack, 2)]);
    }

    #[test]
    fn clean_batch_has_nothing_to_report() {
        let summary = FailureSummary::new(0, &[]);
        assert_eq!(summary.percentage(), 0.0);
        assert_eq!(summary.to_string(), "All 0 items downloaded\n");
    }
}
