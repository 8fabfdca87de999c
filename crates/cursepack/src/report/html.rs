//! Offline page listing the files that must be downloaded by hand

use super::FallbackEntry;
use crate::downloader::{PlacementRules, ResourceKind};
use std::fmt::Write;

/// File name the install pipeline writes the page to
pub const REPORT_FILE_NAME: &str = "download_remaining.html";

/// Escape text for HTML element content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders the fallback page for a set of failed items
#[derive(Debug, Clone)]
pub struct FallbackReport<'a> {
    entries: &'a [FallbackEntry],
    folders: Option<&'a PlacementRules>,
}

impl<'a> FallbackReport<'a> {
    pub fn new(entries: &'a [FallbackEntry]) -> Self {
        Self { entries, folders: None }
    }

    /// Show where each kind of file has to be put
    pub fn with_folders(mut self, folders: &'a PlacementRules) -> Self {
        self.folders = Some(folders);
        self
    }

    pub fn render(&self) -> String {
        let mut page = String::new();
        // Writing into a String cannot fail
        let _ = self.write_page(&mut page);
        page
    }

    fn write_page(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "<!DOCTYPE html>")?;
        writeln!(out, "<html>")?;
        writeln!(out, "<head>")?;
        writeln!(out, "    <meta charset=\"UTF-8\">")?;
        writeln!(out, "    <title>Download remaining mods</title>")?;
        writeln!(out, "</head>")?;
        writeln!(out, "<body>")?;
        write!(
            out,
            "    <p>\n        <b>These files couldn't be downloaded automatically. \
             Please download them manually and put them in their respective folders"
        )?;

        match self.folders {
            Some(folders) => {
                writeln!(out, ":</b>")?;
                writeln!(out, "        <br>")?;
                writeln!(out, "        <table border=\"1\" cellpadding=\"5\">")?;
                writeln!(out, "            <tr><th>Folder</th><th>Local path</th></tr>")?;
                for (title, kind) in [
                    ("Mods folder", ResourceKind::Mod),
                    ("Resource packs folder", ResourceKind::ResourcePack),
                    ("Shaders folder", ResourceKind::ShaderPack),
                ] {
                    writeln!(
                        out,
                        "            <tr><td>{}</td><td><span style=\"color: {}; font-family: monospace; \
                         font-size: 1.25em;\">{}</span></td></tr>",
                        title,
                        kind.color(),
                        escape_html(&folders.directory_for(kind).display().to_string())
                    )?;
                }
                writeln!(out, "        </table>")?;
            }
            None => writeln!(out, ".</b>")?,
        }
        writeln!(out, "    </p>")?;

        writeln!(out, "    <p><b>Downloads:</b></p>")?;
        writeln!(out, "    <table border=\"1\" cellpadding=\"5\">")?;
        writeln!(out, "        <tr><th>Resource type</th><th>Download link</th></tr>")?;
        for entry in self.entries {
            self.write_row(out, entry)?;
        }
        writeln!(out, "    </table>")?;
        writeln!(out, "</body>")?;
        writeln!(out, "</html>")
    }

    fn write_row(&self, out: &mut String, entry: &FallbackEntry) -> std::fmt::Result {
        let target = match &entry.manual_url {
            Some(url) => format!("<a href=\"{}\">{}</a>", escape_html(url), escape_html(&entry.name)),
            None if entry.name == entry.id_pair => escape_html(&entry.id_pair),
            None => format!("{} ({})", escape_html(&entry.name), escape_html(&entry.id_pair)),
        };

        writeln!(
            out,
            "        <tr><td><b style=\"color: {}; font-family: monospace; white-space: pre;\">{}</b></td>\
             <td>{}</td></tr>",
            entry.kind.color(),
            entry.kind.padded_label(),
            target
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::{AssetRequest, ErrorRecord, FailureKind};
    use crate::report::FailureSummary;

    fn summary() -> FailureSummary {
        FailureSummary::new(
            3,
            &[
                ErrorRecord {
                    index: 0,
                    request: AssetRequest::new(1, 10)
                        .with_name("Mod <A> & B")
                        .with_url("https://www.curseforge.com/minecraft/mc-mods/mod-a")
                        .with_kind(ResourceKind::Mod),
                    failure: FailureKind::NotMirrored,
                },
                ErrorRecord {
                    index: 2,
                    request: AssetRequest::new(3, 30),
                    failure: FailureKind::ResolutionUnreachable { attempts: 5 },
                },
            ],
        )
    }

    #[test]
    fn rows_carry_label_color_and_link() {
        let summary = summary();
        let page = summary.fallback_report().render();

        assert!(page.contains(
            "<a href=\"https://www.curseforge.com/minecraft/mc-mods/mod-a/download/10\">Mod &lt;A&gt; &amp; B</a>"
        ));
        assert!(page.contains("<b style=\"color: #1976D2; font-family: monospace; white-space: pre;\">     MOD     </b>"));
        assert!(page.contains("<td>3:30</td>"));
        assert!(page.contains("#757575; font-family: monospace; white-space: pre;\">  UNDEFINED  </b>"));
        assert!(!page.contains("Mods folder"));
    }

    #[test]
    fn folders_are_listed_when_known() {
        let summary = summary();
        let folders = PlacementRules::under("/games/pack");
        let page = summary.fallback_report().with_folders(&folders).render();

        assert!(page.contains("Mods folder"));
        assert!(page.contains(&folders.resourcepacks_dir.display().to_string()));
        assert!(page.contains(&folders.shaderpacks_dir.display().to_string()));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("a<b>&\"'"), "a&lt;b&gt;&amp;&quot;&#39;");
    }
}
