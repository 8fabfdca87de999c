//! `modlist.html` parsing
//!
//! CurseForge exports carry a small HTML page with one link per file, in the
//! same order as the manifest's `files` list:
//!
//! ```html
//! <ul><li><a href="https://www.curseforge.com/minecraft/mc-mods/jei">Just Enough Items (by mezz)</a></li></ul>
//! ```

use crate::downloader::ResourceKind;
use once_cell::sync::Lazy;
use regex::Regex;

const ANCHOR_PATTERN: &str = r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#;
const TAG_PATTERN: &str = r"(?s)<[^>]*>";

static ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(ANCHOR_PATTERN).expect("valid regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(TAG_PATTERN).expect("valid regex"));

/// One link of the modlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModlistEntry {
    pub name: String,
    /// CurseForge project page
    pub url: String,
    pub kind: ResourceKind,
}

/// Every `<a href>` of the page, in document order
pub fn parse_modlist_html(html: &str) -> Vec<ModlistEntry> {
    ANCHOR
        .captures_iter(html)
        .map(|caps| {
            let url = decode_entities(caps[1].trim());
            let text = TAG.replace_all(&caps[2], "");
            let name = decode_entities(text.split_whitespace().collect::<Vec<_>>().join(" ").as_str());
            ModlistEntry {
                kind: ResourceKind::from_project_url(&url),
                name,
                url,
            }
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
