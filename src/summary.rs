use colored::*;
use serde::Serialize;
use std::path::PathBuf;

use crate::downloader::{DownloadOutcome, DownloadRecord};
use crate::html_parser::ResourceKind;
use crate::loader::SourceEncoding;

/// Found/stored/cached/failed counts for one resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    /// Distinct external URLs found.
    pub found: usize,
    pub downloaded: usize,
    pub cached: usize,
    pub failed: usize,
}

impl KindCounts {
    pub fn localized(&self) -> usize {
        self.downloaded + self.cached
    }
}

/// What a run did. Printing it is a side effect only.
#[derive(Debug, Clone, Serialize)]
pub struct LocalizationSummary {
    pub source_html: PathBuf,
    /// `None` when nothing needed localizing and no file was written.
    pub output_html: Option<PathBuf>,
    pub encoding: SourceEncoding,
    pub scripts: KindCounts,
    pub stylesheets: KindCounts,
    pub replacements: usize,
    pub resources: Vec<DownloadRecord>,
    /// Zip archive written when bundling was requested.
    pub bundle: Option<PathBuf>,
}

impl LocalizationSummary {
    pub fn nothing_to_do(&self) -> bool {
        self.output_html.is_none()
    }

    pub fn counts(&self, kind: ResourceKind) -> &KindCounts {
        match kind {
            ResourceKind::Script => &self.scripts,
            ResourceKind::Stylesheet => &self.stylesheets,
        }
    }

    pub fn total_found(&self) -> usize {
        self.scripts.found + self.stylesheets.found
    }

    pub fn total_localized(&self) -> usize {
        self.scripts.localized() + self.stylesheets.localized()
    }

    pub fn total_failed(&self) -> usize {
        self.scripts.failed + self.stylesheets.failed
    }

    /// One report line per resource, in download order.
    pub fn resource_lines(&self) -> Vec<String> {
        self.resources.iter().map(describe).collect()
    }

    pub fn print(&self) {
        println!("📄 Source HTML: {} ({})", self.source_html.display(), self.encoding);
        println!(
            "🔍 Found {} external scripts, {} external stylesheets",
            self.scripts.found, self.stylesheets.found
        );

        let Some(output) = &self.output_html else {
            println!("{}", "Nothing to localize, no output written".yellow());
            return;
        };

        for line in self.resource_lines() {
            println!("  {}", line);
        }

        println!(
            "📊 Localized {}/{} resources ({} failed), {} references rewritten",
            self.total_localized(),
            self.total_found(),
            self.total_failed(),
            self.replacements
        );
        println!("💾 Output HTML: {}", output.display().to_string().green());
        if let Some(bundle) = &self.bundle {
            println!("🗜️  Bundle: {}", bundle.display().to_string().green());
        }
    }
}

fn describe(record: &DownloadRecord) -> String {
    let kind = format!("[{}]", record.kind);
    match (&record.outcome, &record.asset) {
        (DownloadOutcome::Downloaded { bytes }, Some(asset)) => format!(
            "{} {} {} -> {} ({})",
            "✅".green(),
            kind,
            record.url,
            asset.reference,
            format_bytes(*bytes)
        ),
        (DownloadOutcome::Cached, Some(asset)) => {
            let note = if record.collision {
                " (file name shared with another URL)".yellow().to_string()
            } else {
                String::new()
            };
            format!(
                "{} {} {} -> {} (already present){}",
                "⏭️ ".cyan(),
                kind,
                record.url,
                asset.reference,
                note
            )
        }
        (DownloadOutcome::Failed { reason }, _) => {
            format!("{} {} {} ({})", "❌".red(), kind, record.url, reason.red())
        }
        (_, None) => format!("{} {} {}", "❌".red(), kind, record.url),
    }
}

/// Human readable size: `512 B`, `1.50 KB`, `2.00 MB`.
pub fn format_bytes(size: u64) -> String {
    if size < 1024 {
        return format!("{} B", size);
    }
    let units = ["KB", "MB", "GB"];
    let mut value = size as f64;
    let mut idx = 0;
    value /= 1024.0;
    while value >= 1024.0 && idx < units.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    format!("{:.2} {}", value, units[idx])
}
