use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::downloader::DownloadRecord;
use crate::error::LocalizeError;
use crate::file_manager::PARTIAL_SUFFIX;

/// Suffix appended to the input stem to name the archive.
pub const BUNDLE_SUFFIX: &str = "-localized.zip";

/// `<stem>-localized.zip` for `input`, placed in `dir`.
pub fn bundle_path(input: &Path, dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localized-page".to_string());
    dir.join(format!("{}{}", stem, BUNDLE_SUFFIX))
}

/// Pack the rewritten document and every stored asset into a zip archive.
///
/// The archive mirrors the project layout: the HTML at the root under
/// `html_name`, assets under `js/` and `css/`. Failed resources are not
/// included. Returns the number of entries written.
pub fn write_bundle(
    path: &Path,
    html_name: &str,
    html: &str,
    records: &[DownloadRecord],
) -> Result<usize, LocalizeError> {
    let mut partial = path.as_os_str().to_os_string();
    partial.push(PARTIAL_SUFFIX);
    let partial = PathBuf::from(partial);

    let result = pack(&partial, html_name, html, records).and_then(|entries| {
        fs::rename(&partial, path)
            .map_err(|e| LocalizeError::io(format!("failed to write {}", path.display()), e))?;
        Ok(entries)
    });
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn pack(
    partial: &Path,
    html_name: &str,
    html: &str,
    records: &[DownloadRecord],
) -> Result<usize, LocalizeError> {
    let file = File::create(partial)
        .map_err(|e| LocalizeError::io(format!("failed to create {}", partial.display()), e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(html_name, options)?;
    zip.write_all(html.as_bytes())
        .map_err(|e| LocalizeError::io("failed to add HTML to bundle", e))?;
    let mut entries = 1;

    let mut seen = HashSet::new();
    for record in records {
        let Some(asset) = &record.asset else {
            continue;
        };
        let name = format!("{}/{}", record.kind.dir_name(), asset.file_name);
        // Colliding URLs share one file.
        if !seen.insert(name.clone()) {
            continue;
        }

        let content = fs::read(&asset.path)
            .map_err(|e| LocalizeError::io(format!("failed to read {}", asset.path.display()), e))?;
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&content)
            .map_err(|e| LocalizeError::io(format!("failed to add {} to bundle", name), e))?;
        debug!(entry = %name, bytes = content.len(), "bundled asset");
        entries += 1;
    }

    zip.finish()?;
    Ok(entries)
}
