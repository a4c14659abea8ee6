use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

use crate::html_parser::ResourceKind;

/// Suffix of the temporary file an asset is written to before the rename.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Result of looking up an asset's target path before fetching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// A file already sits at the target path; its content is reused as-is.
    Hit(PathBuf),
    Miss(PathBuf),
}

impl CacheStatus {
    pub fn path(&self) -> &Path {
        match self {
            CacheStatus::Hit(path) | CacheStatus::Miss(path) => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileManager {
    asset_root: PathBuf,
}

impl FileManager {
    pub fn new(asset_root: &Path) -> Self {
        Self {
            asset_root: asset_root.to_path_buf(),
        }
    }

    pub fn asset_path(&self, kind: ResourceKind, file_name: &str) -> PathBuf {
        self.asset_root.join(kind.dir_name()).join(file_name)
    }

    /// Cache lookup keyed by target path. Existing files are never re-validated.
    pub fn lookup(&self, kind: ResourceKind, file_name: &str) -> CacheStatus {
        let path = self.asset_path(kind, file_name);
        if path.is_file() {
            CacheStatus::Hit(path)
        } else {
            CacheStatus::Miss(path)
        }
    }

    /// Write `content` next to `path` and rename it into place, so an
    /// interrupted run never leaves a truncated file under the final name.
    pub fn save_file(&self, path: &Path, content: &[u8]) -> std::io::Result<u64> {
        let partial = partial_path(path);

        let result = write_partial(&partial, content).and_then(|()| fs::rename(&partial, path));
        if let Err(e) = result {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        Ok(content.len() as u64)
    }
}

/// Reference written into the document for a stored asset, e.g. `./js/app.js`.
pub fn relative_reference(kind: ResourceKind, file_name: &str) -> String {
    format!("./{}/{}", kind.dir_name(), file_name)
}

/// Deterministic local file name for `url`.
///
/// Uses the last path segment when it carries the kind's extension,
/// otherwise `script_<hash8>.js` / `style_<hash8>.css`.
pub fn local_file_name(url: &str, kind: ResourceKind) -> String {
    let candidate = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_default();

    if !candidate.is_empty() && candidate.ends_with(kind.extension()) {
        candidate
    } else {
        format!("{}_{}{}", kind.file_prefix(), url_digest(url), kind.extension())
    }
}

/// First 8 hex characters of the SHA-256 of the URL string.
pub fn url_digest(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(8);
    hex
}

fn write_partial(partial: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(partial)?;
    file.write_all(content)?;
    file.sync_all()
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
