use async_trait::async_trait;
use indicatif::ProgressBar;
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::HttpSettings;
use crate::error::FetchError;
use crate::file_manager::{local_file_name, relative_reference, CacheStatus, FileManager};
use crate::html_parser::{ResourceKind, ResourceReference};

/// Retrieves the raw bytes behind a URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`Fetch`] over HTTP(S) with the client's default redirect handling.
/// Any non-2xx status is a failure.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self, reqwest::Error> {
        let mut builder = ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(settings.user_agent.as_str());
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        if !settings.proxy_from_env {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

/// A stored copy of a remote asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalAsset {
    pub file_name: String,
    pub path: PathBuf,
    /// Relative reference written into the document, e.g. `./js/app.js`.
    pub reference: String,
}

impl LocalAsset {
    pub fn new(kind: ResourceKind, file_name: &str, path: PathBuf) -> Self {
        Self {
            file_name: file_name.to_string(),
            path,
            reference: relative_reference(kind, file_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DownloadOutcome {
    Downloaded { bytes: u64 },
    /// The target file already existed and was reused.
    Cached,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadRecord {
    pub url: String,
    pub kind: ResourceKind,
    #[serde(flatten)]
    pub outcome: DownloadOutcome,
    /// `None` when the download failed; the reference stays remote.
    pub asset: Option<LocalAsset>,
    /// Another URL in this run already claimed the same file name.
    pub collision: bool,
}

impl DownloadRecord {
    pub fn stored(url: &str, kind: ResourceKind, asset: LocalAsset, outcome: DownloadOutcome) -> Self {
        Self {
            url: url.to_string(),
            kind,
            outcome,
            asset: Some(asset),
            collision: false,
        }
    }

    pub fn failed(url: &str, kind: ResourceKind, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            kind,
            outcome: DownloadOutcome::Failed {
                reason: reason.into(),
            },
            asset: None,
            collision: false,
        }
    }
}

/// URL to local asset mapping for one run, in download order.
#[derive(Debug, Clone, Default)]
pub struct UrlMapping {
    records: Vec<DownloadRecord>,
}

impl UrlMapping {
    pub fn insert(&mut self, record: DownloadRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DownloadRecord] {
        &self.records
    }

    pub fn get(&self, kind: ResourceKind, url: &str) -> Option<&DownloadRecord> {
        self.records.iter().find(|r| r.kind == kind && r.url == url)
    }

    /// Local reference for `url`, or `None` if it was not stored.
    pub fn local_reference(&self, kind: ResourceKind, url: &str) -> Option<&str> {
        self.get(kind, url)
            .and_then(|r| r.asset.as_ref())
            .map(|asset| asset.reference.as_str())
    }

    pub fn count(&self, kind: ResourceKind, pred: impl Fn(&DownloadOutcome) -> bool) -> usize {
        self.records
            .iter()
            .filter(|r| r.kind == kind && pred(&r.outcome))
            .count()
    }

    pub fn into_records(self) -> Vec<DownloadRecord> {
        self.records
    }
}

/// Fetches each distinct reference once, sequentially, into the asset directories.
pub struct AssetDownloader<'a, F: Fetch> {
    fetcher: &'a F,
    file_manager: &'a FileManager,
    progress: ProgressBar,
}

impl<'a, F: Fetch> AssetDownloader<'a, F> {
    pub fn new(fetcher: &'a F, file_manager: &'a FileManager) -> Self {
        Self {
            fetcher,
            file_manager,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub async fn download_all(&self, references: &[&ResourceReference]) -> UrlMapping {
        let mut mapping = UrlMapping::default();
        let mut claimed: HashMap<(ResourceKind, String), String> = HashMap::new();

        for reference in references {
            if mapping.get(reference.kind, &reference.url).is_some() {
                continue;
            }

            self.progress.set_message(reference.url.clone());
            let file_name = local_file_name(&reference.url, reference.kind);

            let key = (reference.kind, file_name.clone());
            let collision = match claimed.get(&key) {
                Some(owner) if owner != &reference.url => {
                    warn!(
                        url = %reference.url,
                        other = %owner,
                        file = %file_name,
                        "file name already used by another URL, reusing its content"
                    );
                    true
                }
                _ => false,
            };

            let mut record = self.download_one(reference, &file_name).await;
            record.collision = collision;
            // A name is owned only by a URL whose content actually landed on disk.
            if record.asset.is_some() {
                claimed.entry(key).or_insert_with(|| reference.url.clone());
            }
            mapping.insert(record);
            self.progress.inc(1);
        }

        mapping
    }

    async fn download_one(&self, reference: &ResourceReference, file_name: &str) -> DownloadRecord {
        let kind = reference.kind;
        let url = reference.url.as_str();

        let path = match self.file_manager.lookup(kind, file_name) {
            CacheStatus::Hit(path) => {
                info!(url, file = %path.display(), "already present, skipping download");
                let asset = LocalAsset::new(kind, file_name, path);
                return DownloadRecord::stored(url, kind, asset, DownloadOutcome::Cached);
            }
            CacheStatus::Miss(path) => path,
        };

        info!(url, "downloading");

        let stored = match self.fetcher.fetch(url).await {
            Ok(body) => self
                .file_manager
                .save_file(&path, &body)
                .map_err(FetchError::from),
            Err(e) => Err(e),
        };

        match stored {
            Ok(bytes) => {
                info!(url, file = %path.display(), bytes, "downloaded");
                let asset = LocalAsset::new(kind, file_name, path);
                DownloadRecord::stored(url, kind, asset, DownloadOutcome::Downloaded { bytes })
            }
            Err(e) => {
                warn!(url, error = %e, "download failed, keeping remote reference");
                DownloadRecord::failed(url, kind, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn reference(url: &str, kind: ResourceKind) -> ResourceReference {
        ResourceReference {
            url: url.to_string(),
            kind,
        }
    }

    fn prepared_manager(root: &std::path::Path) -> FileManager {
        fs::create_dir_all(root.join("js")).unwrap();
        fs::create_dir_all(root.join("css")).unwrap();
        FileManager::new(root)
    }

    #[tokio::test]
    async fn test_downloads_and_stores_bytes() {
        let temp_dir = tempdir().unwrap();
        let file_manager = prepared_manager(temp_dir.path());
        let mut fetcher = MockFetch::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(b"console.log(1);".to_vec()));

        let refs = [reference("https://x.test/app.js", ResourceKind::Script)];
        let refs: Vec<&ResourceReference> = refs.iter().collect();
        let mapping = AssetDownloader::new(&fetcher, &file_manager)
            .download_all(&refs)
            .await;

        let record = mapping.get(ResourceKind::Script, "https://x.test/app.js").unwrap();
        assert_eq!(record.outcome, DownloadOutcome::Downloaded { bytes: 15 });
        assert_eq!(
            mapping.local_reference(ResourceKind::Script, "https://x.test/app.js"),
            Some("./js/app.js")
        );
        assert_eq!(
            fs::read(temp_dir.path().join("js/app.js")).unwrap(),
            b"console.log(1);"
        );
    }

    #[tokio::test]
    async fn test_existing_file_is_not_refetched() {
        let temp_dir = tempdir().unwrap();
        let file_manager = prepared_manager(temp_dir.path());
        fs::write(temp_dir.path().join("css/a.css"), b"old").unwrap();
        let mut fetcher = MockFetch::new();
        fetcher.expect_fetch().never();

        let refs = [reference("https://x.test/a.css", ResourceKind::Stylesheet)];
        let refs: Vec<&ResourceReference> = refs.iter().collect();
        let mapping = AssetDownloader::new(&fetcher, &file_manager)
            .download_all(&refs)
            .await;

        let record = &mapping.records()[0];
        assert_eq!(record.outcome, DownloadOutcome::Cached);
        assert_eq!(fs::read(temp_dir.path().join("css/a.css")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_failure_is_recorded_without_asset() {
        let temp_dir = tempdir().unwrap();
        let file_manager = prepared_manager(temp_dir.path());
        let mut fetcher = MockFetch::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(FetchError::Status(404)));

        let refs = [reference("https://x.test/gone.js", ResourceKind::Script)];
        let refs: Vec<&ResourceReference> = refs.iter().collect();
        let mapping = AssetDownloader::new(&fetcher, &file_manager)
            .download_all(&refs)
            .await;

        let record = &mapping.records()[0];
        assert_eq!(
            record.outcome,
            DownloadOutcome::Failed {
                reason: "HTTP 404".to_string()
            }
        );
        assert!(record.asset.is_none());
        assert!(!temp_dir.path().join("js/gone.js").exists());
    }

    #[tokio::test]
    async fn test_repeated_reference_fetched_once() {
        let temp_dir = tempdir().unwrap();
        let file_manager = prepared_manager(temp_dir.path());
        let mut fetcher = MockFetch::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(b"x".to_vec()));

        let a = reference("https://x.test/a.js", ResourceKind::Script);
        let refs = vec![&a, &a];
        let mapping = AssetDownloader::new(&fetcher, &file_manager)
            .download_all(&refs)
            .await;

        assert_eq!(mapping.records().len(), 1);
    }

    #[tokio::test]
    async fn test_name_collision_reuses_first_file_and_is_flagged() {
        let temp_dir = tempdir().unwrap();
        let file_manager = prepared_manager(temp_dir.path());
        let mut fetcher = MockFetch::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(b"first".to_vec()));

        let first = reference("https://one.test/lib.js", ResourceKind::Script);
        let second = reference("https://two.test/lib.js", ResourceKind::Script);
        let refs = vec![&first, &second];
        let mapping = AssetDownloader::new(&fetcher, &file_manager)
            .download_all(&refs)
            .await;

        let records = mapping.records();
        assert!(!records[0].collision);
        assert!(records[1].collision);
        assert_eq!(records[1].outcome, DownloadOutcome::Cached);
        assert_eq!(fs::read(temp_dir.path().join("js/lib.js")).unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_failed_download_does_not_claim_file_name() {
        let temp_dir = tempdir().unwrap();
        let file_manager = prepared_manager(temp_dir.path());
        let mut fetcher = MockFetch::new();
        fetcher
            .expect_fetch()
            .withf(|url| url.starts_with("https://one.test/"))
            .times(1)
            .returning(|_| Err(FetchError::Status(500)));
        fetcher
            .expect_fetch()
            .withf(|url| url.starts_with("https://two.test/"))
            .times(1)
            .returning(|_| Ok(b"second".to_vec()));

        let first = reference("https://one.test/lib.js", ResourceKind::Script);
        let second = reference("https://two.test/lib.js", ResourceKind::Script);
        let refs = vec![&first, &second];
        let mapping = AssetDownloader::new(&fetcher, &file_manager)
            .download_all(&refs)
            .await;

        let records = mapping.records();
        assert!(matches!(records[0].outcome, DownloadOutcome::Failed { .. }));
        assert!(!records[0].collision);
        assert_eq!(records[1].outcome, DownloadOutcome::Downloaded { bytes: 6 });
        assert!(!records[1].collision);
        assert_eq!(fs::read(temp_dir.path().join("js/lib.js")).unwrap(), b"second");
    }

    #[test]
    fn test_count_by_outcome() {
        let mut mapping = UrlMapping::default();
        mapping.insert(DownloadRecord::failed("https://x.test/a.js", ResourceKind::Script, "offline"));
        mapping.insert(DownloadRecord::stored(
            "https://x.test/b.js",
            ResourceKind::Script,
            LocalAsset::new(ResourceKind::Script, "b.js", PathBuf::from("js/b.js")),
            DownloadOutcome::Cached,
        ));

        assert_eq!(
            mapping.count(ResourceKind::Script, |o| matches!(o, DownloadOutcome::Failed { .. })),
            1
        );
        assert_eq!(mapping.count(ResourceKind::Stylesheet, |_| true), 0);
    }
}
