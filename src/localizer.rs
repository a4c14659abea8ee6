use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::bundle::write_bundle;
use crate::config::LocalizerConfig;
use crate::downloader::{AssetDownloader, DownloadOutcome, Fetch, HttpFetcher, UrlMapping};
use crate::error::LocalizeError;
use crate::file_manager::FileManager;
use crate::html_parser::{HtmlParser, ResourceKind, ResourceReference};
use crate::loader::load_document;
use crate::rewriter::rewrite_references;
use crate::summary::{KindCounts, LocalizationSummary};

/// Runs load, extract, fetch, rewrite and write for one HTML document.
pub struct HtmlAssetsLocalizer<F: Fetch = HttpFetcher> {
    config: LocalizerConfig,
    fetcher: F,
    file_manager: FileManager,
    html_parser: HtmlParser,
    show_progress: bool,
}

impl HtmlAssetsLocalizer<HttpFetcher> {
    pub fn new(config: LocalizerConfig) -> Result<Self, LocalizeError> {
        let fetcher = HttpFetcher::new(&config.http)?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: Fetch> HtmlAssetsLocalizer<F> {
    pub fn with_fetcher(config: LocalizerConfig, fetcher: F) -> Result<Self, LocalizeError> {
        let html_parser = HtmlParser::new(config.include_stylesheets)?;
        let file_manager = FileManager::new(&config.asset_root);

        Ok(Self {
            config,
            fetcher,
            file_manager,
            html_parser,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &LocalizerConfig {
        &self.config
    }

    pub async fn process(&self) -> Result<LocalizationSummary, LocalizeError> {
        let document = load_document(&self.config.input)?;
        info!(path = %self.config.input.display(), "processing HTML file");

        self.config.prepare()?;

        let resources = self.html_parser.extract_resources(&document.text);
        let scripts = resources.unique(ResourceKind::Script);
        let stylesheets = resources.unique(ResourceKind::Stylesheet);
        info!(
            scripts = scripts.len(),
            stylesheets = stylesheets.len(),
            "found external resources"
        );

        if resources.is_empty() {
            info!("no external resources, nothing to do");
            return Ok(LocalizationSummary {
                source_html: self.config.input.clone(),
                output_html: None,
                encoding: document.encoding,
                scripts: KindCounts::default(),
                stylesheets: KindCounts::default(),
                replacements: 0,
                resources: Vec::new(),
                bundle: None,
            });
        }

        let queue: Vec<&ResourceReference> = scripts.iter().chain(stylesheets.iter()).copied().collect();
        let progress = self.progress_bar(queue.len());
        let mapping = AssetDownloader::new(&self.fetcher, &self.file_manager)
            .with_progress(progress.clone())
            .download_all(&queue)
            .await;
        progress.finish_and_clear();

        let rewritten = rewrite_references(&document.text, &mapping)?;
        self.write_output(&rewritten.html)?;
        let bundle = self.bundle_output(&rewritten.html, &mapping)?;

        Ok(LocalizationSummary {
            source_html: self.config.input.clone(),
            output_html: Some(self.config.output_html.clone()),
            encoding: document.encoding,
            scripts: kind_counts(&mapping, ResourceKind::Script, scripts.len()),
            stylesheets: kind_counts(&mapping, ResourceKind::Stylesheet, stylesheets.len()),
            replacements: rewritten.replacements,
            resources: mapping.into_records(),
            bundle,
        })
    }

    fn bundle_output(&self, html: &str, mapping: &UrlMapping) -> Result<Option<PathBuf>, LocalizeError> {
        let Some(path) = &self.config.bundle else {
            return Ok(None);
        };
        let html_name = self
            .config
            .output_html
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index.html".to_string());

        let entries = write_bundle(path, &html_name, html, mapping.records())?;
        info!(path = %path.display(), entries, "wrote zip bundle");
        Ok(Some(path.clone()))
    }

    fn write_output(&self, html: &str) -> Result<(), LocalizeError> {
        let output = &self.config.output_html;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LocalizeError::io(format!("failed to create directory {}", parent.display()), e)
            })?;
        }
        fs::write(output, html)
            .map_err(|e| LocalizeError::io(format!("failed to write {}", output.display()), e))?;
        debug!(path = %output.display(), "wrote rewritten HTML");
        Ok(())
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner} [{pos}/{len}] {msg}") {
            progress.set_style(style);
        }
        progress
    }
}

fn kind_counts(mapping: &UrlMapping, kind: ResourceKind, found: usize) -> KindCounts {
    KindCounts {
        found,
        downloaded: mapping.count(kind, |o| matches!(o, DownloadOutcome::Downloaded { .. })),
        cached: mapping.count(kind, |o| matches!(o, DownloadOutcome::Cached)),
        failed: mapping.count(kind, |o| matches!(o, DownloadOutcome::Failed { .. })),
    }
}
