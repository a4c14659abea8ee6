pub mod bundle;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod file_manager;
pub mod html_parser;
pub mod loader;
pub mod localizer;
pub mod logging;
pub mod rewriter;
pub mod summary;

// Re-export main types for convenience
pub use bundle::{bundle_path, write_bundle};
pub use cli::LocalizeCommand;
pub use config::{HttpSettings, Layout, LocalizerConfig};
pub use downloader::{AssetDownloader, DownloadOutcome, DownloadRecord, Fetch, HttpFetcher, LocalAsset, UrlMapping};
pub use error::{FetchError, LocalizeError};
pub use file_manager::{local_file_name, CacheStatus, FileManager};
pub use html_parser::{ExtractedResources, HtmlParser, ResourceKind, ResourceReference};
pub use loader::{load_document, Document, SourceEncoding};
pub use localizer::HtmlAssetsLocalizer;
pub use logging::init_logging;
pub use rewriter::{rewrite_references, RewrittenDocument};
pub use summary::{KindCounts, LocalizationSummary};
