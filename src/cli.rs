use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{HttpSettings, Layout, LocalizerConfig, DEFAULT_USER_AGENT};

#[derive(Parser, Debug)]
#[command(
    name = "html-assets-localizer",
    about = "Localize external JavaScript and CSS referenced by an HTML file",
    version,
    long_about = "Downloads every externally hosted script and stylesheet referenced by an HTML file into local js/ and css/ directories and rewrites the document to use the local copies, producing a self-contained, offline-capable page."
)]
pub struct LocalizeCommand {
    /// The HTML file to localize
    #[arg(required = true)]
    pub html_file: PathBuf,

    /// Target project directory (project layout) or output HTML path (sibling layout)
    pub destination: Option<PathBuf>,

    /// Where assets and the rewritten HTML are written
    #[arg(short, long, value_enum, default_value = "project")]
    pub layout: Layout,

    /// Only localize <script src>, leave stylesheets alone
    #[arg(long)]
    pub scripts_only: bool,

    /// User agent string to use for requests
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Timeout for each request in seconds (default: no explicit timeout)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Ignore proxy settings from the environment
    #[arg(long)]
    pub no_proxy: bool,

    /// Also pack the rewritten HTML, js/ and css/ into <name>-localized.zip
    #[arg(long)]
    pub zip: bool,

    /// Print the summary as JSON instead of the console report
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl LocalizeCommand {
    pub fn to_config(&self) -> LocalizerConfig {
        let http = HttpSettings {
            user_agent: self.user_agent.clone(),
            timeout: self.timeout.map(Duration::from_secs),
            proxy_from_env: !self.no_proxy,
        };

        LocalizerConfig::from_layout(&self.html_file, self.destination.as_deref(), self.layout)
            .with_stylesheets(!self.scripts_only)
            .with_http(http)
            .with_bundle(self.zip)
    }
}
