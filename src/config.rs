use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bundle::bundle_path;
use crate::error::LocalizeError;
use crate::html_parser::ResourceKind;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0 Safari/537.36";

/// Target project directory used by the project layout when none is given.
pub const DEFAULT_TARGET_DIR: &str = "output";

/// Where assets and the rewritten document end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Layout {
    /// `js/`, `css/` and the rewritten HTML inside a target project directory.
    Project,
    /// `js/` and `css/` beside the input, output written as `<name>_local.<ext>`.
    Sibling,
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    /// `None` keeps the HTTP client's default behavior.
    pub timeout: Option<Duration>,
    pub proxy_from_env: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            proxy_from_env: true,
        }
    }
}

/// Immutable description of one run. Built once, passed by reference.
#[derive(Debug, Clone)]
pub struct LocalizerConfig {
    pub input: PathBuf,
    pub asset_root: PathBuf,
    pub output_html: PathBuf,
    pub include_stylesheets: bool,
    pub http: HttpSettings,
    /// Zip archive of the localized page, written beside the output HTML.
    pub bundle: Option<PathBuf>,
}

impl LocalizerConfig {
    /// Derive asset and output locations for `input` from the chosen layout.
    ///
    /// For [`Layout::Project`] `destination` is the target directory
    /// (default [`DEFAULT_TARGET_DIR`]); for [`Layout::Sibling`] it is the
    /// output HTML path (default `<stem>_local<ext>` beside the input).
    pub fn from_layout(input: &Path, destination: Option<&Path>, layout: Layout) -> Self {
        let input = input.to_path_buf();
        let file_name = input
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "index.html".into());

        let (asset_root, output_html) = match layout {
            Layout::Project => {
                let target = destination
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TARGET_DIR));
                let output = target.join(&file_name);
                (target, output)
            }
            Layout::Sibling => {
                let parent = parent_dir(&input);
                let output = match destination {
                    Some(path) => path.to_path_buf(),
                    None => parent.join(sibling_output_name(&input)),
                };
                (parent, output)
            }
        };

        Self {
            input,
            asset_root,
            output_html,
            include_stylesheets: true,
            http: HttpSettings::default(),
            bundle: None,
        }
    }

    pub fn with_stylesheets(mut self, include: bool) -> Self {
        self.include_stylesheets = include;
        self
    }

    pub fn with_http(mut self, http: HttpSettings) -> Self {
        self.http = http;
        self
    }

    /// Also pack the result into `<stem>-localized.zip` next to the output HTML.
    pub fn with_bundle(mut self, enabled: bool) -> Self {
        self.bundle = enabled.then(|| bundle_path(&self.input, &parent_dir(&self.output_html)));
        self
    }

    /// Directory holding downloaded assets of `kind`.
    pub fn asset_dir(&self, kind: ResourceKind) -> PathBuf {
        self.asset_root.join(kind.dir_name())
    }

    /// Create the asset directories. Called once before any download.
    pub fn prepare(&self) -> Result<(), LocalizeError> {
        let mut kinds = vec![ResourceKind::Script];
        if self.include_stylesheets {
            kinds.push(ResourceKind::Stylesheet);
        }
        for kind in kinds {
            let dir = self.asset_dir(kind);
            fs::create_dir_all(&dir).map_err(|e| {
                LocalizeError::io(format!("failed to create directory {}", dir.display()), e)
            })?;
        }
        Ok(())
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn sibling_output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    match input.extension() {
        Some(ext) => format!("{}_local.{}", stem, ext.to_string_lossy()),
        None => format!("{}_local", stem),
    }
}
