use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a localization run.
#[derive(Debug, Error)]
pub enum LocalizeError {
    #[error("HTML file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("could not decode {} as UTF-8 or GBK", .0.display())]
    Decode(PathBuf),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to write zip bundle: {0}")]
    Bundle(#[from] zip::result::ZipError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl LocalizeError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code the CLI uses for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InputNotFound(_) => 3,
            Self::Decode(_) => 4,
            Self::Pattern(_) | Self::HttpClient(_) | Self::Bundle(_) | Self::Io { .. } => 1,
        }
    }
}

/// Per-resource download failure. Never aborts the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("failed to store asset: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Request(err.to_string()),
        }
    }
}
