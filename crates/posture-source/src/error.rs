use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised by policy source backends.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Name is empty or would escape the source's namespace.
    #[error("invalid policy name: {0:?}")]
    InvalidName(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Base URL or joined request URL does not parse.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Backend could not serve the request at all.
    #[error("policy source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// `true` for a missing file or an HTTP 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            SourceError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            SourceError::Status { status, .. } => *status == 404,
            _ => false,
        }
    }
}
