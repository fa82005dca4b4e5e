use std::path::PathBuf;

/// Failure to fetch corpus text from a [`crate::source::TextSource`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("source text is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// The only error surfaced by the engine. The engine is left unloaded and the
/// caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load knowledge from {location}: {source}")]
    Source { location: String, source: SourceError },

    #[error("failed to load snapshot from {path}: {message}")]
    Snapshot { path: PathBuf, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}
