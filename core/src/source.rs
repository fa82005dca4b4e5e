//! Pluggable providers of UTF-8 corpus text.

use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::{redirect, Client};
use std::time::Duration;

/// Location used when none is given.
pub const DEFAULT_LOCATION: &str = "reze_knowledge.txt";

#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<String, SourceError>;
}

/// Reads a local file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

#[async_trait]
impl TextSource for FileSource {
    async fn fetch(&self, location: &str) -> Result<String, SourceError> {
        let bytes = tokio::fs::read(location).await?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// GETs a URL; any non-2xx status is an error.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!("rezerag/", env!("CARGO_PKG_VERSION")))
            .redirect(redirect::Policy::limited(5))
            .timeout(Duration::from_secs(12))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self { Self { client } }
}

#[async_trait]
impl TextSource for HttpSource {
    async fn fetch(&self, location: &str) -> Result<String, SourceError> {
        let resp = self.client.get(location).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status { url: location.to_string(), status: status.as_u16() });
        }
        let bytes = resp.bytes().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

/// `http://` and `https://` locations go over HTTP, everything else is a path.
#[derive(Debug, Clone)]
pub struct AutoSource {
    file: FileSource,
    http: HttpSource,
}

impl AutoSource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self { file: FileSource, http: HttpSource::new()? })
    }
}

pub fn is_url(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl TextSource for AutoSource {
    async fn fetch(&self, location: &str) -> Result<String, SourceError> {
        if is_url(location) {
            self.http.fetch(location).await
        } else {
            self.file.fetch(location).await
        }
    }
}

/// Serves the same in-memory text for every location.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    text: String,
}

impl StaticSource {
    pub fn new(text: impl Into<String>) -> Self { Self { text: text.into() } }
}

#[async_trait]
impl TextSource for StaticSource {
    async fn fetch(&self, _location: &str) -> Result<String, SourceError> {
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/reze.txt"));
        assert!(is_url("HTTP://example.com"));
        assert!(!is_url("/srv/reze_knowledge.txt"));
        assert!(!is_url("reze_knowledge.txt"));
    }

    #[tokio::test]
    async fn file_source_reports_missing_file() {
        let err = FileSource.fetch("/definitely/not/here.txt").await.unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[tokio::test]
    async fn file_source_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = FileSource.fetch(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, SourceError::Encoding(_)));
    }
}
