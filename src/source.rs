//! Where map data comes from: remote endpoints or files on disk.

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Remote(String),
    Local(PathBuf),
}

impl Source {
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Remote(location.to_string())
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            Source::Local(PathBuf::from(path))
        }
    }

    /// Reads the raw document behind this source.
    pub async fn fetch_bytes(&self, client: &reqwest::Client) -> Result<Vec<u8>> {
        match self {
            Source::Remote(url) => {
                let response = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("Request to {} failed", url))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(anyhow!("GET {} returned {}", url, status));
                }
                let body = response
                    .bytes()
                    .await
                    .with_context(|| format!("Failed to read body from {}", url))?;
                Ok(body.to_vec())
            }
            Source::Local(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {:?}", path)),
        }
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, client: &reqwest::Client) -> Result<T> {
        let bytes = self.fetch_bytes(client).await?;
        serde_json::from_slice(&bytes).with_context(|| format!("Malformed JSON from {}", self))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Remote(url) => write!(f, "{}", url),
            Source::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_remote_and_local_sources() {
        assert_eq!(
            Source::parse("https://example.org/uk.geojson"),
            Source::Remote("https://example.org/uk.geojson".to_string())
        );
        assert_eq!(
            Source::parse("file:///tmp/uk.geojson"),
            Source::Local(PathBuf::from("/tmp/uk.geojson"))
        );
        assert_eq!(
            Source::parse("fixtures/uk.geojson"),
            Source::Local(PathBuf::from("fixtures/uk.geojson"))
        );
    }

    #[tokio::test]
    async fn missing_local_file_is_an_error() {
        let client = build_client(5).unwrap();
        let source = Source::parse("fixtures/does-not-exist.json");
        let err = source.fetch_bytes(&client).await.unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }
}
