//! Fetching release artifacts.

use reqwest::blocking::Client;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::{Error, Result};

/// Retrieves a URL into a local file.
///
/// The installer only talks to the network through this trait so tests can
/// serve fixture archives from disk.
pub trait Downloader {
    /// Write the body of `url` to `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DownloadFailed`] on transport errors or a non-success
    /// status.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

impl<D: Downloader + ?Sized> Downloader for &D {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        (**self).download(url, dest)
    }
}

/// [`Downloader`] over HTTPS using a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    github_token: Option<String>,
}

impl HttpDownloader {
    /// Create a downloader identifying itself as `dcx/<version>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DownloadFailed`] when the TLS backend cannot be
    /// initialized.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("dcx/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::download_failed("", format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            github_token: None,
        })
    }

    /// Send `token` as a bearer credential to `https://github.com/` URLs.
    ///
    /// Release assets are rate limited for anonymous clients. Empty tokens are
    /// ignored.
    #[must_use]
    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.filter(|t| !t.is_empty());
        self
    }

    fn token_for(&self, url: &str) -> Option<&str> {
        if url.starts_with("https://github.com/") {
            self.github_token.as_deref()
        } else {
            None
        }
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        debug!(%url, dest = %dest.display(), "Downloading artifact");

        let mut request = self.client.get(url);
        if let Some(token) = self.token_for(url) {
            request = request.bearer_auth(token);
        }

        let mut response = request
            .send()
            .map_err(|e| Error::download_failed(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::download_failed(
                url,
                format!("HTTP {}", response.status()),
            ));
        }

        let mut file = File::create(dest).map_err(|e| Error::io(e, dest, "create"))?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|e| Error::download_failed(url, format!("Failed to read body: {e}")))?;

        debug!(%url, bytes, "Downloaded artifact");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_only_sent_to_github() {
        let downloader = HttpDownloader::new()
            .unwrap()
            .with_github_token(Some("ghp_abc".into()));
        assert_eq!(
            downloader.token_for("https://github.com/o/r/releases/download/v1/a.tar.gz"),
            Some("ghp_abc")
        );
        assert_eq!(downloader.token_for("https://example.com/a.tar.gz"), None);
        assert_eq!(downloader.token_for("http://github.com/o/r"), None);
    }

    #[test]
    fn test_no_token_by_default() {
        let downloader = HttpDownloader::new().unwrap();
        assert_eq!(downloader.token_for("https://github.com/o/r"), None);

        let empty = downloader.with_github_token(Some(String::new()));
        assert_eq!(empty.token_for("https://github.com/o/r"), None);
    }
}
