//! Blocking HTTP transfers.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::debug;

use crate::error::{InstallerError, InstallerResult};

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Fetches remote resources.
pub trait HttpFetcher: Send + Sync {
    /// Stream `url` into `dest`, replacing any existing file. Returns the
    /// number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> InstallerResult<u64>;

    /// Fetch `url` and return the body as text.
    fn fetch_text(&self, url: &str) -> InstallerResult<String>;
}

impl<T: HttpFetcher + ?Sized> HttpFetcher for Arc<T> {
    fn download(&self, url: &str, dest: &Path) -> InstallerResult<u64> {
        (**self).download(url, dest)
    }

    fn fetch_text(&self, url: &str) -> InstallerResult<String> {
        (**self).fetch_text(url)
    }
}

/// `reqwest`-backed fetcher.
#[derive(Debug)]
pub struct HttpDownloader {
    client: Client,
    timeout: Duration,
}

impl HttpDownloader {
    /// Create a downloader with the given request timeout.
    pub fn with_timeout(timeout: Duration) -> InstallerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("edgeadm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InstallerError::HttpClient(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    fn get(&self, url: &str) -> InstallerResult<Response> {
        debug!(url = %url, "HTTP GET");

        let response = self.client.get(url).send().map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InstallerError::DownloadFailed {
                url: url.to_string(),
                reason: format!("GET request failed with status {}", status),
            });
        }
        Ok(response)
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> InstallerError {
        if e.is_timeout() {
            InstallerError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            InstallerError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }

    fn stream_to_file(&self, url: &str, mut response: Response, dest: &Path) -> InstallerResult<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| InstallerError::CreateDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let file = File::create(dest).map_err(|e| InstallerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut downloaded = 0u64;

        loop {
            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| InstallerError::DownloadFailed {
                    url: url.to_string(),
                    reason: format!("Read error: {}", e),
                })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| InstallerError::WriteFailed {
                    path: dest.to_path_buf(),
                    source: e,
                })?;

            downloaded += bytes_read as u64;
        }

        writer.flush().map_err(|e| InstallerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

        Ok(downloaded)
    }
}

impl HttpFetcher for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> InstallerResult<u64> {
        let response = self.get(url)?;
        let result = self.stream_to_file(url, response, dest);
        if result.is_err() {
            // No partial archive may be left behind.
            fs::remove_file(dest).ok();
        }
        result
    }

    fn fetch_text(&self, url: &str) -> InstallerResult<String> {
        self.get(url)?
            .text()
            .map_err(|e| self.transport_error(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_downloader_builds_with_timeout() {
        let downloader = HttpDownloader::with_timeout(Duration::from_secs(60)).unwrap();
        assert_eq!(downloader.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_unreachable_host_is_download_failure() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.tar.gz");
        let downloader = HttpDownloader::with_timeout(Duration::from_secs(5)).unwrap();

        // Port 9 (discard) on localhost is closed on any sane test host.
        let result = downloader.download("http://127.0.0.1:9/missing.tar.gz", &dest);

        assert!(matches!(
            result,
            Err(InstallerError::DownloadFailed { .. }) | Err(InstallerError::Timeout { .. })
        ));
        assert!(!dest.exists());
    }
}
