// src/registry/client.rs

//! HTTP client for registry operations
//!
//! Provides a wrapper around reqwest for fetching project metadata and
//! streaming wheel downloads. Every call is attempted exactly once; a failed
//! lookup or transfer is final for the current run.

use crate::artifacts::Transport;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, info};

use super::metadata::ProjectDocument;
use super::Registry;

/// Public index used when no other is configured
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";

/// Default timeout for metadata lookups (10 seconds)
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for wheel downloads (30 seconds)
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// HTTP client wrapper for the package index
pub struct RegistryClient {
    client: Client,
    index_url: String,
    metadata_timeout: Duration,
    download_timeout: Duration,
}

impl RegistryClient {
    /// Create a client for the default index with default timeouts
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_INDEX_URL, METADATA_TIMEOUT, DOWNLOAD_TIMEOUT)
    }

    pub fn with_options(
        index_url: &str,
        metadata_timeout: Duration,
        download_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("wheelhouse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            index_url: index_url.trim_end_matches('/').to_string(),
            metadata_timeout,
            download_timeout,
        })
    }

    /// Metadata endpoint for a project
    pub fn project_url(&self, name: &str) -> String {
        format!("{}/{}/json", self.index_url, name)
    }
}

impl Registry for RegistryClient {
    fn project(&self, name: &str) -> Result<ProjectDocument> {
        let url = self.project_url(name);
        debug!("Fetching project metadata from {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.metadata_timeout)
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {}: {}", url, e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(Error::NotFoundError(format!("Package '{}' not in index", name)));
            }
            status if !status.is_success() => {
                return Err(Error::DownloadError(format!("HTTP {} from {}", status, url)));
            }
            _ => {}
        }

        response
            .json::<ProjectDocument>()
            .map_err(|e| Error::ParseError(format!("Invalid metadata JSON for '{}': {}", name, e)))
    }
}

impl Transport for RegistryClient {
    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        info!("Downloading {}", url);

        let mut response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; STREAM_BUFFER_SIZE];
        loop {
            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| Error::DownloadError(format!("Failed to read response: {e}")))?;
            if bytes_read == 0 {
                break;
            }
            dest.write_all(&buffer[..bytes_read])
                .map_err(|e| Error::IoError(format!("Failed to write data: {e}")))?;
            downloaded += bytes_read as u64;
        }

        debug!("Downloaded {} bytes from {}", downloaded, url);
        Ok(downloaded)
    }
}
