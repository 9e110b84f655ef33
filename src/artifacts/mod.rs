// src/artifacts/mod.rs

//! Local wheel store and download functionality
//!
//! The artifact directory is a flat, filename-keyed cache: a wheel already on
//! disk is never fetched again, and nothing is ever evicted. Downloads stream
//! into a temporary file inside the directory and are renamed into place only
//! once the transfer completes, so a file under its final name is always whole.

use crate::error::{Error, Result};
use crate::progress::ProgressTracker;
use crate::resolver::ResolvedArtifact;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Byte transfer from a URL
pub trait Transport: Send + Sync {
    /// Stream the body at `url` into `dest`, returning the byte count
    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64>;
}

/// Derive the local filename for an artifact URL
///
/// Uses the last path segment; query strings and fragments are ignored.
pub fn filename_from_url(url: &str) -> Option<String> {
    let segment = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string)),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    }?;

    let valid = !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\');
    valid.then_some(segment)
}

/// A resolved artifact together with its local file, if it could be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    pub name: String,
    pub version: String,
    pub url: String,
    /// Wheel filename as published by the registry
    pub filename: String,
    pub file: Option<PathBuf>,
}

/// Filename-keyed wheel directory
pub struct ArtifactStore {
    dir: PathBuf,
    transport: Arc<dyn Transport>,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, transport: Arc<dyn Transport>) -> Self {
        Self {
            dir: dir.into(),
            transport,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local path an artifact URL maps to
    pub fn local_path(&self, url: &str) -> Option<PathBuf> {
        filename_from_url(url).map(|name| self.dir.join(name))
    }

    /// Fetch one artifact, reusing the local copy when present
    ///
    /// Returns `None` when the URL has no usable filename or the transfer
    /// fails; the failure is logged.
    pub fn fetch(&self, url: &str) -> Option<PathBuf> {
        let Some(dest) = self.local_path(url) else {
            warn!("Cannot derive a filename from {}", url);
            return None;
        };

        if dest.is_file() {
            debug!("Using cached {}", dest.display());
            return Some(dest);
        }

        match self.download_to(url, &dest) {
            Ok(bytes) => {
                info!("Saved {} ({} bytes)", dest.display(), bytes);
                Some(dest)
            }
            Err(e) => {
                warn!("Failed to download {}: {}", url, e);
                None
            }
        }
    }

    fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::IoError(format!("Failed to create directory {}: {e}", self.dir.display()))
        })?;

        // Temp file lives in the same directory so the rename stays atomic;
        // it is removed on drop if we bail out early.
        let mut temp = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(&self.dir)
            .map_err(|e| Error::IoError(format!("Failed to create temp file: {e}")))?;

        let bytes = self.transport.download(url, temp.as_file_mut())?;
        temp.as_file_mut()
            .flush()
            .map_err(|e| Error::IoError(format!("Failed to flush download: {e}")))?;

        temp.persist(dest).map_err(|e| {
            Error::IoError(format!("Failed to move download to {}: {}", dest.display(), e.error))
        })?;
        Ok(bytes)
    }

    /// Fetch every artifact of a resolution on a bounded worker pool
    ///
    /// Each URL is transferred at most once even if several artifacts share
    /// it. Records come back in input order; failed transfers have
    /// `file: None` and never cancel the rest of the batch.
    pub fn fetch_all(
        &self,
        artifacts: &[ResolvedArtifact],
        workers: usize,
        progress: &dyn ProgressTracker,
    ) -> Result<Vec<ArtifactRecord>> {
        let mut unique: Vec<&ResolvedArtifact> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for artifact in artifacts {
            if seen.insert(artifact.url.as_str()) {
                unique.push(artifact);
            }
        }

        info!(
            "Fetching {} artifacts with {} workers",
            unique.len(),
            workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create download pool: {e}")))?;

        let fetched: HashMap<&str, Option<PathBuf>> = pool.install(|| {
            unique
                .par_iter()
                .map(|artifact| {
                    progress.set_message(&artifact.filename);
                    let path = self.fetch(&artifact.url);
                    if path.is_none() {
                        progress.report_failure(&artifact.filename);
                    }
                    progress.increment(1);
                    (artifact.url.as_str(), path)
                })
                .collect()
        });

        let failed = fetched.values().filter(|p| p.is_none()).count();
        progress.finish_with_message(&format!(
            "{} fetched, {} failed",
            fetched.len() - failed,
            failed
        ));

        Ok(artifacts
            .iter()
            .map(|artifact| ArtifactRecord {
                name: artifact.name.clone(),
                version: artifact.version.clone(),
                url: artifact.url.clone(),
                filename: artifact.filename.clone(),
                file: fetched.get(artifact.url.as_str()).cloned().flatten(),
            })
            .collect())
    }
}
