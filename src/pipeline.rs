// src/pipeline.rs

//! End-to-end offline bundle pipeline
//!
//! Wires the configured registry, cache, resolver, artifact store and
//! manifest writer together. The CLI drives it in two steps (plan, then
//! bundle) so it can size the progress bar between them.

use crate::artifacts::{ArtifactRecord, ArtifactStore, Transport};
use crate::config::WheelhouseConfig;
use crate::error::Result;
use crate::manifest::{script_wheel_dir, Manifest, ManifestFiles, ManifestOptions, ManifestWriter};
use crate::progress::ProgressTracker;
use crate::registry::{MetadataCache, MetadataFetcher, Registry, RegistryClient};
use crate::resolver::{BatchResolver, DependencyWalker, Resolution};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything one bundle run produced
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub resolution: Resolution,
    /// One record per resolved artifact, in resolution order
    pub records: Vec<ArtifactRecord>,
    pub manifest: Manifest,
    pub files: ManifestFiles,
}

impl BatchOutcome {
    pub fn failed_downloads(&self) -> usize {
        self.records.iter().filter(|r| r.file.is_none()).count()
    }
}

pub struct Wheelhouse {
    config: WheelhouseConfig,
    fetcher: Arc<MetadataFetcher>,
    resolver: BatchResolver,
    store: ArtifactStore,
}

impl Wheelhouse {
    /// Build a pipeline talking to the configured HTTP index
    pub fn from_config(config: WheelhouseConfig) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(RegistryClient::with_options(
            &config.registry.index_url,
            config.metadata_timeout(),
            config.download_timeout(),
        )?);
        Self::with_backends(config, client.clone(), client)
    }

    /// Build a pipeline over arbitrary registry and transport backends
    pub fn with_backends(
        config: WheelhouseConfig,
        registry: Arc<dyn Registry>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let cache = Arc::new(MetadataCache::new(config.cache.capacity, config.cache_ttl()?));
        let fetcher = Arc::new(MetadataFetcher::new(registry, cache, config.registry.fallback));
        let walker = DependencyWalker::new(fetcher.clone(), config.traversal_policy());
        let resolver = BatchResolver::new(walker, config.resolver.workers)?;
        let store = ArtifactStore::new(config.download.wheel_dir.clone(), transport);

        Ok(Self {
            config,
            fetcher,
            resolver,
            store,
        })
    }

    pub fn config(&self) -> &WheelhouseConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &MetadataFetcher {
        &self.fetcher
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Resolve without touching the filesystem
    pub fn plan<S: AsRef<str>>(&self, entries: &[S]) -> Resolution {
        let resolution = self.resolver.resolve(entries);
        let stats = self.fetcher.cache().stats();
        debug!(
            "Metadata cache: {} entries ({} negative), {} hits, {} misses, {} evictions",
            stats.entries, stats.negative_entries, stats.hits, stats.misses, stats.evictions
        );
        resolution
    }

    /// Download a resolution and regenerate the bundle files
    pub fn bundle(&self, resolution: Resolution, progress: &dyn ProgressTracker) -> Result<BatchOutcome> {
        if resolution.artifacts.is_empty() {
            warn!("Nothing resolved; writing an empty manifest");
        }

        let records = self
            .store
            .fetch_all(&resolution.artifacts, self.config.download.workers, progress)?;

        let output_dir = &self.config.manifest.output_dir;
        let options = ManifestOptions {
            wheel_dir: script_wheel_dir(&absolute(output_dir), &absolute(self.store.dir())),
            python_version: self.config.manifest.python_version.clone(),
            env_name: self.config.manifest.env_name.clone(),
        };
        let manifest = Manifest::from_records(&records, &options);
        let files = ManifestWriter::new(output_dir.clone())?.write(&manifest)?;

        let outcome = BatchOutcome {
            resolution,
            records,
            manifest,
            files,
        };
        info!(
            "Bundle ready: {} artifacts, {} failed downloads",
            outcome.records.len(),
            outcome.failed_downloads()
        );
        Ok(outcome)
    }

    /// Plan and bundle in one go
    pub fn run<S: AsRef<str>>(&self, entries: &[S], progress: &dyn ProgressTracker) -> Result<BatchOutcome> {
        let resolution = self.plan(entries);
        self.bundle(resolution, progress)
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
