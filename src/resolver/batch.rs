// src/resolver/batch.rs

//! Batch resolution of a request list
//!
//! Roots are walked concurrently on a bounded thread pool, but results are
//! stitched back together in request order so the output is reproducible.
//! The critical pass runs after all roots, and duplicates (by name and
//! version) are dropped last, keeping the first occurrence.

use crate::error::{Error, Result};
use crate::requirement::{is_valid_name, parse_entry, PackageRequest};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use super::walker::DependencyWalker;
use super::ResolvedArtifact;

/// Outcome of resolving one batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    /// Parsed requests, in input order
    pub requests: Vec<PackageRequest>,
    /// Deduplicated artifacts in output order
    pub artifacts: Vec<ResolvedArtifact>,
    /// Raw entries rejected before lookup (unusable package names)
    pub rejected: Vec<String>,
    /// Requests that resolved to nothing (not found or no wheel)
    pub unresolved: Vec<String>,
}

pub struct BatchResolver {
    walker: DependencyWalker,
    pool: rayon::ThreadPool,
}

impl BatchResolver {
    /// Create a resolver walking at most `workers` roots at a time
    pub fn new(walker: DependencyWalker, workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("resolve-{}", i))
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create resolver pool: {e}")))?;
        Ok(Self { walker, pool })
    }

    pub fn walker(&self) -> &DependencyWalker {
        &self.walker
    }

    /// Resolve a list of raw request strings
    pub fn resolve<S>(&self, entries: &[S]) -> Resolution
    where
        S: AsRef<str>,
    {
        let mut resolution = Resolution::default();

        for raw in entries {
            let request = parse_entry(raw.as_ref());
            if is_valid_name(&request.name) {
                resolution.requests.push(request);
            } else {
                warn!("Ignoring malformed package request '{}'", raw.as_ref());
                resolution.rejected.push(raw.as_ref().to_string());
            }
        }

        info!("Resolving {} package requests", resolution.requests.len());

        let per_root: Vec<Vec<ResolvedArtifact>> = self.pool.install(|| {
            resolution
                .requests
                .par_iter()
                .map(|req| self.walker.resolve(&req.name, req.constraint.as_deref()))
                .collect()
        });

        let mut combined = Vec::new();
        for (request, artifacts) in resolution.requests.iter().zip(per_root) {
            if artifacts.is_empty() {
                resolution.unresolved.push(request.to_string());
            }
            combined.extend(artifacts);
        }

        let policy = self.walker.policy();
        if policy.force_include_critical {
            let mut present: HashSet<String> = resolution
                .requests
                .iter()
                .map(PackageRequest::normalized_name)
                .collect();
            present.extend(combined.iter().map(|a| a.name.clone()));

            let missing: Vec<&str> = policy
                .critical
                .iter()
                .filter(|name| !present.contains(*name))
                .collect();

            let critical: Vec<Option<ResolvedArtifact>> = self.pool.install(|| {
                missing
                    .par_iter()
                    .map(|name| self.walker.latest(name))
                    .collect()
            });
            combined.extend(critical.into_iter().flatten());
        }

        let mut seen = HashSet::new();
        combined.retain(|artifact| seen.insert(artifact.key()));

        info!(
            "Resolved {} artifacts ({} unresolved, {} rejected)",
            combined.len(),
            resolution.unresolved.len(),
            resolution.rejected.len()
        );

        resolution.artifacts = combined;
        resolution
    }
}
