// src/resolver/walker.rs

//! Shallow dependency walk for a single root package
//!
//! The walk yields the root, then each direct dependency at its declared
//! constraint. A direct dependency in the critical set is additionally
//! expanded `critical_depth` levels down, every expanded package taken at its
//! latest version. Any lookup that fails, or any package without a wheel,
//! simply drops out; the walk itself cannot fail.

use crate::registry::{MetadataFetcher, PackageMetadata};
use crate::requirement::{normalize_name, parse_requirements};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::policy::TraversalPolicy;
use super::ResolvedArtifact;

pub struct DependencyWalker {
    fetcher: Arc<MetadataFetcher>,
    policy: TraversalPolicy,
}

impl DependencyWalker {
    pub fn new(fetcher: Arc<MetadataFetcher>, policy: TraversalPolicy) -> Self {
        Self { fetcher, policy }
    }

    pub fn policy(&self) -> &TraversalPolicy {
        &self.policy
    }

    pub fn fetcher(&self) -> &MetadataFetcher {
        &self.fetcher
    }

    /// Walk one root request
    ///
    /// Order: root, then each direct dependency in registry order immediately
    /// followed by its critical expansion. Empty when the root itself has no
    /// wheel.
    pub fn resolve(&self, name: &str, constraint: Option<&str>) -> Vec<ResolvedArtifact> {
        let Some(root) = self.fetcher.fetch(name, constraint) else {
            info!("Skipping '{}': no matching release", name);
            return Vec::new();
        };
        let Some(root_artifact) = ResolvedArtifact::from_metadata(&root) else {
            info!("Skipping {} {}: no wheel available", root.name, root.version);
            return Vec::new();
        };

        let mut out = vec![root_artifact];
        let mut expanded = HashSet::from([root.name.clone()]);

        for req in parse_requirements(root.requires_dist.iter().map(String::as_str)) {
            let dep_name = normalize_name(&req.name);
            let critical = self.policy.critical.contains(&dep_name);
            if critical && self.policy.skip_critical_direct {
                debug!("Deferring critical dependency {} of {}", dep_name, root.name);
                continue;
            }

            let Some(dep) = self.fetcher.fetch(&dep_name, req.constraint.as_deref()) else {
                continue;
            };
            let Some(artifact) = ResolvedArtifact::from_metadata(&dep) else {
                debug!("Dependency {} {} has no wheel", dep.name, dep.version);
                continue;
            };
            out.push(artifact);

            if critical {
                self.expand(&dep, self.policy.critical_depth, &mut expanded, &mut out);
            }
        }

        out
    }

    /// Append the dependencies of `meta`, `depth` levels deep, unconstrained
    fn expand(
        &self,
        meta: &PackageMetadata,
        depth: usize,
        expanded: &mut HashSet<String>,
        out: &mut Vec<ResolvedArtifact>,
    ) {
        if depth == 0 || !expanded.insert(meta.name.clone()) {
            return;
        }
        debug!("Expanding critical package {} ({} levels)", meta.name, depth);

        for req in parse_requirements(meta.requires_dist.iter().map(String::as_str)) {
            let Some(sub) = self.fetcher.fetch(&req.name, None) else {
                continue;
            };
            let Some(artifact) = ResolvedArtifact::from_metadata(&sub) else {
                continue;
            };
            out.push(artifact);
            self.expand(&sub, depth - 1, expanded, out);
        }
    }

    /// Resolve a package at its latest version, for the critical pass
    pub fn latest(&self, name: &str) -> Option<ResolvedArtifact> {
        self.fetcher
            .fetch(name, None)
            .and_then(|meta| ResolvedArtifact::from_metadata(&meta))
    }
}
