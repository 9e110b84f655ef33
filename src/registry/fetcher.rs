// src/registry/fetcher.rs

//! Metadata fetching with version resolution
//!
//! Turns `(name, constraint?)` into the concrete version to use, the wheel
//! published for it, and the package's declared dependencies. Lookup failures
//! are logged and reported as `None`; they never abort a batch.

use crate::requirement::{normalize_name, Requirement};
use crate::version::{constraint_text, max_satisfying, parse_specifiers};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use super::cache::{CacheLookup, MetadataCache};
use super::metadata::{PackageMetadata, ProjectDocument};
use super::wheel::select_wheel;
use super::Registry;

/// What to do when no release satisfies a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Report the package as not found
    #[default]
    Strict,
    /// Use the registry's current version instead
    Latest,
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPolicy::Strict => write!(f, "strict"),
            FallbackPolicy::Latest => write!(f, "latest"),
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(FallbackPolicy::Strict),
            "latest" => Ok(FallbackPolicy::Latest),
            other => Err(format!("unknown fallback policy '{}' (expected strict or latest)", other)),
        }
    }
}

/// Resolves package metadata through a shared cache
pub struct MetadataFetcher {
    registry: Arc<dyn Registry>,
    cache: Arc<MetadataCache>,
    fallback: FallbackPolicy,
}

impl MetadataFetcher {
    pub fn new(registry: Arc<dyn Registry>, cache: Arc<MetadataCache>, fallback: FallbackPolicy) -> Self {
        Self {
            registry,
            cache,
            fallback,
        }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Fetch metadata for `name`, optionally restricted by `constraint`
    ///
    /// Returns `None` when the package cannot be looked up or no release
    /// satisfies the constraint under the strict policy. A malformed constraint
    /// is ignored and the latest version is used.
    pub fn fetch(&self, name: &str, constraint: Option<&str>) -> Option<Arc<PackageMetadata>> {
        let name = normalize_name(name);
        let constraint = constraint.map(str::trim).filter(|c| !c.is_empty());
        let key = MetadataCache::key(&name, constraint);

        match self.cache.get(&key) {
            CacheLookup::Hit(meta) => return Some(meta),
            CacheLookup::Negative => {
                debug!("Negative cache hit for {}", key);
                return None;
            }
            CacheLookup::Miss => {}
        }

        let document = match self.registry.project(&name) {
            Ok(document) => document,
            Err(e) => {
                warn!("Metadata lookup for '{}' failed: {}", name, e);
                self.cache.insert(key, None);
                return None;
            }
        };

        let resolved = self.resolve(&name, constraint, document).map(Arc::new);
        self.cache.insert(key, resolved.clone());
        resolved
    }

    fn resolve(
        &self,
        name: &str,
        constraint: Option<&str>,
        mut document: ProjectDocument,
    ) -> Option<PackageMetadata> {
        let specifiers = constraint.and_then(|c| match parse_specifiers(c) {
            Ok(specs) => Some(specs),
            Err(e) => {
                warn!("Ignoring malformed constraint '{}' for '{}': {}", c, name, e);
                None
            }
        });

        let version = match specifiers {
            Some(ref specs) => {
                let candidates = document.releases.keys().map(String::as_str);
                match max_satisfying(candidates, specs) {
                    Some(v) => v.to_string(),
                    None => match self.fallback {
                        FallbackPolicy::Strict => {
                            warn!("No release of '{}' satisfies '{}'", name, constraint_text(specs));
                            return None;
                        }
                        FallbackPolicy::Latest => {
                            warn!(
                                "No release of '{}' satisfies '{}', using latest {}",
                                name,
                                constraint_text(specs),
                                document.info.version
                            );
                            document.info.version.clone()
                        }
                    },
                }
            }
            None => document.info.version.clone(),
        };

        let wheel = document
            .releases
            .get(&version)
            .and_then(|files| select_wheel(files));
        if wheel.is_none() {
            debug!("No wheel published for {} {}", name, version);
        }

        let requires_dist = document
            .info
            .requires_dist
            .take()
            .unwrap_or_default()
            .into_iter()
            .filter(|raw| {
                Requirement::parse(raw)
                    .map(|req| !req.is_extra_only())
                    .unwrap_or(true)
            })
            .collect();

        Some(PackageMetadata {
            name: name.to_string(),
            version,
            wheel,
            requires_dist,
        })
    }
}
