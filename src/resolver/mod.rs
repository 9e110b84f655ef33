// src/resolver/mod.rs

//! Dependency closure resolution
//!
//! Turns package requests into the ordered list of wheels to fetch:
//! - `policy`: the critical package set and traversal parameters
//! - `walker`: the per-root shallow walk
//! - `batch`: concurrent resolution of a request list with deduplication
//!
//! Nothing here touches the filesystem.

mod batch;
mod policy;
mod walker;

pub use batch::{BatchResolver, Resolution};
pub use policy::{CriticalSet, TraversalPolicy, DEFAULT_CRITICAL_PACKAGES};
pub use walker::DependencyWalker;

use crate::registry::PackageMetadata;
use serde::{Deserialize, Serialize};

/// One wheel to fetch
///
/// Two artifacts with the same name and version are the same artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    /// Normalized project name
    pub name: String,
    pub version: String,
    pub url: String,
    /// Wheel filename as published by the registry
    pub filename: String,
}

impl ResolvedArtifact {
    /// Build from fetched metadata; `None` when no wheel was published
    pub fn from_metadata(meta: &PackageMetadata) -> Option<Self> {
        meta.wheel.as_ref().map(|wheel| Self {
            name: meta.name.clone(),
            version: meta.version.clone(),
            url: wheel.url.clone(),
            filename: wheel.filename.clone(),
        })
    }

    /// Uniqueness key within a resolution
    pub fn key(&self) -> (String, String) {
        (self.name.clone(), self.version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::registry::{
        FallbackPolicy, MetadataCache, MetadataFetcher, ProjectDocument, ProjectInfo, Registry,
        ReleaseFile,
    };
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Arc;
    use std::time::Duration;

    struct TableRegistry {
        projects: HashMap<String, ProjectDocument>,
    }

    impl TableRegistry {
        fn new() -> Self {
            Self {
                projects: HashMap::new(),
            }
        }

        fn add(mut self, name: &str, versions: &[&str], requires: &[&str]) -> Self {
            let mut releases = BTreeMap::new();
            for v in versions {
                releases.insert(
                    v.to_string(),
                    vec![ReleaseFile {
                        filename: format!("{}-{}-py3-none-any.whl", name, v),
                        url: format!("https://files.example/{}-{}-py3-none-any.whl", name, v),
                        packagetype: "bdist_wheel".to_string(),
                        yanked: false,
                    }],
                );
            }
            self.projects.insert(
                name.to_string(),
                ProjectDocument {
                    info: ProjectInfo {
                        name: name.to_string(),
                        version: versions.last().unwrap().to_string(),
                        requires_dist: Some(requires.iter().map(|r| r.to_string()).collect()),
                    },
                    releases,
                },
            );
            self
        }

        fn add_sdist_only(mut self, name: &str, version: &str) -> Self {
            self.projects.insert(
                name.to_string(),
                ProjectDocument {
                    info: ProjectInfo {
                        name: name.to_string(),
                        version: version.to_string(),
                        requires_dist: None,
                    },
                    releases: BTreeMap::from([(version.to_string(), Vec::new())]),
                },
            );
            self
        }
    }

    impl Registry for TableRegistry {
        fn project(&self, name: &str) -> Result<ProjectDocument> {
            self.projects
                .get(name)
                .cloned()
                .ok_or_else(|| Error::NotFoundError(name.to_string()))
        }
    }

    fn walker(registry: TableRegistry, policy: TraversalPolicy) -> DependencyWalker {
        let cache = Arc::new(MetadataCache::new(256, Duration::from_secs(60)));
        let fetcher = MetadataFetcher::new(Arc::new(registry), cache, FallbackPolicy::Strict);
        DependencyWalker::new(Arc::new(fetcher), policy)
    }

    fn names(artifacts: &[ResolvedArtifact]) -> Vec<String> {
        artifacts
            .iter()
            .map(|a| format!("{}=={}", a.name, a.version))
            .collect()
    }

    fn registry() -> TableRegistry {
        TableRegistry::new()
            .add("flask", &["2.0.0", "3.0.0"], &["werkzeug>=3.0", "numpy<2", "click; extra == \"cli\""])
            .add("werkzeug", &["2.3.0", "3.0.1"], &["markupsafe>=2.1.1"])
            .add("markupsafe", &["2.1.3"], &[])
            .add("numpy", &["1.26.4", "2.1.0"], &["blas-shim"])
            .add("blas-shim", &["0.1.0", "0.2.0"], &["deep-dep"])
            .add("deep-dep", &["1.0"], &[])
            .add("click", &["8.1.7"], &[])
            .add_sdist_only("nowheel", "1.0")
    }

    #[test]
    fn test_walk_order_and_critical_expansion() {
        let walker = walker(registry(), TraversalPolicy::default());
        let out = walker.resolve("Flask", None);
        assert_eq!(
            names(&out),
            vec![
                "flask==3.0.0",
                "werkzeug==3.0.1",
                "numpy==1.26.4",
                "blas-shim==0.2.0",
            ]
        );
        assert_eq!(out[0].filename, "flask-3.0.0-py3-none-any.whl");
        assert_eq!(out[0].url, "https://files.example/flask-3.0.0-py3-none-any.whl");
    }

    #[test]
    fn test_deeper_critical_expansion() {
        let policy = TraversalPolicy {
            critical_depth: 2,
            ..TraversalPolicy::default()
        };
        let out = walker(registry(), policy).resolve("flask", None);
        assert_eq!(names(&out).last().unwrap(), "deep-dep==1.0");
    }

    #[test]
    fn test_skip_critical_direct() {
        let policy = TraversalPolicy {
            skip_critical_direct: true,
            ..TraversalPolicy::default()
        };
        let out = walker(registry(), policy).resolve("flask", None);
        assert_eq!(names(&out), vec!["flask==3.0.0", "werkzeug==3.0.1"]);
    }

    #[test]
    fn test_root_without_wheel_is_empty() {
        let walker = walker(registry(), TraversalPolicy::default());
        assert!(walker.resolve("nowheel", None).is_empty());
        assert!(walker.resolve("does-not-exist", None).is_empty());
    }

    #[test]
    fn test_batch_dedup_and_critical_pass() {
        let batch = BatchResolver::new(walker(registry(), TraversalPolicy::default()), 4).unwrap();
        let resolution = batch.resolve(&["markupsafe", "markupsafe==2.1.3", "===bad=="]);
        assert_eq!(
            names(&resolution.artifacts),
            vec!["markupsafe==2.1.3", "numpy==2.1.0"]
        );
        assert_eq!(resolution.rejected, vec!["===bad==".to_string()]);
    }

    #[test]
    fn test_critical_pass_skips_already_resolved_names() {
        let batch = BatchResolver::new(walker(registry(), TraversalPolicy::default()), 2).unwrap();
        let resolution = batch.resolve(&["flask"]);
        let numpy: Vec<_> = resolution
            .artifacts
            .iter()
            .filter(|a| a.name == "numpy")
            .collect();
        assert_eq!(numpy.len(), 1);
        assert_eq!(numpy[0].version, "1.26.4");
    }

    #[test]
    fn test_name_spellings_collapse_to_one_project() {
        let policy = TraversalPolicy {
            force_include_critical: false,
            ..TraversalPolicy::default()
        };
        let registry = registry()
            .add("typing-extensions", &["4.12.2"], &[])
            .add("app", &["1.0"], &["Typing.Extensions>=4"]);
        let batch = BatchResolver::new(walker(registry, policy), 2).unwrap();

        let resolution = batch.resolve(&["typing_extensions", "app"]);

        assert_eq!(
            names(&resolution.artifacts),
            vec!["typing-extensions==4.12.2", "app==1.0"]
        );
    }

    #[test]
    fn test_unresolved_requests_reported() {
        let policy = TraversalPolicy {
            force_include_critical: false,
            ..TraversalPolicy::default()
        };
        let batch = BatchResolver::new(walker(registry(), policy), 1).unwrap();
        let resolution = batch.resolve(&["nowheel", "click>=99"]);
        assert!(resolution.artifacts.is_empty());
        assert_eq!(resolution.unresolved, vec!["nowheel".to_string(), "click>=99".to_string()]);
    }
}
