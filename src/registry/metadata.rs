// src/registry/metadata.rs

//! Registry metadata data structures
//!
//! Wire types for the JSON project document served at `{index}/{name}/json`,
//! and the resolved per-package record the fetcher hands to the resolver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Project document returned by the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub info: ProjectInfo,
    /// Release identifier → files published for it
    #[serde(default)]
    pub releases: BTreeMap<String, Vec<ReleaseFile>>,
}

/// The `info` block: describes the current stable release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub requires_dist: Option<Vec<String>>,
}

/// One distribution file of a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseFile {
    pub filename: String,
    pub url: String,
    /// "bdist_wheel", "sdist", ...
    pub packagetype: String,
    #[serde(default)]
    pub yanked: bool,
}

impl ReleaseFile {
    pub fn is_wheel(&self) -> bool {
        self.packagetype == "bdist_wheel"
    }
}

/// Wheel chosen for a resolved version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelFile {
    pub filename: String,
    pub url: String,
}

/// Resolved metadata for one package at one version
///
/// Immutable once built; shared through the metadata cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Normalized package name
    pub name: String,
    pub version: String,
    /// Best wheel for `version`, if any was published
    pub wheel: Option<WheelFile>,
    /// Declared dependencies, extra-only entries already removed
    pub requires_dist: Vec<String>,
}

impl PackageMetadata {
    pub fn artifact_url(&self) -> Option<&str> {
        self.wheel.as_ref().map(|w| w.url.as_str())
    }
}
