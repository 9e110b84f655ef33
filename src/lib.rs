// src/lib.rs

//! Wheelhouse
//!
//! Resolves Python package requests into a set of wheels that can be installed
//! without network access, downloads them, and writes install scripts for the
//! resulting bundle.
//!
//! # Architecture
//!
//! - `version` / `requirement`: version ordering, constraint membership and
//!   request parsing
//! - `registry`: JSON index client, metadata cache, version and wheel selection
//! - `resolver`: shallow dependency walk with critical-package policy
//! - `artifacts`: filename-keyed wheel directory with atomic downloads
//! - `manifest`: requirements list, JSON manifest and install scripts
//! - `pipeline`: wires the above together from a `WheelhouseConfig`
//!
//! Not a full dependency solver: each package is pinned independently to the
//! greatest release satisfying its own constraint.

pub mod artifacts;
pub mod config;
mod error;
pub mod manifest;
pub mod pipeline;
pub mod progress;
pub mod registry;
pub mod requirement;
pub mod resolver;
pub mod version;

pub use artifacts::{filename_from_url, ArtifactRecord, ArtifactStore, Transport};
pub use config::WheelhouseConfig;
pub use error::{Error, Result};
pub use manifest::{Manifest, ManifestEntry, ManifestFiles, ManifestOptions, ManifestWriter};
pub use pipeline::{BatchOutcome, Wheelhouse};
pub use progress::{CliProgress, LogProgress, ProgressTracker, SilentProgress};
pub use registry::{
    FallbackPolicy, MetadataCache, MetadataFetcher, PackageMetadata, Registry, RegistryClient,
};
pub use requirement::{parse_entry, PackageRequest, Requirement};
pub use resolver::{
    BatchResolver, CriticalSet, DependencyWalker, Resolution, ResolvedArtifact, TraversalPolicy,
};
pub use version::{max_satisfying, Version, VersionSpecifiers};
