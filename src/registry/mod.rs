// src/registry/mod.rs

//! Package index access
//!
//! This module provides functionality for:
//! - Fetching project documents from a JSON package index
//! - Resolving a name and constraint to a concrete version
//! - Choosing the most portable wheel for that version
//! - Caching resolved metadata for the lifetime of a session

mod cache;
mod client;
mod fetcher;
mod metadata;
mod wheel;

use crate::error::Result;

pub use cache::{CacheLookup, CacheStats, MetadataCache};
pub use client::{RegistryClient, DEFAULT_INDEX_URL, DOWNLOAD_TIMEOUT, METADATA_TIMEOUT};
pub use fetcher::{FallbackPolicy, MetadataFetcher};
pub use metadata::{PackageMetadata, ProjectDocument, ProjectInfo, ReleaseFile, WheelFile};
pub use wheel::{select_wheel, WheelTags};

/// Source of project documents
///
/// `RegistryClient` talks HTTP; tests plug in in-memory registries.
pub trait Registry: Send + Sync {
    /// Fetch the project document for a normalized package name
    fn project(&self, name: &str) -> Result<ProjectDocument>;
}
