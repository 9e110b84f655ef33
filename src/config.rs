// src/config.rs
//! Configuration file parsing for wheelhouse
//!
//! Supports TOML configuration files with the following sections:
//! - [registry] - Index URL, metadata timeout, constraint fallback
//! - [cache] - Metadata cache capacity and TTL
//! - [resolver] - Worker count and critical package policy
//! - [download] - Wheel directory, worker count, download timeout
//! - [manifest] - Bundle directory and conda environment settings
//!
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! # Example (TOML)
//!
//! ```toml
//! [registry]
//! index_url = "https://pypi.org/pypi"
//! fallback = "latest"
//!
//! [resolver]
//! workers = 8
//! critical_packages = ["numpy", "scipy"]
//! critical_depth = 1
//!
//! [download]
//! wheel_dir = "offline_wheels"
//!
//! [manifest]
//! env_name = "offline_env"
//! python_version = "3.11"
//! ```

use crate::error::{Error, Result};
use crate::registry::{FallbackPolicy, DEFAULT_INDEX_URL};
use crate::resolver::{CriticalSet, TraversalPolicy, DEFAULT_CRITICAL_PACKAGES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Name of the configuration file inside the per-user config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelhouseConfig {
    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub resolver: ResolverSection,

    #[serde(default)]
    pub download: DownloadSection,

    #[serde(default)]
    pub manifest: ManifestSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySection {
    /// Base URL of the JSON index; projects live at `{index_url}/{name}/json`
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Metadata lookup timeout in seconds (default: 10)
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_secs: u64,

    /// What to do when no release satisfies a constraint (default: strict)
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            metadata_timeout_secs: default_metadata_timeout(),
            fallback: FallbackPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSection {
    /// Maximum number of cached lookups, negative entries included
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry lifetime, e.g. "30m", "1h" (default: 1h)
    #[serde(default = "default_cache_ttl")]
    pub ttl: String,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverSection {
    /// Roots resolved concurrently (default: 4)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Packages always included and expanded when seen as direct dependencies
    #[serde(default = "default_critical_packages")]
    pub critical_packages: Vec<String>,

    /// Levels expanded below a critical direct dependency (default: 1)
    #[serde(default = "default_critical_depth")]
    pub critical_depth: usize,

    /// Leave critical packages out of the per-root walk (default: false)
    #[serde(default)]
    pub skip_critical_direct: bool,

    /// Append every critical package after all roots (default: true)
    #[serde(default = "default_true")]
    pub force_include_critical: bool,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            critical_packages: default_critical_packages(),
            critical_depth: default_critical_depth(),
            skip_critical_direct: false,
            force_include_critical: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadSection {
    /// Directory wheels are stored in (default: offline_wheels)
    #[serde(default = "default_wheel_dir")]
    pub wheel_dir: PathBuf,

    /// Concurrent downloads (default: 4)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-wheel download timeout in seconds (default: 30)
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,
}

impl Default for DownloadSection {
    fn default() -> Self {
        Self {
            wheel_dir: default_wheel_dir(),
            workers: default_workers(),
            timeout_secs: default_download_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestSection {
    /// Directory the bundle files are written to (default: current directory)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Conda environment created by the install scripts
    #[serde(default)]
    pub env_name: Option<String>,

    /// Python version for the conda environment
    #[serde(default)]
    pub python_version: Option<String>,
}

impl Default for ManifestSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            env_name: None,
            python_version: None,
        }
    }
}

fn default_index_url() -> String {
    DEFAULT_INDEX_URL.to_string()
}

fn default_metadata_timeout() -> u64 {
    10
}

fn default_cache_capacity() -> usize {
    1024
}

fn default_cache_ttl() -> String {
    "1h".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_critical_packages() -> Vec<String> {
    DEFAULT_CRITICAL_PACKAGES.iter().map(|s| s.to_string()).collect()
}

fn default_critical_depth() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_wheel_dir() -> PathBuf {
    PathBuf::from("offline_wheels")
}

fn default_download_timeout() -> u64 {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl WheelhouseConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let config: WheelhouseConfig = toml::from_str(&content).map_err(|e| {
            Error::ConfigError(format!("Failed to parse config file {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load an explicit file, else the per-user file if it exists, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `$XDG_CONFIG_HOME/wheelhouse/config.toml` or the platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wheelhouse").join(CONFIG_FILE_NAME))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let index = url::Url::parse(&self.registry.index_url).map_err(|e| {
            Error::ConfigError(format!(
                "Invalid registry.index_url '{}': {e}",
                self.registry.index_url
            ))
        })?;
        if !matches!(index.scheme(), "http" | "https") {
            return Err(Error::ConfigError(format!(
                "registry.index_url must be http(s), got '{}'",
                self.registry.index_url
            )));
        }

        if self.resolver.workers == 0 {
            return Err(Error::ConfigError("resolver.workers must be at least 1".to_string()));
        }
        if self.download.workers == 0 {
            return Err(Error::ConfigError("download.workers must be at least 1".to_string()));
        }
        if self.cache.capacity == 0 {
            return Err(Error::ConfigError("cache.capacity must be at least 1".to_string()));
        }
        if self.registry.metadata_timeout_secs == 0 || self.download.timeout_secs == 0 {
            return Err(Error::ConfigError("timeouts must be at least 1 second".to_string()));
        }
        self.cache_ttl()?;

        if let Some(ref env) = self.manifest.env_name {
            if !is_script_safe(env) {
                return Err(Error::ConfigError(format!(
                    "manifest.env_name '{}' may only contain letters, digits, '.', '_' and '-'",
                    env
                )));
            }
        }
        if let Some(ref python) = self.manifest.python_version {
            if !is_script_safe(python) {
                return Err(Error::ConfigError(format!(
                    "manifest.python_version '{}' is not a version",
                    python
                )));
            }
        }

        Ok(())
    }

    /// Parse the cache TTL to a Duration
    pub fn cache_ttl(&self) -> Result<Duration> {
        parse_duration(&self.cache.ttl)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.registry.metadata_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download.timeout_secs)
    }

    /// Traversal policy described by the [resolver] section
    pub fn traversal_policy(&self) -> TraversalPolicy {
        TraversalPolicy {
            critical: CriticalSet::new(&self.resolver.critical_packages),
            critical_depth: self.resolver.critical_depth,
            skip_critical_direct: self.resolver.skip_critical_direct,
            force_include_critical: self.resolver.force_include_critical,
        }
    }
}

/// Values interpolated unquoted into the install scripts
fn is_script_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Parse a duration string like "30s", "5m", "1h", "7d"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('d') {
        (n, 24 * 60 * 60)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 60 * 60)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Assume seconds
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| Error::ConfigError(format!("Invalid duration: '{}'", s)))?;

    let secs = num
        .checked_mul(multiplier)
        .ok_or_else(|| Error::ConfigError(format!("Duration out of range: '{}'", s)))?;
    Ok(Duration::from_secs(secs))
}
