// tests/common/mod.rs

//! Shared test utilities: an in-memory package index and a counting transport.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use wheelhouse::registry::{ProjectDocument, ProjectInfo, ReleaseFile};
use wheelhouse::requirement::normalize_name;
use wheelhouse::{Error, Registry, Result, Transport, Wheelhouse, WheelhouseConfig};

pub const FILES_HOST: &str = "https://files.example.test/packages";

pub fn wheel_url(name: &str, version: &str) -> String {
    format!("{}/{}-{}-py3-none-any.whl", FILES_HOST, name, version)
}

/// In-memory registry serving project documents by normalized name
#[derive(Default)]
pub struct StaticRegistry {
    projects: HashMap<String, ProjectDocument>,
    lookups: Mutex<Vec<String>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project; the last version listed is the registry's current one
    pub fn package(mut self, name: &str, versions: &[&str], requires: &[&str]) -> Self {
        let releases = versions
            .iter()
            .map(|v| {
                let file = ReleaseFile {
                    filename: format!("{}-{}-py3-none-any.whl", name, v),
                    url: wheel_url(name, v),
                    packagetype: "bdist_wheel".to_string(),
                    yanked: false,
                };
                (v.to_string(), vec![file])
            })
            .collect::<BTreeMap<_, _>>();

        self.projects.insert(
            normalize_name(name),
            ProjectDocument {
                info: ProjectInfo {
                    name: name.to_string(),
                    version: versions.last().copied().unwrap_or("0").to_string(),
                    requires_dist: Some(requires.iter().map(|r| r.to_string()).collect()),
                },
                releases,
            },
        );
        self
    }

    /// Add a project that only ships source distributions
    pub fn sdist_only(mut self, name: &str, version: &str) -> Self {
        let file = ReleaseFile {
            filename: format!("{}-{}.tar.gz", name, version),
            url: format!("{}/{}-{}.tar.gz", FILES_HOST, name, version),
            packagetype: "sdist".to_string(),
            yanked: false,
        };
        self.projects.insert(
            normalize_name(name),
            ProjectDocument {
                info: ProjectInfo {
                    name: name.to_string(),
                    version: version.to_string(),
                    requires_dist: None,
                },
                releases: BTreeMap::from([(version.to_string(), vec![file])]),
            },
        );
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }

    pub fn lookup_count(&self, name: &str) -> usize {
        self.lookups.lock().iter().filter(|n| *n == name).count()
    }
}

impl Registry for StaticRegistry {
    fn project(&self, name: &str) -> Result<ProjectDocument> {
        self.lookups.lock().push(name.to_string());
        self.projects
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFoundError(format!("Package '{}' not in index", name)))
    }
}

/// Transport writing a fake body and counting transfers per URL
#[derive(Default)]
pub struct CountingTransport {
    calls: AtomicUsize,
    per_url: Mutex<HashMap<String, usize>>,
    failing: HashSet<String>,
}

impl CountingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(urls: &[String]) -> Self {
        Self {
            failing: urls.iter().cloned().collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.per_url.lock().get(url).copied().unwrap_or(0)
    }
}

impl Transport for CountingTransport {
    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.per_url.lock().entry(url.to_string()).or_insert(0) += 1;

        if self.failing.contains(url) {
            return Err(Error::DownloadError(format!("connection reset fetching {}", url)));
        }
        let body = format!("wheel body for {}", url);
        dest.write_all(body.as_bytes())?;
        Ok(body.len() as u64)
    }
}

/// Index resembling a small slice of a real one
pub fn sample_registry() -> StaticRegistry {
    StaticRegistry::new()
        .package(
            "requests",
            &["2.31.0", "2.32.3"],
            &[
                "charset-normalizer<4,>=2",
                "idna<4,>=2.5",
                "urllib3<3,>=1.21.1",
                "certifi>=2017.4.17",
                "PySocks!=1.5.7,>=1.5.6; extra == \"socks\"",
            ],
        )
        .package("charset-normalizer", &["3.3.2"], &[])
        .package("idna", &["3.6", "3.7"], &[])
        .package("urllib3", &["1.26.18", "2.2.1"], &["brotli>=1.0.9; extra == \"brotli\""])
        .package("certifi", &["2024.2.2"], &[])
        .package("numpy", &["1.24.0", "1.26.4", "2.1.0"], &[])
        .package(
            "pandas",
            &["2.1.4", "2.2.2"],
            &["numpy>=1.23.2", "python-dateutil>=2.8.2", "pytz>=2020.1", "tzdata>=2022.7"],
        )
        .package("python-dateutil", &["2.9.0"], &["six>=1.5"])
        .package("six", &["1.16.0"], &[])
        .package("pytz", &["2024.1"], &[])
        .package("tzdata", &["2024.1"], &[])
        .package("somepkg", &["1.0.0", "2.0.0"], &[])
        .sdist_only("legacy-only", "0.9")
}

/// Config rooted in a scratch directory
pub fn scratch_config(root: &Path) -> WheelhouseConfig {
    let mut config = WheelhouseConfig::default();
    config.download.wheel_dir = root.join("wheels");
    config.manifest.output_dir = root.to_path_buf();
    config
}

pub fn pipeline(
    config: WheelhouseConfig,
    registry: Arc<StaticRegistry>,
    transport: Arc<CountingTransport>,
) -> Wheelhouse {
    Wheelhouse::with_backends(config, registry, transport).unwrap()
}

/// `name==version` strings of a resolution, in order
pub fn pins(artifacts: &[wheelhouse::ResolvedArtifact]) -> Vec<String> {
    artifacts
        .iter()
        .map(|a| format!("{}=={}", a.name, a.version))
        .collect()
}
