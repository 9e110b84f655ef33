// src/manifest/mod.rs

//! Offline bundle manifest
//!
//! A [`Manifest`] is the final artifact sequence plus the few settings the
//! install scripts need. [`ManifestWriter`] regenerates the whole bundle
//! (`requirements.txt`, `install.sh`, `install.bat`, `manifest.json`) from it;
//! files are never patched in place.

mod render;

pub use render::{render_json, render_requirements, ScriptRenderer};

use crate::artifacts::ArtifactRecord;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Version of the `manifest.json` layout
pub const SCHEMA_VERSION: u32 = 1;

pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const INSTALL_SH_FILE: &str = "install.sh";
pub const INSTALL_BAT_FILE: &str = "install.bat";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Settings rendered into the bundle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestOptions {
    /// Wheel directory as the scripts should see it (relative to the bundle
    /// directory when possible)
    pub wheel_dir: String,
    pub python_version: Option<String>,
    pub env_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub version: String,
    pub url: String,
    pub filename: String,
    /// Whether the wheel is present in the wheel directory
    pub downloaded: bool,
}

impl From<&ArtifactRecord> for ManifestEntry {
    fn from(record: &ArtifactRecord) -> Self {
        Self {
            name: record.name.clone(),
            version: record.version.clone(),
            url: record.url.clone(),
            filename: record.filename.clone(),
            downloaded: record.file.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub wheel_dir: String,
    pub python_version: Option<String>,
    pub env_name: Option<String>,
    pub artifacts: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(artifacts: Vec<ManifestEntry>, options: &ManifestOptions) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            wheel_dir: options.wheel_dir.clone(),
            python_version: options.python_version.clone(),
            env_name: options.env_name.clone(),
            artifacts,
        }
    }

    pub fn from_records(records: &[ArtifactRecord], options: &ManifestOptions) -> Self {
        Self::new(records.iter().map(ManifestEntry::from).collect(), options)
    }

    /// Conda lines are rendered only with both an environment and a runtime
    pub fn conda_enabled(&self) -> bool {
        self.env_name.is_some() && self.python_version.is_some()
    }
}

/// Paths of a written bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestFiles {
    pub requirements: PathBuf,
    pub install_sh: PathBuf,
    pub install_bat: PathBuf,
    pub manifest: PathBuf,
}

/// Writes the bundle files into one directory
pub struct ManifestWriter {
    dir: PathBuf,
    renderer: ScriptRenderer,
}

impl ManifestWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            dir: dir.into(),
            renderer: ScriptRenderer::new()?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render everything first, then replace the files
    pub fn write(&self, manifest: &Manifest) -> Result<ManifestFiles> {
        let requirements = render_requirements(manifest);
        let install_sh = self.renderer.render_sh(manifest)?;
        let install_bat = self.renderer.render_bat(manifest)?;
        let json = render_json(manifest)?;

        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::IoError(format!("Failed to create directory {}: {e}", self.dir.display()))
        })?;

        let files = ManifestFiles {
            requirements: self.replace(REQUIREMENTS_FILE, &requirements)?,
            install_sh: self.replace(INSTALL_SH_FILE, &install_sh)?,
            install_bat: self.replace(INSTALL_BAT_FILE, &install_bat)?,
            manifest: self.replace(MANIFEST_FILE, &json)?,
        };
        make_executable(&files.install_sh)?;

        info!(
            "Wrote manifest for {} artifacts to {}",
            manifest.artifacts.len(),
            self.dir.display()
        );
        Ok(files)
    }

    fn replace(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let dest = self.dir.join(name);
        let mut temp = tempfile::Builder::new()
            .prefix(".wheelhouse-")
            .tempfile_in(&self.dir)
            .map_err(|e| Error::IoError(format!("Failed to create temp file: {e}")))?;
        temp.write_all(contents.as_bytes())
            .map_err(|e| Error::IoError(format!("Failed to write {}: {e}", dest.display())))?;
        temp.persist(&dest).map_err(|e| {
            Error::IoError(format!("Failed to replace {}: {}", dest.display(), e.error))
        })?;
        debug!("Wrote {}", dest.display());
        Ok(dest)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| Error::IoError(format!("Failed to chmod {}: {e}", path.display())))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// How the scripts should refer to `wheel_dir` from inside `bundle_dir`
pub fn script_wheel_dir(bundle_dir: &Path, wheel_dir: &Path) -> String {
    match wheel_dir.strip_prefix(bundle_dir) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => wheel_dir.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ArtifactRecord> {
        vec![
            ArtifactRecord {
                name: "six".to_string(),
                version: "1.16.0".to_string(),
                url: "https://files.example/six-1.16.0-py2.py3-none-any.whl".to_string(),
                filename: "six-1.16.0-py2.py3-none-any.whl".to_string(),
                file: Some(PathBuf::from("/tmp/wheels/six-1.16.0-py2.py3-none-any.whl")),
            },
            ArtifactRecord {
                name: "attrs".to_string(),
                version: "23.2.0".to_string(),
                url: "https://files.example/attrs-23.2.0-py3-none-any.whl".to_string(),
                filename: "attrs-23.2.0-py3-none-any.whl".to_string(),
                file: None,
            },
        ]
    }

    #[test]
    fn test_entries_from_records() {
        let manifest = Manifest::from_records(&records(), &ManifestOptions::default());
        assert_eq!(manifest.schema_version, SCHEMA_VERSION);
        assert!(manifest.artifacts[0].downloaded);
        assert!(!manifest.artifacts[1].downloaded);
        assert_eq!(manifest.artifacts[1].filename, "attrs-23.2.0-py3-none-any.whl");
        assert!(!manifest.conda_enabled());
    }

    #[test]
    fn test_write_bundle_is_deterministic() {
        let temp = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(temp.path().join("bundle")).unwrap();
        let options = ManifestOptions {
            wheel_dir: "wheels".to_string(),
            ..ManifestOptions::default()
        };
        let manifest = Manifest::from_records(&records(), &options);

        let files = writer.write(&manifest).unwrap();
        let first = fs::read(&files.requirements).unwrap();
        let first_json = fs::read(&files.manifest).unwrap();
        writer.write(&manifest).unwrap();

        assert_eq!(first, fs::read(&files.requirements).unwrap());
        assert_eq!(first_json, fs::read(&files.manifest).unwrap());
        assert_eq!(String::from_utf8(first).unwrap(), "six==1.16.0\nattrs==23.2.0\n");
        assert!(files.install_bat.is_file());

        let leftovers: Vec<_> = fs::read_dir(writer.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".wheelhouse-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_install_sh_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let temp = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(temp.path()).unwrap();
        let files = writer
            .write(&Manifest::from_records(&records(), &ManifestOptions::default()))
            .unwrap();
        let mode = fs::metadata(&files.install_sh).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_script_wheel_dir() {
        let bundle = Path::new("/srv/bundle");
        assert_eq!(script_wheel_dir(bundle, Path::new("/srv/bundle/wheels")), "wheels");
        assert_eq!(script_wheel_dir(bundle, bundle), ".");
        assert_eq!(script_wheel_dir(bundle, Path::new("/data/wheels")), "/data/wheels");
    }
}
