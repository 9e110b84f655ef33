// src/registry/wheel.rs

//! Wheel selection among the files of one release
//!
//! A universal wheel (`none-any`) installs everywhere and always wins. Among
//! binary wheels, broadly portable platform tags (manylinux, musllinux) are
//! preferred over vendor-specific ones.

use super::metadata::{ReleaseFile, WheelFile};

/// Compatibility tags from a wheel filename
///
/// Format: `{dist}-{version}(-{build})?-{python}-{abi}-{platform}.whl`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelTags {
    pub python: String,
    pub abi: String,
    pub platform: String,
}

impl WheelTags {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let stem = filename.strip_suffix(".whl")?;
        let parts: Vec<&str> = stem.split('-').collect();
        if parts.len() < 5 {
            return None;
        }
        let n = parts.len();
        Some(Self {
            python: parts[n - 3].to_ascii_lowercase(),
            abi: parts[n - 2].to_ascii_lowercase(),
            platform: parts[n - 1].to_ascii_lowercase(),
        })
    }

    pub fn is_universal(&self) -> bool {
        self.platform == "any"
    }

    /// Higher is more portable
    fn portability(&self) -> u32 {
        let platform_score = if self.is_universal() {
            100
        } else if self.platform.contains("manylinux") {
            if self.platform.contains("x86_64") { 60 } else { 55 }
        } else if self.platform.contains("musllinux") {
            45
        } else if self.platform.starts_with("macosx") {
            if self.platform.contains("universal2") { 35 } else { 30 }
        } else if self.platform.starts_with("win") {
            if self.platform.contains("amd64") { 25 } else { 20 }
        } else {
            10
        };
        let abi_score = match self.abi.as_str() {
            "none" => 3,
            "abi3" => 2,
            _ => 0,
        };
        let python_score = u32::from(self.python.starts_with("py3") || self.python.contains(".py3"));
        platform_score + abi_score + python_score
    }
}

/// Choose the best wheel among a release's files
///
/// Yanked files are ignored. Ties keep the earliest file in registry order.
/// Wheels with unparseable filenames are still eligible, ranked lowest.
pub fn select_wheel(files: &[ReleaseFile]) -> Option<WheelFile> {
    let mut best: Option<(u32, &ReleaseFile)> = None;
    for file in files.iter().filter(|f| f.is_wheel() && !f.yanked) {
        let score = WheelTags::from_filename(&file.filename)
            .map(|tags| tags.portability())
            .unwrap_or(0);
        if best.is_none_or(|(best_score, _)| score > best_score) {
            best = Some((score, file));
        }
    }
    best.map(|(_, file)| WheelFile {
        filename: file.filename.clone(),
        url: file.url.clone(),
    })
}
