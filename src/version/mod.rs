// src/version/mod.rs

//! Version selection for Python packages
//!
//! Parsing and ordering of public version identifiers and specifier sets come
//! from `pep440_rs`. This module adds what the resolver needs on top: lenient
//! validity checks for registry release keys and picking the greatest
//! satisfying release with the usual pre-release rule.

use crate::error::{Error, Result};
use std::str::FromStr;

pub use pep440_rs::{Operator, Version, VersionSpecifier, VersionSpecifiers};

/// Parse a version identifier such as `1.24.0` or `1!2.0rc1.post3`
pub fn parse_version(s: &str) -> Result<Version> {
    Version::from_str(s.trim())
        .map_err(|e| Error::ParseError(format!("Invalid version '{}': {}", s, e)))
}

/// Parse a comma-separated specifier set such as `>=1.21.1,<3`
///
/// An empty string is rejected; callers model "any version" as no
/// specifier set at all.
pub fn parse_specifiers(s: &str) -> Result<VersionSpecifiers> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(Error::ParseError("Empty version constraint".to_string()));
    }
    let clauses = trimmed.split(',').map(str::trim).collect::<Vec<_>>().join(",");
    VersionSpecifiers::from_str(&clauses)
        .map_err(|e| Error::ParseError(format!("Invalid version constraint '{}': {}", s, e)))
}

/// Check if a string is a valid version identifier
pub fn is_valid_version(s: &str) -> bool {
    parse_version(s).is_ok()
}

/// Render a specifier set as compact constraint text (`>=1.0,<2`)
pub fn constraint_text(specifiers: &VersionSpecifiers) -> String {
    specifiers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// True when some clause of the set itself names a pre-release
pub fn names_prerelease(specifiers: &VersionSpecifiers) -> bool {
    specifiers.iter().any(|clause| clause.version().any_prerelease())
}

/// Pick the greatest candidate satisfying `specifiers`
///
/// Candidates that are not valid versions are skipped. Pre-releases are only
/// considered when the constraint names one, or when no final release
/// satisfies it. Returns the candidate string as given, so callers can index
/// registry data with it.
pub fn max_satisfying<'a, I>(candidates: I, specifiers: &VersionSpecifiers) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let allow_pre = names_prerelease(specifiers);
    let mut best_final: Option<(Version, &'a str)> = None;
    let mut best_pre: Option<(Version, &'a str)> = None;

    for raw in candidates {
        let Ok(version) = parse_version(raw) else {
            continue;
        };
        if !specifiers.contains(&version) {
            continue;
        }
        let slot = if version.any_prerelease() && !allow_pre {
            &mut best_pre
        } else {
            &mut best_final
        };
        if slot.as_ref().is_none_or(|(best, _)| version > *best) {
            *slot = Some((version, raw));
        }
    }

    best_final.or(best_pre).map(|(_, raw)| raw)
}
