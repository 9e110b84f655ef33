// src/requirement.rs

//! Package request and dependency requirement parsing
//!
//! Two kinds of strings come through here:
//! - user requests such as `numpy==1.24.0` or `requests>=2.28`, parsed
//!   leniently by [`parse_entry`] (it never fails)
//! - declared dependencies from registry metadata such as
//!   `PySocks!=1.5.7,>=1.5.6; extra == "socks"`, parsed by [`Requirement::parse`]

use crate::error::{Error, Result};
use pep508_rs::{MarkerTree, MarkerValue, Requirement as Pep508Requirement, VersionOrUrl};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Operators that mark a request as carrying a range constraint
const RANGE_OPERATORS: [&str; 4] = [">=", "<=", "~=", "!="];

/// A user package request split into name and constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageRequest {
    pub name: String,
    /// Normalized constraint expression; `None` means "latest"
    pub constraint: Option<String>,
}

impl PackageRequest {
    pub fn new(name: impl Into<String>, constraint: Option<String>) -> Self {
        Self {
            name: name.into(),
            constraint,
        }
    }

    /// Normalized lookup name
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

impl fmt::Display for PackageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.constraint {
            Some(ref c) => write!(f, "{}{}", self.name, c),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Split a raw request string into name and constraint
///
/// - `name==1.2` splits once on the first `==` into an exact pin, returned as
///   the constraint `==1.2`
/// - strings with `>=`, `<=`, `~=` or `!=` are parsed as a full constraint
///   expression; a malformed expression degrades to a bare name
/// - anything else is a bare name
///
/// Never fails. Garbage in yields a best-effort request whose name the caller
/// can reject with [`is_valid_name`].
pub fn parse_entry(raw: &str) -> PackageRequest {
    let entry = raw.trim();

    let first_range = RANGE_OPERATORS
        .iter()
        .filter_map(|op| entry.find(op))
        .min();

    if let Some(eq_pos) = entry.find("==") {
        if first_range.is_none_or(|pos| eq_pos < pos) {
            let name = strip_extras(entry[..eq_pos].trim());
            let version = entry[eq_pos + 2..].trim();
            if name.is_empty() || version.is_empty() {
                debug!("Request '{}' has an empty side around '=='", entry);
                return PackageRequest::new(entry, None);
            }
            return PackageRequest::new(name, Some(format!("=={}", version)));
        }
    }

    if first_range.is_some() {
        return match Requirement::parse(entry) {
            Ok(req) => PackageRequest::new(req.name, req.constraint),
            Err(e) => {
                debug!("Falling back to bare name for '{}': {}", entry, e);
                PackageRequest::new(entry, None)
            }
        };
    }

    PackageRequest::new(strip_extras(entry), None)
}

/// Normalize a project name for lookups, cache keys and deduplication
///
/// Lowercases and collapses each run of `-`, `_` and `.` into a single `-`,
/// so `Typing_Extensions`, `typing.extensions` and `typing-extensions` are
/// one project.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            pending_separator = true;
            continue;
        }
        if pending_separator && !out.is_empty() {
            out.push('-');
        }
        pending_separator = false;
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Check that a name could be a registry project name
///
/// Letters, digits, `.`, `_` and `-`, starting and ending alphanumeric.
pub fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) if first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric() => {
            bytes
                .iter()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
        }
        _ => false,
    }
}

fn strip_extras(name: &str) -> &str {
    match name.find('[') {
        Some(pos) => name[..pos].trim(),
        None => name,
    }
}

/// A declared dependency of a package
///
/// Parsed from PEP 508 strings such as `idna (<4,>=2.5)` or
/// `PySocks!=1.5.7,>=1.5.6; extra == "socks"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    /// Compact constraint text, `None` for "any version"
    pub constraint: Option<String>,
    pub marker: Option<String>,
    extra_only: bool,
}

impl Requirement {
    /// Parse a requirement string
    ///
    /// Direct URL references (`name @ https://...`) are rejected; they cannot
    /// be resolved against the registry.
    pub fn parse(s: &str) -> Result<Self> {
        let parsed = Pep508Requirement::from_str(s.trim())
            .map_err(|e| Error::ParseError(format!("Invalid requirement '{}': {}", s, e)))?;

        let constraint = match parsed.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(ref specifiers)) => {
                let text = specifiers
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                (!text.is_empty()).then_some(text)
            }
            Some(VersionOrUrl::Url(_)) => {
                return Err(Error::ParseError(format!(
                    "Direct URL requirement '{}' is not supported",
                    s
                )));
            }
            None => None,
        };

        Ok(Self {
            name: parsed.name.to_string(),
            extras: parsed.extras.clone().unwrap_or_default(),
            constraint,
            marker: parsed.marker.as_ref().map(ToString::to_string),
            extra_only: parsed.marker.as_ref().is_some_and(references_extra),
        })
    }

    /// True when the marker restricts this requirement to an optional extra
    pub fn is_extra_only(&self) -> bool {
        self.extra_only
    }
}

/// Whether any comparison in the marker tree involves `extra`
fn references_extra(tree: &MarkerTree) -> bool {
    match tree {
        MarkerTree::Expression(expr) => {
            matches!(expr.l_value, MarkerValue::Extra) || matches!(expr.r_value, MarkerValue::Extra)
        }
        MarkerTree::And(trees) | MarkerTree::Or(trees) => trees.iter().any(references_extra),
    }
}

/// Parse declared dependencies, dropping extra-only and unparseable entries
pub fn parse_requirements<'a, I>(raw: I) -> Vec<Requirement>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter()
        .filter_map(|line| match Requirement::parse(line) {
            Ok(req) if req.is_extra_only() => None,
            Ok(req) => Some(req),
            Err(e) => {
                debug!("Skipping requirement '{}': {}", line, e);
                None
            }
        })
        .collect()
}
