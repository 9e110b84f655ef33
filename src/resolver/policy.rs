// src/resolver/policy.rs

//! Traversal policy for the dependency walk
//!
//! The walk is deliberately shallow: a root and its direct dependencies, plus
//! special handling for a set of "critical" packages (native extensions and
//! build tooling that are painful to be missing offline).

use crate::requirement::normalize_name;
use std::collections::HashSet;

/// Packages always included in a resolution
pub const DEFAULT_CRITICAL_PACKAGES: [&str; 12] = [
    "numpy",
    "pandas",
    "cryptography",
    "pillow",
    "scipy",
    "torch",
    "tensorflow",
    "cffi",
    "pyopenssl",
    "lxml",
    "pycryptodome",
    "grpcio",
];

/// Ordered set of critical package names, matched after name normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalSet {
    /// Normalized names in configured order, without duplicates
    names: Vec<String>,
    index: HashSet<String>,
}

impl CriticalSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self {
            names: Vec::new(),
            index: HashSet::new(),
        };
        for name in names {
            let name = normalize_name(name.as_ref());
            if !name.is_empty() && set.index.insert(name.clone()) {
                set.names.push(name);
            }
        }
        set
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty::<&str>())
    }

    /// Inclusion predicate: is this package always pulled in?
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(&normalize_name(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for CriticalSet {
    fn default() -> Self {
        Self::new(DEFAULT_CRITICAL_PACKAGES)
    }
}

/// How far and how the walker expands critical packages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalPolicy {
    pub critical: CriticalSet,
    /// Dependency levels walked below a critical direct dependency,
    /// each fetched at its latest version; 0 disables the expansion
    pub critical_depth: usize,
    /// Leave critical packages out of the per-root walk entirely
    pub skip_critical_direct: bool,
    /// Append every critical package at its latest version after all roots
    pub force_include_critical: bool,
}

impl Default for TraversalPolicy {
    fn default() -> Self {
        Self {
            critical: CriticalSet::default(),
            critical_depth: 1,
            skip_critical_direct: false,
            force_include_critical: true,
        }
    }
}
