// src/error.rs

//! Error types for wheelhouse
//!
//! Per-package failures (network errors, missing wheels, bad version strings)
//! are absorbed inside the resolver and never reach this type. `Error` is for
//! failures that make a whole batch unusable.

use thiserror::Error;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem failure (artifact directory, manifest output)
    #[error("I/O error: {0}")]
    IoError(String),

    /// Registry lookup or wheel transfer failed
    #[error("Download error: {0}")]
    DownloadError(String),

    /// Malformed version, specifier, requirement or registry document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Package or release not present in the registry
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// A component could not be set up (HTTP client, thread pool)
    #[error("Initialization error: {0}")]
    InitError(String),

    /// Invalid configuration file or option
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Install script template failed to register or render
    #[error("Template error: {0}")]
    TemplateError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}

/// Result type alias using wheelhouse's Error type
pub type Result<T> = std::result::Result<T, Error>;
