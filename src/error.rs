//! Error types for iptv-scan.
//!
//! Uses `thiserror` for ergonomic error definitions.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scanning operations.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("{url} redirected to HTTPS, connection dropped")]
    RedirectToHttps { url: String },

    #[error("{url} exceeded the redirect limit")]
    TooManyRedirects { url: String },

    #[error("{url} answered with status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL template expansion failed: {0}")]
    Template(#[from] crate::template::TemplateError),

    #[error("invalid target: {0}")]
    Target(#[from] crate::types::TargetError),

    #[error("worker pool is closed")]
    PoolClosed,
}

impl ScanError {
    /// Whether this error must abort the whole run rather than one target.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Template(_) | Self::PoolClosed)
    }
}

/// Errors raised while loading or validating settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not locate a configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error(transparent)]
    Port(#[from] crate::types::PortError),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
