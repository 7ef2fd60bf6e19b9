//! Error types for the agent.
//!
//! Only [`ConfigError`] is fatal (at startup). Everything else is scoped
//! to a single cycle or a single artifact write.

use std::path::PathBuf;

use snowcheck_core::error::CoreError;

/// Invalid or missing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Snapshot fetch or hub report failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network, DNS, TLS or timeout failure.
    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Remote returned a non-2xx status code.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The digest challenge was missing or could not be answered.
    #[error("Digest authentication with {url} failed: {reason}")]
    DigestAuth { url: String, reason: String },
}

impl TransportError {
    pub(crate) fn request(url: &str, source: reqwest::Error) -> Self {
        Self::Request {
            url: url.to_string(),
            source,
        }
    }

    /// HTTP status code, when the failure came from the remote side.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A debug artifact could not be persisted.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Encode(#[from] CoreError),
}

/// Anything that aborts a detection cycle before a decision is reached.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
