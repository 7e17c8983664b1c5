//! Error types for spool-fetch.
//!
//! Failures fall into two classes. [`TransportError`] covers everything the network
//! layer can report and is always retried until the attempt budget runs out.
//! [`StorageFault`] covers the destination side and is never retried: another attempt
//! against the same full or failing volume cannot succeed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport) for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("server responded with HTTP status {0}")]
    Status(u16),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Failure on the destination side of a download.
#[derive(Debug, Error)]
pub enum StorageFault {
    #[error("failed to open {path} for writing: {source}")]
    Open {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove previous {path}: {source}")]
    Remove {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("storage write failed: {0}")]
    Write(#[source] io::Error),

    #[error("short write: {written} of {requested} bytes reached storage")]
    ShortWrite { requested: usize, written: usize },

    #[error("insufficient storage: {needed} bytes needed, {free} bytes free")]
    QuotaExceeded { free: u64, needed: u64 },

    #[error("failed to close destination: {0}")]
    Close(#[source] io::Error),
}

/// Terminal error of [`Downloader::download`](crate::Downloader::download).
///
/// Per-attempt transport failures are absorbed by the retry loop; callers only see the
/// final outcome.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Storage(#[from] StorageFault),

    #[error("download failed after {attempts} attempts: {last}")]
    RetryBudgetExhausted {
        attempts: u32,
        #[source]
        last:     TransportError,
    },
}

impl DownloadError {
    /// Returns `true` if the download stopped because the volume ran out of space.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, DownloadError::Storage(StorageFault::QuotaExceeded { .. }))
    }

    /// Returns `true` for any destination-side failure, quota exhaustion included.
    pub fn is_storage(&self) -> bool { matches!(self, DownloadError::Storage(_)) }
}

pub type Result<T> = std::result::Result<T, DownloadError>;
