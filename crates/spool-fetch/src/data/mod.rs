//! Immutable data types for download operations.
//!
//! Configuration constants and options, progress snapshots handed to callbacks, and the
//! report returned by a successful download.

pub mod options;
pub mod progress;

pub use options::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MIN_THROUGHPUT_BPS, DEFAULT_READ_TIMEOUT, DEFAULT_RETRY_BACKOFF,
    DEFAULT_RX_CHUNK_SIZE, FetchOptions, TransportOptions,
};
pub use progress::{DownloadReport, FetchPhase, Progress};
