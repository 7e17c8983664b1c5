use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::progress::Progress;

/// Attempts made before a download gives up on transport failures.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Throughput below which a completed download logs an advisory (400 KiB/s).
pub const DEFAULT_MIN_THROUGHPUT_BPS: u64 = 400 * 1024;

/// Longest the transport waits for a single network read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(5000);

/// Longest the transport waits to establish a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Base delay of the exponential backoff between attempts.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(1000);

/// Size of the RAM buffer that coalesces chunks into storage writes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 32 * 1024;

/// Largest body chunk the transport hands to the event handler at once.
pub const DEFAULT_RX_CHUNK_SIZE: usize = 32 * 1024;

/// Retry and reporting policy of a [`Downloader`](crate::Downloader).
///
/// # Examples
///
/// ```
/// use spool_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_attempts(5)
///     .retry_backoff(Duration::from_millis(200))
///     .min_throughput_bps(64 * 1024);
/// assert_eq!(options.max_attempts, 5);
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Total attempts, the first one included. Never less than 1.
    ///
    /// Only transport failures consume attempts; a storage fault ends the download
    /// immediately.
    ///
    /// Default: 3
    pub max_attempts: u32,

    /// Base delay for exponential backoff between attempts.
    ///
    /// The delay observed after failed attempt N is `retry_backoff * 2^(N-1)`.
    ///
    /// Default: 1s
    pub retry_backoff: Duration,

    /// Advisory throughput floor in bytes per second.
    ///
    /// A slower download still succeeds; the report flags it and a warning is logged.
    ///
    /// Default: 400 KiB/s
    pub min_throughput_bps: u64,

    /// Progress callback.
    ///
    /// The callback is invoked:
    /// - When an attempt starts (Connecting)
    /// - After each flush to storage (Downloading)
    /// - Before sleeping between attempts (BackingOff)
    /// - Once on the terminal outcome (Completed or Failed)
    ///
    /// Default: None
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff", &self.retry_backoff)
            .field("min_throughput_bps", &self.min_throughput_bps)
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_attempts:       DEFAULT_MAX_ATTEMPTS,
            retry_backoff:      DEFAULT_RETRY_BACKOFF,
            min_throughput_bps: DEFAULT_MIN_THROUGHPUT_BPS,
            on_progress:        None,
        }
    }
}

impl FetchOptions {
    /// Set the attempt budget. Zero is treated as one.
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn min_throughput_bps(mut self, min_throughput_bps: u64) -> Self {
        self.min_throughput_bps = min_throughput_bps;
        self
    }

    /// Set the progress callback.
    ///
    /// # Examples
    ///
    /// ```
    /// use spool_fetch::{FetchOptions, FetchPhase};
    /// use std::sync::Arc;
    ///
    /// let options = FetchOptions::default().on_progress(Arc::new(|progress| {
    ///     if let FetchPhase::BackingOff = progress.phase {
    ///         println!("retrying in {:?}", progress.backoff);
    ///     }
    /// }));
    /// ```
    #[must_use]
    pub fn on_progress(mut self, on_progress: Arc<dyn Fn(&Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub(crate) fn report(&self, progress: Progress) {
        if let Some(ref callback) = self.on_progress {
            callback(&progress);
        }
    }
}

/// Connection settings of the HTTPS transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Per-read timeout. An expired read fails the attempt as a timeout.
    pub read_timeout: Duration,

    pub connect_timeout: Duration,

    /// Upper bound on the size of a single `Data` event.
    pub rx_chunk_size: usize,

    /// PEM bundle of extra trust anchors, consulted on every connection in addition to the
    /// platform roots.
    pub ca_bundle: Option<PathBuf>,

    /// Reject locators that would not use an encrypted transport.
    pub https_only: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            read_timeout:    DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            rx_chunk_size:   DEFAULT_RX_CHUNK_SIZE,
            ca_bundle:       None,
            https_only:      true,
        }
    }
}

impl TransportOptions {
    #[must_use]
    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Set the largest chunk delivered per event. Zero is treated as one byte.
    #[must_use]
    pub fn rx_chunk_size(mut self, rx_chunk_size: usize) -> Self {
        self.rx_chunk_size = rx_chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn ca_bundle(mut self, ca_bundle: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(ca_bundle.into());
        self
    }

    #[must_use]
    pub fn https_only(mut self, https_only: bool) -> Self {
        self.https_only = https_only;
        self
    }
}
