use std::fmt;
use std::time::Duration;

/// Phases of a download operation.
///
/// An attempt moves Connecting → Downloading. A retryable failure passes through
/// BackingOff into the next attempt's Connecting; the operation ends in Completed or
/// Failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Attempt started, destination recreated, request in flight.
    #[default]
    Connecting,

    /// Body bytes are being flushed to storage.
    Downloading,

    /// Attempt failed with a transport error; waiting before the next one.
    BackingOff,

    /// The destination holds the complete body.
    Completed,

    /// Terminal failure.
    Failed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::BackingOff => write!(f, "BackingOff"),
            FetchPhase::Completed => write!(f, "Completed"),
            FetchPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Snapshot passed to the progress callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Current attempt, 1-indexed.
    pub attempt: u32,

    /// Bytes the storage has acknowledged during this attempt.
    pub bytes_written: u64,

    /// Delay before the next attempt. Only set in [`FetchPhase::BackingOff`].
    pub backoff: Option<Duration>,
}

impl Progress {
    pub(crate) fn new(phase: FetchPhase, attempt: u32, bytes_written: u64) -> Self {
        Self {
            phase,
            attempt,
            bytes_written,
            backoff: None,
        }
    }

    pub(crate) fn backing_off(attempt: u32, delay: Duration) -> Self {
        Self {
            phase: FetchPhase::BackingOff,
            attempt,
            bytes_written: 0,
            backoff: Some(delay),
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool { self.phase == FetchPhase::Completed }

    /// Returns `true` once the first attempt has failed.
    #[must_use]
    pub fn is_retrying(&self) -> bool { self.attempt > 1 || self.phase == FetchPhase::BackingOff }
}

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadReport {
    /// Bytes durably written to the destination.
    pub bytes_written: u64,

    /// Time from the start of the successful attempt to its final flush.
    pub elapsed: Duration,

    pub bytes_per_sec: f64,

    /// The transfer finished below the configured throughput floor. Advisory only.
    pub below_min_throughput: bool,

    /// Attempts used, the successful one included.
    pub attempts: u32,
}

impl DownloadReport {
    /// Throughput in KiB/s, the unit used in log lines.
    #[must_use]
    pub fn kib_per_sec(&self) -> f64 { self.bytes_per_sec / 1024.0 }
}
