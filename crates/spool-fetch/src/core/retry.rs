use std::time::Duration;

/// Calculate the delay before a retry using exponential backoff.
///
/// The delay formula is: `base * 2^retry_count`
///
/// # Arguments
///
/// * `retry_count` - The retry number, 0-indexed (0 = the retry after the first failure)
/// * `base` - The base delay duration
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use spool_fetch::retry_delay;
///
/// assert_eq!(retry_delay(0, Duration::from_millis(1000)), Duration::from_millis(1000));
/// assert_eq!(retry_delay(1, Duration::from_millis(1000)), Duration::from_millis(2000));
/// assert_eq!(retry_delay(2, Duration::from_millis(1000)), Duration::from_millis(4000));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_count);
    base.saturating_mul(multiplier)
}

/// How a single attempt ended, as far as the retry policy is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Transport finished and storage recorded no fault.
    Success,
    /// Transport failed and storage recorded no fault.
    TransportFailed,
    /// Storage recorded a fault, whatever the transport reported.
    StorageFault,
}

impl AttemptOutcome {
    /// Classify an attempt. A storage fault dominates the transport status.
    pub fn classify(transport_ok: bool, storage_fault: bool) -> Self {
        match (transport_ok, storage_fault) {
            (_, true) => AttemptOutcome::StorageFault,
            (true, false) => AttemptOutcome::Success,
            (false, false) => AttemptOutcome::TransportFailed,
        }
    }
}

/// State of one logical download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Attempt `n` (1-indexed) is running or about to run.
    Attempting(u32),
    Succeeded,
    FailedFatal,
    FailedExhausted,
}

impl DownloadState {
    pub fn is_terminal(&self) -> bool { !matches!(self, DownloadState::Attempting(_)) }
}

/// What the caller should do after reporting an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Wait `delay`, then run attempt `attempt`.
    Retry { attempt: u32, delay: Duration },
    /// The request reached a terminal state.
    Done(DownloadState),
}

/// Bounded retry state machine with exponential backoff.
///
/// ```
/// use std::time::Duration;
/// use spool_fetch::{AttemptOutcome, DownloadState, RetryController, Step};
///
/// let mut retry = RetryController::new(3, Duration::from_millis(1000));
/// assert_eq!(
///     retry.advance(AttemptOutcome::TransportFailed),
///     Step::Retry { attempt: 2, delay: Duration::from_millis(1000) }
/// );
/// assert_eq!(
///     retry.advance(AttemptOutcome::Success),
///     Step::Done(DownloadState::Succeeded)
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RetryController {
    max_attempts: u32,
    base_delay:   Duration,
    state:        DownloadState,
    finished_at:  u32,
}

impl RetryController {
    /// Start at attempt 1. `max_attempts` of zero is treated as one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            state: DownloadState::Attempting(1),
            finished_at: 0,
        }
    }

    pub fn state(&self) -> DownloadState { self.state }

    pub fn max_attempts(&self) -> u32 { self.max_attempts }

    /// Attempts started so far.
    pub fn attempts(&self) -> u32 {
        match self.state {
            DownloadState::Attempting(n) => n,
            _ => self.finished_at,
        }
    }

    /// Feed the outcome of the current attempt. Terminal states absorb further outcomes.
    pub fn advance(&mut self, outcome: AttemptOutcome) -> Step {
        let DownloadState::Attempting(n) = self.state else {
            return Step::Done(self.state);
        };

        let next = match outcome {
            AttemptOutcome::Success => DownloadState::Succeeded,
            AttemptOutcome::StorageFault => DownloadState::FailedFatal,
            AttemptOutcome::TransportFailed if n >= self.max_attempts => {
                DownloadState::FailedExhausted
            }
            AttemptOutcome::TransportFailed => {
                self.state = DownloadState::Attempting(n + 1);
                return Step::Retry {
                    attempt: n + 1,
                    delay:   retry_delay(n - 1, self.base_delay),
                };
            }
        };

        self.finished_at = n;
        self.state = next;
        Step::Done(next)
    }
}
