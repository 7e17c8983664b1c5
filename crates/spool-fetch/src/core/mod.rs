//! Pure logic of a download: backoff arithmetic, the retry state machine and throughput
//! evaluation. Nothing in here performs I/O or reads a clock.

mod retry;
mod throughput;

pub use retry::{AttemptOutcome, DownloadState, RetryController, Step, retry_delay};
pub use throughput::{Throughput, evaluate_throughput};
