use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::router::EventRouter;
use crate::buffer::CoalescingBuffer;
use crate::core::{AttemptOutcome, RetryController, Step, evaluate_throughput};
use crate::data::{DEFAULT_BUFFER_CAPACITY, DownloadReport, FetchOptions, FetchPhase, Progress};
use crate::error::{DownloadError, Result, StorageFault, TransportError};
use crate::net::Transport;
use crate::quota::QuotaGuard;
use crate::storage::{Storage, StorageHandle};

/// Result of one attempt, before the retry policy looks at it.
struct AttemptResult {
    transport:     std::result::Result<(), TransportError>,
    fault:         Option<StorageFault>,
    bytes_written: u64,
    elapsed:       Duration,
}

impl AttemptResult {
    fn faulted(fault: StorageFault) -> Self {
        Self {
            transport:     Ok(()),
            fault:         Some(fault),
            bytes_written: 0,
            elapsed:       Duration::ZERO,
        }
    }
}

/// Downloads one resource at a time into storage through an `N`-byte write buffer.
///
/// The buffer is allocated once and reused by every attempt of every download. `download`
/// takes `&mut self`, so one downloader never runs two transfers at once.
///
/// # Examples
///
/// ```no_run
/// use spool_fetch::{Downloader, FetchOptions, LocalStorage, ReqwestTransport, TransportOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = ReqwestTransport::new(&TransportOptions::default())?;
/// let mut downloader = Downloader::new(transport, LocalStorage::new())
///     .with_options(FetchOptions::default().max_attempts(5));
///
/// let report = downloader
///     .download("https://example.com/firmware.bin", "/data/firmware.bin")
///     .await?;
/// println!("{} bytes at {:.2} KiB/s", report.bytes_written, report.kib_per_sec());
/// # Ok(())
/// # }
/// ```
pub struct Downloader<T: Transport, S: Storage, const N: usize = DEFAULT_BUFFER_CAPACITY> {
    transport: T,
    storage:   S,
    options:   FetchOptions,
    buffer:    CoalescingBuffer<N>,
}

impl<T: Transport, S: Storage> Downloader<T, S> {
    /// Create a downloader with the default write buffer capacity.
    pub fn new(transport: T, storage: S) -> Self { Self::with_buffer(transport, storage) }
}

impl<T: Transport, S: Storage, const N: usize> Downloader<T, S, N> {
    /// Create a downloader with an `N`-byte write buffer.
    pub fn with_buffer(transport: T, storage: S) -> Self {
        Self {
            transport,
            storage,
            options: FetchOptions::default(),
            buffer: CoalescingBuffer::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &FetchOptions { &self.options }

    /// Fetch `source_uri` into `destination_path`, retrying transport failures.
    ///
    /// Every attempt starts from a freshly created destination. Storage faults end the
    /// download at once; transport failures are retried with exponential backoff until
    /// the attempt budget is spent.
    pub async fn download(
        &mut self,
        source_uri: &str,
        destination_path: impl AsRef<Path>,
    ) -> Result<DownloadReport> {
        let destination = destination_path.as_ref();
        let mut retry = RetryController::new(self.options.max_attempts, self.options.retry_backoff);

        loop {
            let attempt = retry.attempts();
            info!(
                attempt,
                max_attempts = retry.max_attempts(),
                url = source_uri,
                "starting download attempt"
            );
            self.options.report(Progress::new(FetchPhase::Connecting, attempt, 0));

            let AttemptResult { transport, fault, bytes_written, elapsed } =
                self.run_attempt(source_uri, destination, attempt).await;

            let outcome = AttemptOutcome::classify(transport.is_ok(), fault.is_some());
            if let Step::Retry { attempt: next, delay } = retry.advance(outcome) {
                if let Err(ref e) = transport {
                    warn!(attempt, error = %e, "download attempt failed");
                }
                warn!(
                    next_attempt = next,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after backoff"
                );
                self.options.report(Progress::backing_off(attempt, delay));
                tokio::time::sleep(delay).await;
                continue;
            }

            return match (fault, transport) {
                (Some(fault), _) => {
                    error!(attempt, %fault, "aborting due to storage fault");
                    self.options.report(Progress::new(FetchPhase::Failed, attempt, bytes_written));
                    Err(DownloadError::Storage(fault))
                }
                (None, Err(last)) => {
                    error!(
                        attempts = attempt,
                        error = %last,
                        "download failed, retry budget exhausted"
                    );
                    self.options.report(Progress::new(FetchPhase::Failed, attempt, bytes_written));
                    Err(DownloadError::RetryBudgetExhausted {
                        attempts: attempt,
                        last,
                    })
                }
                (None, Ok(())) => Ok(self.complete(attempt, bytes_written, elapsed)),
            };
        }
    }

    async fn run_attempt(&mut self, url: &str, destination: &Path, attempt: u32) -> AttemptResult {
        if let Err(source) = self.storage.remove(destination) {
            return AttemptResult::faulted(StorageFault::Remove {
                path: destination.to_path_buf(),
                source,
            });
        }

        let mut handle = match self.storage.create(destination) {
            Ok(handle) => handle,
            Err(source) => {
                return AttemptResult::faulted(StorageFault::Open {
                    path: destination.to_path_buf(),
                    source,
                });
            }
        };

        self.buffer.reset();
        let started = Instant::now();

        let mut router = EventRouter::new(
            &mut self.buffer,
            &mut handle,
            QuotaGuard::new(&self.storage, destination),
            &self.options,
            attempt,
        );
        let transport = self.transport.perform(url, &mut router).await;
        let mut fault = router.finish();
        let elapsed = started.elapsed();

        if let Err(e) = handle.close() {
            match fault {
                None => fault = Some(StorageFault::Close(e)),
                Some(_) => debug!(error = %e, "close failed after earlier storage fault"),
            }
        }

        AttemptResult {
            transport,
            fault,
            bytes_written: self.buffer.bytes_written(),
            elapsed,
        }
    }

    fn complete(&self, attempts: u32, bytes_written: u64, elapsed: Duration) -> DownloadReport {
        let throughput =
            evaluate_throughput(bytes_written, elapsed, self.options.min_throughput_bps);
        let kib_per_sec = throughput.bytes_per_sec / 1024.0;

        info!(
            bytes = bytes_written,
            elapsed_secs = elapsed.as_secs_f64(),
            kib_per_sec,
            "downloaded"
        );
        if throughput.below_target {
            warn!(
                kib_per_sec,
                min_kib_per_sec = self.options.min_throughput_bps / 1024,
                "download speed below minimum throughput"
            );
        }
        info!(bytes = bytes_written, attempts, "download complete");

        self.options.report(Progress::new(FetchPhase::Completed, attempts, bytes_written));

        DownloadReport {
            bytes_written,
            elapsed,
            bytes_per_sec: throughput.bytes_per_sec,
            below_min_throughput: throughput.below_target,
            attempts,
        }
    }
}
