//! Resilient HTTPS downloading into bounded memory.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Configuration constants, options, progress and report types
//! - [`core`] - Pure logic: backoff, the retry state machine, throughput evaluation
//! - I/O edges behind traits: [`Transport`] for the network, [`Storage`] for the destination
//!
//! # Pipeline
//!
//! [`Downloader::download`] runs up to `max_attempts` attempts. Each attempt recreates the
//! destination, feeds transport events through an event router into a fixed-size
//! [`CoalescingBuffer`], checks free space with a [`QuotaGuard`] before every chunk, and
//! flushes the tail when the stream finishes.
//!
//! - **Bounded memory**: one `N`-byte buffer, chosen at compile time and reused by every attempt
//! - **Fail fast on storage**: short writes and full volumes end the download without retrying
//! - **Backoff**: transport failures are retried after `base * 2^(n-1)`
//! - **Advisory throughput**: slow transfers succeed, flagged in the [`DownloadReport`]

mod buffer;
pub mod core;
pub mod data;
mod error;
mod fetch;
mod net;
mod quota;
mod storage;

pub use buffer::CoalescingBuffer;
pub use self::core::{
    AttemptOutcome, DownloadState, RetryController, Step, Throughput, evaluate_throughput,
    retry_delay,
};
pub use data::{DownloadReport, FetchOptions, FetchPhase, Progress, TransportOptions};
pub use error::{DownloadError, Result, StorageFault, TransportError};
pub use fetch::Downloader;
#[cfg(feature = "reqwest")]
pub use net::ReqwestTransport;
pub use net::{EventHandler, Transport, TransportEvent};
pub use quota::QuotaGuard;
pub use storage::{Capacity, LocalFile, LocalStorage, Storage, StorageHandle};
