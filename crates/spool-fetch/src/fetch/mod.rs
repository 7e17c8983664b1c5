//! Download orchestration: the per-attempt event router and the retrying downloader.

mod downloader;
mod router;

pub use downloader::Downloader;
