//! Persistent storage abstraction.
//!
//! A [`Storage`] opens one exclusively owned [`StorageHandle`] per attempt and answers
//! capacity queries for the quota guard. [`LocalStorage`] is the filesystem
//! implementation; tests substitute in-memory doubles.

mod local;

use std::io;
use std::path::Path;

pub use local::{LocalFile, LocalStorage};

/// Size of the volume holding a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capacity {
    pub total: u64,
    pub used:  u64,
}

impl Capacity {
    pub fn free(&self) -> u64 { self.total.saturating_sub(self.used) }
}

/// Write side of one attempt's destination.
pub trait StorageHandle: Send {
    /// Write `buf` and return how many bytes reached storage.
    ///
    /// Returning fewer than `buf.len()` bytes is allowed and means the write faulted
    /// part-way; callers do not retry the remainder.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Make written data durable and release the handle.
    fn close(self) -> io::Result<()>
    where
        Self: Sized;
}

/// Destination namespace of downloads.
pub trait Storage: Send + Sync {
    type Handle: StorageHandle;

    /// Delete `path`. A missing file is not an error.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Create `path` for writing, truncating any existing content.
    fn create(&self, path: &Path) -> io::Result<Self::Handle>;

    /// Capacity of the volume that holds `path`.
    fn capacity(&self, path: &Path) -> io::Result<Capacity>;
}

impl<S: Storage> Storage for &S {
    type Handle = S::Handle;

    fn remove(&self, path: &Path) -> io::Result<()> { (**self).remove(path) }

    fn create(&self, path: &Path) -> io::Result<Self::Handle> { (**self).create(path) }

    fn capacity(&self, path: &Path) -> io::Result<Capacity> { (**self).capacity(path) }
}
