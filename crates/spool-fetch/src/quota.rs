//! Free-space check performed before each inbound chunk is buffered.

use std::path::Path;

use crate::error::StorageFault;
use crate::storage::Storage;

/// Rejects chunks larger than the free space on the destination's volume.
///
/// The comparison uses the inbound chunk size, not the amount that would be written by the
/// next flush. It can reject slightly early, but check and write never race.
pub struct QuotaGuard<'a, S: Storage + ?Sized> {
    storage:     &'a S,
    destination: &'a Path,
}

impl<'a, S: Storage + ?Sized> QuotaGuard<'a, S> {
    pub fn new(storage: &'a S, destination: &'a Path) -> Self {
        Self {
            storage,
            destination,
        }
    }

    /// Returns `false` when free space is smaller than `pending_bytes`.
    pub fn check_capacity(&self, pending_bytes: u64) -> bool { self.admit(pending_bytes).is_ok() }

    /// Like [`check_capacity`](Self::check_capacity), with the shortfall as the error.
    ///
    /// When capacity cannot be queried the chunk is admitted; a real write failure will
    /// still surface through the buffer.
    pub fn admit(&self, pending_bytes: u64) -> Result<(), StorageFault> {
        match self.storage.capacity(self.destination) {
            Ok(capacity) if capacity.free() < pending_bytes => Err(StorageFault::QuotaExceeded {
                free:   capacity.free(),
                needed: pending_bytes,
            }),
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::debug!(error = %e, "capacity query failed, admitting chunk");
                Ok(())
            }
        }
    }
}
