use tracing::{debug, error, info, warn};

use crate::buffer::CoalescingBuffer;
use crate::data::{FetchOptions, FetchPhase, Progress};
use crate::error::StorageFault;
use crate::net::{EventHandler, TransportEvent};
use crate::quota::QuotaGuard;
use crate::storage::Storage;

/// Bridges transport events of one attempt into buffered storage writes.
///
/// Holds the attempt's mutable state by reference for the duration of a single
/// `perform` call. The first storage fault is kept and every later chunk is dropped.
pub(crate) struct EventRouter<'a, S: Storage, const N: usize> {
    buffer:  &'a mut CoalescingBuffer<N>,
    handle:  &'a mut S::Handle,
    guard:   QuotaGuard<'a, S>,
    options: &'a FetchOptions,
    attempt: u32,
    fault:   Option<StorageFault>,
}

impl<'a, S: Storage, const N: usize> EventRouter<'a, S, N> {
    pub(crate) fn new(
        buffer: &'a mut CoalescingBuffer<N>,
        handle: &'a mut S::Handle,
        guard: QuotaGuard<'a, S>,
        options: &'a FetchOptions,
        attempt: u32,
    ) -> Self {
        Self {
            buffer,
            handle,
            guard,
            options,
            attempt,
            fault: None,
        }
    }

    /// Flush whatever is still buffered and hand back the attempt's storage fault, if any.
    pub(crate) fn finish(mut self) -> Option<StorageFault> {
        self.flush();
        self.fault
    }

    fn on_data(&mut self, chunk: &[u8]) {
        if chunk.is_empty() || self.fault.is_some() {
            return;
        }

        if let Err(fault) = self.guard.admit(chunk.len() as u64) {
            error!(%fault, "out of storage space, aborting");
            self.buffer.mark_faulted();
            self.fault = Some(fault);
            return;
        }

        let flushes = self.buffer.flushes();
        let result = self.buffer.append(chunk, &mut *self.handle);
        self.settle(result, flushes);
    }

    fn flush(&mut self) {
        let flushes = self.buffer.flushes();
        let result = self.buffer.flush(&mut *self.handle);
        self.settle(result, flushes);
    }

    fn settle(&mut self, result: Result<(), StorageFault>, flushes_before: u64) {
        if let Err(fault) = result {
            error!(%fault, "storage write error");
            self.fault.get_or_insert(fault);
        } else if self.buffer.flushes() != flushes_before {
            self.options.report(Progress::new(
                FetchPhase::Downloading,
                self.attempt,
                self.buffer.bytes_written(),
            ));
        }
    }
}

impl<S: Storage, const N: usize> EventHandler for EventRouter<'_, S, N> {
    fn on_event(&mut self, event: TransportEvent<'_>) {
        match event {
            TransportEvent::Data(chunk) => self.on_data(chunk),
            TransportEvent::Finished => {
                info!("stream finished");
                self.flush();
            }
            TransportEvent::Connected => info!("connected"),
            TransportEvent::HeaderSent => debug!("request headers sent"),
            TransportEvent::Header { key, value } => debug!(key, value, "response header"),
            TransportEvent::Redirect(location) => warn!(location, "redirected"),
            TransportEvent::Error(message) => error!(error = message, "transport error"),
            TransportEvent::Disconnected => warn!("disconnected"),
        }
    }
}
