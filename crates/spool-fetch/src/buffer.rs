//! Fixed-capacity RAM buffer that coalesces inbound chunks into fewer storage writes.

use crate::error::StorageFault;
use crate::storage::StorageHandle;

/// Write-coalescing buffer of `N` bytes.
///
/// Chunks are copied in until the buffer is full, which triggers a flush; the tail is
/// flushed when the stream completes. The first failed flush latches the buffer: every
/// later append or flush in the same attempt is a no-op until [`reset`](Self::reset).
pub struct CoalescingBuffer<const N: usize> {
    data:    Box<[u8; N]>,
    offset:  usize,
    written: u64,
    flushes: u64,
    faulted: bool,
}

impl<const N: usize> Default for CoalescingBuffer<N> {
    fn default() -> Self { Self::new() }
}

impl<const N: usize> CoalescingBuffer<N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        const { assert!(N > 0, "write buffer capacity must be non-zero") };
        Self {
            data:    Box::new([0; N]),
            offset:  0,
            written: 0,
            flushes: 0,
            faulted: false,
        }
    }

    /// Prepare for a new attempt: drop buffered bytes, zero counters, clear the fault latch.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.written = 0;
        self.flushes = 0;
        self.faulted = false;
    }

    /// Bytes currently held, not yet flushed.
    pub fn len(&self) -> usize { self.offset }

    pub fn is_empty(&self) -> bool { self.offset == 0 }

    /// Bytes storage has acknowledged since the last reset.
    pub fn bytes_written(&self) -> u64 { self.written }

    /// Storage writes issued since the last reset.
    pub fn flushes(&self) -> u64 { self.flushes }

    pub fn is_faulted(&self) -> bool { self.faulted }

    /// Stop accepting bytes for the rest of the attempt.
    pub fn mark_faulted(&mut self) { self.faulted = true; }

    /// Copy `chunk` in, flushing to `sink` each time the buffer fills.
    ///
    /// Ignored once the buffer is faulted.
    pub fn append<H>(&mut self, chunk: &[u8], sink: &mut H) -> Result<(), StorageFault>
    where
        H: StorageHandle + ?Sized,
    {
        let mut rest = chunk;
        while !rest.is_empty() && !self.faulted {
            let take = rest.len().min(N - self.offset);
            self.data[self.offset..self.offset + take].copy_from_slice(&rest[..take]);
            self.offset += take;
            rest = &rest[take..];

            if self.offset == N {
                self.flush(sink)?;
            }
        }
        Ok(())
    }

    /// Write the filled region to `sink` and empty the buffer.
    ///
    /// No-op when empty or faulted. The written counter advances by what storage reports,
    /// so a short write still counts the bytes that made it.
    pub fn flush<H>(&mut self, sink: &mut H) -> Result<(), StorageFault>
    where
        H: StorageHandle + ?Sized,
    {
        if self.offset == 0 || self.faulted {
            return Ok(());
        }

        let requested = self.offset;
        self.offset = 0;
        self.flushes += 1;

        match sink.write(&self.data[..requested]) {
            Ok(written) => {
                self.written += written as u64;
                if written < requested {
                    self.faulted = true;
                    return Err(StorageFault::ShortWrite { requested, written });
                }
                Ok(())
            }
            Err(e) => {
                self.faulted = true;
                Err(StorageFault::Write(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    /// Sink recording each write; optionally accepts only `limit` bytes per call.
    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<Vec<u8>>,
        limit:  Option<usize>,
        fail:   bool,
    }

    impl RecordingSink {
        fn contents(&self) -> Vec<u8> { self.writes.concat() }
    }

    impl StorageHandle for RecordingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail {
                return Err(io::Error::other("device error"));
            }
            let n = self.limit.map_or(buf.len(), |limit| limit.min(buf.len()));
            self.writes.push(buf[..n].to_vec());
            Ok(n)
        }

        fn close(self) -> io::Result<()> { Ok(()) }
    }

    #[test]
    fn four_byte_buffer_with_two_three_byte_chunks() {
        let mut buffer = CoalescingBuffer::<4>::new();
        let mut sink = RecordingSink::default();

        buffer.append(b"abc", &mut sink).unwrap();
        assert!(sink.writes.is_empty());

        buffer.append(b"def", &mut sink).unwrap();
        assert_eq!(sink.writes, vec![b"abcd".to_vec()]);
        assert_eq!(buffer.len(), 2);

        buffer.flush(&mut sink).unwrap();
        assert_eq!(sink.writes, vec![b"abcd".to_vec(), b"ef".to_vec()]);
        assert_eq!(buffer.bytes_written(), 6);
        assert_eq!(buffer.flushes(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn chunk_larger_than_capacity_is_split_in_order() {
        let mut buffer = CoalescingBuffer::<3>::new();
        let mut sink = RecordingSink::default();

        buffer.append(b"0123456", &mut sink).unwrap();
        assert_eq!(sink.writes, vec![b"012".to_vec(), b"345".to_vec()]);
        buffer.flush(&mut sink).unwrap();

        assert_eq!(sink.contents(), b"0123456");
        assert_eq!(buffer.bytes_written(), 7);
    }

    #[test]
    fn bytes_flushed_equal_bytes_appended_for_any_chunking() {
        let input: Vec<u8> = (0..=255).cycle().take(1000).collect();
        for split in [1, 2, 3, 7, 8, 9, 64, 999, 1000] {
            let mut buffer = CoalescingBuffer::<8>::new();
            let mut sink = RecordingSink::default();
            for chunk in input.chunks(split) {
                buffer.append(chunk, &mut sink).unwrap();
            }
            buffer.flush(&mut sink).unwrap();

            assert_eq!(sink.contents(), input, "split {split}");
            assert_eq!(buffer.bytes_written(), 1000);
            assert!(sink.writes.iter().all(|w| w.len() <= 8));
        }
    }

    #[test]
    fn flush_of_empty_buffer_is_noop() {
        let mut buffer = CoalescingBuffer::<4>::new();
        let mut sink = RecordingSink::default();
        buffer.flush(&mut sink).unwrap();
        assert!(sink.writes.is_empty());
        assert_eq!(buffer.flushes(), 0);
    }

    #[test]
    fn short_write_latches_fault() {
        let mut buffer = CoalescingBuffer::<4>::new();
        let mut sink = RecordingSink {
            limit: Some(3),
            ..Default::default()
        };

        let err = buffer.append(b"abcdefgh", &mut sink).unwrap_err();
        assert!(matches!(err, StorageFault::ShortWrite { requested: 4, written: 3 }));
        assert!(buffer.is_faulted());
        assert_eq!(buffer.bytes_written(), 3);

        buffer.append(b"more", &mut sink).unwrap();
        buffer.flush(&mut sink).unwrap();
        assert_eq!(sink.writes.len(), 1);
        assert_eq!(buffer.bytes_written(), 3);
    }

    #[test]
    fn write_error_latches_fault() {
        let mut buffer = CoalescingBuffer::<2>::new();
        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let err = buffer.append(b"ab", &mut sink).unwrap_err();
        assert!(matches!(err, StorageFault::Write(_)));
        assert!(buffer.is_faulted());
        assert_eq!(buffer.bytes_written(), 0);
    }

    #[test]
    fn reset_clears_state_for_next_attempt() {
        let mut buffer = CoalescingBuffer::<4>::new();
        let mut sink = RecordingSink::default();
        buffer.append(b"abcdef", &mut sink).unwrap();
        buffer.mark_faulted();

        buffer.reset();
        assert!(buffer.is_empty());
        assert!(!buffer.is_faulted());
        assert_eq!(buffer.bytes_written(), 0);
        assert_eq!(buffer.flushes(), 0);
    }
}
