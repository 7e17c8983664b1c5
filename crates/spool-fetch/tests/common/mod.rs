//! Scripted transport and in-memory storage shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spool_fetch::{
    Capacity, EventHandler, Progress, Storage, StorageHandle, Transport, TransportError,
    TransportEvent,
};
use tokio::time::Instant;

/// What one `perform` call does.
pub struct Attempt {
    chunks:   Vec<Vec<u8>>,
    outcome:  Result<(), TransportError>,
    duration: Duration,
}

impl Attempt {
    pub fn ok(chunks: &[&[u8]]) -> Self {
        Self {
            chunks:   chunks.iter().map(|c| c.to_vec()).collect(),
            outcome:  Ok(()),
            duration: Duration::ZERO,
        }
    }

    pub fn fail(err: TransportError) -> Self { Self::fail_after(&[], err) }

    pub fn fail_after(chunks: &[&[u8]], err: TransportError) -> Self {
        Self {
            chunks:   chunks.iter().map(|c| c.to_vec()).collect(),
            outcome:  Err(err),
            duration: Duration::ZERO,
        }
    }

    /// Spend `duration` on the wire before delivering the body.
    pub fn taking(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Transport that plays one [`Attempt`] per `perform` call.
#[derive(Default)]
pub struct ScriptedTransport {
    script:  Mutex<VecDeque<Attempt>>,
    started: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Attempt>) -> Self {
        Self {
            script:  Mutex::new(script.into_iter().collect()),
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> usize { self.started.lock().unwrap().len() }

    /// Gaps between consecutive attempt starts.
    pub fn gaps(&self) -> Vec<Duration> {
        let started = self.started.lock().unwrap();
        started.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

impl Transport for ScriptedTransport {
    async fn perform<H>(&self, _url: &str, handler: &mut H) -> Result<(), TransportError>
    where
        H: EventHandler + Send,
    {
        self.started.lock().unwrap().push(Instant::now());
        let attempt = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Attempt::fail(TransportError::Connect("script exhausted".into())));

        handler.on_event(TransportEvent::Connected);
        handler.on_event(TransportEvent::HeaderSent);
        if !attempt.duration.is_zero() {
            tokio::time::sleep(attempt.duration).await;
        }
        for chunk in &attempt.chunks {
            handler.on_event(TransportEvent::Data(chunk));
        }

        match attempt.outcome {
            Ok(()) => {
                handler.on_event(TransportEvent::Finished);
                handler.on_event(TransportEvent::Disconnected);
                Ok(())
            }
            Err(e) => {
                handler.on_event(TransportEvent::Error(&e.to_string()));
                handler.on_event(TransportEvent::Disconnected);
                Err(e)
            }
        }
    }
}

#[derive(Default)]
struct Volume {
    files:        HashMap<PathBuf, Vec<u8>>,
    total:        u64,
    write_limit:  Option<usize>,
    fail_create:  bool,
    fail_remove:  bool,
    fail_close:   bool,
    writes:       Vec<usize>,
    removes:      u32,
}

/// In-memory volume of fixed size.
#[derive(Clone)]
pub struct MemoryStorage {
    volume: Arc<Mutex<Volume>>,
}

impl MemoryStorage {
    pub fn new(total: u64) -> Self {
        Self {
            volume: Arc::new(Mutex::new(Volume {
                total,
                ..Default::default()
            })),
        }
    }

    /// Every write call accepts at most `limit` bytes.
    pub fn with_write_limit(self, limit: usize) -> Self {
        self.volume.lock().unwrap().write_limit = Some(limit);
        self
    }

    pub fn failing_create(self) -> Self {
        self.volume.lock().unwrap().fail_create = true;
        self
    }

    pub fn failing_remove(self) -> Self {
        self.volume.lock().unwrap().fail_remove = true;
        self
    }

    /// Closing a handle reports a sync failure.
    pub fn failing_close(self) -> Self {
        self.volume.lock().unwrap().fail_close = true;
        self
    }

    pub fn put(&self, path: impl Into<PathBuf>, contents: &[u8]) {
        self.volume.lock().unwrap().files.insert(path.into(), contents.to_vec());
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.volume.lock().unwrap().files.get(path.as_ref()).cloned()
    }

    /// Sizes of the write calls issued so far, in order.
    pub fn writes(&self) -> Vec<usize> { self.volume.lock().unwrap().writes.clone() }

    pub fn removes(&self) -> u32 { self.volume.lock().unwrap().removes }
}

pub struct MemoryFile {
    path:   PathBuf,
    volume: Arc<Mutex<Volume>>,
}

impl StorageHandle for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut volume = self.volume.lock().unwrap();
        let n = volume.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        volume.writes.push(buf.len());
        volume
            .files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn close(self) -> io::Result<()> {
        if self.volume.lock().unwrap().fail_close {
            return Err(io::Error::other("sync failed"));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    type Handle = MemoryFile;

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut volume = self.volume.lock().unwrap();
        volume.removes += 1;
        if volume.fail_remove {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "file is locked"));
        }
        volume.files.remove(path);
        Ok(())
    }

    fn create(&self, path: &Path) -> io::Result<MemoryFile> {
        let mut volume = self.volume.lock().unwrap();
        if volume.fail_create {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only volume"));
        }
        volume.files.insert(path.to_path_buf(), Vec::new());
        Ok(MemoryFile {
            path:   path.to_path_buf(),
            volume: Arc::clone(&self.volume),
        })
    }

    fn capacity(&self, _path: &Path) -> io::Result<Capacity> {
        let volume = self.volume.lock().unwrap();
        Ok(Capacity {
            total: volume.total,
            used:  volume.files.values().map(|f| f.len() as u64).sum(),
        })
    }
}

/// Progress callback that records every snapshot.
pub fn recorder() -> (Arc<Mutex<Vec<Progress>>>, Arc<dyn Fn(&Progress) + Send + Sync>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, Arc::new(move |p: &Progress| sink.lock().unwrap().push(p.clone())))
}
