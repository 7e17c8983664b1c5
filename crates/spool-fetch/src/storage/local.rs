use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use sysinfo::Disks;

use super::{Capacity, Storage, StorageHandle};

/// Filesystem storage. Capacity comes from the mounted volume with the longest mount
/// point that prefixes the destination.
pub struct LocalStorage {
    disks: Mutex<Disks>,
}

impl Default for LocalStorage {
    fn default() -> Self { Self::new() }
}

impl LocalStorage {
    pub fn new() -> Self {
        Self {
            disks: Mutex::new(Disks::new_with_refreshed_list()),
        }
    }
}

impl Storage for LocalStorage {
    type Handle = LocalFile;

    fn remove(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn create(&self, path: &Path) -> io::Result<LocalFile> {
        File::create(path).map(|file| LocalFile { file })
    }

    fn capacity(&self, path: &Path) -> io::Result<Capacity> {
        let path = std::path::absolute(path)?;
        let mut disks = self
            .disks
            .lock()
            .map_err(|_| io::Error::other("disk table lock poisoned"))?;

        let disk = disks
            .list_mut()
            .iter_mut()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no mounted volume holds {}", path.display()),
                )
            })?;

        disk.refresh();
        let total = disk.total_space();
        Ok(Capacity {
            total,
            used: total.saturating_sub(disk.available_space()),
        })
    }
}

/// Open destination file of one attempt.
pub struct LocalFile {
    file: File,
}

impl StorageHandle for LocalFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            match self.file.write(&buf[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if written == 0 => return Err(e),
                Err(e) => {
                    tracing::debug!(error = %e, written, "write stopped part-way");
                    break;
                }
            }
        }
        Ok(written)
    }

    fn close(self) -> io::Result<()> { self.file.sync_all() }
}
