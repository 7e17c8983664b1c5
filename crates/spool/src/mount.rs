use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use spool_fetch::{LocalStorage, Storage};
use tracing::{info, warn};

/// Make sure the destination's directory exists and log how full its volume is.
pub fn prepare(dest: &Path) -> anyhow::Result<()> {
    if dest.is_dir() {
        bail!("destination {} is a directory", dest.display());
    }

    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory {}", parent.display()))?;

    match LocalStorage::new().capacity(parent) {
        Ok(capacity) => info!(
            path = %parent.display(),
            total = capacity.total,
            used = capacity.used,
            "storage ready"
        ),
        Err(e) => warn!(path = %parent.display(), error = %e, "storage capacity unavailable"),
    }

    Ok(())
}
