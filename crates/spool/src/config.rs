//! Settings layering: command-line flags over the optional TOML file over built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use spool_fetch::{FetchOptions, TransportOptions};

use crate::cli::App;

/// Keys accepted in the `--config` file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub max_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub min_speed_kib: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub ca_bundle: Option<PathBuf>,
    pub allow_http: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> { Ok(toml::from_str(text)?) }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub fetch: FetchOptions,
    pub transport: TransportOptions,
}

impl Settings {
    pub fn resolve(app: &App, file: FileConfig) -> Self {
        let mut fetch = FetchOptions::default();
        if let Some(n) = app.max_attempts.or(file.max_attempts) {
            fetch = fetch.max_attempts(n);
        }
        if let Some(ms) = app.retry_backoff_ms.or(file.retry_backoff_ms) {
            fetch = fetch.retry_backoff(Duration::from_millis(ms));
        }
        if let Some(kib) = app.min_speed_kib.or(file.min_speed_kib) {
            fetch = fetch.min_throughput_bps(kib.saturating_mul(1024));
        }

        let mut transport = TransportOptions::default();
        if let Some(ms) = app.read_timeout_ms.or(file.read_timeout_ms) {
            transport = transport.read_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = app.connect_timeout_ms.or(file.connect_timeout_ms) {
            transport = transport.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(bundle) = app.ca_bundle.clone().or(file.ca_bundle) {
            transport = transport.ca_bundle(bundle);
        }
        let allow_http = app.allow_http || file.allow_http.unwrap_or(false);
        transport = transport.https_only(!allow_http);

        Self { fetch, transport }
    }
}
