use anyhow::Context;
use clap::Parser;
use spool_fetch::{Downloader, LocalStorage, ReqwestTransport};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::App;
use crate::config::{FileConfig, Settings};
use crate::tracker::{ProgressTrackerBuilder, Tracker, TrackerBuilder};

mod cli;
mod config;
mod mount;
mod tracker;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// One download at a time on one execution context.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let app = App::parse();
    init_tracing();

    let file = match app.config {
        Some(ref path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let Settings { fetch, transport } = Settings::resolve(&app, file);

    mount::prepare(&app.dest)?;

    let transport =
        ReqwestTransport::new(&transport).context("failed to initialise HTTPS transport")?;

    let tracker = (!app.quiet).then(|| {
        ProgressTrackerBuilder::default()
            .with_prefix("Downloading")
            .with_finish("done")
            .build()
    });
    let fetch = match tracker {
        Some(ref tracker) => fetch.on_progress(tracker.callback()),
        None => fetch,
    };

    let mut downloader = Downloader::new(transport, LocalStorage::new()).with_options(fetch);
    let result = downloader.download(&app.url, &app.dest).await;

    if let Some(tracker) = tracker {
        if result.is_ok() {
            tracker.finish();
        } else {
            tracker.abandon();
        }
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!(url = %app.url, "file download failed");
            return Err(e).with_context(|| format!("failed to download {}", app.url));
        }
    };

    let size = std::fs::metadata(&app.dest)
        .with_context(|| format!("downloaded file not found at {}", app.dest.display()))?
        .len();
    info!(
        path = %app.dest.display(),
        bytes = size,
        attempts = report.attempts,
        kib_per_sec = report.kib_per_sec(),
        "file downloaded successfully"
    );

    Ok(())
}
