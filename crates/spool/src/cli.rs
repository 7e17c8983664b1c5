use std::path::PathBuf;

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(name = "spool", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    /// HTTPS URL of the resource to fetch
    pub url: String,

    /// Destination file; replaced on every attempt
    pub dest: PathBuf,

    /// TOML file with default settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Base backoff delay between attempts
    #[arg(long)]
    pub retry_backoff_ms: Option<u64>,

    /// Throughput below which a warning is logged
    #[arg(long)]
    pub min_speed_kib: Option<u64>,

    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// PEM bundle of additional trusted certificates
    #[arg(long)]
    pub ca_bundle: Option<PathBuf>,

    /// Accept plain http:// URLs
    #[arg(long)]
    pub allow_http: bool,

    /// Hide the progress spinner
    #[arg(short, long)]
    pub quiet: bool,
}
