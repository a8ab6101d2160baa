//! gpsdscan
//!
//! Reads a gpsd JSON stream from a file or stdin and writes one record per
//! line to stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncRead;
use tracing::info;

use gpsdscan_cli::{PipeOptions, Summary, pipe};
use gpsdscan_core::config::{Config, load_config};
use gpsdscan_core::tracing_init::init_tracing;
use gpsdscan_core::{AsyncScanner, ScannerConfig};

#[derive(Parser, Debug)]
#[command(name = "gpsdscan")]
#[command(version, about = "Split a gpsd JSON stream into one record per line")]
struct Args {
    /// Input file (reads stdin when omitted)
    #[arg(short, long, env = "GPSDSCAN_INPUT")]
    input: Option<PathBuf>,

    /// JSON settings file layered over the global one
    #[arg(short, long, env = "GPSDSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Largest record accepted, in bytes
    #[arg(long)]
    max_record_bytes: Option<usize>,

    /// Drop records that are not valid JSON
    #[arg(long)]
    validate: bool,

    /// Log level filter (e.g. "info", "debug", "warn")
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(n) = self.max_record_bytes {
            config.scanner.max_record_bytes = n;
        }
        if let Some(level) = &self.log_level {
            config.log.level.clone_from(level);
        }
        if self.log_json {
            config.log.json = true;
        }
    }
}

async fn run<R: AsyncRead + Unpin>(
    reader: R,
    config: &ScannerConfig,
    options: PipeOptions,
) -> anyhow::Result<Summary> {
    let scanner = AsyncScanner::with_config(reader, config)?;
    let mut stdout = tokio::io::stdout();
    Ok(pipe(&scanner, &mut stdout, options).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);
    init_tracing(&config.log)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting gpsdscan");

    let options = PipeOptions {
        validate: args.validate,
    };
    let summary = match &args.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            run(file, &config.scanner, options).await?
        }
        None => run(tokio::io::stdin(), &config.scanner, options).await?,
    };

    info!(
        records = summary.records,
        invalid = summary.invalid,
        oversized = summary.oversized,
        "Finished"
    );
    Ok(())
}
