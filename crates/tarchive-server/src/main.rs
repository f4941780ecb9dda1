//! Token snapshot archive - entry point.
//!
//! `tarchive serve` runs the export server, `tarchive record` archives token
//! observations read as JSON Lines, `tarchive dates` lists exportable dates.

use std::fs::File;
use std::io::{self, BufReader};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

/// Token snapshot archive
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TARCHIVE_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the export endpoints (default)
    Serve,
    /// Record token observations from a JSON Lines file or stdin
    Record {
        /// Input path, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: String,
    },
    /// Print exportable dates, most recent first
    Dates,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = tarchive_server::AppConfig::load(args.config.as_deref())?;

    tarchive_telemetry::init_logging(&config.telemetry.log_level)?;

    info!("Starting tarchive v{}", env!("CARGO_PKG_VERSION"));
    info!(data_dir = %config.archive.data_dir, "Configuration loaded");

    let app = tarchive_server::Application::new(config)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => app.serve().await?,
        Command::Record { input } => {
            let stats = if input == "-" {
                app.ingest(io::stdin().lock())?
            } else {
                let file = File::open(&input).with_context(|| format!("opening {input}"))?;
                app.ingest(BufReader::new(file))?
            };
            info!(recorded = stats.recorded(), skipped = stats.skipped, "Record run complete");
        }
        Command::Dates => {
            for date in app.available_dates()? {
                println!("{date}");
            }
        }
    }

    Ok(())
}
