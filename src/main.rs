//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `xmlstream` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Exit-code mapping and user-facing output
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use xmlstream::initialization::init_logger_with;
use xmlstream::{run_stream, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments into Config
    let config = Config::parse();

    // Initialize logger based on config
    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    // Run the streaming conversion using the library
    match run_stream(config).await {
        Ok(report) => {
            let mut summary = format!(
                "Emitted {} record{} in {:.1}s",
                report.records,
                if report.records == 1 { "" } else { "s" },
                report.elapsed_seconds
            );
            if report.skipped_fragments > 0 {
                summary.push_str(&format!(
                    " ({} malformed fragment{} skipped)",
                    report.skipped_fragments,
                    if report.skipped_fragments == 1 { "" } else { "s" }
                ));
            }
            if report.dropped_batches > 0 {
                summary.push_str(&format!(
                    " ({} failed batch{} dropped)",
                    report.dropped_batches,
                    if report.dropped_batches == 1 { "" } else { "es" }
                ));
            }
            println!("{summary}");
            if report.cancelled {
                // Cancellation is a request, not an error: exit 0.
                eprintln!("Interrupted; stopped cleanly at a record boundary.");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("xmlstream error: {:#}", e);
            process::exit(e.exit_code());
        }
    }
}
