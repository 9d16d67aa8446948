//! xmlstream library: streaming XML-to-records conversion.
//!
//! Converts arbitrarily large XML documents into a stream of
//! discriminator-tagged JSON records, emitted to line-delimited text,
//! a SQLite database, or a textual MySQL dump, while holding at most
//! one record's subtree in memory.
//!
//! # Example
//!
//! ```no_run
//! use xmlstream::{run_stream, Config, Mode};
//! use std::path::PathBuf;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     input: PathBuf::from("scan.xml"),
//!     output: PathBuf::from("hosts.jsonl"),
//!     mode: Mode::Nmap,
//!     ..Default::default()
//! };
//!
//! let report = run_stream(config).await?;
//! println!("Emitted {} records", report.records);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or call library functions within an async context.

#![warn(missing_docs)]

mod app;
pub mod config;
pub mod error_handling;
mod fold;
pub mod initialization;
mod parse;
pub mod sink;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, Mode, OutputFormat};
pub use error_handling::StreamError;
pub use fold::{fold_record, fold_value, Record};
pub use parse::{Element, PullReader, RecordScanner};
pub use run::{run_stream, run_stream_with_cancel, StreamReport};

// Internal run module (contains the streaming pipeline)
mod run {
    use std::fs::File;
    use std::io::{self, BufRead, BufReader};
    use std::path::Path;

    use log::info;
    use tokio_util::sync::CancellationToken;

    use crate::app::{install_cancel_handler, log_progress};
    use crate::config::{Config, PROGRESS_LOG_EVERY};
    use crate::error_handling::{ResourceError, StreamError};
    use crate::fold;
    use crate::parse::{PullReader, RecordScanner};
    use crate::sink::Sink;

    /// Results of a completed streaming run.
    #[derive(Debug, Clone)]
    pub struct StreamReport {
        /// Records folded and handed to the sink.
        pub records: u64,
        /// Malformed fragments skipped by lenient recovery.
        pub skipped_fragments: u64,
        /// SQLite batches dropped after a failed transaction.
        pub dropped_batches: u64,
        /// Whether the run stopped on a cancellation request.
        pub cancelled: bool,
        /// Elapsed time in seconds.
        pub elapsed_seconds: f64,
    }

    /// Runs a streaming conversion with the provided configuration.
    ///
    /// Installs a Ctrl-C handler for cooperative cancellation; a
    /// cancelled run completes the in-flight record and returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] for invalid configuration, resources
    /// that cannot be opened, unrecoverably malformed input, or a
    /// failed text-sink write. See [`StreamError::exit_code`] for the
    /// binary's mapping.
    pub async fn run_stream(config: Config) -> Result<StreamReport, StreamError> {
        let cancel = install_cancel_handler();
        run_stream_with_cancel(config, cancel).await
    }

    /// Like [`run_stream`], with an explicit cancellation token.
    ///
    /// The token is observed at record boundaries only: tripping it
    /// never interrupts a fold or a sink write in progress.
    pub async fn run_stream_with_cancel(
        config: Config,
        cancel: CancellationToken,
    ) -> Result<StreamReport, StreamError> {
        config.validate()?;
        let record_tag = config.effective_record_tag().to_string();

        let input = open_input(&config.input)?;
        let mut sink = Sink::open(&config).await.map_err(StreamError::Resource)?;

        let reader = PullReader::new(input);
        let mut scanner = RecordScanner::new(reader, record_tag.as_str(), cancel);

        info!(
            "streaming records tagged <{record_tag}> from {}",
            config.input.display()
        );
        let start_time = std::time::Instant::now();

        let scan_result = loop {
            match scanner.next_record() {
                Ok(Some(element)) => {
                    let record = fold::fold(config.mode, &element, config.coerce_numbers);
                    drop(element); // one record subtree resident at a time
                    if let Err(e) = sink.write(&record).await {
                        break Err(StreamError::Sink(e));
                    }
                    if scanner.records() % PROGRESS_LOG_EVERY == 0 {
                        log_progress(start_time, scanner.records());
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(StreamError::MalformedInput(e)),
            }
        };

        let cancelled = scanner.cancelled();
        // Close the sink on every exit path: records already emitted
        // stay durable even when the scan failed.
        let close_result = sink.close(cancelled).await;

        scan_result?;
        let sink_report = close_result.map_err(StreamError::Sink)?;

        let report = StreamReport {
            records: scanner.records(),
            skipped_fragments: scanner.skipped(),
            dropped_batches: sink_report.dropped_batches,
            cancelled,
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        };
        if report.cancelled {
            info!(
                "stopped on cancellation after {} record(s), all of them fully written",
                report.records
            );
        }
        log_progress(start_time, report.records);
        Ok(report)
    }

    fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>, StreamError> {
        if path.as_os_str() == "-" {
            info!("Reading XML from stdin");
            return Ok(Box::new(BufReader::new(io::stdin())));
        }
        let file = File::open(path).map_err(|source| {
            StreamError::Resource(ResourceError::InputOpen {
                path: path.display().to_string(),
                source,
            })
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}
