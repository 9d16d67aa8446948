//! Record sinks.
//!
//! Three runtime-selected variants behind one enum: line-delimited
//! JSON, a textual MySQL dump, and a batched SQLite table. All three
//! are always compiled and chosen by configuration.

mod jsonl;
mod sqldump;
mod sqlite;

pub use jsonl::JsonlSink;
pub use sqldump::{sql_escape, SqlDumpSink};
pub use sqlite::SqliteSink;

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::config::{Config, OutputFormat};
use crate::error_handling::{ResourceError, SinkError};
use crate::fold::Record;

/// Where a text sink writes: a file, or stdout for `-`.
pub struct Output(Box<dyn Write + Send>);

impl Output {
    /// Opens `path` for writing, with `-` meaning stdout.
    pub fn create(path: &Path) -> Result<Self, ResourceError> {
        if path.as_os_str() == "-" {
            return Ok(Output(Box::new(io::stdout())));
        }
        let file = File::create(path).map_err(|source| ResourceError::OutputCreate {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Output(Box::new(file)))
    }

    #[cfg(test)]
    pub fn test_buffer(buf: std::sync::Arc<std::sync::Mutex<Vec<u8>>>) -> Self {
        struct Shared(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, data: &[u8]) -> io::Result<usize> {
                self.0.lock().expect("test buffer lock").extend_from_slice(data);
                Ok(data.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        Output(Box::new(Shared(buf)))
    }
}

impl Write for Output {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.write(data)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// Counters reported by [`Sink::close`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkReport {
    /// Records made durable (lines written or rows committed).
    pub written: u64,
    /// SQLite batches dropped after a failed transaction.
    pub dropped_batches: u64,
}

/// A record sink, selected at runtime from the configuration.
pub enum Sink {
    /// One JSON object per line.
    Jsonl(JsonlSink),
    /// Textual MySQL dump.
    SqlDump(SqlDumpSink),
    /// Batched SQLite table.
    Sqlite(SqliteSink),
}

impl Sink {
    /// Opens the sink described by `config`. The configuration has
    /// already been validated, so sqlite always has a db path here.
    pub async fn open(config: &Config) -> Result<Self, ResourceError> {
        match config.format {
            OutputFormat::Jsonl | OutputFormat::MongoJsonl => {
                let out = Output::create(&config.output)?;
                Ok(Sink::Jsonl(JsonlSink::new(out, config.pretty)))
            }
            OutputFormat::MysqlSql => {
                let out = Output::create(&config.output)?;
                let sink = SqlDumpSink::open(out, &config.table).map_err(|e| match e {
                    SinkError::Io(source) => ResourceError::OutputCreate {
                        path: config.output.display().to_string(),
                        source,
                    },
                    SinkError::Sql(e) => ResourceError::Database(e),
                    SinkError::Serialize(_) => {
                        unreachable!("dump preamble involves no serialization")
                    }
                })?;
                Ok(Sink::SqlDump(sink))
            }
            OutputFormat::Sqlite => {
                let db_path = config
                    .sqlite_db
                    .as_deref()
                    .unwrap_or_else(|| Path::new("records.db"));
                let sink = SqliteSink::open(
                    db_path,
                    &config.table,
                    config.batch,
                    !config.no_flush_on_cancel,
                )
                .await?;
                Ok(Sink::Sqlite(sink))
            }
        }
    }

    /// Persists one record (text sinks) or buffers it (sqlite).
    pub async fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        match self {
            Sink::Jsonl(sink) => sink.write(record),
            Sink::SqlDump(sink) => sink.write(record),
            Sink::Sqlite(sink) => sink.write(record).await,
        }
    }

    /// Closes the sink, making buffered state durable per policy.
    pub async fn close(self, cancelled: bool) -> Result<SinkReport, SinkError> {
        match self {
            Sink::Jsonl(sink) => Ok(SinkReport {
                written: sink.close()?,
                dropped_batches: 0,
            }),
            Sink::SqlDump(sink) => Ok(SinkReport {
                written: sink.close()?,
                dropped_batches: 0,
            }),
            Sink::Sqlite(sink) => {
                let (written, dropped_batches) = sink.close(cancelled).await?;
                Ok(SinkReport {
                    written,
                    dropped_batches,
                })
            }
        }
    }
}
