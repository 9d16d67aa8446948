//! Error type definitions.
//!
//! One enum per error class so that callers (and the binary's exit-code
//! mapping) can tell configuration mistakes, startup resource failures,
//! unrecoverable input corruption, and sink failures apart.

use thiserror::Error;

/// Errors detected while validating the configuration, before any
/// processing begins.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Generic mode scans for a specific element name and cannot run without one.
    #[error("--record-tag is required in generic mode (e.g. --record-tag item)")]
    MissingRecordTag,

    /// The sqlite format writes to a database file, not to --output.
    #[error("--sqlite-db is required when --format=sqlite")]
    MissingSqliteDb,

    /// Nmap mode only understands <host> records.
    #[error("nmap mode extracts <host> records; --record-tag {0:?} is not supported")]
    RecordTagMismatch(String),

    /// Table names are spliced into SQL text and must be plain identifiers.
    #[error("invalid table name {0:?}: use letters, digits and underscores, not starting with a digit")]
    InvalidTableName(String),

    /// Batch size zero would never flush.
    #[error("--batch must be at least 1")]
    ZeroBatchSize,
}

/// Errors opening input, output, or the database at startup.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The input file could not be opened.
    #[error("cannot open input {path}: {source}")]
    InputOpen {
        path: String,
        source: std::io::Error,
    },

    /// The output file could not be created.
    #[error("cannot create output {path}: {source}")]
    OutputCreate {
        path: String,
        source: std::io::Error,
    },

    /// The database file could not be created.
    #[error("cannot create database file: {0}")]
    DbFileCreation(String),

    /// Connecting to or preparing the database failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The input is malformed beyond what lenient recovery can skip.
///
/// Recoverable fragments are skipped and logged; this error is raised
/// only when the reader can make no further byte progress.
#[derive(Error, Debug)]
#[error("malformed XML input at byte {position}: {source}")]
pub struct MalformedInputError {
    /// Byte offset in the input stream where the reader gave up.
    pub position: u64,
    /// The underlying parser error.
    pub source: quick_xml::Error,
}

/// A write to an already-open sink failed.
///
/// For the sqlite sink a failed batch is logged and dropped without
/// aborting the run; text sinks surface I/O failures as fatal.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Writing to the output stream failed.
    #[error("output write error: {0}")]
    Io(#[from] std::io::Error),

    /// A database statement failed.
    #[error("database write error: {0}")]
    Sql(#[from] sqlx::Error),

    /// Serializing a record to JSON failed.
    #[error("record serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level error for a streaming run.
///
/// Each variant maps to a distinct process exit code so scripts can
/// react to the failure class.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Invalid mode/format/parameter combination.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input, output, or database could not be opened.
    #[error("{0}")]
    Resource(#[from] ResourceError),

    /// The input stream is unrecoverably malformed.
    #[error("{0}")]
    MalformedInput(#[from] MalformedInputError),

    /// A text sink write failed mid-stream.
    #[error("{0}")]
    Sink(#[from] SinkError),
}

impl StreamError {
    /// Exit code for the binary. Success (including graceful
    /// cancellation) is 0 and never reaches this mapping.
    pub fn exit_code(&self) -> i32 {
        match self {
            StreamError::Config(_) => 2,
            StreamError::Resource(_) => 3,
            StreamError::MalformedInput(_) => 4,
            StreamError::Sink(_) => 5,
        }
    }
}
