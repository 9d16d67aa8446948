//! Configuration types and CLI options.
//!
//! This module defines the `Config` struct (doubles as the clap
//! command line) and the enums used for mode, format, and logging
//! selection.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{DEFAULT_BATCH_SIZE, DEFAULT_TABLE, NMAP_RECORD_TAG};
use crate::error_handling::ConfigError;

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Extraction mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Fold any element subtree with the generic merge rules.
    Generic,
    /// Schema-aware normalization of Nmap `<host>` records.
    Nmap,
}

/// Output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line (default).
    Jsonl,
    /// SQLite database file with a records table.
    Sqlite,
    /// Textual MySQL dump: CREATE TABLE plus one INSERT per record.
    MysqlSql,
    /// Alias of jsonl, named for easy `mongoimport`.
    MongoJsonl,
}

/// Configuration for one streaming run.
///
/// Parsed from the command line in the binary, or constructed directly
/// when using the library.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "xmlstream",
    about = "Stream massive XML into JSONL / SQLite / MySQL-dump records",
    after_help = "Examples:\n\n  \
        # Nmap scan -> JSONL (one host per line)\n  \
        xmlstream --mode nmap -i scan.xml -o hosts.jsonl\n\n  \
        # Generic XML -> JSONL from stdin\n  \
        cat big.xml | xmlstream --record-tag item -o out.jsonl\n\n  \
        # Nmap scan -> SQLite\n  \
        xmlstream --mode nmap -i scan.xml --format sqlite --sqlite-db scan.db\n\n  \
        # Nmap scan -> MySQL dump (import with mysql < out.sql)\n  \
        xmlstream --mode nmap -i scan.xml --format mysql-sql -o out.sql"
)]
pub struct Config {
    /// Input XML file, or '-' for stdin
    #[arg(short, long, default_value = "-")]
    pub input: PathBuf,

    /// Output file (jsonl / mysql-sql), or '-' for stdout
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
    pub format: OutputFormat,

    /// Extraction mode
    #[arg(long, value_enum, default_value_t = Mode::Generic)]
    pub mode: Mode,

    /// Element tag to treat as a record (defaults to 'host' in nmap mode)
    #[arg(long)]
    pub record_tag: Option<String>,

    /// Pretty-print JSON (jsonl only; slower, bigger)
    #[arg(long)]
    pub pretty: bool,

    /// SQLite database path (required when --format=sqlite)
    #[arg(long)]
    pub sqlite_db: Option<PathBuf>,

    /// Table name for the sqlite and mysql-sql sinks
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Rows buffered per sqlite insert transaction
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch: usize,

    /// Emit numeric-looking nmap fields (portid, uptime seconds) as JSON numbers
    #[arg(long)]
    pub coerce_numbers: bool,

    /// On Ctrl-C, drop the partially filled sqlite batch instead of flushing it
    #[arg(long)]
    pub no_flush_on_cancel: bool,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("-"),
            output: PathBuf::from("-"),
            format: OutputFormat::Jsonl,
            mode: Mode::Generic,
            record_tag: None,
            pretty: false,
            sqlite_db: None,
            table: DEFAULT_TABLE.to_string(),
            batch: DEFAULT_BATCH_SIZE,
            coerce_numbers: false,
            no_flush_on_cancel: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// The record tag this run scans for.
    ///
    /// Nmap mode implies `host`; generic mode requires an explicit tag
    /// (enforced by [`Config::validate`]).
    pub fn effective_record_tag(&self) -> &str {
        match self.mode {
            Mode::Nmap => self.record_tag.as_deref().unwrap_or(NMAP_RECORD_TAG),
            Mode::Generic => self.record_tag.as_deref().unwrap_or(""),
        }
    }

    /// Validates mode/format/parameter combinations.
    ///
    /// Called before any input or output is opened, so a configuration
    /// error never produces partial output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            Mode::Generic => {
                if self.record_tag.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::MissingRecordTag);
                }
            }
            Mode::Nmap => {
                if let Some(tag) = self.record_tag.as_deref() {
                    if tag != NMAP_RECORD_TAG {
                        return Err(ConfigError::RecordTagMismatch(tag.to_string()));
                    }
                }
            }
        }

        if self.format == OutputFormat::Sqlite && self.sqlite_db.is_none() {
            return Err(ConfigError::MissingSqliteDb);
        }

        if !is_valid_table_ident(&self.table) {
            return Err(ConfigError::InvalidTableName(self.table.clone()));
        }

        if self.batch == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        Ok(())
    }
}

/// Table names are spliced into CREATE TABLE / INSERT text and must be
/// bare identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_table_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_mode_requires_record_tag() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRecordTag)
        ));

        let config = Config {
            record_tag: Some("item".into()),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nmap_mode_defaults_record_tag_to_host() {
        let config = Config {
            mode: Mode::Nmap,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_record_tag(), "host");
    }

    #[test]
    fn test_nmap_mode_rejects_other_record_tags() {
        let config = Config {
            mode: Mode::Nmap,
            record_tag: Some("service".into()),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RecordTagMismatch(t)) if t == "service"
        ));
    }

    #[test]
    fn test_sqlite_format_requires_db_path() {
        let config = Config {
            mode: Mode::Nmap,
            format: OutputFormat::Sqlite,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSqliteDb)
        ));
    }

    #[test]
    fn test_table_identifier_validation() {
        assert!(is_valid_table_ident("records"));
        assert!(is_valid_table_ident("_scan_2024"));
        assert!(!is_valid_table_ident("7records"));
        assert!(!is_valid_table_ident("records; DROP TABLE x"));
        assert!(!is_valid_table_ident(""));
    }

    #[test]
    fn test_zero_batch_is_rejected() {
        let config = Config {
            mode: Mode::Nmap,
            batch: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroBatchSize)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.batch, DEFAULT_BATCH_SIZE);
        assert_eq!(config.table, DEFAULT_TABLE);
        assert!(!config.pretty);
        assert!(!config.coerce_numbers);
        assert!(!config.no_flush_on_cancel);
    }
}
