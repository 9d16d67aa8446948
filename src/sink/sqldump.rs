//! MySQL dump sink.
//!
//! Purely textual: emits a CREATE TABLE preamble on open, one INSERT
//! per record, and a fixed postamble on close. No connection is ever
//! opened; the dump is meant for `mysql < out.sql`.

use std::io::Write;

use crate::error_handling::SinkError;
use crate::fold::Record;

use super::Output;

/// Textual SQL dump writer.
pub struct SqlDumpSink {
    out: Output,
    table: String,
    written: u64,
}

impl SqlDumpSink {
    /// Wraps the output and writes the dump preamble.
    ///
    /// `table` must already be identifier-validated (config layer).
    pub fn open(mut out: Output, table: &str) -> Result<Self, SinkError> {
        write!(
            out,
            "-- MySQL dump generated by xmlstream\n\
             SET NAMES utf8mb4; SET FOREIGN_KEY_CHECKS=0;\n\
             CREATE TABLE IF NOT EXISTS `{table}` (\n\
             \x20 `id` BIGINT NOT NULL AUTO_INCREMENT,\n\
             \x20 `tag` VARCHAR(128) NULL,\n\
             \x20 `json` JSON NOT NULL,\n\
             \x20 `added_at` TIMESTAMP NULL DEFAULT CURRENT_TIMESTAMP,\n\
             \x20 PRIMARY KEY (`id`)\n\
             ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;\n"
        )?;
        Ok(SqlDumpSink {
            out,
            table: table.to_string(),
            written: 0,
        })
    }

    /// Appends one INSERT statement for the record.
    pub fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        let json = record.to_json(false)?;
        let line = format!(
            "INSERT INTO `{}`(`tag`,`json`) VALUES('{}', CAST('{}' AS JSON));\n",
            self.table,
            sql_escape(&record.tag),
            sql_escape(&json)
        );
        self.out.write_all(line.as_bytes())?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Writes the fixed postamble. Called on every exit path,
    /// cancellation included, so the dump stays importable.
    pub fn close(mut self) -> Result<u64, SinkError> {
        self.out.write_all(b"SET FOREIGN_KEY_CHECKS=1;\n")?;
        self.out.flush()?;
        Ok(self.written)
    }
}

/// Escapes a string for inclusion in a single-quoted MySQL literal:
/// backslash, both quote kinds, newline, carriage return, tab, and NUL.
pub fn sql_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\0' => escaped.push_str("\\0"),
            _ => escaped.push(c),
        }
    }
    escaped
}
