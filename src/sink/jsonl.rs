//! Line-delimited JSON sink.

use std::io::Write;

use crate::error_handling::SinkError;
use crate::fold::Record;

use super::Output;

/// Writes one JSON object per line, flushed per record so that a
/// cancelled run leaves exactly the records written so far, each line
/// independently parseable.
pub struct JsonlSink {
    out: Output,
    pretty: bool,
    written: u64,
}

impl JsonlSink {
    /// Wraps an already-opened output stream.
    pub fn new(out: Output, pretty: bool) -> Self {
        JsonlSink {
            out,
            pretty,
            written: 0,
        }
    }

    /// Serializes and appends one record, flushing immediately.
    pub fn write(&mut self, record: &Record) -> Result<(), SinkError> {
        let mut line = record.to_json(self.pretty)?;
        line.push('\n');
        self.out.write_all(line.as_bytes())?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Flushes and returns the number of lines written.
    pub fn close(mut self) -> Result<u64, SinkError> {
        self.out.flush()?;
        Ok(self.written)
    }
}
