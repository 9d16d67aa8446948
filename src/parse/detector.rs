//! Record detection with cooperative cancellation.

use std::io::BufRead;

use tokio_util::sync::CancellationToken;

use crate::error_handling::MalformedInputError;
use crate::parse::node::Element;
use crate::parse::reader::PullReader;

/// Drives a [`PullReader`] over the configured record tag.
///
/// The cancellation token is polled exactly once per call to
/// [`RecordScanner::next_record`], before the reader is touched: a
/// record that was already returned is never abandoned half way, and a
/// tripped token stops the scan at the next boundary. A half-folded
/// record is therefore impossible by construction.
pub struct RecordScanner<R: BufRead> {
    reader: PullReader<R>,
    tag: String,
    cancel: CancellationToken,
    records: u64,
    cancelled: bool,
}

impl<R: BufRead> RecordScanner<R> {
    /// Creates a scanner for `tag`, observing `cancel` at record
    /// boundaries only.
    pub fn new(reader: PullReader<R>, tag: impl Into<String>, cancel: CancellationToken) -> Self {
        RecordScanner {
            reader,
            tag: tag.into(),
            cancel,
            records: 0,
            cancelled: false,
        }
    }

    /// Returns the next record subtree, `Ok(None)` on end of input or
    /// after cancellation has been observed.
    ///
    /// A fatal reader error stops the scan; records already returned
    /// are not retracted.
    pub fn next_record(&mut self) -> Result<Option<Element>, MalformedInputError> {
        if self.cancel.is_cancelled() {
            if !self.cancelled {
                self.cancelled = true;
                log::info!(
                    "cancellation observed after {} record(s); stopping scan",
                    self.records
                );
            }
            return Ok(None);
        }
        match self.reader.next_record(&self.tag)? {
            Some(element) => {
                self.records += 1;
                Ok(Some(element))
            }
            None => Ok(None),
        }
    }

    /// Records returned so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Malformed fragments skipped by the reader's recovery pass.
    pub fn skipped(&self) -> u64 {
        self.reader.skipped()
    }

    /// Whether a cancellation request has been observed.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }
}
