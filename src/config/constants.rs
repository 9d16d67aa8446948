//! Configuration constants.

/// Record tag implied by nmap mode when none is given explicitly.
pub const NMAP_RECORD_TAG: &str = "host";

/// Default table name for the sqlite and mysql-sql sinks.
pub const DEFAULT_TABLE: &str = "records";

/// Default number of rows buffered by the sqlite sink before one
/// transactional flush.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// How many records between progress log lines.
pub const PROGRESS_LOG_EVERY: u64 = 10_000;
