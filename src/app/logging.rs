//! Progress logging utilities.

use log::info;

/// Logs streaming progress.
///
/// # Arguments
///
/// * `start_time` - The start time of processing
/// * `records` - Records emitted so far
pub fn log_progress(start_time: std::time::Instant, records: u64) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let rate = if elapsed_secs > 0.0 {
        records as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Processed {} records in {:.2} seconds (~{:.2} records/sec)",
        records, elapsed_secs, rate
    );
}
