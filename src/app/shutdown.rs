//! Graceful shutdown handling.

use tokio_util::sync::CancellationToken;

/// Installs a Ctrl-C handler that trips a cancellation token.
///
/// The token is only ever observed at record boundaries by the
/// scanner, so the in-flight record always completes (soft stop).
pub fn install_cancel_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trip = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupt received; finishing current record and stopping");
            trip.cancel();
        }
    });
    token
}
