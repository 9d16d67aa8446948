//! Application-level helpers: progress logging and shutdown.

mod logging;
mod shutdown;

pub use logging::log_progress;
pub use shutdown::install_cancel_handler;
