//! Startup initialization (logging).

mod logger;

pub use logger::init_logger_with;
