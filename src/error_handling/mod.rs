//! Error handling.
//!
//! Defines the error taxonomy for a streaming run: configuration
//! errors, resource errors, malformed-input errors, and sink errors,
//! each with its own process exit code.

mod types;

pub use types::{ConfigError, MalformedInputError, ResourceError, SinkError, StreamError};
