//! Streaming XML parsing.
//!
//! This module provides:
//! - [`Element`]: one materialized record subtree
//! - [`PullReader`]: forward-only scan + subtree materialization
//! - [`RecordScanner`]: record detection with cooperative cancellation

mod detector;
mod node;
mod reader;

pub use detector::RecordScanner;
pub use node::Element;
pub use reader::PullReader;
