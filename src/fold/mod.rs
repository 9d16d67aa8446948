//! Folding: XML subtree -> structured record.
//!
//! Two folders share the [`Record`] output type: the generic folder
//! applies fixed merge rules to any subtree, the nmap folder normalizes
//! one known schema (`<host>` records).

mod generic;
mod nmap;

pub use generic::{fold_record, fold_value};
pub use nmap::{fold_host, HOST_TAG};

use serde_json::Value;

use crate::config::Mode;
use crate::parse::Element;

/// One folded, discriminator-tagged record.
///
/// `body` is always a JSON object carrying a `_tag` key; `tag` repeats
/// the discriminator for sinks that store a tag column.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Partition key for tag-column sinks.
    pub tag: String,
    /// The folded value, always an object.
    pub body: Value,
}

impl Record {
    /// Serializes the record body to JSON text.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(&self.body)
        } else {
            serde_json::to_string(&self.body)
        }
    }
}

/// Folds one record subtree according to the configured mode.
pub fn fold(mode: Mode, element: &Element, coerce_numbers: bool) -> Record {
    match mode {
        Mode::Generic => fold_record(element),
        Mode::Nmap => fold_host(element, coerce_numbers),
    }
}
