// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::ViewRecord;

/// Name of the embedded text blob holding the document.
pub const DATA_BLOCK_NAME: &str = ".vantage_data";

/// Current schema version written to new documents.
pub const SCHEMA_VERSION: u32 = 1;

fn default_version() -> u32 {
    SCHEMA_VERSION
}

fn default_next() -> u64 {
    1
}

/// The whole persisted document. Always read and written as one unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Saved views, in navigation order.
    #[serde(default)]
    pub saved_views: Vec<ViewRecord>,
    /// Reserved for shareable style presets.
    #[serde(default)]
    pub style_presets: Vec<Value>,
    /// Monotonic counter for default view names.
    #[serde(default = "default_next")]
    pub next_view_number: u64,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            saved_views: Vec::new(),
            style_presets: Vec::new(),
            next_view_number: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_shape() {
        let doc = StoreDocument::default();
        let text = serde_json::to_string(&doc).unwrap();
        let round: StoreDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(round.version, SCHEMA_VERSION);
        assert!(round.saved_views.is_empty());
        assert_eq!(round.next_view_number, 1);
    }

    #[test]
    fn missing_fields_default() {
        let doc: StoreDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.version, SCHEMA_VERSION);
        assert_eq!(doc.next_view_number, 1);
    }
}
