// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data types for query points, extracted records and errors.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Title used when the detail panel has no readable heading.
pub const NO_TITLE: &str = "No title";

/// Address used when the detail panel has no usable item button.
pub const NO_ADDRESS: &str = "No address";

/// One feed to scrape: a search phrase anchored at a coordinate/zoom token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery {
    /// Human-readable name of the point, used in logs and output file names.
    pub label: String,
    /// The search phrase typed into the map search box.
    pub search_term: String,
    /// Optional qualifier appended to the search phrase (e.g. ", Cikole, Sukabumi").
    pub area: Option<String>,
    /// Raw map viewport token such as `@-6.8890102,106.873541,13z`.
    pub coordinate_zoom_token: String,
}

impl LocationQuery {
    pub fn new(
        label: impl Into<String>,
        search_term: impl Into<String>,
        area: Option<String>,
        coordinate_zoom_token: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            search_term: search_term.into(),
            area,
            coordinate_zoom_token: coordinate_zoom_token.into(),
        }
    }
}

/// A single place pulled out of a detail panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub title: String,
    pub address: String,
    pub phone: String,
}

/// Titles already recorded during one query point's run.
///
/// Scope is a single feed: a fresh index is created for every point.
#[derive(Debug, Default)]
pub struct DedupIndex {
    seen: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.seen.contains(title)
    }

    /// Insert a title. Returns `false` if it was already present.
    pub fn insert(&mut self, title: &str) -> bool {
        self.seen.insert(title.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Errors that can occur in the placefeed library.
#[derive(thiserror::Error, Debug)]
pub enum PlacefeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Feed not found: selector {selector} did not attach within {timeout_ms}ms")]
    FeedNotFound { selector: String, timeout_ms: u64 },

    #[error("Stale element handle: {0}")]
    StaleHandle(String),

    #[error("Browser error: {0}")]
    Browser(String),
}

/// Convenience result type.
pub type PlacefeedResult<T> = Result<T, PlacefeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_index_rejects_second_insert() {
        let mut index = DedupIndex::new();
        assert!(index.is_empty());
        assert!(index.insert("Kopi Kenangan"));
        assert!(!index.insert("Kopi Kenangan"));
        assert!(index.contains("Kopi Kenangan"));
        assert!(!index.contains("kopi kenangan"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn record_serializes_with_plain_field_names() {
        let record = ExtractedRecord {
            title: "Toko Maju".into(),
            address: "Jl. Contoh No. 1".into(),
            phone: "0812345".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["title"], "Toko Maju");
        assert_eq!(value["address"], "Jl. Contoh No. 1");
        assert_eq!(value["phone"], "0812345");
    }
}
