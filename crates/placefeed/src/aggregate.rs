// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-point result accumulation and hand-off to persistence sinks.

use crate::types::{ExtractedRecord, LocationQuery, PlacefeedResult};

/// A persistence collaborator that receives one point's full record set.
pub trait RecordSink: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;
    /// Store `records` for `query`, replacing anything stored for it before.
    fn persist(&self, query: &LocationQuery, records: &[ExtractedRecord]) -> PlacefeedResult<()>;
}

/// Accumulates records for a single query point.
///
/// Records are only handed to sinks by [`ResultAggregator::flush`], which is
/// called once the card loop has finished; nothing partial is ever persisted.
#[derive(Debug)]
pub struct ResultAggregator {
    query: LocationQuery,
    records: Vec<ExtractedRecord>,
}

impl ResultAggregator {
    pub fn new(query: LocationQuery) -> Self {
        Self {
            query,
            records: Vec::new(),
        }
    }

    pub fn query(&self) -> &LocationQuery {
        &self.query
    }

    /// Append a record. Order of arrival is preserved.
    pub fn push(&mut self, record: ExtractedRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ExtractedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forward the full record set to every sink, then discard it.
    ///
    /// All sinks are attempted; the first error is returned.
    pub fn flush(self, sinks: &[Box<dyn RecordSink>]) -> PlacefeedResult<usize> {
        let mut first_error = None;
        for sink in sinks {
            match sink.persist(&self.query, &self.records) {
                Ok(()) => tracing::debug!(
                    sink = sink.name(),
                    point = %self.query.label,
                    records = self.records.len(),
                    "records persisted"
                ),
                Err(e) => {
                    tracing::warn!(sink = sink.name(), point = %self.query.label, "persist failed: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(self.records.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlacefeedError;
    use std::sync::{Arc, Mutex};

    struct Collect(Arc<Mutex<Vec<(String, Vec<ExtractedRecord>)>>>);

    impl RecordSink for Collect {
        fn name(&self) -> &str {
            "collect"
        }
        fn persist(&self, query: &LocationQuery, records: &[ExtractedRecord]) -> PlacefeedResult<()> {
            self.0
                .lock()
                .unwrap()
                .push((query.label.clone(), records.to_vec()));
            Ok(())
        }
    }

    struct Broken;

    impl RecordSink for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn persist(&self, _query: &LocationQuery, _records: &[ExtractedRecord]) -> PlacefeedResult<()> {
            Err(PlacefeedError::InvalidInput("disk full".into()))
        }
    }

    fn record(title: &str) -> ExtractedRecord {
        ExtractedRecord {
            title: title.into(),
            address: "Jl. A".into(),
            phone: String::new(),
        }
    }

    fn query() -> LocationQuery {
        LocationQuery::new("cisaat", "Toko", None, "@-6.9,106.8,13z")
    }

    #[test]
    fn flush_hands_all_records_to_every_sink() {
        let store = Arc::new(Mutex::new(Vec::new()));
        let sinks: Vec<Box<dyn RecordSink>> = vec![
            Box::new(Collect(store.clone())),
            Box::new(Collect(store.clone())),
        ];

        let mut agg = ResultAggregator::new(query());
        agg.push(record("A"));
        agg.push(record("B"));
        assert_eq!(agg.flush(&sinks).unwrap(), 2);

        let stored = store.lock().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].0, "cisaat");
        let titles: Vec<_> = stored[0].1.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"]);
    }

    #[test]
    fn failing_sink_does_not_starve_others() {
        let store = Arc::new(Mutex::new(Vec::new()));
        let sinks: Vec<Box<dyn RecordSink>> =
            vec![Box::new(Broken), Box::new(Collect(store.clone()))];

        let mut agg = ResultAggregator::new(query());
        agg.push(record("A"));
        assert!(agg.flush(&sinks).is_err());
        assert_eq!(store.lock().unwrap().len(), 1);
    }
}
