// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! JSON and CSV persistence for extracted records.

use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::RecordSink;
use crate::types::{ExtractedRecord, LocationQuery, PlacefeedResult};

/// CSV header row.
pub const CSV_HEADER: [&str; 3] = ["title", "address", "phone"];

/// Overwrite `path` with the records as a pretty-printed JSON array.
pub fn save_json(path: &Path, records: &[ExtractedRecord]) -> PlacefeedResult<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), records = records.len(), "saved JSON");
    Ok(())
}

/// Overwrite `path` with a header row followed by one row per record.
pub fn save_csv(path: &Path, records: &[ExtractedRecord]) -> PlacefeedResult<()> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([&record.title, &record.address, &record.phone])?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), records = records.len(), "saved CSV");
    Ok(())
}

/// Load records saved by [`save_json`]. `Ok(None)` when the file does not exist.
pub fn load_json(path: &Path) -> PlacefeedResult<Option<Vec<ExtractedRecord>>> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no saved records");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&data)?))
}

fn ensure_parent(path: &Path) -> PlacefeedResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// File-name-safe form of a point label: lowercase ASCII alphanumerics
/// separated by single dashes.
pub fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "point".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes `<dir>/<slug>.json` and/or `<dir>/<slug>.csv` for each point.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    json: bool,
    csv: bool,
}

impl FileSink {
    /// JSON and CSV output under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            json: true,
            csv: true,
        }
    }

    pub fn json_only(dir: impl Into<PathBuf>) -> Self {
        Self {
            csv: false,
            ..Self::new(dir)
        }
    }

    pub fn json_path(&self, query: &LocationQuery) -> PathBuf {
        self.dir.join(format!("{}.json", slug(&query.label)))
    }

    pub fn csv_path(&self, query: &LocationQuery) -> PathBuf {
        self.dir.join(format!("{}.csv", slug(&query.label)))
    }
}

impl RecordSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn persist(&self, query: &LocationQuery, records: &[ExtractedRecord]) -> PlacefeedResult<()> {
        if self.json {
            save_json(&self.json_path(query), records)?;
        }
        if self.csv {
            save_csv(&self.csv_path(query), records)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn records() -> Vec<ExtractedRecord> {
        vec![
            ExtractedRecord {
                title: "Kedai Kopi, Cikole".into(),
                address: "Jl. Contoh No. 1".into(),
                phone: "0812345".into(),
            },
            ExtractedRecord {
                title: "Toko \"Maju\"".into(),
                address: "No address".into(),
                phone: String::new(),
            },
        ]
    }

    #[test]
    fn json_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.json");
        save_json(&path, &records()).unwrap();
        let loaded = load_json(&path).unwrap().unwrap();
        assert_eq!(loaded, records());
    }

    #[test]
    fn json_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        save_json(&path, &records()).unwrap();
        save_json(&path, &records()[..1]).unwrap();
        assert_eq!(load_json(&path).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_json(&dir.path().join("missing.json")).unwrap().is_none());
    }

    #[test]
    fn load_corrupt_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_json(&path).is_err());
    }

    #[test]
    fn csv_has_header_and_quotes_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        save_csv(&path, &records()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "title,address,phone");
        assert_eq!(lines[1], "\"Kedai Kopi, Cikole\",Jl. Contoh No. 1,0812345");
        assert_eq!(lines[2], "\"Toko \"\"Maju\"\"\",No address,");
    }

    #[test]
    fn csv_with_no_records_is_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        save_csv(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim_end(), "title,address,phone");
    }

    #[test]
    fn slug_is_file_safe() {
        assert_eq!(slug("Cisaat, Sukabumi"), "cisaat-sukabumi");
        assert_eq!(slug("  --Kota Bogor!! "), "kota-bogor");
        assert_eq!(slug("???"), "point");
    }

    #[test]
    fn file_sink_writes_both_formats() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path());
        let query = LocationQuery::new("Cikole", "Toko", None, "@-6.8,106.8,13z");
        sink.persist(&query, &records()).unwrap();
        assert!(dir.path().join("cikole.json").exists());
        assert!(dir.path().join("cikole.csv").exists());

        let json_only = FileSink::json_only(dir.path().join("j"));
        json_only.persist(&query, &records()).unwrap();
        assert!(json_only.json_path(&query).exists());
        assert!(!json_only.csv_path(&query).exists());
    }
}
