// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Positions file: the named geographic points a batch run visits.
//!
//! The file is a JSON array:
//!
//! ```json
//! [
//!   { "name": "Cikole", "area": ", Cikole, Sukabumi", "latitude": -6.889, "longitude": 106.873, "zoom": 13 },
//!   { "name": "Cisaat", "latitude": -6.902, "longitude": 106.887 }
//! ]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{LocationQuery, PlacefeedError, PlacefeedResult};

/// Zoom level used when a point does not specify one.
pub const DEFAULT_ZOOM: u8 = 13;

/// One named point in the positions file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub name: String,
    #[serde(default)]
    pub area: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub zoom: Option<u8>,
}

impl GeoPoint {
    /// Map viewport token, e.g. `@-6.8890102,106.873541,13z`.
    pub fn coordinate_token(&self) -> String {
        format!(
            "@{},{},{}z",
            self.latitude,
            self.longitude,
            self.zoom.unwrap_or(DEFAULT_ZOOM)
        )
    }

    /// Pair this point with a search phrase.
    pub fn to_query(&self, search_term: &str) -> LocationQuery {
        LocationQuery::new(
            self.name.clone(),
            search_term,
            self.area.clone(),
            self.coordinate_token(),
        )
    }

    fn validate(&self, index: usize) -> PlacefeedResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(PlacefeedError::InvalidInput(format!(
                "position #{index} ({}) is out of range: {}, {}",
                self.name, self.latitude, self.longitude
            )));
        }
        if self.zoom.is_some_and(|z| !(1..=21).contains(&z)) {
            return Err(PlacefeedError::InvalidInput(format!(
                "position #{index} ({}) has zoom outside 1..=21",
                self.name
            )));
        }
        Ok(())
    }
}

/// Read and validate the positions file.
pub fn load_positions(path: &Path) -> PlacefeedResult<Vec<GeoPoint>> {
    let data = fs::read_to_string(path).map_err(|e| {
        PlacefeedError::InvalidInput(format!("cannot read positions file {}: {e}", path.display()))
    })?;
    parse_positions(&data)
}

/// Parse and validate positions JSON.
pub fn parse_positions(data: &str) -> PlacefeedResult<Vec<GeoPoint>> {
    let points: Vec<GeoPoint> = serde_json::from_str(data)?;
    for (index, point) in points.iter().enumerate() {
        point.validate(index)?;
    }
    Ok(points)
}
