// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runway reference data.
//!
//! Loads runway ends from an OurAirports-style `runways.csv`, where each row
//! describes both ends of one runway (`le_*` and `he_*` columns). Closed
//! runways and ends without coordinates are skipped.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::geo::{bearing_to, normalize_bearing};
use crate::pairing::{pair_runway_ends, RunwayIdent};
use crate::runway::RunwayConfiguration;

/// File name of the runway table inside a reference-data directory.
pub const RUNWAYS_FILE: &str = "runways.csv";

/// Errors that can occur while loading reference data.
#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("failed to open runway data: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed runway data: {0}")]
    Csv(#[from] csv::Error),
}

/// One runway end as known to the reference data.
#[derive(Debug, Clone, PartialEq)]
pub struct RunwayEnd {
    /// Designator as listed (e.g. "09L").
    pub runway_id: String,
    /// Threshold latitude in degrees.
    pub latitude: f64,
    /// Threshold longitude in degrees.
    pub longitude: f64,
    /// True heading in degrees, when listed.
    pub heading_deg: Option<f64>,
    /// Threshold elevation in feet, when listed.
    pub elevation_ft: Option<f64>,
}

impl RunwayEnd {
    #[must_use]
    pub fn new(runway_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            runway_id: runway_id.into(),
            latitude,
            longitude,
            heading_deg: None,
            elevation_ft: None,
        }
    }
}

/// Source of runway ends for an airport.
///
/// An unknown airport yields an empty list rather than an error.
pub trait RunwayEndSource {
    fn runway_ends(&self, airport: &str) -> Vec<RunwayEnd>;
}

/// A source with no reference data at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReferenceData;

impl RunwayEndSource for NoReferenceData {
    fn runway_ends(&self, _airport: &str) -> Vec<RunwayEnd> {
        Vec::new()
    }
}

#[derive(Debug, Deserialize)]
struct RunwayRecord {
    airport_ident: String,
    #[serde(default)]
    closed: Option<i32>,

    #[serde(default)]
    le_ident: String,
    #[serde(default)]
    le_latitude_deg: Option<f64>,
    #[serde(default)]
    le_longitude_deg: Option<f64>,
    #[serde(default)]
    le_elevation_ft: Option<f64>,
    #[serde(default, rename = "le_heading_degT")]
    le_heading_deg: Option<f64>,

    #[serde(default)]
    he_ident: String,
    #[serde(default)]
    he_latitude_deg: Option<f64>,
    #[serde(default)]
    he_longitude_deg: Option<f64>,
    #[serde(default)]
    he_elevation_ft: Option<f64>,
    #[serde(default, rename = "he_heading_degT")]
    he_heading_deg: Option<f64>,
}

impl RunwayRecord {
    fn is_active(&self) -> bool {
        self.closed.unwrap_or(0) == 0
    }

    fn ends(self) -> impl Iterator<Item = RunwayEnd> {
        let low = end_from(self.le_ident, self.le_latitude_deg, self.le_longitude_deg, self.le_heading_deg, self.le_elevation_ft);
        let high = end_from(self.he_ident, self.he_latitude_deg, self.he_longitude_deg, self.he_heading_deg, self.he_elevation_ft);
        low.into_iter().chain(high)
    }
}

fn end_from(
    ident: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    heading_deg: Option<f64>,
    elevation_ft: Option<f64>,
) -> Option<RunwayEnd> {
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return None;
    };
    if ident.trim().is_empty() {
        return None;
    }
    Some(RunwayEnd {
        runway_id: ident.trim().to_string(),
        latitude,
        longitude,
        heading_deg,
        elevation_ft,
    })
}

/// Runway ends grouped by airport, in file order.
#[derive(Debug, Default)]
pub struct RunwayDatabase {
    ends_by_airport: HashMap<String, Vec<RunwayEnd>>,
}

impl RunwayDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `runways.csv` from a file path.
    pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceDataError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load `runways.csv` from `<directory>/runways.csv`.
    pub fn load_directory<P: AsRef<Path>>(directory: P) -> Result<Self, ReferenceDataError> {
        Self::load_path(directory.as_ref().join(RUNWAYS_FILE))
    }

    /// Parse runway rows from any CSV reader with a header line.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceDataError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut db = Self::new();

        let mut runways = 0;
        for result in csv_reader.deserialize() {
            let record: RunwayRecord = result?;
            if !record.is_active() {
                continue;
            }
            let airport = record.airport_ident.trim().to_ascii_uppercase();
            let ends: Vec<RunwayEnd> = record.ends().collect();
            if ends.is_empty() {
                continue;
            }
            db.ends_by_airport.entry(airport).or_default().extend(ends);
            runways += 1;
        }

        info!(
            "Loaded {} runways at {} airports",
            runways,
            db.ends_by_airport.len()
        );
        Ok(db)
    }

    /// Number of airports with at least one runway end.
    #[must_use]
    pub fn airport_count(&self) -> usize {
        self.ends_by_airport.len()
    }

    /// Build a runway configuration for `runway_id` at `airport`.
    ///
    /// The heading comes from the reference data, or from the bearing toward the
    /// reciprocal end when the data has none. Approach parameters other than the
    /// threshold, heading and field elevation keep their defaults.
    #[must_use]
    pub fn configuration_for(&self, airport: &str, runway_id: &str) -> Option<RunwayConfiguration> {
        let ends = self.runway_ends(airport);
        let wanted = RunwayIdent::parse(runway_id)?;
        let index = ends
            .iter()
            .position(|end| RunwayIdent::parse(&end.runway_id) == Some(wanted))?;
        let end = &ends[index];

        let reciprocal = pair_runway_ends(&ends).into_iter().find_map(|(a, b)| {
            if a == index {
                Some(&ends[b])
            } else if b == index {
                Some(&ends[a])
            } else {
                None
            }
        });

        let heading_deg = end.heading_deg.or_else(|| {
            reciprocal.map(|other| bearing_to(end.latitude, end.longitude, other.latitude, other.longitude))
        });
        let Some(heading_deg) = heading_deg else {
            debug!("No heading available for {airport} {runway_id}");
            return None;
        };

        Some(RunwayConfiguration {
            airport: airport.trim().to_ascii_uppercase(),
            runway: end.runway_id.clone(),
            threshold_lat: end.latitude,
            threshold_lon: end.longitude,
            heading_deg: normalize_bearing(heading_deg),
            field_elevation_ft: end.elevation_ft.unwrap_or(0.0),
            ..RunwayConfiguration::demo()
        })
    }
}

impl RunwayEndSource for RunwayDatabase {
    fn runway_ends(&self, airport: &str) -> Vec<RunwayEnd> {
        self.ends_by_airport
            .get(&airport.trim().to_ascii_uppercase())
            .cloned()
            .unwrap_or_default()
    }
}
