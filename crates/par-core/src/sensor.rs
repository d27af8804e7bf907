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

//! Sensor frame resolution.
//!
//! The radar sensor sits on the runway side of the threshold, along the runway
//! heading, at the configured offset. The approach course points the other way:
//! from the threshold out along final.

use crate::geo::{destination_from, normalize_bearing};
use crate::runway::RunwayConfiguration;

/// Sensor position and approach-course bearing for one redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    /// Sensor latitude in degrees.
    pub sensor_lat: f64,
    /// Sensor longitude in degrees.
    pub sensor_lon: f64,
    /// Bearing from the threshold out along final (runway heading + 180).
    pub approach_bearing_deg: f64,
    /// Sensor offset actually used, after defaulting.
    pub offset_nm: f64,
}

impl SensorFrame {
    /// Derive the frame from a runway configuration.
    #[must_use]
    pub fn resolve(config: &RunwayConfiguration) -> Self {
        let offset_nm = config.effective_sensor_offset_nm();
        let (sensor_lat, sensor_lon) = destination_from(
            config.threshold_lat,
            config.threshold_lon,
            normalize_bearing(config.heading_deg),
            offset_nm,
        );

        Self {
            sensor_lat,
            sensor_lon,
            approach_bearing_deg: normalize_bearing(config.heading_deg + 180.0),
            offset_nm,
        }
    }
}
