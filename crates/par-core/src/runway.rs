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

//! Runway configuration the scopes are referenced to.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo::FEET_PER_NM;

/// Sensor offset used when the configured one is unset or non-positive.
pub const DEFAULT_SENSOR_OFFSET_NM: f64 = 0.5;

/// Airport code of the built-in demonstration configuration.
pub const DEMO_AIRPORT: &str = "DEMO";

/// Approach runway setup for one redraw pass.
///
/// Treated as a read-only value: the operator may edit it between passes and the
/// next redraw simply uses the new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunwayConfiguration {
    /// Airport identifier (e.g. "KSFO").
    pub airport: String,
    /// Runway identifier of the approach end (e.g. "28L").
    pub runway: String,
    /// Threshold latitude in degrees.
    pub threshold_lat: f64,
    /// Threshold longitude in degrees.
    pub threshold_lon: f64,
    /// Runway true heading in degrees.
    pub heading_deg: f64,
    /// Glide-slope angle in degrees.
    pub glide_slope_deg: f64,
    /// Threshold-crossing height in feet.
    pub threshold_crossing_height_ft: f64,
    /// Field elevation in feet MSL.
    pub field_elevation_ft: f64,
    /// Display range beyond the threshold in nautical miles.
    pub range_nm: f64,
    /// Decision height in feet above field elevation.
    pub decision_height_ft: f64,
    /// Total azimuth cone in degrees (half on each side of the course).
    pub azimuth_cone_deg: f64,
    /// Distance of the sensor behind the threshold in nautical miles.
    pub sensor_offset_nm: f64,
    /// Vertical ceiling of the elevation scope in degrees.
    pub max_elevation_deg: f64,
}

impl Default for RunwayConfiguration {
    fn default() -> Self {
        Self::demo()
    }
}

impl RunwayConfiguration {
    /// Fixed demonstration configuration used whenever no runway is selected.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            airport: DEMO_AIRPORT.to_string(),
            runway: "27".to_string(),
            threshold_lat: 37.0,
            threshold_lon: -122.0,
            heading_deg: 270.0,
            glide_slope_deg: 3.0,
            threshold_crossing_height_ft: 50.0,
            field_elevation_ft: 0.0,
            range_nm: 10.0,
            decision_height_ft: 200.0,
            azimuth_cone_deg: 20.0,
            sensor_offset_nm: DEFAULT_SENSOR_OFFSET_NM,
            max_elevation_deg: 6.0,
        }
    }

    /// Use the given configuration, or fall back to [`RunwayConfiguration::demo`].
    #[must_use]
    pub fn or_demo(config: Option<&Self>) -> Self {
        if let Some(config) = config {
            config.clone()
        } else {
            debug!("No runway configured, using {DEMO_AIRPORT} configuration");
            Self::demo()
        }
    }

    /// Whether this is the built-in demonstration configuration.
    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.airport == DEMO_AIRPORT
    }

    /// Sensor offset with the default substituted for unset or non-positive values.
    #[must_use]
    pub fn effective_sensor_offset_nm(&self) -> f64 {
        if self.sensor_offset_nm.is_finite() && self.sensor_offset_nm > 0.0 {
            self.sensor_offset_nm
        } else {
            DEFAULT_SENSOR_OFFSET_NM
        }
    }

    /// Half of the azimuth cone: the deviation allowed on each side of the course.
    #[must_use]
    pub fn half_cone_deg(&self) -> f64 {
        (self.azimuth_cone_deg / 2.0).max(0.0)
    }

    /// Distance from the threshold back to the touchdown point, where the glide
    /// slope meets the field elevation.
    #[must_use]
    pub fn touchdown_offset_nm(&self) -> f64 {
        let tan_gs = self.glide_slope_deg.to_radians().tan();
        if tan_gs <= 0.0 || !tan_gs.is_finite() {
            return 0.0;
        }
        (self.threshold_crossing_height_ft / tan_gs) / FEET_PER_NM
    }

    /// Glide-slope altitude (feet MSL) at `along_nm` from the threshold.
    #[must_use]
    pub fn glide_slope_altitude_ft(&self, along_nm: f64) -> f64 {
        self.field_elevation_ft
            + self.threshold_crossing_height_ft
            + self.glide_slope_deg.to_radians().tan() * along_nm * FEET_PER_NM
    }

    /// Total horizontal extent of the range scopes: display range plus sensor offset.
    #[must_use]
    pub fn scope_span_nm(&self) -> f64 {
        self.range_nm.max(0.0) + self.effective_sensor_offset_nm()
    }

    /// Short label such as `KSFO 28L`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.airport, self.runway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_offset_default() {
        let mut config = RunwayConfiguration::demo();
        config.sensor_offset_nm = 0.0;
        assert!((config.effective_sensor_offset_nm() - DEFAULT_SENSOR_OFFSET_NM).abs() < 1e-12);
        config.sensor_offset_nm = -2.0;
        assert!((config.effective_sensor_offset_nm() - DEFAULT_SENSOR_OFFSET_NM).abs() < 1e-12);
        config.sensor_offset_nm = 0.8;
        assert!((config.effective_sensor_offset_nm() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_touchdown_offset() {
        let config = RunwayConfiguration::demo();
        // 50 ft TCH on a 3 degree slope lands ~954 ft before the threshold
        let expected = (50.0 / 3.0_f64.to_radians().tan()) / FEET_PER_NM;
        assert!((config.touchdown_offset_nm() - expected).abs() < 1e-12);
        assert!((config.glide_slope_altitude_ft(-expected) - config.field_elevation_ft).abs() < 1e-6);
    }

    #[test]
    fn test_flat_glide_slope_has_no_touchdown_offset() {
        let mut config = RunwayConfiguration::demo();
        config.glide_slope_deg = 0.0;
        assert!(config.touchdown_offset_nm().abs() < f64::EPSILON);
    }

    #[test]
    fn test_or_demo() {
        assert!(RunwayConfiguration::or_demo(None).is_demo());

        let mut custom = RunwayConfiguration::demo();
        custom.airport = "KSFO".to_string();
        assert_eq!(RunwayConfiguration::or_demo(Some(&custom)).airport, "KSFO");
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: RunwayConfiguration =
            serde_json::from_str(r#"{"airport":"KOAK","runway":"30","range_nm":15.0}"#).unwrap();
        assert_eq!(config.label(), "KOAK 30");
        assert!((config.range_nm - 15.0).abs() < 1e-12);
        assert!((config.glide_slope_deg - 3.0).abs() < 1e-12);
    }
}
