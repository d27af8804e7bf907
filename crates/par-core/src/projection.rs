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

//! Target projection into the approach-course frame.
//!
//! Each snapshot is placed relative to the sensor and to the threshold, rotated
//! so that along-track runs out along final and cross-track is perpendicular to
//! it, and then classified for the vertical and azimuth scopes.
//!
//! Sign conventions:
//! - along-track is positive out on final, where inbound traffic is;
//! - cross-track is positive toward `approach bearing + 90°`, i.e. to the right
//!   when looking from the sensor out along the approach.

use crate::geo::{geo_to_local, FEET_PER_NM, METERS_PER_NM};
use crate::runway::RunwayConfiguration;
use crate::sensor::SensorFrame;
use crate::snapshot::AircraftSnapshot;

/// Along-track distance below which angles are not computed.
pub const ANGLE_GUARD_NM: f64 = 0.01;

/// Extra distance on the sensor side of the azimuth window.
pub const NEAR_EDGE_BUFFER_NM: f64 = 0.3;

/// Extra distance beyond the display range of the azimuth window.
pub const FAR_EDGE_BUFFER_NM: f64 = 0.5;

/// Lowest elevation angle shown in the vertical scope.
pub const MIN_ELEVATION_DEG: f64 = -1.0;

/// Fixed AGL buffer under which a target is always ground traffic.
pub const GROUND_BUFFER_FT: f64 = 20.0;

/// Slope of the ground-traffic boundary away from the threshold.
pub const GROUND_SLOPE_DEG: f64 = 0.5;

/// Offsets measured in the approach-course frame, in nautical miles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CourseOffset {
    pub along_nm: f64,
    pub cross_nm: f64,
}

impl CourseOffset {
    /// Rotate local east/north meters into the course frame for `bearing_deg`.
    #[must_use]
    pub fn from_local(east_m: f64, north_m: f64, bearing_deg: f64) -> Self {
        let (sin_b, cos_b) = bearing_deg.to_radians().sin_cos();
        let along = north_m * cos_b + east_m * sin_b;
        let cross = -north_m * sin_b + east_m * cos_b;
        Self {
            along_nm: along / METERS_PER_NM,
            cross_nm: cross / METERS_PER_NM,
        }
    }
}

/// Result of projecting one snapshot for one redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Course-frame offsets from the sensor.
    pub from_sensor: CourseOffset,
    /// Course-frame offsets from the threshold.
    pub from_threshold: CourseOffset,
    /// East offset from the threshold (plan view).
    pub east_nm: f64,
    /// North offset from the threshold (plan view).
    pub north_nm: f64,
    /// Altitude in feet MSL.
    pub altitude_ft: f64,
    /// Lateral angle off course seen from the threshold, degrees.
    pub azimuth_deg: f64,
    /// Angle above the field seen from the threshold, degrees.
    pub elevation_deg: f64,
    pub in_azimuth_scope: bool,
    pub in_vertical_scope: bool,
    pub is_ground_traffic: bool,
}

/// Whether a target at `altitude_ft`, `distance_nm` from the threshold in any
/// direction, is on the ground.
///
/// The boundary is the higher of a fixed 20 ft AGL buffer and a half-degree
/// slope rising from the threshold.
#[must_use]
pub fn is_ground_traffic(altitude_ft: f64, field_elevation_ft: f64, distance_nm: f64) -> bool {
    let distance_ft = distance_nm.abs() * FEET_PER_NM;
    let sloped = field_elevation_ft + GROUND_SLOPE_DEG.to_radians().tan() * distance_ft;
    altitude_ft < (field_elevation_ft + GROUND_BUFFER_FT).max(sloped)
}

/// Project a snapshot against the runway configuration and its sensor frame.
#[must_use]
pub fn project(
    snapshot: &AircraftSnapshot,
    config: &RunwayConfiguration,
    frame: &SensorFrame,
) -> Projection {
    let bearing = frame.approach_bearing_deg;

    let (sensor_east, sensor_north) =
        geo_to_local(frame.sensor_lat, frame.sensor_lon, snapshot.latitude, snapshot.longitude);
    let (thr_east, thr_north) =
        geo_to_local(config.threshold_lat, config.threshold_lon, snapshot.latitude, snapshot.longitude);

    let from_sensor = CourseOffset::from_local(sensor_east, sensor_north, bearing);
    let from_threshold = CourseOffset::from_local(thr_east, thr_north, bearing);

    let along = from_threshold.along_nm;
    let height_ft = snapshot.altitude_ft - config.field_elevation_ft;

    // Near the origin atan2 degenerates; leave both angles at zero there.
    let (azimuth_deg, elevation_deg) = if along.abs() > ANGLE_GUARD_NM {
        (
            from_threshold.cross_nm.atan2(along).to_degrees(),
            (height_ft / (along * FEET_PER_NM)).atan().to_degrees(),
        )
    } else {
        (0.0, 0.0)
    };

    let near_edge = -frame.offset_nm - NEAR_EDGE_BUFFER_NM;
    let far_edge = config.range_nm + FAR_EDGE_BUFFER_NM;
    let in_azimuth_scope = azimuth_deg.abs() <= config.half_cone_deg()
        && (near_edge..=far_edge).contains(&along);
    let in_vertical_scope = in_azimuth_scope
        && (MIN_ELEVATION_DEG..=config.max_elevation_deg).contains(&elevation_deg);

    Projection {
        from_sensor,
        from_threshold,
        east_nm: thr_east / METERS_PER_NM,
        north_nm: thr_north / METERS_PER_NM,
        altitude_ft: snapshot.altitude_ft,
        azimuth_deg,
        elevation_deg,
        in_azimuth_scope,
        in_vertical_scope,
        is_ground_traffic: is_ground_traffic(
            snapshot.altitude_ft,
            config.field_elevation_ft,
            thr_east.hypot(thr_north) / METERS_PER_NM,
        ),
    }
}
