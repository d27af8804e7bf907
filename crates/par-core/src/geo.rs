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

//! Geodetic primitives.
//!
//! Small-distance helpers shared by the projector, the scope geometry and the
//! traffic generator. The local projection is an equirectangular approximation
//! around a reference point; it is only meant for the few tens of nautical miles
//! a PAR display covers and is not valid for global distances.

/// Equatorial Earth radius in meters (WGS-84 semi-major axis).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Meters in one international nautical mile.
pub const METERS_PER_NM: f64 = 1852.0;

/// Feet in one nautical mile.
pub const FEET_PER_NM: f64 = 6076.12;

const EARTH_RADIUS_NM: f64 = EARTH_RADIUS_M / METERS_PER_NM;

/// Normalize a bearing in degrees to `[0, 360)`.
#[must_use]
pub fn normalize_bearing(bearing_deg: f64) -> f64 {
    let normalized = bearing_deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Project `(lat, lon)` onto a local east/north plane centered on `(lat0, lon0)`.
///
/// Returns `(east_m, north_m)`.
#[must_use]
pub fn geo_to_local(lat0: f64, lon0: f64, lat: f64, lon: f64) -> (f64, f64) {
    let east = (lon - lon0).to_radians() * lat0.to_radians().cos() * EARTH_RADIUS_M;
    let north = (lat - lat0).to_radians() * EARTH_RADIUS_M;
    (east, north)
}

/// Inverse of [`geo_to_local`]: local east/north meters back to `(lat, lon)`.
#[must_use]
pub fn local_to_geo(lat0: f64, lon0: f64, east_m: f64, north_m: f64) -> (f64, f64) {
    let lat = lat0 + (north_m / EARTH_RADIUS_M).to_degrees();
    let lon = lon0 + (east_m / (EARTH_RADIUS_M * lat0.to_radians().cos())).to_degrees();
    (lat, lon)
}

/// Great-circle destination reached from `(lat0, lon0)` after travelling
/// `distance_nm` on the initial `bearing_deg`.
///
/// Longitude is normalized to `[-180, 180)`. Physical plausibility of the
/// inputs is not checked.
#[must_use]
pub fn destination_from(lat0: f64, lon0: f64, bearing_deg: f64, distance_nm: f64) -> (f64, f64) {
    let angular = distance_nm / EARTH_RADIUS_NM;
    let bearing = bearing_deg.to_radians();
    let lat1 = lat0.to_radians();
    let lon1 = lon0.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    let lon_deg = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    (lat2.to_degrees(), lon_deg)
}

/// Initial great-circle bearing from point 1 to point 2 in degrees `[0, 360)`.
#[must_use]
pub fn bearing_to(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let x = delta_lon.sin() * lat2_rad.cos();
    let y = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    normalize_bearing(x.atan2(y).to_degrees())
}

/// Haversine distance between two points in nautical miles.
///
/// Uses the same sphere as [`destination_from`] so the two agree with each other.
#[must_use]
pub fn distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_NM * c
}

/// Smallest absolute difference between two bearings, in degrees `[0, 180]`.
#[must_use]
pub fn bearing_difference(a_deg: f64, b_deg: f64) -> f64 {
    let diff = normalize_bearing(a_deg - b_deg);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_round_trip_within_one_meter() {
        let origins = [(37.6188, -122.375), (-33.9461, 151.1772), (64.13, -21.94), (0.0, 179.5)];
        let offsets = [(0.0, 0.0), (0.5, 0.5), (-0.99, 0.3), (0.2, -0.99), (0.75, -0.75)];

        for (lat0, lon0) in origins {
            for (dlat, dlon) in offsets {
                let (lat, lon) = (lat0 + dlat, lon0 + dlon);
                let (east, north) = geo_to_local(lat0, lon0, lat, lon);
                let (lat_back, lon_back) = local_to_geo(lat0, lon0, east, north);
                let (err_e, err_n) = geo_to_local(lat, lon, lat_back, lon_back);
                assert!(
                    err_e.hypot(err_n) < 1.0,
                    "round trip error {:.3} m at ({lat}, {lon})",
                    err_e.hypot(err_n)
                );
            }
        }
    }

    #[test]
    fn test_geo_to_local_axes() {
        let (east, north) = geo_to_local(45.0, 10.0, 45.0, 10.1);
        assert!(east > 0.0);
        assert!(north.abs() < 1e-9);

        let (east, north) = geo_to_local(45.0, 10.0, 44.9, 10.0);
        assert!(east.abs() < 1e-9);
        assert!(north < 0.0);
    }

    #[test]
    fn test_destination_and_back() {
        let (lat0, lon0) = (37.6188, -122.375);
        for bearing in [0.0, 45.0, 117.0, 180.0, 270.0, 359.0] {
            for distance in [0.5, 5.0, 20.0] {
                let (lat, lon) = destination_from(lat0, lon0, bearing, distance);
                let back_bearing = bearing_to(lat, lon, lat0, lon0);
                let back_distance = distance_nm(lat, lon, lat0, lon0);

                assert!(
                    bearing_difference(back_bearing, bearing + 180.0) < 0.5,
                    "bearing {bearing} back {back_bearing}"
                );
                assert!((back_distance - distance).abs() / distance < 0.001);
            }
        }
    }

    #[test]
    fn test_destination_normalizes_longitude() {
        let (_, lon) = destination_from(0.0, 179.99, 90.0, 10.0);
        assert!((-180.0..180.0).contains(&lon));
        assert!(lon < 0.0);
    }

    #[test]
    fn test_distance_lax_jfk() {
        // LAX to JFK is approximately 2,150 nautical miles
        let distance = distance_nm(33.9425, -118.4081, 40.6413, -73.7781);
        assert!((distance - 2150.0).abs() < 15.0);
    }

    #[test]
    fn test_normalize_bearing() {
        assert!((normalize_bearing(450.0) - 90.0).abs() < 1e-12);
        assert!((normalize_bearing(-90.0) - 270.0).abs() < 1e-12);
        assert!(normalize_bearing(360.0).abs() < 1e-12);
        assert!((0.0..360.0).contains(&normalize_bearing(-1e-18)));
    }
}
