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

//! Per-callsign trail history for the three scopes.
//!
//! Redraws happen on a fixed tick that is independent of telemetry arrival, so
//! a trail only grows when the target has actually moved beyond a physical
//! tolerance. Each trail is capped at [`MAX_TRAIL_POINTS`] with the oldest
//! point evicted first.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::projection::Projection;

/// Maximum number of points kept per trail.
pub const MAX_TRAIL_POINTS: usize = 20;

/// Minimum position change (NM) for a new trail point.
pub const POSITION_TOLERANCE_NM: f64 = 0.01;

/// Minimum altitude change (feet) for a new vertical trail point.
pub const ALTITUDE_TOLERANCE_FT: f64 = 50.0;

/// One accepted trail point in physical units.
///
/// The meaning of `x`/`y` depends on the trail: along-track NM × altitude ft for
/// the vertical trail, along-track NM × cross-track NM for the azimuth trail and
/// east NM × north NM for the plan trail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub x: f64,
    pub y: f64,
}

impl TrailPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounded FIFO trail with change detection.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
    x_tolerance: f64,
    y_tolerance: f64,
}

impl Trail {
    #[must_use]
    pub fn new(x_tolerance: f64, y_tolerance: f64) -> Self {
        Self {
            points: VecDeque::with_capacity(MAX_TRAIL_POINTS + 1),
            x_tolerance,
            y_tolerance,
        }
    }

    /// Offer a candidate point. Returns `true` if it was appended.
    pub fn offer(&mut self, candidate: TrailPoint) -> bool {
        if !candidate.x.is_finite() || !candidate.y.is_finite() {
            return false;
        }

        let moved = match self.last_accepted() {
            Some(last) => {
                (candidate.x - last.x).abs() > self.x_tolerance
                    || (candidate.y - last.y).abs() > self.y_tolerance
            }
            None => true,
        };

        if moved {
            self.points.push_back(candidate);
            while self.points.len() > MAX_TRAIL_POINTS {
                self.points.pop_front();
            }
        }
        moved
    }

    /// The most recently accepted point. Eviction only removes from the front,
    /// so this is always the back of the trail.
    #[must_use]
    pub fn last_accepted(&self) -> Option<TrailPoint> {
        self.points.back().copied()
    }

    /// The most recent `count` points, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = TrailPoint> + '_ {
        let skip = self.points.len().saturating_sub(count);
        self.points.iter().skip(skip).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Opacity for the `index`-th of `count` history dots (oldest first).
///
/// Rises toward the most recent dot but stays below the full opacity reserved
/// for the current position.
#[must_use]
pub fn trail_opacity(index: usize, count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    (index.min(count - 1) + 1) as f32 / (count + 1) as f32
}

/// Trails for one callsign.
#[derive(Debug, Clone)]
pub struct TargetHistory {
    /// Along-track NM from threshold × altitude ft.
    pub vertical: Trail,
    /// Along-track NM × cross-track NM from threshold.
    pub azimuth: Trail,
    /// East NM × north NM from threshold.
    pub plan: Trail,
}

impl Default for TargetHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetHistory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vertical: Trail::new(POSITION_TOLERANCE_NM, ALTITUDE_TOLERANCE_FT),
            azimuth: Trail::new(POSITION_TOLERANCE_NM, POSITION_TOLERANCE_NM),
            plan: Trail::new(POSITION_TOLERANCE_NM, POSITION_TOLERANCE_NM),
        }
    }

    /// Feed one projection into the trails.
    ///
    /// The plan trail always takes the point; the course-relative trails only
    /// while the target is inside their scope.
    pub fn record(&mut self, projection: &Projection) {
        let along = projection.from_threshold.along_nm;

        if projection.in_vertical_scope {
            self.vertical.offer(TrailPoint::new(along, projection.altitude_ft));
        }
        if projection.in_azimuth_scope {
            self.azimuth
                .offer(TrailPoint::new(along, projection.from_threshold.cross_nm));
        }
        self.plan
            .offer(TrailPoint::new(projection.east_nm, projection.north_nm));
    }
}

/// Owner of every [`TargetHistory`], keyed by callsign identity key.
#[derive(Debug, Default)]
pub struct HistoryTracker {
    histories: HashMap<String, TargetHistory>,
}

impl HistoryTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a projection for `key`, creating the history on first sighting.
    pub fn record(&mut self, key: &str, projection: &Projection) -> &TargetHistory {
        let history = self.histories.entry(key.to_string()).or_insert_with(|| {
            debug!("Creating trail history for {key}");
            TargetHistory::new()
        });
        history.record(projection);
        history
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TargetHistory> {
        self.histories.get(key)
    }

    /// Destroy the history for `key`. Returns `true` if one existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.histories.remove(key).is_some();
        if removed {
            debug!("Dropped trail history for {key}");
        }
        removed
    }

    /// Destroy every history.
    pub fn clear(&mut self) {
        debug!("Dropping all {} trail histories", self.histories.len());
        self.histories.clear();
    }

    /// Keep only histories whose key is in `keys`.
    pub fn retain_keys(&mut self, keys: &[String]) {
        self.histories.retain(|key, _| keys.contains(key));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::CourseOffset;

    fn projection(along: f64, cross: f64, altitude: f64, in_scope: bool) -> Projection {
        Projection {
            from_sensor: CourseOffset { along_nm: along + 0.5, cross_nm: cross },
            from_threshold: CourseOffset { along_nm: along, cross_nm: cross },
            east_nm: along,
            north_nm: cross,
            altitude_ft: altitude,
            azimuth_deg: 0.0,
            elevation_deg: 3.0,
            in_azimuth_scope: in_scope,
            in_vertical_scope: in_scope,
            is_ground_traffic: false,
        }
    }

    #[test]
    fn test_identical_updates_keep_single_point() {
        let mut tracker = HistoryTracker::new();
        let p = projection(5.0, 0.0, 1600.0, true);
        for _ in 0..1000 {
            tracker.record("UAL1", &p);
        }

        let history = tracker.get("UAL1").unwrap();
        assert_eq!(history.vertical.len(), 1);
        assert_eq!(history.azimuth.len(), 1);
        assert_eq!(history.plan.len(), 1);
    }

    #[test]
    fn test_jitter_within_tolerance_ignored() {
        let mut tracker = HistoryTracker::new();
        for i in 0..100 {
            let jitter = if i % 2 == 0 { 0.004 } else { -0.004 };
            tracker.record("UAL1", &projection(5.0 + jitter, jitter, 1600.0 + jitter * 1000.0, true));
        }
        assert_eq!(tracker.get("UAL1").unwrap().plan.len(), 1);
    }

    #[test]
    fn test_trail_capped_and_evicts_oldest() {
        let mut tracker = HistoryTracker::new();
        for i in 0..500 {
            tracker.record("UAL1", &projection(10.0 - f64::from(i) * 0.02, 0.0, 3000.0 - f64::from(i) * 60.0, true));
        }

        let history = tracker.get("UAL1").unwrap();
        assert_eq!(history.vertical.len(), MAX_TRAIL_POINTS);
        assert_eq!(history.azimuth.len(), MAX_TRAIL_POINTS);
        assert_eq!(history.plan.len(), MAX_TRAIL_POINTS);

        let oldest = history.plan.recent(MAX_TRAIL_POINTS).next().unwrap();
        assert!((oldest.x - (10.0 - 480.0 * 0.02)).abs() < 1e-9);
        let newest = history.plan.last_accepted().unwrap();
        assert!((newest.x - (10.0 - 499.0 * 0.02)).abs() < 1e-9);
    }

    #[test]
    fn test_altitude_change_only_affects_vertical_trail() {
        let mut tracker = HistoryTracker::new();
        tracker.record("UAL1", &projection(5.0, 0.0, 1600.0, true));
        tracker.record("UAL1", &projection(5.0, 0.0, 1660.0, true));

        let history = tracker.get("UAL1").unwrap();
        assert_eq!(history.vertical.len(), 2);
        assert_eq!(history.azimuth.len(), 1);
        assert_eq!(history.plan.len(), 1);
    }

    #[test]
    fn test_out_of_scope_only_feeds_plan_trail() {
        let mut tracker = HistoryTracker::new();
        tracker.record("UAL1", &projection(-2.0, 0.0, 1600.0, false));
        tracker.record("UAL1", &projection(-2.5, 0.0, 1600.0, false));

        let history = tracker.get("UAL1").unwrap();
        assert!(history.vertical.is_empty());
        assert!(history.azimuth.is_empty());
        assert_eq!(history.plan.len(), 2);
    }

    #[test]
    fn test_recent_decimation() {
        let mut trail = Trail::new(POSITION_TOLERANCE_NM, POSITION_TOLERANCE_NM);
        for i in 0..10 {
            trail.offer(TrailPoint::new(f64::from(i), 0.0));
        }
        let recent: Vec<f64> = trail.recent(3).map(|p| p.x).collect();
        assert_eq!(recent, vec![7.0, 8.0, 9.0]);
        assert_eq!(trail.recent(50).count(), 10);
    }

    #[test]
    fn test_non_finite_points_rejected() {
        let mut trail = Trail::new(POSITION_TOLERANCE_NM, POSITION_TOLERANCE_NM);
        assert!(!trail.offer(TrailPoint::new(f64::NAN, 0.0)));
        assert!(!trail.offer(TrailPoint::new(0.0, f64::INFINITY)));
        assert!(trail.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut tracker = HistoryTracker::new();
        tracker.record("A", &projection(5.0, 0.0, 1600.0, true));
        tracker.record("B", &projection(5.0, 0.0, 1600.0, true));
        tracker.record("C", &projection(5.0, 0.0, 1600.0, true));

        assert!(tracker.remove("A"));
        assert!(!tracker.remove("A"));
        assert_eq!(tracker.len(), 2);

        tracker.retain_keys(&["B".to_string()]);
        assert!(tracker.get("B").is_some());
        assert!(tracker.get("C").is_none());

        tracker.clear();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_trail_opacity_increases() {
        let count = 5;
        let opacities: Vec<f32> = (0..count).map(|i| trail_opacity(i, count)).collect();
        assert!(opacities.windows(2).all(|w| w[0] < w[1]));
        assert!(opacities[count - 1] < 1.0);
        assert!(trail_opacity(0, 0).abs() < f32::EPSILON);
    }
}
