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

//! Per-redraw frame composition.
//!
//! [`ScopeEngine`] owns the only state that survives between redraws: the
//! trail histories. Each call to [`ScopeEngine::compose`] drains store events,
//! rebuilds the scope geometry and turns the current snapshots into markers.

use log::{debug, warn};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::draw::{MarkerKind, Point, Primitive, ScopeCanvases, ScopeDrawing};
use crate::geometry::ScopeGeometry;
use crate::history::{trail_opacity, HistoryTracker, Trail, TrailPoint, MAX_TRAIL_POINTS};
use crate::projection::project;
use crate::reference::RunwayEndSource;
use crate::runway::RunwayConfiguration;
use crate::snapshot::{SnapshotStore, TelemetryEvent};

pub const DEFAULT_HISTORY_DOTS: usize = 5;

/// User-adjustable display options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySettings {
    history_dots: usize,
    pub show_ground: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DOTS, false)
    }
}

impl DisplaySettings {
    /// `history_dots` is clamped to `1..=20`.
    #[must_use]
    pub fn new(history_dots: usize, show_ground: bool) -> Self {
        Self {
            history_dots: history_dots.clamp(1, MAX_TRAIL_POINTS),
            show_ground,
        }
    }

    #[must_use]
    pub fn history_dots(&self) -> usize {
        self.history_dots
    }

    pub fn set_history_dots(&mut self, history_dots: usize) {
        self.history_dots = history_dots.clamp(1, MAX_TRAIL_POINTS);
    }
}

/// Counts for one composed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Snapshots in the store when the frame was composed.
    pub targets: usize,
    pub vertical_targets: usize,
    pub azimuth_targets: usize,
    pub plan_targets: usize,
    /// Ground targets suppressed because "show ground" is off.
    pub ground_hidden: usize,
}

/// Draw lists for all three scopes.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The configuration the frame was drawn for, after the demo fallback.
    pub config: RunwayConfiguration,
    pub vertical: ScopeDrawing,
    pub azimuth: ScopeDrawing,
    pub plan: ScopeDrawing,
    pub stats: FrameStats,
}

/// Redraw engine for the three scopes.
#[derive(Debug)]
pub struct ScopeEngine {
    history: HistoryTracker,
    events: broadcast::Receiver<TelemetryEvent>,
}

impl ScopeEngine {
    /// Create an engine subscribed to `store` events.
    #[must_use]
    pub fn new(store: &SnapshotStore) -> Self {
        Self {
            history: HistoryTracker::new(),
            events: store.subscribe(),
        }
    }

    #[must_use]
    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    /// Apply queued delete/reset events to the histories.
    ///
    /// If the event channel overflowed, histories are reconciled against the
    /// store's current callsigns instead.
    pub fn apply_pending_events(&mut self, store: &SnapshotStore) {
        let mut lagged = false;
        loop {
            match self.events.try_recv() {
                Ok(TelemetryEvent::Deleted(key)) => {
                    self.history.remove(&key);
                }
                Ok(TelemetryEvent::Reset) => self.history.clear(),
                Ok(TelemetryEvent::Added(_) | TelemetryEvent::Updated(_)) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} telemetry events, reconciling histories");
                    lagged = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        if lagged {
            self.history.retain_keys(&store.callsigns());
        }
    }

    /// Compose one frame from the current store contents.
    ///
    /// A missing configuration falls back to the demo configuration.
    pub fn compose(
        &mut self,
        store: &SnapshotStore,
        config: Option<&RunwayConfiguration>,
        settings: &DisplaySettings,
        runway_source: &dyn RunwayEndSource,
        canvases: ScopeCanvases,
    ) -> Frame {
        self.apply_pending_events(store);

        let config = RunwayConfiguration::or_demo(config);
        let runway_ends = runway_source.runway_ends(&config.airport);
        let geometry = ScopeGeometry::build(&config, canvases, &runway_ends);

        let mut vertical = ScopeDrawing::with_background(geometry.vertical_background.clone());
        let mut azimuth = ScopeDrawing::with_background(geometry.azimuth_background.clone());
        let mut plan = ScopeDrawing::with_background(geometry.plan_background.clone());

        let snapshots = store.snapshot_all();
        let mut stats = FrameStats {
            targets: snapshots.len(),
            ..FrameStats::default()
        };
        let dots = settings.history_dots();

        // Current markers go on top of every trail
        let mut vertical_markers = Vec::new();
        let mut azimuth_markers = Vec::new();
        let mut plan_markers = Vec::new();

        for snapshot in &snapshots {
            let key = snapshot.key();
            let projection = project(snapshot, &config, &geometry.frame);

            if projection.is_ground_traffic && !settings.show_ground {
                stats.ground_hidden += 1;
                continue;
            }
            let kind = if projection.is_ground_traffic {
                MarkerKind::Ground
            } else {
                MarkerKind::Target
            };

            let history = self.history.record(&key, &projection);
            let along = projection.from_threshold.along_nm;

            if projection.in_vertical_scope {
                let canvas = canvases.vertical;
                push_trail(&mut vertical, &history.vertical, dots, |p| {
                    canvas.clamp(geometry.vertical_point(p.x, p.y))
                });
                if let Some(at) = canvas.clamp(geometry.vertical_point(along, projection.altitude_ft)) {
                    vertical_markers.push(current_marker(at, kind, &key));
                    stats.vertical_targets += 1;
                }
            }

            if projection.in_azimuth_scope {
                let canvas = canvases.azimuth;
                push_trail(&mut azimuth, &history.azimuth, dots, |p| {
                    canvas.clamp(geometry.azimuth_point(p.x, p.y))
                });
                let cross = projection.from_threshold.cross_nm;
                if let Some(at) = canvas.clamp(geometry.azimuth_point(along, cross)) {
                    azimuth_markers.push(current_marker(at, kind, &key));
                    stats.azimuth_targets += 1;
                }
            }

            let canvas = canvases.plan;
            let at = geometry.plan_point(projection.east_nm, projection.north_nm);
            if canvas.contains(at) {
                push_trail(&mut plan, &history.plan, dots, |p| {
                    let point = geometry.plan_point(p.x, p.y);
                    canvas.contains(point).then_some(point)
                });
                plan_markers.push(current_marker(at, kind, &key));
                stats.plan_targets += 1;
            }
        }

        vertical.primitives.extend(vertical_markers);
        azimuth.primitives.extend(azimuth_markers);
        plan.primitives.extend(plan_markers);

        debug!(
            "Composed frame: {} targets, {} vertical, {} azimuth, {} plan",
            stats.targets, stats.vertical_targets, stats.azimuth_targets, stats.plan_targets
        );

        Frame {
            config,
            vertical,
            azimuth,
            plan,
            stats,
        }
    }
}

fn current_marker(at: Point, kind: MarkerKind, callsign: &str) -> Primitive {
    Primitive::Marker {
        at,
        kind,
        opacity: 1.0,
        label: Some(callsign.to_string()),
    }
}

/// Push up to `count` of the most recent trail points, oldest first and faintest.
fn push_trail(
    drawing: &mut ScopeDrawing,
    trail: &Trail,
    count: usize,
    to_canvas: impl Fn(TrailPoint) -> Option<Point>,
) {
    let shown = count.min(trail.len());
    for (index, point) in trail.recent(shown).enumerate() {
        if let Some(at) = to_canvas(point) {
            drawing.push(Primitive::Marker {
                at,
                kind: MarkerKind::History,
                opacity: trail_opacity(index, shown),
                label: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{destination_from, FEET_PER_NM};
    use crate::reference::NoReferenceData;
    use crate::sensor::SensorFrame;
    use crate::snapshot::AircraftSnapshot;

    fn on_final(callsign: &str, distance_nm: f64) -> AircraftSnapshot {
        let config = RunwayConfiguration::demo();
        let frame = SensorFrame::resolve(&config);
        let (lat, lon) = destination_from(
            config.threshold_lat,
            config.threshold_lon,
            frame.approach_bearing_deg,
            distance_nm,
        );
        let altitude = config.glide_slope_altitude_ft(distance_nm);
        AircraftSnapshot::new(callsign, lat, lon, altitude, config.heading_deg, 140.0)
    }

    fn compose(engine: &mut ScopeEngine, store: &SnapshotStore, settings: &DisplaySettings) -> Frame {
        engine.compose(store, None, settings, &NoReferenceData, ScopeCanvases::default())
    }

    fn labels(drawing: &ScopeDrawing, kind: MarkerKind) -> Vec<String> {
        drawing
            .markers(kind)
            .filter_map(|p| match p {
                Primitive::Marker { label, .. } => label.clone(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_display_settings_clamped() {
        assert_eq!(DisplaySettings::new(0, false).history_dots(), 1);
        assert_eq!(DisplaySettings::new(50, false).history_dots(), 20);
        assert_eq!(DisplaySettings::default().history_dots(), DEFAULT_HISTORY_DOTS);

        let mut settings = DisplaySettings::default();
        settings.set_history_dots(30);
        assert_eq!(settings.history_dots(), 20);
    }

    #[test]
    fn test_on_course_target_in_all_scopes() {
        let store = SnapshotStore::default();
        let mut engine = ScopeEngine::new(&store);
        store.upsert(on_final("ual1", 5.0));

        let frame = compose(&mut engine, &store, &DisplaySettings::default());
        assert!(frame.config.is_demo());
        assert_eq!(frame.stats.targets, 1);
        assert_eq!(frame.stats.vertical_targets, 1);
        assert_eq!(frame.stats.azimuth_targets, 1);
        assert_eq!(frame.stats.plan_targets, 1);
        assert_eq!(labels(&frame.vertical, MarkerKind::Target), vec!["UAL1".to_string()]);
    }

    #[test]
    fn test_delete_drops_history() {
        let store = SnapshotStore::default();
        let mut engine = ScopeEngine::new(&store);
        store.upsert(on_final("ual1", 5.0));
        compose(&mut engine, &store, &DisplaySettings::default());
        assert!(engine.history().get("UAL1").is_some());

        store.remove("UAL1");
        let frame = compose(&mut engine, &store, &DisplaySettings::default());
        assert!(engine.history().is_empty());
        assert_eq!(frame.stats.targets, 0);
    }

    #[test]
    fn test_reset_clears_all_histories() {
        let store = SnapshotStore::default();
        let mut engine = ScopeEngine::new(&store);
        store.upsert(on_final("a1", 3.0));
        store.upsert(on_final("b2", 6.0));
        compose(&mut engine, &store, &DisplaySettings::default());
        assert_eq!(engine.history().len(), 2);

        store.reset();
        engine.apply_pending_events(&store);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_lagged_events_reconcile_histories() {
        let store = SnapshotStore::new(1);
        let mut engine = ScopeEngine::new(&store);
        store.upsert(on_final("a1", 3.0));
        store.upsert(on_final("b2", 6.0));
        compose(&mut engine, &store, &DisplaySettings::default());
        assert_eq!(engine.history().len(), 2);

        // Overflows the single-slot channel, so the delete is never seen
        store.remove("A1");
        store.upsert(on_final("c3", 7.0));
        store.upsert(on_final("d4", 8.0));

        engine.apply_pending_events(&store);
        assert!(engine.history().get("A1").is_none());
        assert!(engine.history().get("B2").is_some());
    }

    #[test]
    fn test_stationary_target_keeps_single_trail_point() {
        let store = SnapshotStore::default();
        let mut engine = ScopeEngine::new(&store);
        store.upsert(on_final("ual1", 5.0));

        let settings = DisplaySettings::new(20, false);
        let mut frame = compose(&mut engine, &store, &settings);
        for _ in 0..10 {
            frame = compose(&mut engine, &store, &settings);
        }

        let history = engine.history().get("UAL1").unwrap();
        assert_eq!(history.vertical.len(), 1);
        assert_eq!(history.azimuth.len(), 1);
        assert_eq!(history.plan.len(), 1);
        assert_eq!(frame.vertical.markers(MarkerKind::History).count(), 1);
    }

    #[test]
    fn test_trail_dots_limited_and_fading() {
        let store = SnapshotStore::default();
        let mut engine = ScopeEngine::new(&store);
        let settings = DisplaySettings::new(3, false);

        let mut frame = None;
        for step in 0..8 {
            store.upsert(on_final("ual1", 8.0 - f64::from(step) * 0.5));
            frame = Some(compose(&mut engine, &store, &settings));
        }
        let frame = frame.unwrap();

        let opacities: Vec<f32> = frame
            .vertical
            .markers(MarkerKind::History)
            .map(|p| match p {
                Primitive::Marker { opacity, .. } => *opacity,
                _ => 0.0,
            })
            .collect();
        assert_eq!(opacities.len(), 3);
        assert!(opacities.windows(2).all(|w| w[0] < w[1]));
        assert!(opacities.iter().all(|o| *o < 1.0));
    }

    #[test]
    fn test_current_markers_drawn_above_all_trails() {
        let store = SnapshotStore::default();
        let mut engine = ScopeEngine::new(&store);
        let settings = DisplaySettings::default();

        let mut frame = None;
        for step in 0..4 {
            let moved = f64::from(step) * 0.5;
            store.upsert(on_final("aal1", 8.0 - moved));
            store.upsert(on_final("dal2", 6.0 - moved));
            frame = Some(compose(&mut engine, &store, &settings));
        }
        let frame = frame.unwrap();

        for drawing in [&frame.vertical, &frame.azimuth, &frame.plan] {
            let kinds: Vec<MarkerKind> = drawing
                .primitives
                .iter()
                .filter_map(|p| match p {
                    Primitive::Marker { kind, .. } => Some(*kind),
                    _ => None,
                })
                .collect();
            let first_target = kinds.iter().position(|k| *k == MarkerKind::Target).unwrap();
            let last_history = kinds.iter().rposition(|k| *k == MarkerKind::History).unwrap();
            assert!(last_history < first_target, "marker order {kinds:?}");
            assert_eq!(kinds.iter().filter(|k| **k == MarkerKind::Target).count(), 2);
        }
    }

    #[test]
    fn test_off_course_target_only_in_plan() {
        let config = RunwayConfiguration::demo();
        let frame = SensorFrame::resolve(&config);
        let (lat, lon) = destination_from(
            config.threshold_lat,
            config.threshold_lon,
            frame.approach_bearing_deg + 40.0,
            4.0,
        );

        let store = SnapshotStore::default();
        let mut engine = ScopeEngine::new(&store);
        store.upsert(AircraftSnapshot::new("wide", lat, lon, 3000.0, 0.0, 200.0));

        let frame = compose(&mut engine, &store, &DisplaySettings::default());
        assert_eq!(frame.stats.vertical_targets, 0);
        assert_eq!(frame.stats.azimuth_targets, 0);
        assert_eq!(frame.stats.plan_targets, 1);
        assert_eq!(frame.vertical.markers(MarkerKind::Target).count(), 0);
        assert_eq!(frame.plan.markers(MarkerKind::Target).count(), 1);
    }

    #[test]
    fn test_ground_traffic_hidden_unless_enabled() {
        let store = SnapshotStore::default();
        let mut engine = ScopeEngine::new(&store);
        let config = RunwayConfiguration::demo();
        store.upsert(AircraftSnapshot::new(
            "tug1",
            config.threshold_lat,
            config.threshold_lon,
            config.field_elevation_ft + 5.0,
            config.heading_deg,
            10.0,
        ));

        let hidden = compose(&mut engine, &store, &DisplaySettings::default());
        assert_eq!(hidden.stats.ground_hidden, 1);
        assert_eq!(hidden.plan.markers(MarkerKind::Ground).count(), 0);
        assert!(engine.history().is_empty());

        let shown = compose(&mut engine, &store, &DisplaySettings::new(5, true));
        assert_eq!(shown.stats.ground_hidden, 0);
        assert_eq!(labels(&shown.plan, MarkerKind::Ground), vec!["TUG1".to_string()]);
    }

    #[test]
    fn test_markers_sorted_by_callsign() {
        let store = SnapshotStore::default();
        let mut engine = ScopeEngine::new(&store);
        store.upsert(on_final("zz9", 4.0));
        store.upsert(on_final("aa1", 6.0));
        store.upsert(on_final("mm5", 2.0));

        let frame = compose(&mut engine, &store, &DisplaySettings::default());
        assert_eq!(
            labels(&frame.plan, MarkerKind::Target),
            vec!["AA1".to_string(), "MM5".to_string(), "ZZ9".to_string()]
        );
    }

    #[test]
    fn test_markers_clamped_into_canvas() {
        let store = SnapshotStore::default();
        let mut engine = ScopeEngine::new(&store);
        // Inside the cone at full range but near the elevation ceiling
        let mut target = on_final("high", 10.2);
        target.altitude_ft = 5.9_f64.to_radians().tan() * 10.2 * FEET_PER_NM;
        store.upsert(target);

        let frame = compose(&mut engine, &store, &DisplaySettings::default());
        let canvas = ScopeCanvases::default().vertical;
        for marker in frame.vertical.markers(MarkerKind::Target) {
            if let Primitive::Marker { at, .. } = marker {
                assert!(canvas.contains(*at));
            }
        }
        assert_eq!(frame.stats.vertical_targets, 1);
    }
}
