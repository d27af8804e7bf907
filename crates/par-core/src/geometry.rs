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

//! Static scope geometry.
//!
//! Everything here is a pure function of the runway configuration, the canvas
//! sizes and the runway ends of the selected airport. It is rebuilt on every
//! redraw so configuration edits show up on the next tick.
//!
//! Layout conventions:
//! - vertical and azimuth scopes share the horizontal range scale, with the
//!   sensor at the left edge and range growing to the right;
//! - the vertical scope maps field elevation to the bottom edge and the altitude
//!   of a 6° line at full range to the top edge;
//! - the plan view is north-up, centered on the threshold.

use crate::draw::{Anchor, Canvas, Point, Primitive, Role, ScopeCanvases};
use crate::geo::{geo_to_local, FEET_PER_NM, METERS_PER_NM};
use crate::pairing::pair_runway_ends;
use crate::reference::RunwayEnd;
use crate::runway::RunwayConfiguration;
use crate::sensor::SensorFrame;

/// Elevation angle whose altitude at full range sets the top of the vertical scope.
pub const ALTITUDE_SCALE_ELEVATION_DEG: f64 = 6.0;

/// Height of the flag drawn above the decision-height tick.
pub const DH_FLAG_HEIGHT_FT: f64 = 200.0;

/// Length of the stand-in runway drawn when no runway pair is known.
pub const FALLBACK_STUB_NM: f64 = 2.0;

/// Share of the half-height used by the widest azimuth guide at full range.
const LATERAL_FILL: f64 = 0.9;

/// Half-width in pixels of the decision-height tick.
const DH_TICK_HALF_WIDTH_PX: f32 = 12.0;

/// Horizontal map shared by the vertical and azimuth scopes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeScale {
    pub px_per_nm: f64,
    pub sensor_offset_nm: f64,
}

impl RangeScale {
    #[must_use]
    pub fn new(config: &RunwayConfiguration, canvas: Canvas) -> Self {
        Self {
            px_per_nm: f64::from(canvas.width) / config.scope_span_nm(),
            sensor_offset_nm: config.effective_sensor_offset_nm(),
        }
    }

    /// Pixel column for an along-track distance from the threshold.
    #[must_use]
    pub fn x(&self, along_nm: f64) -> f32 {
        ((along_nm + self.sensor_offset_nm) * self.px_per_nm) as f32
    }
}

/// Linear altitude map of the vertical scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeScale {
    pub field_elevation_ft: f64,
    pub top_ft: f64,
    pub height_px: f64,
}

impl AltitudeScale {
    #[must_use]
    pub fn new(config: &RunwayConfiguration, canvas: Canvas) -> Self {
        let span_ft = config.scope_span_nm() * FEET_PER_NM;
        Self {
            field_elevation_ft: config.field_elevation_ft,
            top_ft: config.field_elevation_ft
                + ALTITUDE_SCALE_ELEVATION_DEG.to_radians().tan() * span_ft,
            height_px: f64::from(canvas.height),
        }
    }

    /// Pixel row for an altitude in feet MSL.
    #[must_use]
    pub fn y(&self, altitude_ft: f64) -> f32 {
        let span = (self.top_ft - self.field_elevation_ft).max(1.0);
        (self.height_px - (altitude_ft - self.field_elevation_ft) / span * self.height_px) as f32
    }
}

/// Cross-track map of the azimuth scope, centered vertically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LateralScale {
    pub center_y: f64,
    pub px_per_nm: f64,
}

impl LateralScale {
    #[must_use]
    pub fn new(config: &RunwayConfiguration, canvas: Canvas) -> Self {
        let center_y = f64::from(canvas.height) / 2.0;
        let reach_nm = config.range_nm.max(0.0) + config.touchdown_offset_nm();
        // Widest guide at full range; a zero cone still gets a usable scale.
        let half_width_nm = (config.half_cone_deg().to_radians().tan() * reach_nm).max(0.05);
        Self {
            center_y,
            px_per_nm: center_y * LATERAL_FILL / half_width_nm,
        }
    }

    /// Pixel row for a cross-track distance.
    #[must_use]
    pub fn y(&self, cross_nm: f64) -> f32 {
        (self.center_y - cross_nm * self.px_per_nm) as f32
    }
}

/// North-up map of the plan view, centered on the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanScale {
    pub center: Point,
    pub px_per_nm: f64,
}

impl PlanScale {
    #[must_use]
    pub fn new(config: &RunwayConfiguration, canvas: Canvas) -> Self {
        let radius_px = f64::from(canvas.width.min(canvas.height)) / 2.0;
        Self {
            center: canvas.center(),
            px_per_nm: radius_px / config.scope_span_nm(),
        }
    }

    /// Pixel position for east/north offsets from the threshold.
    #[must_use]
    pub fn point(&self, east_nm: f64, north_nm: f64) -> Point {
        Point::new(
            self.center.x + (east_nm * self.px_per_nm) as f32,
            self.center.y - (north_nm * self.px_per_nm) as f32,
        )
    }
}

/// A labelled distance tick on the range axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTick {
    /// Along-track distance from the threshold.
    pub along_nm: f64,
    pub label: String,
}

/// Range-axis ticks: "TD" at touchdown, "THR" at the threshold, then whole
/// nautical miles measured from touchdown out to the display range.
#[must_use]
pub fn distance_ticks(config: &RunwayConfiguration) -> Vec<DistanceTick> {
    let td = config.touchdown_offset_nm();
    let mut ticks = vec![
        DistanceTick { along_nm: -td, label: "TD".to_string() },
        DistanceTick { along_nm: 0.0, label: "THR".to_string() },
    ];

    let mut nm = 1_u32;
    while f64::from(nm) - td <= config.range_nm {
        ticks.push(DistanceTick {
            along_nm: f64::from(nm) - td,
            label: nm.to_string(),
        });
        nm += 1;
    }
    ticks
}

/// Glide-slope reference segment as `[(along_nm, altitude_ft); 2]`, from the
/// threshold crossing height out to the display range.
#[must_use]
pub fn glide_slope_segment(config: &RunwayConfiguration) -> [(f64, f64); 2] {
    [
        (0.0, config.glide_slope_altitude_ft(0.0)),
        (config.range_nm, config.glide_slope_altitude_ft(config.range_nm)),
    ]
}

/// Along-track distance where the glide slope reaches decision height.
///
/// `None` when the glide slope is flat or invalid.
#[must_use]
pub fn decision_height_along_nm(config: &RunwayConfiguration) -> Option<f64> {
    let tan_gs = config.glide_slope_deg.to_radians().tan();
    if tan_gs <= 0.0 || !tan_gs.is_finite() {
        return None;
    }
    Some((config.decision_height_ft - config.threshold_crossing_height_ft) / (tan_gs * FEET_PER_NM))
}

/// Azimuth guide angles on one side: 0, 0.5, 1, 2, then every 2° up to the half cone.
#[must_use]
pub fn azimuth_guide_angles(half_cone_deg: f64) -> Vec<f64> {
    let mut angles: Vec<f64> = vec![0.0, 0.5, 1.0];
    let mut angle = 2.0;
    while angle <= half_cone_deg + 1e-9 {
        angles.push(angle);
        angle += 2.0;
    }
    angles.retain(|a| *a <= half_cone_deg + 1e-9);
    angles
}

/// Altitude grid spacing that keeps roughly four to ten lines on screen.
#[must_use]
pub fn altitude_grid_step_ft(span_ft: f64) -> f64 {
    match span_ft {
        s if s <= 2_000.0 => 250.0,
        s if s <= 5_000.0 => 500.0,
        s if s <= 10_000.0 => 1_000.0,
        _ => 2_000.0,
    }
}

/// A runway depicted in the plan view, in NM east/north of the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct RunwaySegment {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub label: String,
}

/// Plan-view runway segments for the selected airport.
///
/// Each paired end/reciprocal becomes one segment; unpaired ends are dropped.
/// With no pairs at all a single stub along the configured heading stands in.
#[must_use]
pub fn runway_segments(config: &RunwayConfiguration, ends: &[RunwayEnd]) -> Vec<RunwaySegment> {
    let to_plan = |end: &RunwayEnd| {
        let (east, north) =
            geo_to_local(config.threshold_lat, config.threshold_lon, end.latitude, end.longitude);
        (east / METERS_PER_NM, north / METERS_PER_NM)
    };

    let segments: Vec<RunwaySegment> = pair_runway_ends(ends)
        .into_iter()
        .map(|(a, b)| RunwaySegment {
            from: to_plan(&ends[a]),
            to: to_plan(&ends[b]),
            label: format!("{}/{}", ends[a].runway_id, ends[b].runway_id),
        })
        .collect();

    if !segments.is_empty() {
        return segments;
    }

    let (sin_h, cos_h) = config.heading_deg.to_radians().sin_cos();
    vec![RunwaySegment {
        from: (0.0, 0.0),
        to: (sin_h * FALLBACK_STUB_NM, cos_h * FALLBACK_STUB_NM),
        label: config.runway.clone(),
    }]
}

/// Shorten the ray `origin → end` so it stays within the canvas.
fn clip_ray(origin: Point, end: Point, canvas: Canvas) -> Point {
    let mut t: f32 = 1.0;
    let (dx, dy) = (end.x - origin.x, end.y - origin.y);
    if end.x > canvas.width && dx > 0.0 {
        t = t.min((canvas.width - origin.x) / dx);
    }
    if end.x < 0.0 && dx < 0.0 {
        t = t.min(-origin.x / dx);
    }
    if end.y > canvas.height && dy > 0.0 {
        t = t.min((canvas.height - origin.y) / dy);
    }
    if end.y < 0.0 && dy < 0.0 {
        t = t.min(-origin.y / dy);
    }
    let t = t.max(0.0);
    Point::new(origin.x + dx * t, origin.y + dy * t)
}

/// Scales and static background for all three scopes.
#[derive(Debug, Clone)]
pub struct ScopeGeometry {
    pub config: RunwayConfiguration,
    pub frame: SensorFrame,
    pub canvases: ScopeCanvases,
    pub touchdown_offset_nm: f64,
    pub range: RangeScale,
    pub altitude: AltitudeScale,
    pub lateral: LateralScale,
    pub plan: PlanScale,
    pub vertical_background: Vec<Primitive>,
    pub azimuth_background: Vec<Primitive>,
    pub plan_background: Vec<Primitive>,
}

impl ScopeGeometry {
    /// Build scales and backgrounds for one redraw.
    #[must_use]
    pub fn build(config: &RunwayConfiguration, canvases: ScopeCanvases, runway_ends: &[RunwayEnd]) -> Self {
        let mut geometry = Self {
            config: config.clone(),
            frame: SensorFrame::resolve(config),
            canvases,
            touchdown_offset_nm: config.touchdown_offset_nm(),
            range: RangeScale::new(config, canvases.vertical),
            altitude: AltitudeScale::new(config, canvases.vertical),
            lateral: LateralScale::new(config, canvases.azimuth),
            plan: PlanScale::new(config, canvases.plan),
            vertical_background: Vec::new(),
            azimuth_background: Vec::new(),
            plan_background: Vec::new(),
        };
        geometry.vertical_background = geometry.build_vertical();
        geometry.azimuth_background = geometry.build_azimuth();
        geometry.plan_background = geometry.build_plan(runway_ends);
        geometry
    }

    /// Vertical-scope pixel position for along-track NM and altitude ft.
    #[must_use]
    pub fn vertical_point(&self, along_nm: f64, altitude_ft: f64) -> Point {
        Point::new(self.range.x(along_nm), self.altitude.y(altitude_ft))
    }

    /// Azimuth-scope pixel position for along/cross-track NM.
    ///
    /// The azimuth canvas may differ in width from the vertical one, so x is
    /// rescaled proportionally.
    #[must_use]
    pub fn azimuth_point(&self, along_nm: f64, cross_nm: f64) -> Point {
        let scale = self.canvases.azimuth.width / self.canvases.vertical.width;
        Point::new(self.range.x(along_nm) * scale, self.lateral.y(cross_nm))
    }

    /// Plan-view pixel position for east/north NM from the threshold.
    #[must_use]
    pub fn plan_point(&self, east_nm: f64, north_nm: f64) -> Point {
        self.plan.point(east_nm, north_nm)
    }

    fn build_vertical(&self) -> Vec<Primitive> {
        let canvas = self.canvases.vertical;
        let config = &self.config;
        let fe = config.field_elevation_ft;
        let mut out = vec![Primitive::text(
            Point::new(6.0, 4.0),
            format!("ELEVATION  {}", config.label()),
            Anchor::LeftTop,
            Role::Title,
        )];

        // Altitude grid
        let step = altitude_grid_step_ft(self.altitude.top_ft - fe);
        let mut level = step;
        while fe + level < self.altitude.top_ft {
            let y = self.altitude.y(fe + level);
            out.push(Primitive::dashed(Point::new(0.0, y), Point::new(canvas.width, y), Role::Grid));
            out.push(Primitive::text(
                Point::new(canvas.width - 4.0, y),
                format!("{:.0}", fe + level),
                Anchor::RightBottom,
                Role::GridLabel,
            ));
            level += step;
        }
        let ground_y = self.altitude.y(fe);
        out.push(Primitive::line(Point::new(0.0, ground_y), Point::new(canvas.width, ground_y), Role::Grid));

        self.push_distance_ticks(&mut out, canvas, |along| self.range.x(along));

        // Sensor and threshold
        out.push(Primitive::Circle { center: Point::new(0.0, ground_y), radius: 4.0, role: Role::Sensor });
        let thr_x = self.range.x(0.0);
        out.push(Primitive::line(
            Point::new(thr_x, ground_y),
            Point::new(thr_x, self.altitude.y(fe + config.threshold_crossing_height_ft)),
            Role::Threshold,
        ));

        // Upper elevation envelope from the threshold
        let envelope_end = config.range_nm.max(0.0);
        let envelope_alt =
            fe + config.max_elevation_deg.to_radians().tan() * envelope_end * FEET_PER_NM;
        let envelope_origin = self.vertical_point(0.0, fe);
        out.push(Primitive::dashed(
            envelope_origin,
            clip_ray(envelope_origin, self.vertical_point(envelope_end, envelope_alt), canvas),
            Role::Wedge,
        ));

        // Glide slope
        let [(a0, alt0), (a1, alt1)] = glide_slope_segment(config);
        let gs_start = self.vertical_point(a0, alt0);
        if let Some(start) = canvas.clamp(gs_start) {
            out.push(Primitive::line(
                start,
                clip_ray(start, self.vertical_point(a1, alt1), canvas),
                Role::GlideSlope,
            ));
        }

        // Decision height
        if let Some(dh_along) = decision_height_along_nm(config) {
            let dh_alt = fe + config.decision_height_ft;
            let at = self.vertical_point(dh_along, dh_alt);
            if let Some(at) = canvas.clamp(at) {
                let flag_top = canvas
                    .clamp(Point::new(at.x, self.altitude.y(dh_alt + DH_FLAG_HEIGHT_FT)))
                    .unwrap_or(at);
                out.push(Primitive::line(
                    Point::new(at.x - DH_TICK_HALF_WIDTH_PX, at.y),
                    Point::new(at.x + DH_TICK_HALF_WIDTH_PX, at.y),
                    Role::DecisionHeight,
                ));
                out.push(Primitive::line(at, flag_top, Role::DecisionHeight));
                out.push(Primitive::text(flag_top, "DH", Anchor::CenterBottom, Role::DecisionHeight));
            }
        }

        out
    }

    fn build_azimuth(&self) -> Vec<Primitive> {
        let canvas = self.canvases.azimuth;
        let config = &self.config;
        let mut out = vec![Primitive::text(
            Point::new(6.0, 4.0),
            format!("AZIMUTH  {}", config.label()),
            Anchor::LeftTop,
            Role::Title,
        )];

        let scale = canvas.width / self.canvases.vertical.width;
        self.push_distance_ticks(&mut out, canvas, |along| self.range.x(along) * scale);

        let origin = self.azimuth_point(-self.touchdown_offset_nm, 0.0);
        let reach_nm = config.range_nm.max(0.0) + self.touchdown_offset_nm;
        let half_cone = config.half_cone_deg();

        for angle in azimuth_guide_angles(half_cone) {
            let cross = angle.to_radians().tan() * reach_nm;
            if angle == 0.0 {
                let end = self.azimuth_point(config.range_nm, 0.0);
                out.push(Primitive::line(origin, clip_ray(origin, end, canvas), Role::CourseLine));
                continue;
            }
            for side in [1.0, -1.0] {
                let end = self.azimuth_point(config.range_nm, side * cross);
                out.push(Primitive::dashed(origin, clip_ray(origin, end, canvas), Role::DeviationGuide));
            }
            out.push(Primitive::text(
                clip_ray(origin, self.azimuth_point(config.range_nm, cross), canvas),
                format!("{angle}°"),
                Anchor::RightBottom,
                Role::GridLabel,
            ));
        }

        // Azimuth envelope
        if half_cone > 0.0 {
            let cross = half_cone.to_radians().tan() * reach_nm;
            for side in [1.0, -1.0] {
                let end = self.azimuth_point(config.range_nm, side * cross);
                out.push(Primitive::line(origin, clip_ray(origin, end, canvas), Role::Wedge));
            }
        }

        out.push(Primitive::Circle {
            center: Point::new(0.0, self.lateral.y(0.0)),
            radius: 4.0,
            role: Role::Sensor,
        });
        let thr = self.azimuth_point(0.0, 0.0);
        out.push(Primitive::line(
            Point::new(thr.x, thr.y - 6.0),
            Point::new(thr.x, thr.y + 6.0),
            Role::Threshold,
        ));

        out
    }

    fn build_plan(&self, runway_ends: &[RunwayEnd]) -> Vec<Primitive> {
        let canvas = self.canvases.plan;
        let config = &self.config;
        let mut out = vec![
            Primitive::text(Point::new(6.0, 4.0), format!("PLAN  {}", config.label()), Anchor::LeftTop, Role::Title),
            Primitive::text(Point::new(canvas.width / 2.0, 2.0), "N", Anchor::CenterTop, Role::GridLabel),
        ];

        // Range rings out to the farthest corner
        let span = config.scope_span_nm();
        let spacing_nm = if span <= 12.0 {
            1.0
        } else if span <= 25.0 {
            2.0
        } else {
            5.0
        };
        let max_radius_px = f64::from(canvas.width.hypot(canvas.height)) / 2.0;
        let mut ring_nm = spacing_nm;
        while ring_nm * self.plan.px_per_nm <= max_radius_px {
            let radius = (ring_nm * self.plan.px_per_nm) as f32;
            out.push(Primitive::Circle { center: self.plan.center, radius, role: Role::RangeRing });
            out.push(Primitive::text(
                Point::new(self.plan.center.x + 2.0, self.plan.center.y - radius),
                format!("{ring_nm:.0}"),
                Anchor::LeftTop,
                Role::GridLabel,
            ));
            ring_nm += spacing_nm;
        }

        // Approach course out along final
        let (sin_b, cos_b) = self.frame.approach_bearing_deg.to_radians().sin_cos();
        let course_end = self.plan.point(sin_b * config.range_nm, cos_b * config.range_nm);
        out.push(Primitive::dashed(
            self.plan.center,
            clip_ray(self.plan.center, course_end, canvas),
            Role::CourseLine,
        ));

        for segment in runway_segments(config, runway_ends) {
            let from = self.plan.point(segment.from.0, segment.from.1);
            let to = self.plan.point(segment.to.0, segment.to.1);
            if canvas.contains(from) || canvas.contains(to) {
                out.push(Primitive::line(from, to, Role::Runway));
            }
        }

        let (sensor_east, sensor_north) = geo_to_local(
            config.threshold_lat,
            config.threshold_lon,
            self.frame.sensor_lat,
            self.frame.sensor_lon,
        );
        out.push(Primitive::Circle {
            center: self.plan.point(sensor_east / METERS_PER_NM, sensor_north / METERS_PER_NM),
            radius: 3.0,
            role: Role::Sensor,
        });

        out
    }

    fn push_distance_ticks(&self, out: &mut Vec<Primitive>, canvas: Canvas, x_for: impl Fn(f64) -> f32) {
        for tick in distance_ticks(&self.config) {
            let x = x_for(tick.along_nm);
            if !(0.0..=canvas.width).contains(&x) {
                continue;
            }
            out.push(Primitive::dashed(Point::new(x, 0.0), Point::new(x, canvas.height), Role::Grid));
            out.push(Primitive::text(Point::new(x, canvas.height - 2.0), tick.label, Anchor::CenterBottom, Role::GridLabel));
        }
    }
}
