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

//! Toolkit-independent draw primitives.
//!
//! The engine only decides positions and visibility. Colors and strokes are
//! chosen by the renderer from each primitive's [`Role`].

/// Canvas position in pixels, origin top-left, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Size of one scope's drawing area in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.is_finite()
            && (0.0..=self.width).contains(&point.x)
            && (0.0..=self.height).contains(&point.y)
    }

    /// Clamp a point to the canvas bounds. Non-finite points are not drawable.
    #[must_use]
    pub fn clamp(&self, point: Point) -> Option<Point> {
        point
            .is_finite()
            .then(|| Point::new(point.x.clamp(0.0, self.width), point.y.clamp(0.0, self.height)))
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Canvas sizes for the three scopes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScopeCanvases {
    pub vertical: Canvas,
    pub azimuth: Canvas,
    pub plan: Canvas,
}

impl Default for ScopeCanvases {
    fn default() -> Self {
        Self {
            vertical: Canvas::new(800.0, 300.0),
            azimuth: Canvas::new(800.0, 300.0),
            plan: Canvas::new(500.0, 500.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

/// What a primitive depicts; the renderer maps roles to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Grid,
    GridLabel,
    GlideSlope,
    DecisionHeight,
    CourseLine,
    DeviationGuide,
    Wedge,
    RangeRing,
    Runway,
    Sensor,
    Threshold,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Current position of a target.
    Target,
    /// Past position from the trail.
    History,
    /// Ground traffic shown because "show ground" is enabled.
    Ground,
}

/// Text anchor relative to the given point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    LeftTop,
    LeftCenter,
    CenterTop,
    CenterBottom,
    RightCenter,
    RightBottom,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        from: Point,
        to: Point,
        style: LineStyle,
        role: Role,
    },
    Circle {
        center: Point,
        radius: f32,
        role: Role,
    },
    Marker {
        at: Point,
        kind: MarkerKind,
        /// 0.0 (invisible) to 1.0 (opaque).
        opacity: f32,
        label: Option<String>,
    },
    Text {
        at: Point,
        text: String,
        anchor: Anchor,
        role: Role,
    },
}

impl Primitive {
    #[must_use]
    pub fn line(from: Point, to: Point, role: Role) -> Self {
        Self::Line { from, to, style: LineStyle::Solid, role }
    }

    #[must_use]
    pub fn dashed(from: Point, to: Point, role: Role) -> Self {
        Self::Line { from, to, style: LineStyle::Dashed, role }
    }

    #[must_use]
    pub fn text(at: Point, text: impl Into<String>, anchor: Anchor, role: Role) -> Self {
        Self::Text { at, text: text.into(), anchor, role }
    }
}

/// Everything drawn in one scope for one redraw: static background first,
/// then trail dots, then current target markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeDrawing {
    pub primitives: Vec<Primitive>,
}

impl ScopeDrawing {
    #[must_use]
    pub fn with_background(background: Vec<Primitive>) -> Self {
        Self { primitives: background }
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    /// Markers of the given kind, in draw order.
    pub fn markers(&self, kind: MarkerKind) -> impl Iterator<Item = &Primitive> + '_ {
        self.primitives
            .iter()
            .filter(move |p| matches!(p, Primitive::Marker { kind: k, .. } if *k == kind))
    }
}
