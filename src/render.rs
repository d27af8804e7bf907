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

//! Paints core draw primitives with egui.

use eframe::egui;
use par_core::{Anchor, Canvas, LineStyle, MarkerKind, Point, Primitive, Role, ScopeDrawing};

const SCOPE_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(8, 18, 12);
const TARGET_COLOR: egui::Color32 = egui::Color32::from_rgb(120, 255, 120);
const GROUND_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 190, 60);
const LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(200, 230, 200);

const DASH_LENGTH: f32 = 6.0;
const GAP_LENGTH: f32 = 4.0;

/// Stroke color and width for a background role.
pub fn role_stroke(role: Role) -> egui::Stroke {
    let (width, color) = match role {
        Role::Grid => (1.0, egui::Color32::from_rgb(30, 70, 40)),
        Role::GridLabel => (1.0, egui::Color32::from_rgb(90, 150, 100)),
        Role::GlideSlope => (2.0, egui::Color32::from_rgb(80, 200, 255)),
        Role::DecisionHeight => (1.5, egui::Color32::from_rgb(255, 200, 50)),
        Role::CourseLine => (2.0, egui::Color32::from_rgb(80, 200, 255)),
        Role::DeviationGuide => (1.0, egui::Color32::from_rgb(60, 130, 160)),
        Role::Wedge => (1.5, egui::Color32::from_rgb(100, 170, 100)),
        Role::RangeRing => (1.0, egui::Color32::from_rgb(40, 90, 50)),
        Role::Runway => (4.0, egui::Color32::from_rgb(200, 200, 200)),
        Role::Sensor => (2.0, egui::Color32::from_rgb(255, 80, 80)),
        Role::Threshold => (2.0, egui::Color32::from_rgb(230, 230, 230)),
        Role::Title => (1.0, egui::Color32::from_rgb(100, 200, 100)),
    };
    egui::Stroke::new(width, color)
}

pub fn align(anchor: Anchor) -> egui::Align2 {
    match anchor {
        Anchor::LeftTop => egui::Align2::LEFT_TOP,
        Anchor::LeftCenter => egui::Align2::LEFT_CENTER,
        Anchor::CenterTop => egui::Align2::CENTER_TOP,
        Anchor::CenterBottom => egui::Align2::CENTER_BOTTOM,
        Anchor::RightCenter => egui::Align2::RIGHT_CENTER,
        Anchor::RightBottom => egui::Align2::RIGHT_BOTTOM,
    }
}

/// Canvas in scope coordinates for a screen rectangle.
pub fn canvas_for(rect: egui::Rect) -> Canvas {
    Canvas::new(rect.width(), rect.height())
}

fn to_screen(rect: egui::Rect, point: Point) -> egui::Pos2 {
    rect.min + egui::vec2(point.x, point.y)
}

/// Paint one scope into `rect`.
pub fn paint_scope(painter: &egui::Painter, rect: egui::Rect, drawing: &ScopeDrawing) {
    painter.rect_filled(rect, 0.0, SCOPE_BACKGROUND);

    for primitive in &drawing.primitives {
        match primitive {
            Primitive::Line { from, to, style, role } => {
                let points = [to_screen(rect, *from), to_screen(rect, *to)];
                let stroke = role_stroke(*role);
                match style {
                    LineStyle::Solid => {
                        painter.line_segment(points, stroke);
                    }
                    LineStyle::Dashed => {
                        painter.extend(egui::Shape::dashed_line(&points, stroke, DASH_LENGTH, GAP_LENGTH));
                    }
                }
            }
            Primitive::Circle { center, radius, role } => {
                painter.circle_stroke(to_screen(rect, *center), *radius, role_stroke(*role));
            }
            Primitive::Marker { at, kind, opacity, label } => {
                paint_marker(painter, to_screen(rect, *at), *kind, *opacity, label.as_deref());
            }
            Primitive::Text { at, text, anchor, role } => {
                painter.text(
                    to_screen(rect, *at),
                    align(*anchor),
                    text,
                    egui::FontId::monospace(if *role == Role::Title { 12.0 } else { 10.0 }),
                    role_stroke(*role).color,
                );
            }
        }
    }

    painter.rect_stroke(
        rect,
        0.0,
        egui::Stroke::new(1.0, egui::Color32::from_rgb(40, 90, 50)),
        egui::StrokeKind::Inside,
    );
}

fn paint_marker(painter: &egui::Painter, pos: egui::Pos2, kind: MarkerKind, opacity: f32, label: Option<&str>) {
    let color = match kind {
        MarkerKind::Target | MarkerKind::History => TARGET_COLOR,
        MarkerKind::Ground => GROUND_COLOR,
    }
    .gamma_multiply(opacity.clamp(0.0, 1.0));

    match kind {
        MarkerKind::History => {
            painter.circle_filled(pos, 2.5, color);
        }
        MarkerKind::Target => {
            painter.circle_filled(pos, 4.5, color);
        }
        MarkerKind::Ground => {
            let rect = egui::Rect::from_center_size(pos, egui::vec2(8.0, 8.0));
            painter.rect_filled(rect, 0.0, color);
        }
    }

    if let Some(label) = label {
        painter.text(
            pos + egui::vec2(7.0, -7.0),
            egui::Align2::LEFT_BOTTOM,
            label,
            egui::FontId::monospace(10.0),
            LABEL_COLOR,
        );
    }
}
