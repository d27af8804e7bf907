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

//! Desktop window: three scopes plus a control panel.

use std::ops::RangeInclusive;
use std::time::Instant;

use eframe::egui;
use log::{info, warn};
use par_core::{
    DisplaySettings, Frame, RunwayConfiguration, RunwayDatabase, ScopeCanvases, ScopeEngine,
    SimulationHandle, SnapshotStore,
};

use crate::render::{canvas_for, paint_scope};
use crate::settings::Settings;
use crate::REDRAW_INTERVAL;

const SCOPE_GAP: f32 = 6.0;
const HEADER_COLOR: egui::Color32 = egui::Color32::from_rgb(100, 200, 100);
const DIM_COLOR: egui::Color32 = egui::Color32::from_rgb(150, 150, 150);

pub struct ParApp {
    store: SnapshotStore,
    engine: ScopeEngine,
    runways: RunwayDatabase,
    /// Synthetic traffic, moved along with the selected runway.
    simulation: Option<SimulationHandle>,
    settings: Settings,
    display: DisplaySettings,
    airport_input: String,
    runway_input: String,
    status: Option<String>,
    frame: Option<Frame>,
    last_compose: Option<Instant>,
    last_canvases: Option<ScopeCanvases>,
    /// Something changed that the next frame must reflect.
    dirty: bool,
    /// Settings changed since the last save.
    unsaved: bool,
}

impl std::fmt::Debug for ParApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParApp")
            .field("store", &self.store)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ParApp {
    pub fn new(
        store: SnapshotStore,
        runways: RunwayDatabase,
        simulation: Option<SimulationHandle>,
        settings: Settings,
    ) -> Self {
        let (airport_input, runway_input) = settings
            .runway
            .as_ref()
            .map(|config| (config.airport.clone(), config.runway.clone()))
            .unwrap_or_default();

        Self {
            engine: ScopeEngine::new(&store),
            store,
            runways,
            simulation,
            display: settings.display_settings(),
            settings,
            airport_input,
            runway_input,
            status: None,
            frame: None,
            last_compose: None,
            last_canvases: None,
            dirty: true,
            unsaved: false,
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("◈ PAR DISPLAY").color(HEADER_COLOR).size(14.0).strong());
        if let Some(frame) = &self.frame {
            ui.label(
                egui::RichText::new(frame.config.label())
                    .color(DIM_COLOR)
                    .size(10.0)
                    .monospace(),
            );
        }
        ui.separator();

        self.draw_runway_picker(ui);
        ui.separator();
        self.draw_approach_parameters(ui);
        ui.separator();
        self.draw_display_options(ui);
        ui.separator();
        self.draw_contact_list(ui);
    }

    fn draw_runway_picker(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("RUNWAY").color(HEADER_COLOR).strong());
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.airport_input).hint_text("KSFO").desired_width(60.0));
            ui.add(egui::TextEdit::singleline(&mut self.runway_input).hint_text("28L").desired_width(40.0));

            if ui.button("Load").clicked() {
                self.load_runway();
            }
            if ui.button("Demo").clicked() {
                info!("Switching to demo runway");
                self.status = None;
                self.set_runway(None);
            }
        });

        if let Some(status) = &self.status {
            ui.label(egui::RichText::new(status).color(DIM_COLOR).size(10.0));
        }
    }

    fn load_runway(&mut self) {
        let airport = self.airport_input.trim().to_ascii_uppercase();
        let runway = self.runway_input.trim().to_ascii_uppercase();

        if let Some(config) = self.runways.configuration_for(&airport, &runway) {
            info!("Loaded runway {} heading {:.1}", config.label(), config.heading_deg);
            self.status = Some(format!("Loaded {}", config.label()));
            self.set_runway(Some(config));
        } else {
            warn!("Runway {airport} {runway} not found in reference data");
            self.status = Some(format!("{airport} {runway} not found"));
        }
    }

    fn set_runway(&mut self, config: Option<RunwayConfiguration>) {
        if let Some(simulation) = &self.simulation {
            simulation.set_runway(config.clone().unwrap_or_default());
        }
        self.settings.runway = config;
        self.mark_changed();
    }

    fn draw_approach_parameters(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("APPROACH").color(HEADER_COLOR).strong());

        let mut config = self.settings.runway.clone().unwrap_or_default();
        let mut changed = false;

        egui::Grid::new("approach_parameters").num_columns(2).show(ui, |ui| {
            changed |= parameter(ui, "Threshold lat", &mut config.threshold_lat, -90.0..=90.0, 0.0001, "°");
            changed |= parameter(ui, "Threshold lon", &mut config.threshold_lon, -180.0..=180.0, 0.0001, "°");
            changed |= parameter(ui, "Heading", &mut config.heading_deg, 0.0..=360.0, 0.1, "°");
            changed |= parameter(ui, "Field elevation", &mut config.field_elevation_ft, -1500.0..=15_000.0, 1.0, " ft");
            changed |= parameter(ui, "Glide slope", &mut config.glide_slope_deg, 1.0..=6.0, 0.05, "°");
            changed |= parameter(ui, "TCH", &mut config.threshold_crossing_height_ft, 0.0..=200.0, 1.0, " ft");
            changed |= parameter(ui, "Decision height", &mut config.decision_height_ft, 50.0..=1000.0, 5.0, " ft");
            changed |= parameter(ui, "Range", &mut config.range_nm, 2.0..=40.0, 0.5, " NM");
            changed |= parameter(ui, "Azimuth cone", &mut config.azimuth_cone_deg, 2.0..=60.0, 0.5, "°");
            changed |= parameter(ui, "Sensor offset", &mut config.sensor_offset_nm, 0.1..=3.0, 0.05, " NM");
        });

        if changed {
            self.set_runway(Some(config));
        }
    }

    fn draw_display_options(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("DISPLAY").color(HEADER_COLOR).strong());

        let mut dots = self.display.history_dots();
        let mut show_ground = self.display.show_ground;
        let dots_changed = ui.add(egui::Slider::new(&mut dots, 1..=20).text("Trail dots")).changed();
        let ground_changed = ui.checkbox(&mut show_ground, "Show ground traffic").changed();

        if dots_changed || ground_changed {
            self.display = DisplaySettings::new(dots, show_ground);
            self.settings.set_display_settings(self.display);
            self.mark_changed();
        }
    }

    fn draw_contact_list(&mut self, ui: &mut egui::Ui) {
        let contacts = self.store.snapshot_all();
        ui.label(egui::RichText::new("◈ CONTACT LIST").color(HEADER_COLOR).strong());
        ui.label(
            egui::RichText::new(format!("TOTAL: {}", contacts.len()))
                .color(DIM_COLOR)
                .size(10.0)
                .monospace(),
        );

        egui::ScrollArea::vertical().show(ui, |ui| {
            let now = chrono::Utc::now();
            for snapshot in contacts {
                let seconds_ago = (now - snapshot.received_at).num_seconds();
                ui.label(
                    egui::RichText::new(format!(
                        "{:<8} {:>6.0} ft {:>4.0} kt T-{:03}s",
                        snapshot.key(),
                        snapshot.altitude_ft,
                        snapshot.ground_speed_kt,
                        seconds_ago
                    ))
                    .color(egui::Color32::from_rgb(180, 180, 180))
                    .size(10.0)
                    .monospace(),
                );
            }
        });
    }

    fn draw_scopes(&mut self, ui: &mut egui::Ui) {
        let [vertical, azimuth, plan] = scope_rects(ui.max_rect().shrink(SCOPE_GAP));
        let canvases = ScopeCanvases {
            vertical: canvas_for(vertical),
            azimuth: canvas_for(azimuth),
            plan: canvas_for(plan),
        };

        let due = self
            .last_compose
            .map_or(true, |at| at.elapsed() >= REDRAW_INTERVAL);
        if due || self.dirty || self.last_canvases != Some(canvases) {
            self.frame = Some(self.engine.compose(
                &self.store,
                self.settings.runway.as_ref(),
                &self.display,
                &self.runways,
                canvases,
            ));
            self.last_compose = Some(Instant::now());
            self.last_canvases = Some(canvases);
            self.dirty = false;
        }

        if let Some(frame) = &self.frame {
            paint_scope(&ui.painter_at(vertical), vertical, &frame.vertical);
            paint_scope(&ui.painter_at(azimuth), azimuth, &frame.azimuth);
            paint_scope(&ui.painter_at(plan), plan, &frame.plan);
        }
    }

    fn mark_changed(&mut self) {
        self.dirty = true;
        self.unsaved = true;
    }

    /// Write settings once the pointer is released, not on every drag step.
    fn save_when_idle(&mut self, ctx: &egui::Context) {
        if !self.unsaved || ctx.input(|i| i.pointer.any_down()) {
            return;
        }
        if let Err(e) = self.settings.save() {
            warn!("Failed to save settings: {e}");
        }
        self.unsaved = false;
    }
}

fn parameter(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut f64,
    range: RangeInclusive<f64>,
    speed: f64,
    suffix: &str,
) -> bool {
    ui.label(label);
    let changed = ui
        .add(egui::DragValue::new(value).range(range).speed(speed).suffix(suffix))
        .changed();
    ui.end_row();
    changed
}

/// Split the scope area: elevation over azimuth on the left, plan view on the right.
fn scope_rects(area: egui::Rect) -> [egui::Rect; 3] {
    let plan_side = (area.width() * 0.38).min(area.height()).max(100.0);
    let left_width = (area.width() - plan_side - SCOPE_GAP).max(100.0);
    let half_height = ((area.height() - SCOPE_GAP) / 2.0).max(50.0);

    let vertical = egui::Rect::from_min_size(area.min, egui::vec2(left_width, half_height));
    let azimuth = egui::Rect::from_min_size(
        area.min + egui::vec2(0.0, half_height + SCOPE_GAP),
        egui::vec2(left_width, half_height),
    );
    let plan = egui::Rect::from_min_size(
        area.min + egui::vec2(left_width + SCOPE_GAP, 0.0),
        egui::vec2(plan_side, plan_side),
    );
    [vertical, azimuth, plan]
}

impl eframe::App for ParApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint_after(REDRAW_INTERVAL);

        egui::SidePanel::left("controls")
            .resizable(false)
            .default_width(300.0)
            .show(ctx, |ui| {
                self.draw_controls(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                self.draw_scopes(ui);
            });

        self.save_when_idle(ctx);
    }
}
