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

//! Projection engine for precision approach radar (PAR) style scopes.
//!
//! Turns live aircraft positions into three synchronized views of a runway
//! approach: an elevation scope (range × altitude), an azimuth scope
//! (range × lateral offset) and a north-up plan view. The crate is split into
//! layers that can be used on their own:
//!
//! - **Geodesy**: [`geo`] local tangent plane and great-circle helpers
//! - **Projection**: [`sensor`] and [`projection`] map a snapshot into the
//!   course frame and decide scope membership
//! - **History**: [`history`] keeps decimated per-target trails
//! - **Geometry**: [`geometry`] builds scales and static scope backgrounds,
//!   [`pairing`] matches runway ends for the plan view
//! - **Composition**: [`frame`] turns everything into toolkit-independent
//!   [`draw`] primitives once per redraw
//! - **Collaborators**: [`snapshot`] store, [`telemetry`] feed listener,
//!   [`reference`] runway data and the [`sim`] traffic generator
//!
//! # Quick Start
//!
//! ```
//! use par_core::{
//!     DisplaySettings, NoReferenceData, RunwayConfiguration, ScopeCanvases, ScopeEngine,
//!     SnapshotStore, TrafficGenerator,
//! };
//!
//! let store = SnapshotStore::default();
//! let mut engine = ScopeEngine::new(&store);
//!
//! for snapshot in TrafficGenerator::new(RunwayConfiguration::demo(), 3).snapshots() {
//!     store.upsert(snapshot);
//! }
//!
//! let frame = engine.compose(
//!     &store,
//!     None,
//!     &DisplaySettings::default(),
//!     &NoReferenceData,
//!     ScopeCanvases::default(),
//! );
//! assert_eq!(frame.stats.vertical_targets, 3);
//! ```

pub mod draw;
pub mod frame;
pub mod geo;
pub mod geometry;
pub mod history;
pub mod pairing;
pub mod projection;
pub mod reference;
pub mod runway;
pub mod sensor;
pub mod sim;
pub mod snapshot;
pub mod telemetry;

pub use draw::{Anchor, Canvas, LineStyle, MarkerKind, Point, Primitive, Role, ScopeCanvases, ScopeDrawing};
pub use frame::{DisplaySettings, Frame, FrameStats, ScopeEngine};
pub use geometry::ScopeGeometry;
pub use history::{HistoryTracker, TargetHistory, Trail, TrailPoint};
pub use projection::{project, CourseOffset, Projection};
pub use reference::{NoReferenceData, ReferenceDataError, RunwayDatabase, RunwayEnd, RunwayEndSource};
pub use runway::RunwayConfiguration;
pub use sensor::SensorFrame;
pub use sim::{SimulationHandle, TrafficGenerator};
pub use snapshot::{AircraftSnapshot, SnapshotStore, TelemetryEvent};
pub use telemetry::{TelemetryError, TelemetryListener, TelemetryRecord};
