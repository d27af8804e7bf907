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

//! Synthetic approach traffic for demos and bench testing without a feed.
//!
//! The generator is deterministic: the same configuration and target count
//! always produce the same traffic.

use std::time::Duration;

use log::info;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::geo::{local_to_geo, METERS_PER_NM};
use crate::runway::RunwayConfiguration;
use crate::sensor::SensorFrame;
use crate::snapshot::{AircraftSnapshot, SnapshotStore};

pub const DEFAULT_TARGET_COUNT: usize = 4;
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_secs(1);

const APPROACH_SPEED_KT: f64 = 130.0;
const TAXI_SPEED_KT: f64 = 20.0;
/// How far down the runway the ground target rolls before starting over.
const GROUND_ROLL_NM: f64 = 1.2;
const GROUND_CALLSIGN: &str = "TUG1";

#[derive(Debug, Clone)]
struct SimTarget {
    callsign: String,
    /// Along-track NM from the threshold, positive out on final.
    along_nm: f64,
    cross_nm: f64,
    speed_kt: f64,
    on_ground: bool,
}

/// Deterministic generator of traffic on final plus one ground target.
#[derive(Debug, Clone)]
pub struct TrafficGenerator {
    config: RunwayConfiguration,
    approach_bearing_deg: f64,
    targets: Vec<SimTarget>,
}

impl TrafficGenerator {
    /// Space `count` aircraft evenly along final, each on the glide slope
    /// with a small fixed lateral offset.
    #[must_use]
    pub fn new(config: RunwayConfiguration, count: usize) -> Self {
        let spacing = config.range_nm.max(1.0) / (count as f64 + 1.0);
        let mut targets: Vec<SimTarget> = (0..count)
            .map(|i| SimTarget {
                callsign: format!("SIM{:02}", i + 1),
                along_nm: spacing * (i as f64 + 1.0),
                cross_nm: ((i % 3) as f64 - 1.0) * 0.08,
                speed_kt: APPROACH_SPEED_KT + (i % 4) as f64 * 5.0,
                on_ground: false,
            })
            .collect();

        targets.push(SimTarget {
            callsign: GROUND_CALLSIGN.to_string(),
            along_nm: -0.1,
            cross_nm: 0.0,
            speed_kt: TAXI_SPEED_KT,
            on_ground: true,
        });

        let approach_bearing_deg = SensorFrame::resolve(&config).approach_bearing_deg;
        Self {
            config,
            approach_bearing_deg,
            targets,
        }
    }

    /// Move the traffic onto another runway.
    ///
    /// Targets keep their along-track and cross-track positions relative to the
    /// new threshold; airborne targets beyond the new range restart at its edge.
    pub fn set_runway(&mut self, config: RunwayConfiguration) {
        self.approach_bearing_deg = SensorFrame::resolve(&config).approach_bearing_deg;
        for target in &mut self.targets {
            if !target.on_ground {
                target.along_nm = target.along_nm.min(config.range_nm);
            }
        }
        self.config = config;
    }

    /// Callsigns this generator produces.
    pub fn callsigns(&self) -> impl Iterator<Item = &str> + '_ {
        self.targets.iter().map(|t| t.callsign.as_str())
    }

    /// Advance every target inbound by `dt`.
    ///
    /// Aircraft that pass touchdown respawn at the far end of the range; the
    /// ground target restarts at the threshold after its roll.
    pub fn step(&mut self, dt: Duration) {
        let hours = dt.as_secs_f64() / 3600.0;
        let touchdown = -self.config.touchdown_offset_nm();
        let range = self.config.range_nm;

        for target in &mut self.targets {
            target.along_nm -= target.speed_kt * hours;
            if target.on_ground {
                if target.along_nm < -GROUND_ROLL_NM {
                    target.along_nm = -0.1;
                }
            } else if target.along_nm < touchdown {
                target.along_nm = range;
            }
        }
    }

    /// Current position of every target.
    #[must_use]
    pub fn snapshots(&self) -> Vec<AircraftSnapshot> {
        let (sin_b, cos_b) = self.approach_bearing_deg.to_radians().sin_cos();
        let config = &self.config;

        self.targets
            .iter()
            .map(|target| {
                let east_m = (target.along_nm * sin_b + target.cross_nm * cos_b) * METERS_PER_NM;
                let north_m = (target.along_nm * cos_b - target.cross_nm * sin_b) * METERS_PER_NM;
                let (lat, lon) = local_to_geo(config.threshold_lat, config.threshold_lon, east_m, north_m);
                let altitude_ft = if target.on_ground {
                    config.field_elevation_ft
                } else {
                    config.glide_slope_altitude_ft(target.along_nm)
                };
                AircraftSnapshot::new(
                    target.callsign.clone(),
                    lat,
                    lon,
                    altitude_ft,
                    config.heading_deg,
                    target.speed_kt,
                )
            })
            .collect()
    }

    /// Run the generator in a background task, writing into `store` every `period`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(mut self, store: SnapshotStore, period: Duration) -> SimulationHandle {
        let cancel_token = CancellationToken::new();
        let task_cancel = cancel_token.clone();
        let (runway_tx, mut runway_rx) = watch::channel(self.config.clone());

        info!(
            "Simulating {} targets for {}",
            self.targets.len(),
            self.config.label()
        );

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    Ok(()) = runway_rx.changed() => {
                        let config = runway_rx.borrow_and_update().clone();
                        info!("Simulation moved to {}", config.label());
                        self.set_runway(config);
                    }
                    _ = ticker.tick() => {
                        self.step(period);
                        for snapshot in self.snapshots() {
                            store.upsert(snapshot);
                        }
                    }
                    () = task_cancel.cancelled() => {
                        for callsign in self.callsigns() {
                            store.remove(callsign);
                        }
                        info!("Simulation stopped");
                        return;
                    }
                }
            }
        });

        SimulationHandle {
            cancel_token,
            runway_tx,
        }
    }
}

/// Handle to a running simulation; dropping it stops the task.
#[derive(Debug)]
pub struct SimulationHandle {
    cancel_token: CancellationToken,
    runway_tx: watch::Sender<RunwayConfiguration>,
}

impl SimulationHandle {
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// Follow a runway change; traffic moves on the next tick.
    pub fn set_runway(&self, config: RunwayConfiguration) {
        self.runway_tx.send_replace(config);
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
