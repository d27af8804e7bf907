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

//! Windowless redraw loop: composes frames on the redraw tick and logs counts.

use log::{debug, info, warn};
use par_core::{
    DisplaySettings, FrameStats, RunwayConfiguration, RunwayEndSource, ScopeCanvases, ScopeEngine,
    SnapshotStore,
};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::REDRAW_INTERVAL;

/// Run until Ctrl-C.
pub async fn run(
    store: SnapshotStore,
    config: Option<RunwayConfiguration>,
    display: DisplaySettings,
    runways: &dyn RunwayEndSource,
) {
    let cancel_token = CancellationToken::new();
    let interrupt = cancel_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted, shutting down");
                interrupt.cancel();
            }
            Err(e) => warn!("Unable to listen for Ctrl-C: {e}"),
        }
    });

    let mut engine = ScopeEngine::new(&store);
    let mut ticker = interval(REDRAW_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_stats: Option<FrameStats> = None;

    info!("Running headless, redrawing every {} ms", REDRAW_INTERVAL.as_millis());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let frame = engine.compose(&store, config.as_ref(), &display, runways, ScopeCanvases::default());
                let stats = frame.stats;
                let summary = format!(
                    "{}: {} targets, {} elevation, {} azimuth, {} plan, {} ground hidden",
                    frame.config.label(),
                    stats.targets,
                    stats.vertical_targets,
                    stats.azimuth_targets,
                    stats.plan_targets,
                    stats.ground_hidden,
                );
                if last_stats == Some(stats) {
                    debug!("{summary}");
                } else {
                    info!("{summary}");
                    last_stats = Some(stats);
                }
            }
            () = cancel_token.cancelled() => return,
        }
    }
}
