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

//! Telemetry feed decoding and the TCP listener that applies it.
//!
//! Feeders connect and send one JSON object per line:
//!
//! ```text
//! {"event":"add","callsign":"UAL12","lat":37.01,"lon":-121.9,"alt":1800,"heading":270,"speed":140}
//! {"event":"update","callsign":"UAL12","lat":37.01,"lon":-121.91,"alt":1750}
//! {"event":"delete","callsign":"UAL12"}
//! {"event":"reset"}
//! ```
//!
//! Malformed lines are logged and skipped; they never close the connection.

use std::net::SocketAddr;

use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::snapshot::{AircraftSnapshot, SnapshotStore};

/// Default address the listener binds to.
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:30154";

/// Errors that can occur while decoding a telemetry line.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("malformed telemetry record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for field '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Position fields carried by `add` and `update` records.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PositionReport {
    pub callsign: String,
    pub lat: f64,
    pub lon: f64,
    /// Altitude in feet MSL.
    pub alt: f64,
    #[serde(default)]
    pub heading: f64,
    /// Ground speed in knots.
    #[serde(default)]
    pub speed: f64,
}

impl PositionReport {
    fn validate(&self) -> Result<(), TelemetryError> {
        if self.callsign.trim().is_empty() {
            return Err(TelemetryError::MissingField("callsign"));
        }
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(TelemetryError::InvalidValue { field: "lat", value: self.lat.to_string() });
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(TelemetryError::InvalidValue { field: "lon", value: self.lon.to_string() });
        }
        if !self.alt.is_finite() {
            return Err(TelemetryError::InvalidValue { field: "alt", value: self.alt.to_string() });
        }
        Ok(())
    }

    fn into_snapshot(self) -> AircraftSnapshot {
        AircraftSnapshot::new(self.callsign, self.lat, self.lon, self.alt, self.heading, self.speed)
    }
}

/// One decoded telemetry line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelemetryRecord {
    Add(PositionReport),
    Update(PositionReport),
    Delete { callsign: String },
    Reset,
}

/// Decode one line. Blank lines yield `Ok(None)`.
pub fn decode_line(line: &str) -> Result<Option<TelemetryRecord>, TelemetryError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let record: TelemetryRecord = serde_json::from_str(line)?;
    match &record {
        TelemetryRecord::Add(report) | TelemetryRecord::Update(report) => report.validate()?,
        TelemetryRecord::Delete { callsign } if callsign.trim().is_empty() => {
            return Err(TelemetryError::MissingField("callsign"));
        }
        TelemetryRecord::Delete { .. } | TelemetryRecord::Reset => {}
    }
    Ok(Some(record))
}

/// Apply a decoded record to the store.
///
/// `add` and `update` are both upserts: an update for an unknown callsign
/// creates it, an add for a known one replaces it.
pub fn apply(record: TelemetryRecord, store: &SnapshotStore) {
    match record {
        TelemetryRecord::Add(report) | TelemetryRecord::Update(report) => {
            store.upsert(report.into_snapshot());
        }
        TelemetryRecord::Delete { callsign } => {
            if !store.remove(&callsign) {
                debug!("Delete for unknown callsign {callsign}");
            }
        }
        TelemetryRecord::Reset => {
            info!("Telemetry reset, clearing {} aircraft", store.len());
            store.reset();
        }
    }
}

/// Handle to a running telemetry listener.
///
/// Accepts any number of feeder connections in background tasks. Dropping the
/// handle shuts the listener and every feeder connection down.
pub struct TelemetryListener {
    local_addr: SocketAddr,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for TelemetryListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryListener")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

impl TelemetryListener {
    /// Bind `address` and start accepting feeders that write into `store`.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn bind(address: &str, store: SnapshotStore) -> std::io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        let local_addr = listener.local_addr()?;
        let cancel_token = CancellationToken::new();

        info!("Telemetry listener on {local_addr}");
        tokio::spawn(accept_loop(listener, store, cancel_token.clone()));

        Ok(Self {
            local_addr,
            cancel_token,
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and close every feeder connection.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for TelemetryListener {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn accept_loop(listener: TcpListener, store: SnapshotStore, cancel_token: CancellationToken) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        info!("Telemetry feeder connected from {peer}");
                        tokio::spawn(feeder_loop(stream, peer, store.clone(), cancel_token.child_token()));
                    }
                    Err(e) => warn!("Failed to accept telemetry feeder: {e}"),
                }
            }

            () = cancel_token.cancelled() => {
                info!("Telemetry listener shut down");
                return;
            }
        }
    }
}

async fn feeder_loop(stream: TcpStream, peer: SocketAddr, store: SnapshotStore, cancel_token: CancellationToken) {
    let mut lines = BufReader::new(stream).lines();

    loop {
        tokio::select! {
            line_result = lines.next_line() => {
                match line_result {
                    Ok(Some(line)) => match decode_line(&line) {
                        Ok(Some(record)) => apply(record, &store),
                        Ok(None) => {}
                        Err(e) => warn!("Dropping telemetry line from {peer}: {e}"),
                    },
                    Ok(None) => {
                        info!("Telemetry feeder {peer} disconnected");
                        return;
                    }
                    Err(e) => {
                        warn!("Telemetry feeder {peer} read error: {e}");
                        return;
                    }
                }
            }

            () = cancel_token.cancelled() => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_decode_add() {
        let record = decode_line(
            r#"{"event":"add","callsign":"UAL12","lat":37.01,"lon":-121.9,"alt":1800,"heading":270,"speed":140}"#,
        )
        .unwrap()
        .unwrap();
        match record {
            TelemetryRecord::Add(report) => {
                assert_eq!(report.callsign, "UAL12");
                assert!((report.alt - 1800.0).abs() < f64::EPSILON);
                assert!((report.speed - 140.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn test_decode_update_defaults_heading_and_speed() {
        let record = decode_line(r#"{"event":"update","callsign":"n1","lat":1,"lon":2,"alt":3}"#)
            .unwrap()
            .unwrap();
        match record {
            TelemetryRecord::Update(report) => {
                assert!(report.heading.abs() < f64::EPSILON);
                assert!(report.speed.abs() < f64::EPSILON);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn test_decode_delete_and_reset() {
        assert_eq!(
            decode_line(r#"{"event":"delete","callsign":"UAL12"}"#).unwrap(),
            Some(TelemetryRecord::Delete { callsign: "UAL12".to_string() })
        );
        assert_eq!(decode_line(r#"{"event":"reset"}"#).unwrap(), Some(TelemetryRecord::Reset));
        assert_eq!(decode_line("   ").unwrap(), None);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_line("not json"), Err(TelemetryError::Json(_))));
        assert!(matches!(decode_line(r#"{"event":"warp"}"#), Err(TelemetryError::Json(_))));
        // Position records need lat/lon/alt
        assert!(matches!(
            decode_line(r#"{"event":"add","callsign":"X","lat":1}"#),
            Err(TelemetryError::Json(_))
        ));
        assert!(matches!(
            decode_line(r#"{"event":"add","callsign":" ","lat":1,"lon":2,"alt":3}"#),
            Err(TelemetryError::MissingField("callsign"))
        ));
        assert!(matches!(
            decode_line(r#"{"event":"add","callsign":"X","lat":91,"lon":2,"alt":3}"#),
            Err(TelemetryError::InvalidValue { field: "lat", .. })
        ));
        assert!(matches!(
            decode_line(r#"{"event":"delete","callsign":""}"#),
            Err(TelemetryError::MissingField("callsign"))
        ));
    }

    #[test]
    fn test_apply_records() {
        let store = SnapshotStore::default();
        apply(decode_line(r#"{"event":"update","callsign":"a1","lat":1,"lon":2,"alt":3}"#).unwrap().unwrap(), &store);
        apply(decode_line(r#"{"event":"add","callsign":"b2","lat":1,"lon":2,"alt":3}"#).unwrap().unwrap(), &store);
        assert_eq!(store.len(), 2);

        apply(TelemetryRecord::Delete { callsign: "A1".to_string() }, &store);
        assert!(store.get("a1").is_none());

        apply(TelemetryRecord::Reset, &store);
        assert!(store.is_empty());
    }

    async fn wait_for(store: &SnapshotStore, predicate: impl Fn(&SnapshotStore) -> bool) -> bool {
        for _ in 0..200 {
            if predicate(store) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_listener_applies_lines_and_skips_garbage() {
        let store = SnapshotStore::default();
        let listener = TelemetryListener::bind("127.0.0.1:0", store.clone()).await.unwrap();

        let mut feeder = TcpStream::connect(listener.local_addr()).await.unwrap();
        feeder
            .write_all(
                b"{\"event\":\"add\",\"callsign\":\"UAL1\",\"lat\":37.0,\"lon\":-121.9,\"alt\":1500}\n\
                  garbage line\n\
                  {\"event\":\"add\",\"callsign\":\"DAL2\",\"lat\":37.0,\"lon\":-121.8,\"alt\":2500}\n\
                  {\"event\":\"delete\",\"callsign\":\"UAL1\"}\n",
            )
            .await
            .unwrap();

        assert!(wait_for(&store, |s| s.get("DAL2").is_some() && s.get("UAL1").is_none()).await);
        assert_eq!(store.len(), 1);
        listener.shutdown();
    }

    #[tokio::test]
    async fn test_listener_accepts_multiple_feeders() {
        let store = SnapshotStore::default();
        let listener = TelemetryListener::bind("127.0.0.1:0", store.clone()).await.unwrap();

        let mut first = TcpStream::connect(listener.local_addr()).await.unwrap();
        let mut second = TcpStream::connect(listener.local_addr()).await.unwrap();
        first
            .write_all(b"{\"event\":\"add\",\"callsign\":\"A1\",\"lat\":1,\"lon\":2,\"alt\":3}\n")
            .await
            .unwrap();
        second
            .write_all(b"{\"event\":\"add\",\"callsign\":\"B2\",\"lat\":1,\"lon\":2,\"alt\":3}\n")
            .await
            .unwrap();

        assert!(wait_for(&store, |s| s.len() == 2).await);
    }
}
