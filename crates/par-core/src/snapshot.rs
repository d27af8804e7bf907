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

//! Latest-snapshot-per-callsign store shared between telemetry and the redraw loop.
//!
//! Writers replace whole [`AircraftSnapshot`] values behind an `Arc`, so a reader
//! never observes a half-updated record. Every mutation is also announced on a
//! broadcast channel so the scope engine can drop trail history on delete/reset.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// Default broadcast capacity for store events.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Normalize a callsign to its identity key (trimmed, upper case).
#[must_use]
pub fn normalize_callsign(callsign: &str) -> String {
    callsign.trim().to_ascii_uppercase()
}

/// One immutable telemetry sample for an aircraft.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftSnapshot {
    /// Callsign as reported (see [`AircraftSnapshot::key`] for the identity key).
    pub callsign: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in feet MSL.
    pub altitude_ft: f64,
    /// Heading in degrees true.
    pub heading_deg: f64,
    /// Ground speed in knots.
    pub ground_speed_kt: f64,
    /// When the sample was received.
    pub received_at: DateTime<Utc>,
}

impl AircraftSnapshot {
    #[must_use]
    pub fn new(
        callsign: impl Into<String>,
        latitude: f64,
        longitude: f64,
        altitude_ft: f64,
        heading_deg: f64,
        ground_speed_kt: f64,
    ) -> Self {
        Self {
            callsign: callsign.into(),
            latitude,
            longitude,
            altitude_ft,
            heading_deg,
            ground_speed_kt,
            received_at: Utc::now(),
        }
    }

    /// Case-insensitive identity key.
    #[must_use]
    pub fn key(&self) -> String {
        normalize_callsign(&self.callsign)
    }
}

/// Change notifications emitted by [`SnapshotStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// A callsign was seen for the first time.
    Added(String),
    /// A known callsign received a new snapshot.
    Updated(String),
    /// A callsign was removed.
    Deleted(String),
    /// All callsigns were cleared.
    Reset,
}

/// Thread-safe map of the latest snapshot per callsign.
///
/// Cloning the store is cheap and yields another handle to the same map.
#[derive(Clone)]
pub struct SnapshotStore {
    inner: Arc<RwLock<HashMap<String, Arc<AircraftSnapshot>>>>,
    event_tx: broadcast::Sender<TelemetryEvent>,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("aircraft_count", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl SnapshotStore {
    /// Create an empty store whose event channel buffers `event_capacity` events.
    #[must_use]
    pub fn new(event_capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(event_capacity.max(1));
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            event_tx,
        }
    }

    /// Insert or replace the snapshot for its callsign.
    pub fn upsert(&self, snapshot: AircraftSnapshot) {
        let key = snapshot.key();
        let previous = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), Arc::new(snapshot));

        let event = if previous.is_some() {
            TelemetryEvent::Updated(key)
        } else {
            TelemetryEvent::Added(key)
        };
        let _ = self.event_tx.send(event);
    }

    /// Remove a callsign. Returns `true` if it was present.
    pub fn remove(&self, callsign: &str) -> bool {
        let key = normalize_callsign(callsign);
        let removed = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
            .is_some();

        if removed {
            let _ = self.event_tx.send(TelemetryEvent::Deleted(key));
        }
        removed
    }

    /// Drop every callsign.
    pub fn reset(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        let _ = self.event_tx.send(TelemetryEvent::Reset);
    }

    /// Latest snapshot for a callsign (case-insensitive).
    #[must_use]
    pub fn get(&self, callsign: &str) -> Option<Arc<AircraftSnapshot>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_callsign(callsign))
            .cloned()
    }

    /// Copy out every current snapshot, sorted by callsign key.
    #[must_use]
    pub fn snapshot_all(&self) -> Vec<Arc<AircraftSnapshot>> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<(&String, &Arc<AircraftSnapshot>)> = map.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, snapshot)| Arc::clone(snapshot)).collect()
    }

    /// Identity keys of all current callsigns.
    #[must_use]
    pub fn callsigns(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to store events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(callsign: &str, altitude_ft: f64) -> AircraftSnapshot {
        AircraftSnapshot::new(callsign, 37.0, -121.9, altitude_ft, 270.0, 140.0)
    }

    #[test]
    fn test_upsert_is_case_insensitive() {
        let store = SnapshotStore::default();
        store.upsert(snapshot("ual123", 3000.0));
        store.upsert(snapshot(" UAL123 ", 2500.0));

        assert_eq!(store.len(), 1);
        let latest = store.get("Ual123").unwrap();
        assert!((latest.altitude_ft - 2500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_events() {
        let store = SnapshotStore::default();
        let mut rx = store.subscribe();

        store.upsert(snapshot("AAL1", 3000.0));
        store.upsert(snapshot("AAL1", 2900.0));
        assert!(store.remove("aal1"));
        assert!(!store.remove("aal1"));
        store.reset();

        assert_eq!(rx.try_recv().unwrap(), TelemetryEvent::Added("AAL1".to_string()));
        assert_eq!(rx.try_recv().unwrap(), TelemetryEvent::Updated("AAL1".to_string()));
        assert_eq!(rx.try_recv().unwrap(), TelemetryEvent::Deleted("AAL1".to_string()));
        assert_eq!(rx.try_recv().unwrap(), TelemetryEvent::Reset);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_snapshot_all_sorted() {
        let store = SnapshotStore::default();
        store.upsert(snapshot("N3", 1000.0));
        store.upsert(snapshot("N1", 1000.0));
        store.upsert(snapshot("N2", 1000.0));

        let keys: Vec<String> = store.snapshot_all().iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec!["N1", "N2", "N3"]);
    }

    #[test]
    fn test_concurrent_writers() {
        let store = SnapshotStore::default();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.upsert(snapshot(&format!("T{t}"), f64::from(i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 4);
        for t in 0..4 {
            let latest = store.get(&format!("t{t}")).unwrap();
            assert!((latest.altitude_ft - 49.0).abs() < f64::EPSILON);
        }
    }
}
