//! Latest known state per callsign
//!
//! Written by the feed session, snapshotted by the push relay. Every operation
//! takes the lock for its own duration only, so no caller can hold table state
//! across an await point.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::fsd::geo::initial_bearing_deg;
use crate::fsd::PositionReport;

#[derive(Debug, Default)]
pub struct ClientTable {
    clients: Mutex<HashMap<String, PositionReport>>,
}

impl ClientTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any existing entry for the report's callsign.
    ///
    /// When the previous report sits at a different position, the bearing
    /// from it is attached as the new report's track.
    pub fn upsert(&self, mut report: PositionReport) {
        let mut clients = self.lock();
        if let Some(previous) = clients.get(&report.callsign) {
            report.track_deg =
                initial_bearing_deg(previous.lat, previous.lon, report.lat, report.lon);
        } else {
            debug!("New client tracked: {}", report.callsign);
        }
        clients.insert(report.callsign.clone(), report);
    }

    /// Remove a callsign. Returns whether it was present.
    pub fn remove(&self, callsign: &str) -> bool {
        self.lock().remove(callsign).is_some()
    }

    /// Independent copy of every current report
    pub fn snapshot(&self) -> Vec<PositionReport> {
        self.lock().values().cloned().collect()
    }

    pub fn get(&self, callsign: &str) -> Option<PositionReport> {
        self.lock().get(callsign).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PositionReport>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
