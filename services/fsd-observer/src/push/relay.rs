//! Fixed-cadence snapshot relay
//!
//! Runs independently of the feed session. Each tick snapshots the client table
//! and hands it to the collector on its own task; a tick that finds the previous
//! delivery still in flight is skipped, so a slow or failing collector never
//! stretches the cadence.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::client_table::ClientTable;
use crate::fsd::PositionReport;
use crate::state::{ConnectionStatus, ObserverStats, StatusSnapshot};

use super::client::Collector;

/// Body of one collector push
#[derive(Debug, Clone, Serialize)]
pub struct LiveUpdate {
    pub clients: Vec<PositionReport>,
    /// Unix seconds
    pub ts: i64,
    pub bot: StatusSnapshot,
}

impl LiveUpdate {
    pub fn capture(table: &ClientTable, status: &ConnectionStatus) -> Self {
        Self {
            clients: table.snapshot(),
            ts: Utc::now().timestamp(),
            bot: status.snapshot(),
        }
    }
}

pub struct PushRelay<C: Collector> {
    collector: Arc<C>,
    table: Arc<ClientTable>,
    status: Arc<ConnectionStatus>,
    stats: Arc<ObserverStats>,
    period: Duration,
}

impl<C: Collector> PushRelay<C> {
    pub fn new(
        collector: Arc<C>,
        table: Arc<ClientTable>,
        status: Arc<ConnectionStatus>,
        stats: Arc<ObserverStats>,
        period: Duration,
    ) -> Self {
        Self {
            collector,
            table,
            status,
            stats,
            period,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            ticker.tick().await;

            if in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
                self.stats.record_push_skipped();
                debug!("Previous push still in flight, skipping tick");
                continue;
            }

            let update = LiveUpdate::capture(&self.table, &self.status);
            let collector = self.collector.clone();
            let stats = self.stats.clone();

            in_flight = Some(tokio::spawn(async move {
                match collector.deliver(&update).await {
                    Ok(()) => {
                        stats.record_push_ok();
                        debug!("Pushed {} clients", update.clients.len());
                    }
                    Err(e) => {
                        stats.record_push_failed();
                        warn!("Push failed: {}", e);
                    }
                }
            }));
        }
    }
}
