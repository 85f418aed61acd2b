//! Observer supervisor
//!
//! Owns the client table, connection status and counters. Starts the push
//! relay once, then runs feed sessions one after another forever, sleeping
//! through the reconnect backoff between them.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::{info, warn};

use crate::client_table::ClientTable;
use crate::config::Config;
use crate::push::{Collector, HttpCollector, PushError, PushRelay};
use crate::session::{Backoff, FeedSession, SessionOutcome};
use crate::state::{ConnectionStatus, ObserverStats};

pub struct Observer<C: Collector> {
    config: Arc<Config>,
    table: Arc<ClientTable>,
    status: Arc<ConnectionStatus>,
    stats: Arc<ObserverStats>,
    collector: Arc<C>,
}

impl Observer<HttpCollector> {
    /// Observer pushing to the configured HTTP collector
    pub fn with_http_collector(config: Config) -> Result<Self, PushError> {
        let collector =
            HttpCollector::new(&config.push_url, &config.push_token, config.push_timeout)?;
        Ok(Self::new(config, collector))
    }
}

impl<C: Collector> Observer<C> {
    pub fn new(config: Config, collector: C) -> Self {
        Self {
            config: Arc::new(config),
            table: Arc::new(ClientTable::new()),
            status: Arc::new(ConnectionStatus::new()),
            stats: Arc::new(ObserverStats::new()),
            collector: Arc::new(collector),
        }
    }

    pub fn table(&self) -> &Arc<ClientTable> {
        &self.table
    }

    pub fn stats(&self) -> &Arc<ObserverStats> {
        &self.stats
    }

    /// Run until the future is dropped. Background tasks stop with it.
    pub async fn run(&self) {
        let _relay = AbortOnDrop(
            PushRelay::new(
                self.collector.clone(),
                self.table.clone(),
                self.status.clone(),
                self.stats.clone(),
                self.config.push_interval,
            )
            .spawn(),
        );

        let _reporter = self.config.stats_interval.map(|period| {
            AbortOnDrop(tokio::spawn(report_stats(
                self.stats.clone(),
                self.table.clone(),
                period,
            )))
        });

        let mut backoff = Backoff::new(self.config.backoff_unit, self.config.backoff_max_units);

        loop {
            let session = FeedSession::new(
                self.config.clone(),
                self.table.clone(),
                self.status.clone(),
                self.stats.clone(),
            );
            let outcome = session.run().await;
            let delay = next_delay(&mut backoff, &outcome);
            warn!("Disconnected: {}. Retry in {:?}", outcome.error, delay);
            sleep(delay).await;
        }
    }
}

/// A session that reached streaming resets the backoff before the next wait
fn next_delay(backoff: &mut Backoff, outcome: &SessionOutcome) -> Duration {
    if outcome.streamed {
        backoff.reset();
    }
    backoff.next_delay()
}

async fn report_stats(stats: Arc<ObserverStats>, table: Arc<ClientTable>, period: Duration) {
    let mut ticker = interval(period);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        info!("[Stats] {} | Tracked: {}", stats.summary(), table.len());
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::LiveUpdate;
    use crate::session::SessionError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct RecordingCollector {
        received: Mutex<Vec<LiveUpdate>>,
    }

    #[async_trait]
    impl Collector for RecordingCollector {
        async fn deliver(&self, update: &LiveUpdate) -> Result<(), PushError> {
            self.received.lock().unwrap().push(update.clone());
            Ok(())
        }
    }

    fn outcome(streamed: bool) -> SessionOutcome {
        SessionOutcome {
            streamed,
            error: SessionError::PeerClosed,
        }
    }

    async fn read_login(socket: &mut TcpStream) {
        let mut line = Vec::new();
        while !line.ends_with(b"\r\n") {
            line.push(socket.read_u8().await.unwrap());
        }
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        for _ in 0..300 {
            if cond() {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[test]
    fn test_failures_back_off_and_success_resets() {
        let mut backoff = Backoff::new(Duration::from_secs(1), 30);
        let delays: Vec<u64> = (0..3)
            .map(|_| next_delay(&mut backoff, &outcome(false)).as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4]);

        assert_eq!(next_delay(&mut backoff, &outcome(true)).as_secs(), 1);
        assert_eq!(next_delay(&mut backoff, &outcome(false)).as_secs(), 2);
    }

    #[test]
    fn test_backoff_capped() {
        let mut backoff = Backoff::new(Duration::from_secs(1), 30);
        let last = (0..10)
            .map(|_| next_delay(&mut backoff, &outcome(false)))
            .last()
            .unwrap();
        assert_eq!(last, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_reconnects_and_keeps_table_across_sessions() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (go_tx, go_rx) = oneshot::channel::<()>();

        let server = tokio::spawn(async move {
            let (mut first, _) = listener.accept().await.unwrap();
            read_login(&mut first).await;
            first
                .write_all(b"@N:DLH123:1200:1:50.1:8.6:35000:450:0:0\r\n")
                .await
                .unwrap();
            drop(first);

            let (mut second, _) = listener.accept().await.unwrap();
            read_login(&mut second).await;
            let _ = go_rx.await;
            second.write_all(b"#DPDLH123:1\r\n").await.unwrap();
            sleep(Duration::from_secs(10)).await;
        });

        let mut config = Config::from_lookup(|_| None).unwrap();
        config.feed_port = port;
        config.backoff_unit = Duration::from_millis(20);
        config.push_interval = Duration::from_millis(50);
        config.stats_interval = None;

        let observer = Arc::new(Observer::new(config, RecordingCollector::default()));
        let runner = {
            let observer = observer.clone();
            tokio::spawn(async move { observer.run().await })
        };

        assert!(wait_until(|| observer.table().get("DLH123").is_some()).await);
        assert!(wait_until(|| observer.stats().summary().sessions_started >= 2).await);
        // Reconnect does not drop previously seen clients
        assert!(observer.table().get("DLH123").is_some());

        assert!(
            wait_until(|| observer
                .collector
                .received
                .lock()
                .unwrap()
                .iter()
                .any(|u| u.clients.iter().any(|c| c.callsign == "DLH123")))
            .await
        );

        go_tx.send(()).unwrap();
        assert!(wait_until(|| observer.table().is_empty()).await);

        runner.abort();
        server.abort();
    }
}
