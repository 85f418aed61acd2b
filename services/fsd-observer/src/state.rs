//! State shared between the feed session and the push relay

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Feed connectivity, pushed alongside every snapshot
#[derive(Debug, Default)]
pub struct ConnectionStatus {
    inner: Mutex<StatusInner>,
}

#[derive(Debug, Default, Clone, Copy)]
struct StatusInner {
    connected: bool,
    connected_since: Option<DateTime<Utc>>,
}

/// Serialized form of [`ConnectionStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub connected: bool,
    /// Unix seconds
    pub since: Option<i64>,
}

impl ConnectionStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the feed live. Keeps the first timestamp when already connected.
    pub fn mark_connected(&self, at: DateTime<Utc>) {
        let mut inner = self.lock();
        if !inner.connected {
            inner.connected = true;
            inner.connected_since = Some(at);
        }
    }

    pub fn mark_disconnected(&self) {
        let mut inner = self.lock();
        inner.connected = false;
        inner.connected_since = None;
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    pub fn connected_since(&self) -> Option<DateTime<Utc>> {
        self.lock().connected_since
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = *self.lock();
        StatusSnapshot {
            connected: inner.connected,
            since: inner.connected_since.map(|t| t.timestamp()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Observer-wide counters
#[derive(Debug, Default)]
pub struct ObserverStats {
    pub sessions_started: AtomicU64,
    pub sessions_streamed: AtomicU64,
    pub bytes_received: AtomicU64,
    pub lines_received: AtomicU64,
    pub positions_applied: AtomicU64,
    pub disconnects_applied: AtomicU64,
    pub lines_ignored: AtomicU64,
    pub pushes_ok: AtomicU64,
    pub pushes_failed: AtomicU64,
    pub pushes_skipped: AtomicU64,
}

impl ObserverStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_streamed(&self) {
        self.sessions_streamed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes(&self, n: usize) {
        self.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn record_line(&self) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_position(&self) {
        self.positions_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        self.disconnects_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.lines_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_push_ok(&self) {
        self.pushes_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_push_failed(&self) {
        self.pushes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_push_skipped(&self) {
        self.pushes_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_streamed: self.sessions_streamed.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            lines_received: self.lines_received.load(Ordering::Relaxed),
            positions_applied: self.positions_applied.load(Ordering::Relaxed),
            disconnects_applied: self.disconnects_applied.load(Ordering::Relaxed),
            lines_ignored: self.lines_ignored.load(Ordering::Relaxed),
            pushes_ok: self.pushes_ok.load(Ordering::Relaxed),
            pushes_failed: self.pushes_failed.load(Ordering::Relaxed),
            pushes_skipped: self.pushes_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ObserverStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSummary {
    pub sessions_started: u64,
    pub sessions_streamed: u64,
    pub bytes_received: u64,
    pub lines_received: u64,
    pub positions_applied: u64,
    pub disconnects_applied: u64,
    pub lines_ignored: u64,
    pub pushes_ok: u64,
    pub pushes_failed: u64,
    pub pushes_skipped: u64,
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sessions: {} ({} streamed) | Lines: {} ({} bytes) | Positions: {} | Disconnects: {} | Ignored: {} | Pushes: {} ok, {} failed, {} skipped",
            self.sessions_started,
            self.sessions_streamed,
            self.lines_received,
            self.bytes_received,
            self.positions_applied,
            self.disconnects_applied,
            self.lines_ignored,
            self.pushes_ok,
            self.pushes_failed,
            self.pushes_skipped
        )
    }
}
