//! One TCP session against the FSD feed
//!
//! `Disconnected -> Connecting -> Authenticating -> Streaming -> Disconnected`.
//! A session always ends in an error: a refused or timed-out connect, a failed
//! login write, a read failure or timeout, the server closing the socket, or a
//! runaway unterminated line. The caller decides how long to wait before the
//! next one.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::client_table::ClientTable;
use crate::config::Config;
use crate::fsd::{parse_line, FrameError, LineFramer, ParsedLine};
use crate::state::{ConnectionStatus, ObserverStats};

use super::SessionState;

const READ_CHUNK: usize = 4096;

/// Bytes shown in the RX hex dump
const HEX_PREFIX: usize = 96;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("login write failed: {0}")]
    Login(#[source] std::io::Error),

    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("no data received for {0:?}")]
    ReadTimeout(Duration),

    #[error("socket closed by server")]
    PeerClosed,

    #[error(transparent)]
    Framing(#[from] FrameError),
}

/// How a session ended
#[derive(Debug)]
pub struct SessionOutcome {
    /// Whether the session got as far as streaming
    pub streamed: bool,
    pub error: SessionError,
}

pub struct FeedSession {
    config: Arc<Config>,
    table: Arc<ClientTable>,
    status: Arc<ConnectionStatus>,
    stats: Arc<ObserverStats>,
    state: SessionState,
    streamed: bool,
}

impl FeedSession {
    pub fn new(
        config: Arc<Config>,
        table: Arc<ClientTable>,
        status: Arc<ConnectionStatus>,
        stats: Arc<ObserverStats>,
    ) -> Self {
        Self {
            config,
            table,
            status,
            stats,
            state: SessionState::Disconnected,
            streamed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion
    pub async fn run(mut self) -> SessionOutcome {
        self.stats.record_session_started();

        let error = match self.drive().await {
            Ok(never) => match never {},
            Err(e) => e,
        };

        self.status.mark_disconnected();
        self.transition(SessionState::Disconnected);

        SessionOutcome {
            streamed: self.streamed,
            error,
        }
    }

    async fn drive(&mut self) -> Result<Infallible, SessionError> {
        let mut stream = self.connect().await?;
        self.authenticate(&mut stream).await?;
        self.stream(stream).await
    }

    async fn connect(&mut self) -> Result<TcpStream, SessionError> {
        self.transition(SessionState::Connecting);

        let addr = self.config.feed_addr();
        let limit = self.config.connect_timeout;
        info!("Connecting to FSD feed at {} ...", addr);

        match timeout(limit, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(SessionError::Connect { addr, source }),
            Err(_) => Err(SessionError::ConnectTimeout {
                addr,
                timeout: limit,
            }),
        }
    }

    /// Write the login lines. The feed sends no ack, so success here means streaming.
    async fn authenticate(&mut self, stream: &mut TcpStream) -> Result<(), SessionError> {
        self.transition(SessionState::Authenticating);

        let login = &self.config.login;
        stream
            .write_all(&login.wire_bytes())
            .await
            .map_err(SessionError::Login)?;
        stream.flush().await.map_err(SessionError::Login)?;

        info!("Sent login: {}", login.login.redacted_line());
        if let Some(presence) = &login.presence {
            info!("Sent presence: {}", presence.line());
        }

        self.transition(SessionState::Streaming);
        Ok(())
    }

    async fn stream(&mut self, mut stream: TcpStream) -> Result<Infallible, SessionError> {
        info!("Connected, waiting for server feed...");

        let mut framer = LineFramer::new(self.config.max_line_bytes);
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            let n = match self.config.read_timeout {
                Some(limit) => timeout(limit, stream.read(&mut buf))
                    .await
                    .map_err(|_| SessionError::ReadTimeout(limit))?,
                None => stream.read(&mut buf).await,
            }
            .map_err(SessionError::Read)?;

            if n == 0 {
                return Err(SessionError::PeerClosed);
            }

            let chunk = &buf[..n];
            self.stats.record_bytes(n);
            if self.config.debug_rx {
                log_rx_chunk(chunk);
            }

            for line in framer.push(chunk)? {
                self.stats.record_line();
                if self.config.debug_rx {
                    debug!("RX line: {}", line);
                }
                self.apply(parse_line(&line, Utc::now()));
            }
        }
    }

    fn apply(&self, parsed: ParsedLine) {
        match parsed {
            ParsedLine::Position(report) => {
                self.stats.record_position();
                self.table.upsert(report);
            }
            ParsedLine::Disconnect { callsign } => {
                self.stats.record_disconnect();
                if self.table.remove(&callsign) {
                    info!("Client {} disconnected", callsign);
                } else {
                    debug!("Disconnect for untracked client {}", callsign);
                }
            }
            ParsedLine::Banner { ident } => {
                info!("Server banner received from {}", ident);
                self.status.mark_connected(Utc::now());
            }
            ParsedLine::Ignored => {
                self.stats.record_ignored();
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {} -> {}", self.state, next);
        if next == SessionState::Streaming {
            self.streamed = true;
            self.stats.record_session_streamed();
            self.status.mark_connected(Utc::now());
        }
        self.state = next;
    }
}

fn log_rx_chunk(chunk: &[u8]) {
    let prefix = &chunk[..chunk.len().min(HEX_PREFIX)];
    let more = if chunk.len() > HEX_PREFIX { " ..." } else { "" };
    debug!("RX bytes len={} text={:?}", chunk.len(), String::from_utf8_lossy(chunk));
    debug!("RX hex: {}{}", hex::encode(prefix), more);
}
