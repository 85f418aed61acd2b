//! Feed connection: session state machine and reconnect backoff

mod backoff;
mod feed;

pub use backoff::Backoff;
pub use feed::{FeedSession, SessionError, SessionOutcome};

use std::fmt;

/// Connection state of a [`FeedSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Streaming,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Streaming => "streaming",
        };
        f.write_str(name)
    }
}
