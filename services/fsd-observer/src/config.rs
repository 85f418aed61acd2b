//! Configuration loaded from environment variables

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::fsd::framing::DEFAULT_MAX_PENDING;
use crate::fsd::{Credentials, Login, LoginMode, LoginSequence, Presence};

/// Header carrying the collector shared secret
pub const TOKEN_HEADER: &str = "X-FSD-Token";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("FSD_LOGIN_MODE must be 'AA' or 'AP' (or set FSD_LOGIN_LINE explicitly), got {0:?}")]
    UnknownLoginMode(String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// FSD feed host
    pub feed_host: String,

    /// FSD feed port
    pub feed_port: u16,

    /// Collector ingestion endpoint
    pub push_url: String,

    /// Shared secret sent in [`TOKEN_HEADER`]
    pub push_token: String,

    /// Snapshot push cadence
    pub push_interval: Duration,

    /// Per-request collector timeout
    pub push_timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Read timeout on the feed socket, `None` blocks indefinitely
    pub read_timeout: Option<Duration>,

    /// One reconnect backoff step
    pub backoff_unit: Duration,

    /// Backoff cap, in steps
    pub backoff_max_units: u32,

    /// Cap on bytes buffered without a line terminator
    pub max_line_bytes: usize,

    /// Log every received chunk and line
    pub debug_rx: bool,

    /// Statistics summary period, `None` disables it
    pub stats_interval: Option<Duration>,

    /// Lines written after every successful connect
    pub login: LoginSequence,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let callsign = env.string("FSD_CALLSIGN", "OBS1");

        let login = match env.get("FSD_LOGIN_LINE") {
            Some(line) => Login::Verbatim(line),
            None => {
                let mode_raw = env.string("FSD_LOGIN_MODE", "AA");
                let mode: LoginMode = mode_raw
                    .parse()
                    .map_err(|_| ConfigError::UnknownLoginMode(mode_raw.clone()))?;
                Login::Generated {
                    mode,
                    credentials: Credentials {
                        callsign: callsign.clone(),
                        realname: env.string("FSD_REALNAME", "Observer"),
                        cid: env.string("FSD_CID", ""),
                        password: env.string("FSD_PASSWORD", ""),
                        level: env.string("FSD_LEVEL", "0"),
                        revision: env.string("FSD_REVISION", "9"),
                        simtype: env.string("FSD_SIMTYPE", "0"),
                    },
                }
            }
        };

        let presence = if env.flag("FSD_PRESENCE", false) {
            if let Some(login_callsign) = login.callsign() {
                if login_callsign != callsign {
                    return Err(ConfigError::InvalidValue {
                        key: "FSD_CALLSIGN",
                        value: callsign,
                        reason: format!(
                            "presence line would announce a different station than the login ({login_callsign})"
                        ),
                    });
                }
            }
            Some(Presence {
                callsign,
                frequency: env.string("FSD_PRESENCE_FREQ", "99998"),
                facility: env.string("FSD_PRESENCE_FACILITY", "0"),
                visual_range: env.string("FSD_PRESENCE_RANGE", "0"),
                rating: env.string("FSD_PRESENCE_RATING", "1"),
                lat: env.parse("FSD_PRESENCE_LAT", 0.0)?,
                lon: env.parse("FSD_PRESENCE_LON", 0.0)?,
                alt: env.parse("FSD_PRESENCE_ALT", 0)?,
            })
        } else {
            None
        };

        let backoff_max_units: u32 = env.parse("FSD_BACKOFF_MAX", 30)?;
        if backoff_max_units == 0 {
            return Err(env.invalid("FSD_BACKOFF_MAX", "must be at least 1"));
        }

        let max_line_bytes: usize = env.parse("FSD_MAX_LINE_BYTES", DEFAULT_MAX_PENDING)?;
        if max_line_bytes == 0 {
            return Err(env.invalid("FSD_MAX_LINE_BYTES", "must be at least 1"));
        }

        Ok(Self {
            feed_host: env.string("FSD_HOST", "127.0.0.1"),
            feed_port: env.parse("FSD_PORT", 6809)?,
            push_url: env.string("FSD_PUSH_URL", "http://127.0.0.1:8080/api/live_update"),
            push_token: env.string("FSD_PUSH_TOKEN", "my-super-secret-token"),
            push_interval: env.positive_secs("FSD_PUSH_INTERVAL", 1.0)?,
            push_timeout: env.positive_secs("FSD_PUSH_TIMEOUT", 3.0)?,
            connect_timeout: env.positive_secs("FSD_CONNECT_TIMEOUT", 8.0)?,
            read_timeout: env.optional_secs("FSD_SOCK_TIMEOUT", 0.0)?,
            backoff_unit: Duration::from_secs(1),
            backoff_max_units,
            max_line_bytes,
            debug_rx: env.flag("FSD_DEBUG_RX", false),
            stats_interval: env.optional_secs("FSD_STATS_INTERVAL", 60.0)?,
            login: LoginSequence { login, presence },
        })
    }

    /// `host:port` of the feed
    pub fn feed_addr(&self) -> String {
        format!("{}:{}", self.feed_host, self.feed_port)
    }
}

/// Shared truthiness rule for toggles: `0`, `false`, `no`, `off` and empty are off
pub fn flag_enabled(value: Option<&str>, default: bool) -> bool {
    match value.map(str::trim) {
        None | Some("") => default,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"),
    }
}

/// Hide all but the first two characters of a secret
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "<empty>".to_string();
    }
    let visible: String = secret.chars().take(2).collect();
    format!("{visible}****")
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        flag_enabled(self.get(key).as_deref(), default)
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn secs(&self, key: &'static str, default: f64) -> Result<f64, ConfigError> {
        let secs: f64 = self.parse(key, default)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(self.invalid(key, "must be a non-negative number of seconds"));
        }
        Ok(secs)
    }

    fn positive_secs(&self, key: &'static str, default: f64) -> Result<Duration, ConfigError> {
        let secs = self.secs(key, default)?;
        if secs == 0.0 {
            return Err(self.invalid(key, "must be greater than zero"));
        }
        self.duration(key, secs)
    }

    /// Zero disables
    fn optional_secs(
        &self,
        key: &'static str,
        default: f64,
    ) -> Result<Option<Duration>, ConfigError> {
        let secs = self.secs(key, default)?;
        if secs == 0.0 {
            return Ok(None);
        }
        self.duration(key, secs).map(Some)
    }

    // Sub-nanosecond values would become a zero period downstream
    fn duration(&self, key: &'static str, secs: f64) -> Result<Duration, ConfigError> {
        match Duration::try_from_secs_f64(secs) {
            Ok(d) if d > Duration::ZERO => Ok(d),
            Ok(_) => Err(self.invalid(key, "must be at least one nanosecond")),
            Err(e) => Err(self.invalid(key, &e.to_string())),
        }
    }

    fn invalid(&self, key: &'static str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key,
            value: self.get(key).unwrap_or_default(),
            reason: reason.to_string(),
        }
    }
}
