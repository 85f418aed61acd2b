//! Outbound login lines

use std::str::FromStr;

/// Generated login command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    /// `#AA` ATC-style login
    Aa,
    /// `#AP` pilot-style login
    Ap,
}

impl FromStr for LoginMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AA" => Ok(Self::Aa),
            "AP" => Ok(Self::Ap),
            other => Err(other.to_string()),
        }
    }
}

/// Fields shared by both generated login forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub callsign: String,
    pub realname: String,
    pub cid: String,
    pub password: String,
    pub level: String,
    pub revision: String,
    pub simtype: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Login {
    /// Sent exactly as configured
    Verbatim(String),
    Generated {
        mode: LoginMode,
        credentials: Credentials,
    },
}

impl Login {
    pub fn line(&self) -> String {
        match self {
            Self::Verbatim(line) => line.trim_end_matches(&['\r', '\n'][..]).to_string(),
            Self::Generated { mode, credentials: c } => match mode {
                LoginMode::Aa => format!(
                    "#AA{}::{}:{}:{}:{}:{}",
                    c.callsign, c.realname, c.cid, c.password, c.level, c.revision
                ),
                LoginMode::Ap => format!(
                    "#AP{}::{}:{}:{}:{}:{}:{}",
                    c.callsign, c.cid, c.password, c.level, c.revision, c.simtype, c.realname
                ),
            },
        }
    }

    /// Callsign the server will know us by. `None` for a verbatim line that is not `#AA`/`#AP`.
    pub fn callsign(&self) -> Option<&str> {
        match self {
            Self::Verbatim(line) => {
                let rest = line
                    .strip_prefix("#AA")
                    .or_else(|| line.strip_prefix("#AP"))?;
                let callsign = rest.split(':').next()?.trim();
                (!callsign.is_empty()).then_some(callsign)
            }
            Self::Generated { credentials, .. } => Some(&credentials.callsign),
        }
    }

    /// Login line with the password field blanked, for logs
    pub fn redacted_line(&self) -> String {
        match self {
            Self::Verbatim(_) => "<verbatim login line>".to_string(),
            Self::Generated { mode, credentials } => {
                let masked = Credentials {
                    password: "****".to_string(),
                    ..credentials.clone()
                };
                Self::Generated {
                    mode: *mode,
                    credentials: masked,
                }
                .line()
            }
        }
    }
}

/// Observer presence announcement
#[derive(Debug, Clone, PartialEq)]
pub struct Presence {
    pub callsign: String,
    pub frequency: String,
    pub facility: String,
    pub visual_range: String,
    pub rating: String,
    pub lat: f64,
    pub lon: f64,
    pub alt: i64,
}

impl Presence {
    pub fn line(&self) -> String {
        format!(
            "%{}:{}:{}:{}:{}:{}:{}:{}",
            self.callsign,
            self.frequency,
            self.facility,
            self.visual_range,
            self.rating,
            self.lat,
            self.lon,
            self.alt
        )
    }
}

/// Everything written after a successful connect
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSequence {
    pub login: Login,
    pub presence: Option<Presence>,
}

impl LoginSequence {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.login.line()];
        if let Some(presence) = &self.presence {
            lines.push(presence.line());
        }
        lines
    }

    /// CRLF-terminated wire bytes
    pub fn wire_bytes(&self) -> Vec<u8> {
        self.lines()
            .into_iter()
            .flat_map(|line| format!("{line}\r\n").into_bytes())
            .collect()
    }
}
