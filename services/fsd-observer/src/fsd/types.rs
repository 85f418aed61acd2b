//! FSD data types

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Which position-report layout a line was decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// `@ident:callsign:squawk:rating:lat:lon:alt:gs:pbh:flags`
    Classic,
    /// `@callsign:squawk:type:lat:lon:alt:gs:pbh:vs`
    Legacy,
}

/// Pitch/bank/heading decoded from a packed attitude word
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecodedAttitude {
    /// The masked 32-bit word as received
    #[serde(rename = "pbh_u32")]
    pub packed: u32,

    /// Heading in degrees, [0, 360)
    #[serde(rename = "hdg_deg", serialize_with = "two_decimals")]
    pub heading_deg: f64,

    /// Heading rounded half-to-even, [0, 359]
    #[serde(rename = "hdg_deg_round")]
    pub heading_deg_rounded: u16,

    /// Pitch in whole degrees (floor-divided)
    pub pitch_deg: i32,

    /// Bank in whole degrees (floor-divided)
    pub bank_deg: i32,

    pub on_ground: bool,
}

/// Latest known state of one callsign
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    pub callsign: String,

    /// Transponder code
    pub squawk: String,

    /// Aircraft type (legacy) or identification flag (classic)
    #[serde(rename = "type")]
    pub aircraft_type_or_flag: String,

    /// Pilot rating, classic layout only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,

    pub lat: f64,
    pub lon: f64,

    /// Altitude in feet
    pub alt: i64,

    /// Ground speed in knots
    #[serde(rename = "gs")]
    pub ground_speed: i64,

    /// Vertical speed in feet per minute, 0 for the classic layout
    #[serde(rename = "vs")]
    pub vertical_speed: i64,

    #[serde(flatten)]
    pub attitude: DecodedAttitude,

    /// Track over ground derived from the previous report, when the aircraft moved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_deg: Option<u16>,

    pub format: WireFormat,

    /// Local receipt time
    #[serde(rename = "ts", serialize_with = "unix_seconds")]
    pub observed_at: DateTime<Utc>,
}

/// Classification of one framed line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Position(PositionReport),
    Disconnect { callsign: String },
    Banner { ident: String },
    Ignored,
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 100.0).round_ties_even() / 100.0)
}

fn unix_seconds<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(value.timestamp())
}
