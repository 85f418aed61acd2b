//! FSD line parser

use chrono::{DateTime, Utc};

use super::pbh::PackedAttitude;
use super::types::{ParsedLine, PositionReport, WireFormat};

/// Pilot position sigil
pub const POSITION_SIGIL: char = '@';

/// Client disconnect, followed by the callsign
pub const DISCONNECT_SIGIL: &str = "#DP";

/// Server identification banner
pub const BANNER_SIGIL: &str = "$DI";

const CLASSIC_FIELDS: usize = 10;
const LEGACY_FIELDS: usize = 9;

/// Classify one framed line.
///
/// Lines that match no known message, or position lines that fail both
/// layouts, come back as [`ParsedLine::Ignored`].
pub fn parse_line(line: &str, observed_at: DateTime<Utc>) -> ParsedLine {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(DISCONNECT_SIGIL) {
        let callsign = rest.split(':').next().unwrap_or("").trim();
        if callsign.is_empty() {
            return ParsedLine::Ignored;
        }
        return ParsedLine::Disconnect {
            callsign: callsign.to_string(),
        };
    }

    if let Some(rest) = line.strip_prefix(BANNER_SIGIL) {
        return ParsedLine::Banner {
            ident: rest.split(':').next().unwrap_or("").trim().to_string(),
        };
    }

    match parse_position(line, observed_at) {
        Some(report) => ParsedLine::Position(report),
        None => ParsedLine::Ignored,
    }
}

/// Parse a position line, trying the classic layout before the legacy one
pub fn parse_position(line: &str, observed_at: DateTime<Utc>) -> Option<PositionReport> {
    // Anything before the sigil is banner noise
    let start = line.find(POSITION_SIGIL)?;
    let body = line[start + POSITION_SIGIL.len_utf8()..].trim();
    let fields: Vec<&str> = body.split(':').collect();

    parse_classic(&fields, observed_at).or_else(|| parse_legacy(&fields, observed_at))
}

/// `ident:callsign:squawk:rating:lat:lon:alt:gs:pbh:flags`
fn parse_classic(fields: &[&str], observed_at: DateTime<Utc>) -> Option<PositionReport> {
    if fields.len() < CLASSIC_FIELDS {
        return None;
    }

    let callsign = non_empty(fields[1])?;
    let squawk = parse_int(fields[2])?.to_string();
    let lat = parse_float(fields[4])?;
    let lon = parse_float(fields[5])?;
    let alt = parse_int(fields[6])?;
    let ground_speed = parse_int(fields[7])?;
    let attitude = PackedAttitude::from_wire(parse_int(fields[8])?).decode();

    Some(PositionReport {
        callsign,
        squawk,
        aircraft_type_or_flag: fields[0].trim().to_string(),
        rating: Some(fields[3].trim().to_string()),
        lat,
        lon,
        alt,
        ground_speed,
        vertical_speed: 0,
        attitude,
        track_deg: None,
        format: WireFormat::Classic,
        observed_at,
    })
}

/// `callsign:squawk:type:lat:lon:alt:gs:pbh:vs`
fn parse_legacy(fields: &[&str], observed_at: DateTime<Utc>) -> Option<PositionReport> {
    if fields.len() < LEGACY_FIELDS {
        return None;
    }

    let callsign = non_empty(fields[0])?;
    let lat = parse_float(fields[3])?;
    let lon = parse_float(fields[4])?;
    let alt = parse_int(fields[5])?;
    let ground_speed = parse_int(fields[6])?;
    let attitude = PackedAttitude::from_wire(parse_int(fields[7])?).decode();
    let vertical_speed = parse_int(fields[8])?;

    Some(PositionReport {
        callsign,
        squawk: fields[1].trim().to_string(),
        aircraft_type_or_flag: fields[2].trim().to_string(),
        rating: None,
        lat,
        lon,
        alt,
        ground_speed,
        vertical_speed,
        attitude,
        track_deg: None,
        format: WireFormat::Legacy,
        observed_at,
    })
}

fn non_empty(field: &str) -> Option<String> {
    let field = field.trim();
    (!field.is_empty()).then(|| field.to_string())
}

fn parse_float(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Float first, then truncated toward zero, so `35000.0` is accepted
fn parse_int(field: &str) -> Option<i64> {
    let value = parse_float(field)?;
    if value.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(value.trunc() as i64)
}
