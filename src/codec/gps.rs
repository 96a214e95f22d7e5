//! GGA and RMC sentences for simulated GPS receivers.

use chrono::{DateTime, Datelike, Timelike, Utc};

use super::{numeric_field, CodecError, SentenceBuilder};
use crate::types::{Kinematics, NmeaSentence, Position};

const GPS_TALKER: &str = "GP";

/// A position fix as reported by a GPS receiver
#[derive(Debug, Clone, PartialEq)]
pub struct GpsFix {
    pub time: DateTime<Utc>,
    pub position: Position,
    pub speed_knots: f64,
    pub course_deg: f64,
    /// GGA fix quality, 1 = GPS fix
    pub quality: u8,
    pub satellites: u8,
    pub hdop: f64,
    pub altitude_m: f64,
    pub geoid_separation_m: f64,
}

impl GpsFix {
    pub fn new(time: DateTime<Utc>, kinematics: &Kinematics) -> Self {
        Self {
            time,
            position: kinematics.position,
            speed_knots: kinematics.speed_knots,
            course_deg: kinematics.course_deg,
            quality: 1,
            satellites: 8,
            hdop: 1.0,
            altitude_m: 0.0,
            geoid_separation_m: 0.0,
        }
    }
}

/// `$GPGGA` global positioning system fix data
pub fn gga(fix: &GpsFix) -> Result<String, CodecError> {
    let (lat, ns) = format_latitude(fix.position.latitude());
    let (lon, ew) = format_longitude(fix.position.longitude());
    SentenceBuilder::new(GPS_TALKER, "GGA")
        .field(format_time(&fix.time))
        .field(lat)
        .field(ns)
        .field(lon)
        .field(ew)
        .int(fix.quality as i64)
        .field(format!("{:02}", fix.satellites))
        .float(fix.hdop, 1)
        .float(fix.altitude_m, 1)
        .field("M")
        .float(fix.geoid_separation_m, 1)
        .field("M")
        .empty()
        .empty()
        .build()
}

/// `$GPRMC` recommended minimum specific GNSS data
pub fn rmc(fix: &GpsFix) -> Result<String, CodecError> {
    let (lat, ns) = format_latitude(fix.position.latitude());
    let (lon, ew) = format_longitude(fix.position.longitude());
    SentenceBuilder::new(GPS_TALKER, "RMC")
        .field(format_time(&fix.time))
        .field("A")
        .field(lat)
        .field(ns)
        .field(lon)
        .field(ew)
        .float(fix.speed_knots, 1)
        .float(fix.course_deg, 1)
        .field(format_date(&fix.time))
        .empty()
        .empty()
        .field("A")
        .build()
}

/// Position carried by a parsed GGA sentence
pub fn gga_position(sentence: &NmeaSentence) -> Result<Position, CodecError> {
    Ok(Position::new(coordinate(sentence, 1, 2)?, coordinate(sentence, 3, 4)?))
}

/// Position carried by a parsed RMC sentence
pub fn rmc_position(sentence: &NmeaSentence) -> Result<Position, CodecError> {
    Ok(Position::new(coordinate(sentence, 2, 3)?, coordinate(sentence, 4, 5)?))
}

fn coordinate(sentence: &NmeaSentence, value_index: usize, hemisphere_index: usize) -> Result<f64, CodecError> {
    let raw = numeric_field(sentence, value_index)?.ok_or(CodecError::MissingField { index: value_index })?;
    let degrees = (raw / 100.0).trunc();
    let value = degrees + (raw - degrees * 100.0) / 60.0;
    match sentence.field(hemisphere_index) {
        Some("N") | Some("E") => Ok(value),
        Some("S") | Some("W") => Ok(-value),
        Some(other) => Err(CodecError::MalformedField { index: hemisphere_index, value: other.to_string() }),
        None => Err(CodecError::MissingField { index: hemisphere_index }),
    }
}

/// `ddmm.mmmm` and hemisphere
pub fn format_latitude(latitude: f64) -> (String, &'static str) {
    let hemisphere = if latitude < 0.0 { "S" } else { "N" };
    (degrees_minutes(latitude.abs(), 2), hemisphere)
}

/// `dddmm.mmmm` and hemisphere
pub fn format_longitude(longitude: f64) -> (String, &'static str) {
    let hemisphere = if longitude < 0.0 { "W" } else { "E" };
    (degrees_minutes(longitude.abs(), 3), hemisphere)
}

fn degrees_minutes(value: f64, degree_digits: usize) -> String {
    // Round once in 1/10000 minute units so minutes never print as 60.0000
    let total = (value * 60.0 * 10_000.0).round() as u64;
    let degrees = total / 600_000;
    let minutes = (total % 600_000) / 10_000;
    let fraction = total % 10_000;
    format!("{:0width$}{:02}.{:04}", degrees, minutes, fraction, width = degree_digits)
}

fn format_time(time: &DateTime<Utc>) -> String {
    let centis = (time.nanosecond() / 10_000_000).min(99);
    format!("{:02}{:02}{:02}.{:02}", time.hour(), time.minute(), time.second(), centis)
}

fn format_date(time: &DateTime<Utc>) -> String {
    format!("{:02}{:02}{:02}", time.day(), time.month(), time.year().rem_euclid(100))
}
