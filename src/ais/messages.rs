//! Per-type bit layouts, dispatched through a table indexed by AIS message type.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

use super::bits::{BitReader, BitWriter};
use super::AisError;
use crate::types::constants::{
    AIS_COG_NOT_AVAILABLE, AIS_DRAUGHT_NOT_AVAILABLE, AIS_HEADING_NOT_AVAILABLE, AIS_LATITUDE_NOT_AVAILABLE,
    AIS_LONGITUDE_NOT_AVAILABLE, AIS_ROT_MAX, AIS_ROT_NOT_AVAILABLE, AIS_SOG_MAX, AIS_SOG_NOT_AVAILABLE, MAX_MMSI,
};
use crate::types::{
    normalize_course, AidToNavigationReport, AisMessage, BaseStationReport, ClassBPositionReport, Dimensions,
    EpfdType, Eta, ExtendedClassBReport, Mmsi, NavigationStatus, Position, PositionReport, StaticDataPart,
    StaticDataReport, StaticVoyageData,
};

pub type EncodeFn = fn(&AisMessage, &mut BitWriter) -> Result<(), AisError>;
/// Decoders receive the reader positioned just after the 6-bit message type
pub type DecodeFn = fn(u8, &mut BitReader) -> Result<AisMessage, AisError>;

/// Encode/decode pair for one AIS message type
pub struct MessageCodec {
    pub message_type: u8,
    /// Payload length in bits
    pub bit_length: usize,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
}

static CODECS: [MessageCodec; 9] = [
    MessageCodec { message_type: 1, bit_length: 168, encode: encode_position_report, decode: decode_position_report },
    MessageCodec { message_type: 2, bit_length: 168, encode: encode_position_report, decode: decode_position_report },
    MessageCodec { message_type: 3, bit_length: 168, encode: encode_position_report, decode: decode_position_report },
    MessageCodec { message_type: 4, bit_length: 168, encode: encode_base_station, decode: decode_base_station },
    MessageCodec { message_type: 5, bit_length: 424, encode: encode_static_voyage, decode: decode_static_voyage },
    MessageCodec { message_type: 18, bit_length: 168, encode: encode_class_b_position, decode: decode_class_b_position },
    MessageCodec { message_type: 19, bit_length: 312, encode: encode_extended_class_b, decode: decode_extended_class_b },
    MessageCodec { message_type: 21, bit_length: 272, encode: encode_aid_to_navigation, decode: decode_aid_to_navigation },
    MessageCodec { message_type: 24, bit_length: 168, encode: encode_static_data, decode: decode_static_data },
];

pub fn codec_for(message_type: u8) -> Option<&'static MessageCodec> {
    CODECS.iter().find(|c| c.message_type == message_type)
}

// ------------------------------------------------------------------------------------------------
// Field conversions
// ------------------------------------------------------------------------------------------------

const ROT_SCALE: f64 = 4.733;
const POSITION_SCALE: f64 = 600_000.0;

fn write_header(w: &mut BitWriter, message_type: u8, repeat: u8, mmsi: Mmsi) -> Result<(), AisError> {
    if mmsi.0 > MAX_MMSI {
        return Err(AisError::InvalidMmsi(mmsi.0));
    }
    w.write_uint("message_type", message_type as u64, 6)?;
    w.write_uint("repeat", repeat as u64, 2)?;
    w.write_uint("mmsi", mmsi.0 as u64, 30)
}

fn read_header(r: &mut BitReader) -> Result<(u8, Mmsi), AisError> {
    let repeat = r.read_uint(2)? as u8;
    let mmsi = r.read_uint(30)? as u32;
    Ok((repeat, Mmsi(mmsi)))
}

/// Longitude then latitude, in 1/10000 minute
fn write_position(w: &mut BitWriter, position: Option<Position>) -> Result<(), AisError> {
    let (lon, lat) = match position.filter(|p| p.is_finite()) {
        Some(p) => (
            (p.longitude() * POSITION_SCALE).round() as i64,
            (p.latitude() * POSITION_SCALE).round() as i64,
        ),
        None => (AIS_LONGITUDE_NOT_AVAILABLE, AIS_LATITUDE_NOT_AVAILABLE),
    };
    w.write_int("longitude", lon, 28)?;
    w.write_int("latitude", lat, 27)
}

fn read_position(r: &mut BitReader) -> Result<Option<Position>, AisError> {
    let lon = r.read_int(28)?;
    let lat = r.read_int(27)?;
    if lon == AIS_LONGITUDE_NOT_AVAILABLE || lat == AIS_LATITUDE_NOT_AVAILABLE {
        return Ok(None);
    }
    Ok(Some(Position::new(lat as f64 / POSITION_SCALE, lon as f64 / POSITION_SCALE)))
}

fn write_speed(w: &mut BitWriter, speed_knots: Option<f64>) -> Result<(), AisError> {
    let value = match speed_knots.filter(|s| s.is_finite() && *s >= 0.0) {
        Some(s) => ((s * 10.0).round() as u64).min(AIS_SOG_MAX),
        None => AIS_SOG_NOT_AVAILABLE,
    };
    w.write_uint("speed", value, 10)
}

fn read_speed(r: &mut BitReader) -> Result<Option<f64>, AisError> {
    let value = r.read_uint(10)?;
    Ok((value != AIS_SOG_NOT_AVAILABLE).then(|| value as f64 / 10.0))
}

fn write_course(w: &mut BitWriter, course_deg: Option<f64>) -> Result<(), AisError> {
    let value = match course_deg.filter(|c| c.is_finite()) {
        Some(c) => (normalize_course(c) * 10.0).round() as u64 % 3600,
        None => AIS_COG_NOT_AVAILABLE,
    };
    w.write_uint("course", value, 12)
}

fn read_course(r: &mut BitReader) -> Result<Option<f64>, AisError> {
    let value = r.read_uint(12)?;
    Ok((value < AIS_COG_NOT_AVAILABLE).then(|| value as f64 / 10.0))
}

fn write_heading(w: &mut BitWriter, heading_deg: Option<u16>) -> Result<(), AisError> {
    match heading_deg {
        Some(h) if h >= 360 => Err(AisError::FieldOutOfRange { field: "heading", value: h as i64, width: 9 }),
        Some(h) => w.write_uint("heading", h as u64, 9),
        None => w.write_uint("heading", AIS_HEADING_NOT_AVAILABLE, 9),
    }
}

fn read_heading(r: &mut BitReader) -> Result<Option<u16>, AisError> {
    let value = r.read_uint(9)?;
    Ok((value != AIS_HEADING_NOT_AVAILABLE).then(|| value as u16))
}

/// ROT_AIS = 4.733 * sqrt(|rot|), signed, saturating at +/-126
pub fn rot_to_ais(rate_of_turn: Option<f64>) -> i64 {
    match rate_of_turn.filter(|r| r.is_finite()) {
        Some(rot) => {
            let magnitude = ((ROT_SCALE * rot.abs().sqrt()).round() as i64).min(AIS_ROT_MAX);
            if rot < 0.0 {
                -magnitude
            } else {
                magnitude
            }
        }
        None => AIS_ROT_NOT_AVAILABLE,
    }
}

pub fn rot_from_ais(value: i64) -> Option<f64> {
    if value == AIS_ROT_NOT_AVAILABLE {
        return None;
    }
    let magnitude = (value.abs() as f64 / ROT_SCALE).powi(2);
    Some(if value < 0 { -magnitude } else { magnitude })
}

fn write_dimensions(w: &mut BitWriter, d: &Dimensions) -> Result<(), AisError> {
    w.write_uint("to_bow", d.to_bow as u64, 9)?;
    w.write_uint("to_stern", d.to_stern as u64, 9)?;
    w.write_uint("to_port", d.to_port as u64, 6)?;
    w.write_uint("to_starboard", d.to_starboard as u64, 6)
}

fn read_dimensions(r: &mut BitReader) -> Result<Dimensions, AisError> {
    Ok(Dimensions {
        to_bow: r.read_uint(9)? as u16,
        to_stern: r.read_uint(9)? as u16,
        to_port: r.read_uint(6)? as u8,
        to_starboard: r.read_uint(6)? as u8,
    })
}

fn write_epfd(w: &mut BitWriter, epfd: EpfdType) -> Result<(), AisError> {
    w.write_uint("epfd", epfd as u64, 4)
}

fn read_epfd(r: &mut BitReader) -> Result<EpfdType, AisError> {
    let value = r.read_uint(4)?;
    EpfdType::from_u8(value as u8).ok_or(AisError::InvalidFieldValue { field: "epfd", value })
}

fn write_timestamp(w: &mut BitWriter, second: u8) -> Result<(), AisError> {
    w.write_uint("timestamp", second as u64, 6)
}

fn mismatch(message_type: u8) -> AisError {
    AisError::VariantMismatch(message_type)
}

// ------------------------------------------------------------------------------------------------
// Types 1, 2, 3
// ------------------------------------------------------------------------------------------------

fn encode_position_report(message: &AisMessage, w: &mut BitWriter) -> Result<(), AisError> {
    let AisMessage::PositionReport(m) = message else {
        return Err(mismatch(message.message_type()));
    };
    write_header(w, m.message_type, m.repeat, m.mmsi)?;
    w.write_uint("nav_status", m.nav_status as u64, 4)?;
    w.write_int("rate_of_turn", rot_to_ais(m.rate_of_turn), 8)?;
    write_speed(w, m.speed_knots)?;
    w.write_bool(m.position_accuracy);
    write_position(w, m.position)?;
    write_course(w, m.course_deg)?;
    write_heading(w, m.heading_deg)?;
    write_timestamp(w, m.timestamp_second)?;
    w.write_uint("maneuver", m.maneuver as u64, 2)?;
    w.write_spare(3);
    w.write_bool(m.raim);
    w.write_uint("radio_status", m.radio_status as u64, 19)
}

fn decode_position_report(message_type: u8, r: &mut BitReader) -> Result<AisMessage, AisError> {
    let (repeat, mmsi) = read_header(r)?;
    let status = r.read_uint(4)?;
    let nav_status = NavigationStatus::from_u8(status as u8)
        .ok_or(AisError::InvalidFieldValue { field: "nav_status", value: status })?;
    let rate_of_turn = rot_from_ais(r.read_int(8)?);
    let speed_knots = read_speed(r)?;
    let position_accuracy = r.read_bool()?;
    let position = read_position(r)?;
    let course_deg = read_course(r)?;
    let heading_deg = read_heading(r)?;
    let timestamp_second = r.read_uint(6)? as u8;
    let maneuver = r.read_uint(2)? as u8;
    r.skip(3)?;
    let raim = r.read_bool()?;
    let radio_status = r.read_uint(19)? as u32;
    Ok(AisMessage::PositionReport(PositionReport {
        message_type,
        repeat,
        mmsi,
        nav_status,
        rate_of_turn,
        speed_knots,
        position_accuracy,
        position,
        course_deg,
        heading_deg,
        timestamp_second,
        maneuver,
        raim,
        radio_status,
    }))
}

// ------------------------------------------------------------------------------------------------
// Type 4
// ------------------------------------------------------------------------------------------------

fn encode_base_station(message: &AisMessage, w: &mut BitWriter) -> Result<(), AisError> {
    let AisMessage::BaseStationReport(m) = message else {
        return Err(mismatch(message.message_type()));
    };
    write_header(w, 4, 0, m.mmsi)?;
    w.write_uint("year", m.utc.year() as u64, 14)?;
    w.write_uint("month", m.utc.month() as u64, 4)?;
    w.write_uint("day", m.utc.day() as u64, 5)?;
    w.write_uint("hour", m.utc.hour() as u64, 5)?;
    w.write_uint("minute", m.utc.minute() as u64, 6)?;
    w.write_uint("second", m.utc.second() as u64, 6)?;
    w.write_bool(m.position_accuracy);
    write_position(w, m.position)?;
    write_epfd(w, m.epfd)?;
    w.write_spare(10);
    w.write_bool(m.raim);
    w.write_uint("radio_status", m.radio_status as u64, 19)
}

fn decode_base_station(_: u8, r: &mut BitReader) -> Result<AisMessage, AisError> {
    let (_, mmsi) = read_header(r)?;
    let year = r.read_uint(14)?;
    let month = r.read_uint(4)?;
    let day = r.read_uint(5)?;
    let hour = r.read_uint(5)?;
    let minute = r.read_uint(6)?;
    let second = r.read_uint(6)?;
    let utc: DateTime<Utc> = Utc
        .with_ymd_and_hms(year as i32, month as u32, day as u32, hour as u32, minute as u32, second as u32)
        .single()
        .ok_or(AisError::InvalidFieldValue { field: "utc", value: year })?;
    let position_accuracy = r.read_bool()?;
    let position = read_position(r)?;
    let epfd = read_epfd(r)?;
    r.skip(10)?;
    let raim = r.read_bool()?;
    let radio_status = r.read_uint(19)? as u32;
    Ok(AisMessage::BaseStationReport(BaseStationReport {
        mmsi,
        utc,
        position_accuracy,
        position,
        epfd,
        raim,
        radio_status,
    }))
}

// ------------------------------------------------------------------------------------------------
// Type 5
// ------------------------------------------------------------------------------------------------

fn encode_static_voyage(message: &AisMessage, w: &mut BitWriter) -> Result<(), AisError> {
    let AisMessage::StaticVoyageData(m) = message else {
        return Err(mismatch(message.message_type()));
    };
    write_header(w, 5, 0, m.mmsi)?;
    w.write_uint("ais_version", m.ais_version as u64, 2)?;
    w.write_uint("imo_number", m.imo_number as u64, 30)?;
    w.write_text("call_sign", &m.call_sign, 7)?;
    w.write_text("name", &m.name, 20)?;
    w.write_uint("ship_type", m.ship_type as u64, 8)?;
    write_dimensions(w, &m.dimensions)?;
    write_epfd(w, m.epfd)?;
    w.write_uint("eta_month", m.eta.month as u64, 4)?;
    w.write_uint("eta_day", m.eta.day as u64, 5)?;
    w.write_uint("eta_hour", m.eta.hour as u64, 5)?;
    w.write_uint("eta_minute", m.eta.minute as u64, 6)?;
    let draught = match m.draught.filter(|d| d.is_finite() && *d > 0.0) {
        Some(d) => ((d * 10.0).round() as u64).min(255),
        None => AIS_DRAUGHT_NOT_AVAILABLE,
    };
    w.write_uint("draught", draught, 8)?;
    w.write_text("destination", &m.destination, 20)?;
    w.write_bool(m.dte);
    w.write_spare(1);
    Ok(())
}

fn decode_static_voyage(_: u8, r: &mut BitReader) -> Result<AisMessage, AisError> {
    let (_, mmsi) = read_header(r)?;
    let ais_version = r.read_uint(2)? as u8;
    let imo_number = r.read_uint(30)? as u32;
    let call_sign = r.read_text(7)?;
    let name = r.read_text(20)?;
    let ship_type = r.read_uint(8)? as u8;
    let dimensions = read_dimensions(r)?;
    let epfd = read_epfd(r)?;
    let eta = Eta {
        month: r.read_uint(4)? as u8,
        day: r.read_uint(5)? as u8,
        hour: r.read_uint(5)? as u8,
        minute: r.read_uint(6)? as u8,
    };
    let draught = r.read_uint(8)?;
    let destination = r.read_text(20)?;
    let dte = r.read_bool()?;
    Ok(AisMessage::StaticVoyageData(StaticVoyageData {
        mmsi,
        ais_version,
        imo_number,
        call_sign,
        name,
        ship_type,
        dimensions,
        epfd,
        eta,
        draught: (draught != AIS_DRAUGHT_NOT_AVAILABLE).then(|| draught as f64 / 10.0),
        destination,
        dte,
    }))
}

// ------------------------------------------------------------------------------------------------
// Type 18
// ------------------------------------------------------------------------------------------------

fn encode_class_b_position(message: &AisMessage, w: &mut BitWriter) -> Result<(), AisError> {
    let AisMessage::ClassBPositionReport(m) = message else {
        return Err(mismatch(message.message_type()));
    };
    write_header(w, 18, 0, m.mmsi)?;
    w.write_spare(8);
    write_speed(w, m.speed_knots)?;
    w.write_bool(m.position_accuracy);
    write_position(w, m.position)?;
    write_course(w, m.course_deg)?;
    write_heading(w, m.heading_deg)?;
    write_timestamp(w, m.timestamp_second)?;
    w.write_spare(2);
    w.write_bool(m.cs_unit);
    // display, DSC, band, message 22 and assigned flags
    w.write_spare(5);
    w.write_bool(m.raim);
    w.write_uint("radio_status", m.radio_status as u64, 20)
}

fn decode_class_b_position(_: u8, r: &mut BitReader) -> Result<AisMessage, AisError> {
    let (_, mmsi) = read_header(r)?;
    r.skip(8)?;
    let speed_knots = read_speed(r)?;
    let position_accuracy = r.read_bool()?;
    let position = read_position(r)?;
    let course_deg = read_course(r)?;
    let heading_deg = read_heading(r)?;
    let timestamp_second = r.read_uint(6)? as u8;
    r.skip(2)?;
    let cs_unit = r.read_bool()?;
    r.skip(5)?;
    let raim = r.read_bool()?;
    let radio_status = r.read_uint(20)? as u32;
    Ok(AisMessage::ClassBPositionReport(ClassBPositionReport {
        mmsi,
        speed_knots,
        position_accuracy,
        position,
        course_deg,
        heading_deg,
        timestamp_second,
        cs_unit,
        raim,
        radio_status,
    }))
}

// ------------------------------------------------------------------------------------------------
// Type 19
// ------------------------------------------------------------------------------------------------

fn encode_extended_class_b(message: &AisMessage, w: &mut BitWriter) -> Result<(), AisError> {
    let AisMessage::ExtendedClassBReport(m) = message else {
        return Err(mismatch(message.message_type()));
    };
    write_header(w, 19, 0, m.mmsi)?;
    w.write_spare(8);
    write_speed(w, m.speed_knots)?;
    w.write_bool(m.position_accuracy);
    write_position(w, m.position)?;
    write_course(w, m.course_deg)?;
    write_heading(w, m.heading_deg)?;
    write_timestamp(w, m.timestamp_second)?;
    w.write_spare(4);
    w.write_text("name", &m.name, 20)?;
    w.write_uint("ship_type", m.ship_type as u64, 8)?;
    write_dimensions(w, &m.dimensions)?;
    write_epfd(w, m.epfd)?;
    w.write_bool(m.raim);
    w.write_bool(m.dte);
    // assigned mode flag, then spare
    w.write_spare(5);
    Ok(())
}

fn decode_extended_class_b(_: u8, r: &mut BitReader) -> Result<AisMessage, AisError> {
    let (_, mmsi) = read_header(r)?;
    r.skip(8)?;
    let speed_knots = read_speed(r)?;
    let position_accuracy = r.read_bool()?;
    let position = read_position(r)?;
    let course_deg = read_course(r)?;
    let heading_deg = read_heading(r)?;
    let timestamp_second = r.read_uint(6)? as u8;
    r.skip(4)?;
    let name = r.read_text(20)?;
    let ship_type = r.read_uint(8)? as u8;
    let dimensions = read_dimensions(r)?;
    let epfd = read_epfd(r)?;
    let raim = r.read_bool()?;
    let dte = r.read_bool()?;
    Ok(AisMessage::ExtendedClassBReport(ExtendedClassBReport {
        mmsi,
        speed_knots,
        position_accuracy,
        position,
        course_deg,
        heading_deg,
        timestamp_second,
        name,
        ship_type,
        dimensions,
        epfd,
        raim,
        dte,
    }))
}

// ------------------------------------------------------------------------------------------------
// Type 21
// ------------------------------------------------------------------------------------------------

fn encode_aid_to_navigation(message: &AisMessage, w: &mut BitWriter) -> Result<(), AisError> {
    let AisMessage::AidToNavigationReport(m) = message else {
        return Err(mismatch(message.message_type()));
    };
    write_header(w, 21, 0, m.mmsi)?;
    w.write_uint("aid_type", m.aid_type as u64, 5)?;
    w.write_text("name", &m.name, 20)?;
    w.write_bool(m.position_accuracy);
    write_position(w, m.position)?;
    write_dimensions(w, &m.dimensions)?;
    write_epfd(w, m.epfd)?;
    write_timestamp(w, m.timestamp_second)?;
    w.write_bool(m.off_position);
    // regional reserved
    w.write_spare(8);
    w.write_bool(m.raim);
    w.write_bool(m.virtual_aid);
    w.write_bool(m.assigned);
    w.write_spare(1);
    Ok(())
}

fn decode_aid_to_navigation(_: u8, r: &mut BitReader) -> Result<AisMessage, AisError> {
    let (_, mmsi) = read_header(r)?;
    let aid_type = r.read_uint(5)? as u8;
    let name = r.read_text(20)?;
    let position_accuracy = r.read_bool()?;
    let position = read_position(r)?;
    let dimensions = read_dimensions(r)?;
    let epfd = read_epfd(r)?;
    let timestamp_second = r.read_uint(6)? as u8;
    let off_position = r.read_bool()?;
    r.skip(8)?;
    let raim = r.read_bool()?;
    let virtual_aid = r.read_bool()?;
    let assigned = r.read_bool()?;
    Ok(AisMessage::AidToNavigationReport(AidToNavigationReport {
        mmsi,
        aid_type,
        name,
        position_accuracy,
        position,
        dimensions,
        epfd,
        timestamp_second,
        off_position,
        raim,
        virtual_aid,
        assigned,
    }))
}

// ------------------------------------------------------------------------------------------------
// Type 24
// ------------------------------------------------------------------------------------------------

fn encode_static_data(message: &AisMessage, w: &mut BitWriter) -> Result<(), AisError> {
    let AisMessage::StaticDataReport(m) = message else {
        return Err(mismatch(message.message_type()));
    };
    write_header(w, 24, 0, m.mmsi)?;
    match &m.part {
        StaticDataPart::A { name } => {
            w.write_uint("part", 0, 2)?;
            w.write_text("name", name, 20)?;
            w.write_spare(8);
        }
        StaticDataPart::B { ship_type, vendor_id, unit_model, serial_number, call_sign, dimensions, epfd } => {
            w.write_uint("part", 1, 2)?;
            w.write_uint("ship_type", *ship_type as u64, 8)?;
            w.write_text("vendor_id", vendor_id, 3)?;
            w.write_uint("unit_model", *unit_model as u64, 4)?;
            w.write_uint("serial_number", *serial_number as u64, 20)?;
            w.write_text("call_sign", call_sign, 7)?;
            write_dimensions(w, dimensions)?;
            write_epfd(w, *epfd)?;
            w.write_spare(2);
        }
    }
    Ok(())
}

fn decode_static_data(_: u8, r: &mut BitReader) -> Result<AisMessage, AisError> {
    let (_, mmsi) = read_header(r)?;
    let part = match r.read_uint(2)? {
        0 => StaticDataPart::A { name: r.read_text(20)? },
        1 => StaticDataPart::B {
            ship_type: r.read_uint(8)? as u8,
            vendor_id: r.read_text(3)?,
            unit_model: r.read_uint(4)? as u8,
            serial_number: r.read_uint(20)? as u32,
            call_sign: r.read_text(7)?,
            dimensions: read_dimensions(r)?,
            epfd: read_epfd(r)?,
        },
        other => return Err(AisError::InvalidFieldValue { field: "part", value: other }),
    };
    Ok(AisMessage::StaticDataReport(StaticDataReport { mmsi, part }))
}
