use chrono::{TimeZone, Utc};

use super::encoder::{golden_position_report, sample_static_voyage};
use crate::ais::messages::{rot_from_ais, rot_to_ais};
use crate::ais::{self, reports, AisEncoder, Channel};
use crate::types::{
    AidToNavigation, AisMessage, BaseStation, Dimensions, Kinematics, Mmsi, Position, StaticDataPart,
    VesselClass, VesselState,
};

/// One unit of the 1/10000 minute position resolution
const POSITION_RESOLUTION: f64 = 1.0 / 600_000.0;

fn roundtrip(message: &AisMessage) -> AisMessage {
    let mut encoder = AisEncoder::new();
    let sentences = encoder.encode(message, Channel::A).expect("encodes");
    ais::decode(&sentences).expect("decodes")
}

fn assert_position_close(a: Option<Position>, b: Option<Position>) {
    let (a, b) = (a.expect("position"), b.expect("position"));
    assert!((a.latitude() - b.latitude()).abs() <= POSITION_RESOLUTION, "{} vs {}", a, b);
    assert!((a.longitude() - b.longitude()).abs() <= POSITION_RESOLUTION, "{} vs {}", a, b);
}

fn sample_vessel(class: VesselClass) -> VesselState {
    let mut vessel = VesselState::new(
        Mmsi(367001234),
        "Pacific Trader",
        class,
        Kinematics::new(Position::new(-33.8568, 151.2153), 12.3, 245.6),
    );
    vessel.kinematics.heading_deg = 244.6;
    vessel.kinematics.rate_of_turn = -10.0;
    vessel.call_sign = "WDC1234".to_string();
    vessel.ship_type = 37;
    vessel.dimensions = Dimensions { to_bow: 8, to_stern: 4, to_port: 2, to_starboard: 2 };
    vessel
}

/// Tests the Type 1 round trip:
/// - Position within one 1/10000 minute unit
/// - Speed and course at 0.1 resolution
/// - Rate of turn re-encodes to the same ROT_AIS value
#[test]
fn test_position_report_roundtrip() {
    let utc = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 42).unwrap();
    let original = reports::class_a_position(&sample_vessel(VesselClass::A), utc);
    let (AisMessage::PositionReport(sent), AisMessage::PositionReport(received)) = (&original, roundtrip(&original)) else {
        panic!("unexpected variant");
    };

    assert_eq!(received.mmsi, sent.mmsi);
    assert_eq!(received.nav_status, sent.nav_status);
    assert_position_close(received.position, sent.position);
    assert_eq!(received.speed_knots, Some(12.3));
    assert!((received.course_deg.unwrap() - 245.6).abs() < 1e-9);
    assert_eq!(received.heading_deg, Some(245));
    assert_eq!(received.timestamp_second, 42);
    assert_eq!(rot_to_ais(received.rate_of_turn), rot_to_ais(sent.rate_of_turn));
    assert!(received.rate_of_turn.unwrap() < 0.0);
}

/// Tests the "not available" sentinels survive a round trip as None
#[test]
fn test_not_available_sentinels() {
    let AisMessage::PositionReport(mut report) = golden_position_report() else { unreachable!() };
    report.position = None;
    report.speed_knots = None;
    report.course_deg = None;
    report.heading_deg = None;
    report.rate_of_turn = None;
    report.timestamp_second = 60;

    let AisMessage::PositionReport(decoded) = roundtrip(&AisMessage::PositionReport(report.clone())) else {
        unreachable!()
    };
    assert_eq!(decoded, report);
}

/// Tests the ROT mapping saturates and keeps its sign
#[test]
fn test_rate_of_turn_mapping() {
    assert_eq!(rot_to_ais(Some(0.0)), 0);
    assert_eq!(rot_to_ais(Some(720.0)), 126);
    assert_eq!(rot_to_ais(Some(-720.0)), -126);
    assert_eq!(rot_to_ais(None), -128);
    assert_eq!(rot_from_ais(-128), None);
    assert_eq!(rot_from_ais(0), Some(0.0));
    assert!(rot_from_ais(-15).unwrap() < 0.0);
}

/// Tests Types 4, 5 and 21 round trips
#[test]
fn test_station_and_static_roundtrip() {
    let utc = Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 33).unwrap();

    let station = BaseStation::new(Mmsi(3669999), Position::new(37.8, -122.4));
    let original = reports::base_station(&station, utc);
    let AisMessage::BaseStationReport(decoded) = roundtrip(&original) else { unreachable!() };
    assert_eq!(decoded.utc, utc);
    assert_eq!(decoded.mmsi, Mmsi(3669999));
    assert_eq!(decoded.epfd, station.epfd);
    assert_position_close(decoded.position, Some(station.position));

    let original = AisMessage::StaticVoyageData(sample_static_voyage());
    assert_eq!(roundtrip(&original), original);

    let mut aid = AidToNavigation::new(Mmsi(993672001), "Golden Gate Buoy", 22, Position::new(37.81, -122.48));
    aid.virtual_aid = true;
    let original = reports::aid_to_navigation(&aid, utc);
    let AisMessage::AidToNavigationReport(decoded) = roundtrip(&original) else { unreachable!() };
    assert_eq!(decoded.name, "GOLDEN GATE BUOY");
    assert_eq!(decoded.aid_type, 22);
    assert!(decoded.virtual_aid);
    assert_eq!(decoded.timestamp_second, 33);
    assert_position_close(decoded.position, Some(aid.position));
}

/// Tests Class B round trips:
/// - Type 18 position report
/// - Type 19 extended report with name and dimensions
/// - Type 24 Parts A and B
#[test]
fn test_class_b_roundtrip() {
    let utc = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap();
    let vessel = sample_vessel(VesselClass::B);

    let original = reports::class_b_position(&vessel, utc);
    let AisMessage::ClassBPositionReport(decoded) = roundtrip(&original) else { unreachable!() };
    assert_eq!(decoded.speed_knots, Some(12.3));
    assert!(decoded.cs_unit);
    assert_position_close(decoded.position, Some(vessel.kinematics.position));

    let original = reports::extended_class_b(&vessel, utc);
    let AisMessage::ExtendedClassBReport(decoded) = roundtrip(&original) else { unreachable!() };
    assert_eq!(decoded.name, "PACIFIC TRADER");
    assert_eq!(decoded.ship_type, 37);
    assert_eq!(decoded.dimensions, vessel.dimensions);
    assert_eq!(decoded.timestamp_second, 5);

    let [part_a, part_b] = reports::static_data_b(&vessel);
    let AisMessage::StaticDataReport(decoded) = roundtrip(&part_a) else { unreachable!() };
    assert_eq!(decoded.part, StaticDataPart::A { name: "PACIFIC TRADER".to_string() });
    assert_eq!(roundtrip(&part_b), part_b);
}
