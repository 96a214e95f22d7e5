use crate::ais::{self, AisEncoder, AisError, Channel};
use crate::codec;
use crate::types::{
    AisMessage, Dimensions, EpfdType, Eta, Mmsi, NavigationStatus, Position, PositionReport, StaticVoyageData,
};
use crate::utils::logging;

pub(super) fn golden_position_report() -> AisMessage {
    AisMessage::PositionReport(PositionReport {
        message_type: 1,
        repeat: 0,
        mmsi: Mmsi(367001234),
        nav_status: NavigationStatus::UnderWayUsingEngine,
        rate_of_turn: Some(0.0),
        speed_knots: Some(15.0),
        position_accuracy: false,
        position: Some(Position::new(37.7749, -122.4194)),
        course_deg: Some(90.0),
        heading_deg: Some(90),
        timestamp_second: 19,
        maneuver: 0,
        raim: false,
        radio_status: 0,
    })
}

pub(super) fn sample_static_voyage() -> StaticVoyageData {
    StaticVoyageData {
        mmsi: Mmsi(367001234),
        ais_version: 0,
        imo_number: 9_074_729,
        call_sign: "WDC1234".to_string(),
        name: "PACIFIC TRADER".to_string(),
        ship_type: 70,
        dimensions: Dimensions { to_bow: 120, to_stern: 30, to_port: 10, to_starboard: 12 },
        epfd: EpfdType::Gps,
        eta: Eta { month: 6, day: 15, hour: 14, minute: 30 },
        draught: Some(8.4),
        destination: "OAKLAND".to_string(),
        dte: false,
    }
}

/// Tests the Type 1 golden payload:
/// - Verifies the exact AIVDM sentence for a fixed report
/// - Verifies the checksum validates
#[test]
fn test_type1_golden_sentence() {
    logging::init_logging();
    logging::log("TEST", "=== Starting test_type1_golden_sentence ===");

    let mut encoder = AisEncoder::new();
    let sentences = encoder.encode(&golden_position_report(), Channel::A).expect("encodes");

    assert_eq!(sentences, vec!["!AIVDM,1,1,,A,15MwvTP02FG?Vt@EWFs3Q2lV0000,0*79\r\n".to_string()]);
    assert!(codec::validate(&sentences[0]));

    logging::log("TEST", "✓ Golden payload matches");
}

/// Tests the fragmentation law on a 424-bit Type 5 message:
/// - ceil(71 / 56) = 2 fragments numbered 1..2 sharing one sequential id
/// - Only the final fragment carries the fill bits
#[test]
fn test_type5_fragments() {
    let mut encoder = AisEncoder::new();
    let message = AisMessage::StaticVoyageData(sample_static_voyage());
    let sentences = encoder.encode(&message, Channel::B).expect("encodes");
    assert_eq!(sentences.len(), 2);

    let parsed: Vec<_> = sentences.iter().map(|s| codec::parse(s).expect("valid fragment")).collect();
    assert_eq!(parsed[0].fields[..4], ["2", "1", "1", "B"]);
    assert_eq!(parsed[1].fields[..4], ["2", "2", "1", "B"]);
    assert_eq!(parsed[0].fields[4].len(), 56);
    assert_eq!(parsed[1].fields[4].len(), 15);
    assert_eq!(parsed[0].fields[5], "0");
    assert_eq!(parsed[1].fields[5], "2");

    assert_eq!(ais::decode(&sentences), Ok(message));
}

/// Tests fragment counts for every threshold that keeps a Type 5 payload within nine fragments
#[test]
fn test_fragmentation_law() {
    let message = AisMessage::StaticVoyageData(sample_static_voyage());
    let (payload, _) = ais::encode_payload(&message).unwrap();
    assert_eq!(payload.len(), 71);

    for threshold in 8..=80usize {
        let mut encoder = AisEncoder::new().with_fragment_threshold(threshold);
        let sentences = encoder.encode(&message, Channel::A).expect("encodes");
        let expected = (payload.len() + threshold - 1) / threshold;
        assert_eq!(sentences.len(), expected, "threshold {}", threshold);

        let ids: Vec<String> = sentences
            .iter()
            .map(|s| codec::parse(s).unwrap().fields[2].clone())
            .collect();
        for (index, sentence) in sentences.iter().enumerate() {
            let parsed = codec::parse(sentence).unwrap();
            assert_eq!(parsed.fields[1], (index + 1).to_string());
        }
        if expected == 1 {
            assert_eq!(ids, vec![String::new()]);
        } else {
            assert!(ids.iter().all(|id| id == "1"));
        }
    }

    let mut encoder = AisEncoder::new().with_fragment_threshold(7);
    assert!(matches!(
        encoder.encode(&message, Channel::A),
        Err(AisError::TooManyFragments { fragments: 11, .. })
    ));
}

/// Tests that sequential ids cycle through 1..=9 across multi-fragment messages
#[test]
fn test_sequential_id_cycles() {
    let mut encoder = AisEncoder::new();
    let message = AisMessage::StaticVoyageData(sample_static_voyage());

    let ids: Vec<String> = (0..10)
        .map(|_| {
            let sentences = encoder.encode(&message, Channel::A).unwrap();
            codec::parse(&sentences[0]).unwrap().fields[2].clone()
        })
        .collect();
    assert_eq!(ids, ["1", "2", "3", "4", "5", "6", "7", "8", "9", "1"]);

    // Single-fragment messages do not consume an id
    encoder.encode(&golden_position_report(), Channel::A).unwrap();
    let next = encoder.encode(&message, Channel::A).unwrap();
    assert_eq!(codec::parse(&next[0]).unwrap().fields[2], "2");
}

/// Tests data errors:
/// - Dimensions beyond their bit width
/// - Ship type beyond eight bits is impossible, heading beyond 359 is rejected
/// - MMSI above nine digits
/// - Speed saturates instead of failing
#[test]
fn test_out_of_range_fields() {
    let mut encoder = AisEncoder::new();

    let mut data = sample_static_voyage();
    data.dimensions.to_port = 64;
    assert_eq!(
        encoder.encode(&AisMessage::StaticVoyageData(data), Channel::A),
        Err(AisError::FieldOutOfRange { field: "to_port", value: 64, width: 6 })
    );

    let mut data = sample_static_voyage();
    data.imo_number = 1 << 30;
    assert!(matches!(
        encoder.encode(&AisMessage::StaticVoyageData(data), Channel::A),
        Err(AisError::FieldOutOfRange { field: "imo_number", .. })
    ));

    let AisMessage::PositionReport(mut report) = golden_position_report() else { unreachable!() };
    report.heading_deg = Some(400);
    assert!(matches!(
        encoder.encode(&AisMessage::PositionReport(report.clone()), Channel::A),
        Err(AisError::FieldOutOfRange { field: "heading", .. })
    ));

    report.heading_deg = Some(90);
    report.mmsi = Mmsi(1_000_000_000);
    assert_eq!(
        encoder.encode(&AisMessage::PositionReport(report.clone()), Channel::A),
        Err(AisError::InvalidMmsi(1_000_000_000))
    );

    report.mmsi = Mmsi(367001234);
    report.speed_knots = Some(250.0);
    let sentences = encoder.encode(&AisMessage::PositionReport(report), Channel::A).expect("speed saturates");
    let AisMessage::PositionReport(decoded) = ais::decode(&sentences).unwrap() else { unreachable!() };
    assert_eq!(decoded.speed_knots, Some(102.2));

    let mut unsupported = golden_position_report();
    if let AisMessage::PositionReport(r) = &mut unsupported {
        r.message_type = 7;
    }
    assert_eq!(encoder.encode(&unsupported, Channel::A), Err(AisError::UnsupportedMessageType(7)));
}

/// Tests fragment reassembly failures on the decode path
#[test]
fn test_decode_fragment_errors() {
    let mut encoder = AisEncoder::new();
    let message = AisMessage::StaticVoyageData(sample_static_voyage());
    let sentences = encoder.encode(&message, Channel::A).unwrap();

    assert!(matches!(ais::decode(&sentences[..1]), Err(AisError::Fragment(_))));
    let reversed = vec![sentences[1].clone(), sentences[0].clone()];
    assert!(matches!(ais::decode(&reversed), Err(AisError::Fragment(_))));

    let other = encoder.encode(&message, Channel::A).unwrap();
    let mixed = vec![sentences[0].clone(), other[1].clone()];
    assert!(matches!(ais::decode(&mixed), Err(AisError::Fragment(_))));

    let empty: [&str; 0] = [];
    assert!(ais::decode(&empty).is_err());
}
