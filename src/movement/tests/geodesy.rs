use crate::movement::geodesy::{course_change, destination, distance_m, initial_bearing};
use crate::types::Position;

/// Tests that destination and distance agree for a range of bearings
#[test]
fn test_destination_distance_consistency() {
    let start = Position::new(37.7749, -122.4194);
    for bearing in (0..360).step_by(15) {
        let end = destination(start, bearing as f64, 10_000.0);
        let measured = distance_m(start, end);
        assert!((measured - 10_000.0).abs() < 1e-3, "bearing {}: {}", bearing, measured);

        let back = initial_bearing(start, end);
        assert!(course_change(bearing as f64, back).abs() < 1e-6, "bearing {} came back as {}", bearing, back);
    }
}

/// Tests projection edge cases:
/// - Zero and non-finite distances leave the position untouched
/// - Crossing the antimeridian wraps the longitude
/// - Crossing the pole keeps the latitude in range
#[test]
fn test_destination_edge_cases() {
    let start = Position::new(10.0, 179.999);
    assert_eq!(destination(start, 90.0, 0.0), start);
    assert_eq!(destination(start, 90.0, f64::NAN), start);

    let east = destination(start, 90.0, 1_000.0);
    assert!(east.longitude() < -179.99, "expected wrap, got {}", east);

    let polar = destination(Position::new(89.999, 0.0), 0.0, 5_000.0);
    assert!(polar.latitude() <= 90.0 && polar.latitude() > 89.9);
    assert!((polar.longitude().abs() - 180.0).abs() < 1e-6);
}

/// Tests the signed course difference used for rate of turn
#[test]
fn test_course_change() {
    assert_eq!(course_change(350.0, 10.0), 20.0);
    assert_eq!(course_change(10.0, 350.0), -20.0);
    assert_eq!(course_change(90.0, 90.0), 0.0);
    assert_eq!(course_change(0.0, 180.0), 180.0);
}
