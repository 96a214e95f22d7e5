//! Spherical earth geometry.

use crate::types::constants::EARTH_RADIUS_M;
use crate::types::{normalize_course, Position};

/// Point reached by travelling `distance_m` along the great circle leaving `from` at `bearing_deg`
pub fn destination(from: Position, bearing_deg: f64, distance_m: f64) -> Position {
    if !(distance_m.is_finite() && distance_m > 0.0) || !bearing_deg.is_finite() {
        return from;
    }

    let angular = distance_m / EARTH_RADIUS_M;
    let bearing = bearing_deg.to_radians();
    let lat1 = from.latitude().to_radians();
    let lon1 = from.longitude().to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());

    Position::new(lat2.to_degrees(), lon2.to_degrees())
}

/// Initial great-circle bearing from `from` to `to`, in [0, 360)
pub fn initial_bearing(from: Position, to: Position) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let delta_lon = (to.longitude() - from.longitude()).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    normalize_course(y.atan2(x).to_degrees())
}

/// Haversine distance in meters
pub fn distance_m(a: Position, b: Position) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let delta_lat = lat2 - lat1;
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).max(0.0).sqrt())
}

/// Signed smallest rotation from `from` to `to`, in (-180, 180], positive clockwise
pub fn course_change(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}
