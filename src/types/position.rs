use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic position in decimal degrees.
///
/// Latitude is clamped into [-90, 90] and longitude wraps into [-180, 180), so a
/// `Position` is always in range no matter how it was produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPosition", into = "RawPosition")]
pub struct Position {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize, Deserialize)]
struct RawPosition {
    latitude: f64,
    longitude: f64,
}

impl Position {
    /// Create a normalized position
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: latitude.clamp(-90.0, 90.0),
            longitude: wrap_longitude(longitude),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Wrap a longitude into [-180, 180)
pub fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..180.0).contains(&longitude) {
        return longitude;
    }
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can land exactly on 360 for tiny negative inputs
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Normalize a bearing into [0, 360)
pub fn normalize_course(course: f64) -> f64 {
    let c = course.rem_euclid(360.0);
    if c >= 360.0 {
        0.0
    } else {
        c
    }
}

impl From<RawPosition> for Position {
    fn from(raw: RawPosition) -> Self {
        Position::new(raw.latitude, raw.longitude)
    }
}

impl From<Position> for RawPosition {
    fn from(p: Position) -> Self {
        RawPosition { latitude: p.latitude, longitude: p.longitude }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_normalization() {
        let p = Position::new(95.0, 190.0);
        assert_eq!(p.latitude(), 90.0);
        assert!((p.longitude() - -170.0).abs() < 1e-9);

        let p = Position::new(-91.0, -180.5);
        assert_eq!(p.latitude(), -90.0);
        assert!((p.longitude() - 179.5).abs() < 1e-9);

        assert_eq!(Position::new(0.0, 180.0).longitude(), -180.0);
        assert_eq!(Position::new(10.0, -122.4194).longitude(), -122.4194);
    }

    #[test]
    fn test_course_normalization() {
        assert_eq!(normalize_course(0.0), 0.0);
        assert_eq!(normalize_course(360.0), 0.0);
        assert!((normalize_course(-90.0) - 270.0).abs() < 1e-9);
        assert!((normalize_course(725.0) - 5.0).abs() < 1e-9);
        assert!(normalize_course(-1e-18) < 360.0);
    }
}
