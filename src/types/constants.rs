use std::time::Duration;

/// Mean earth radius used for spherical projection, in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per second in one knot
pub const KNOTS_TO_MPS: f64 = 0.514444;

/// Maximum NMEA 0183 sentence length including the leading delimiter and `\r\n`
pub const MAX_SENTENCE_LENGTH: usize = 82;

/// Maximum armored payload characters carried by a single AIVDM fragment
pub const AIS_FRAGMENT_THRESHOLD: usize = 56;

/// Sequential message ids cycle through 1..=AIS_MAX_SEQUENTIAL_ID
pub const AIS_MAX_SEQUENTIAL_ID: u8 = 9;

/// Largest value an MMSI may take (nine decimal digits)
pub const MAX_MMSI: u32 = 999_999_999;

// ------------------------------------------------------------------------------------------------
// AIS "not available" sentinels
// ------------------------------------------------------------------------------------------------

pub const AIS_LATITUDE_NOT_AVAILABLE: i64 = 91 * 600_000;
pub const AIS_LONGITUDE_NOT_AVAILABLE: i64 = 181 * 600_000;
pub const AIS_SOG_NOT_AVAILABLE: u64 = 1023;
pub const AIS_SOG_MAX: u64 = 1022;
pub const AIS_COG_NOT_AVAILABLE: u64 = 3600;
pub const AIS_HEADING_NOT_AVAILABLE: u64 = 511;
pub const AIS_ROT_NOT_AVAILABLE: i64 = -128;
pub const AIS_ROT_MAX: i64 = 126;
pub const AIS_TIMESTAMP_NOT_AVAILABLE: u8 = 60;
pub const AIS_DRAUGHT_NOT_AVAILABLE: u64 = 0;

// ------------------------------------------------------------------------------------------------
// Default reporting intervals
// ------------------------------------------------------------------------------------------------

pub const DEFAULT_GPS_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_BASE_STATION_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_STATIC_VOYAGE_INTERVAL: Duration = Duration::from_secs(360);
pub const DEFAULT_AID_TO_NAVIGATION_INTERVAL: Duration = Duration::from_secs(180);
pub const DEFAULT_CLASS_B_POSITION_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_EXTENDED_CLASS_B_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_CLASS_B_STATIC_INTERVAL: Duration = Duration::from_secs(360);

/// Lower bound for the Class A position report interval
pub const MIN_CLASS_A_INTERVAL: Duration = Duration::from_secs(2);
