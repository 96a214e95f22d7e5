//! Reporting intervals per message kind.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::EngineError;
use crate::types::constants::{
    DEFAULT_AID_TO_NAVIGATION_INTERVAL, DEFAULT_BASE_STATION_INTERVAL, DEFAULT_CLASS_B_POSITION_INTERVAL,
    DEFAULT_CLASS_B_STATIC_INTERVAL, DEFAULT_EXTENDED_CLASS_B_INTERVAL, DEFAULT_GPS_INTERVAL,
    DEFAULT_STATIC_VOYAGE_INTERVAL, MIN_CLASS_A_INTERVAL,
};
use crate::types::{MessageKind, VesselState};

/// Interval between emissions of each message kind, in virtual seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateTable {
    /// GGA and RMC
    pub gps_secs: f64,
    pub base_station_secs: f64,
    pub static_voyage_secs: f64,
    pub aid_to_navigation_secs: f64,
    pub class_b_position_secs: f64,
    pub extended_class_b_secs: f64,
    pub class_b_static_secs: f64,
    /// Speed dependent Class A position report intervals
    pub class_a: ClassAReportingTable,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            gps_secs: DEFAULT_GPS_INTERVAL.as_secs_f64(),
            base_station_secs: DEFAULT_BASE_STATION_INTERVAL.as_secs_f64(),
            static_voyage_secs: DEFAULT_STATIC_VOYAGE_INTERVAL.as_secs_f64(),
            aid_to_navigation_secs: DEFAULT_AID_TO_NAVIGATION_INTERVAL.as_secs_f64(),
            class_b_position_secs: DEFAULT_CLASS_B_POSITION_INTERVAL.as_secs_f64(),
            extended_class_b_secs: DEFAULT_EXTENDED_CLASS_B_INTERVAL.as_secs_f64(),
            class_b_static_secs: DEFAULT_CLASS_B_STATIC_INTERVAL.as_secs_f64(),
            class_a: ClassAReportingTable::default(),
        }
    }
}

/// One row of the Class A reporting table, applying from `min_speed` up to the next row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedBreakpoint {
    /// Lower speed bound in knots, inclusive
    pub min_speed: f64,
    pub interval_secs: f64,
    /// Interval while the vessel is changing course
    pub maneuvering_secs: f64,
}

/// Class A position report intervals after ITU-R M.1371 Table 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassAReportingTable {
    /// Interval for anchored or moored vessels at or below `stationary_max_speed`
    pub stationary_secs: f64,
    pub stationary_max_speed: f64,
    /// Rate of turn, in degrees per minute, from which a vessel counts as changing course
    pub maneuver_rot_threshold: f64,
    /// Rows in ascending `min_speed` order
    pub breakpoints: Vec<SpeedBreakpoint>,
    /// No interval is ever shorter than this
    pub min_interval_secs: f64,
}

impl Default for ClassAReportingTable {
    fn default() -> Self {
        Self {
            stationary_secs: 180.0,
            stationary_max_speed: 3.0,
            maneuver_rot_threshold: 5.0,
            breakpoints: vec![
                SpeedBreakpoint { min_speed: 0.0, interval_secs: 10.0, maneuvering_secs: 10.0 / 3.0 },
                SpeedBreakpoint { min_speed: 14.0, interval_secs: 6.0, maneuvering_secs: 2.0 },
                SpeedBreakpoint { min_speed: 23.0, interval_secs: 2.0, maneuvering_secs: 2.0 },
            ],
            min_interval_secs: MIN_CLASS_A_INTERVAL.as_secs_f64(),
        }
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidRate(format!("{} must be positive, got {}", name, value)))
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl ClassAReportingTable {
    pub fn validate(&self) -> Result<(), EngineError> {
        check_positive("class_a.stationary_secs", self.stationary_secs)?;
        check_positive("class_a.min_interval_secs", self.min_interval_secs)?;
        if !(self.stationary_max_speed.is_finite() && self.maneuver_rot_threshold.is_finite()) {
            return Err(EngineError::InvalidRate("class_a thresholds must be finite".to_string()));
        }
        if self.breakpoints.is_empty() {
            return Err(EngineError::InvalidRate("class_a.breakpoints must not be empty".to_string()));
        }
        for row in &self.breakpoints {
            check_positive("class_a.breakpoints.interval_secs", row.interval_secs)?;
            check_positive("class_a.breakpoints.maneuvering_secs", row.maneuvering_secs)?;
        }
        for pair in self.breakpoints.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            if !(upper.min_speed > lower.min_speed) {
                return Err(EngineError::InvalidRate(format!(
                    "class_a.breakpoints must be in ascending speed order ({} after {})",
                    upper.min_speed, lower.min_speed
                )));
            }
            if upper.interval_secs > lower.interval_secs || upper.maneuvering_secs > lower.maneuvering_secs {
                return Err(EngineError::InvalidRate(format!(
                    "class_a interval at {} kn is longer than at {} kn",
                    upper.min_speed, lower.min_speed
                )));
            }
        }
        Ok(())
    }

    /// Reporting interval for a vessel at `speed_knots` turning at `rate_of_turn` deg/min
    pub fn interval(&self, speed_knots: f64, rate_of_turn: f64, stationary: bool) -> Duration {
        let minimum = secs(self.min_interval_secs);
        if stationary && speed_knots <= self.stationary_max_speed {
            return secs(self.stationary_secs).max(minimum);
        }

        let row = self
            .breakpoints
            .iter()
            .rev()
            .find(|row| speed_knots >= row.min_speed)
            .or_else(|| self.breakpoints.first());
        let Some(row) = row else {
            return minimum;
        };
        let maneuvering = rate_of_turn.abs() >= self.maneuver_rot_threshold;
        let interval = if maneuvering { row.maneuvering_secs } else { row.interval_secs };
        secs(interval).max(minimum)
    }
}

impl RateTable {
    pub fn validate(&self) -> Result<(), EngineError> {
        check_positive("gps_secs", self.gps_secs)?;
        check_positive("base_station_secs", self.base_station_secs)?;
        check_positive("static_voyage_secs", self.static_voyage_secs)?;
        check_positive("aid_to_navigation_secs", self.aid_to_navigation_secs)?;
        check_positive("class_b_position_secs", self.class_b_position_secs)?;
        check_positive("extended_class_b_secs", self.extended_class_b_secs)?;
        check_positive("class_b_static_secs", self.class_b_static_secs)?;
        self.class_a.validate()
    }

    /// Interval until the next emission of `kind`.
    ///
    /// Class A position reports depend on the vessel's reported speed, rate of turn and
    /// navigational status; without a vessel the slowest moving row applies.
    pub fn interval_for(&self, kind: MessageKind, vessel: Option<&VesselState>) -> Duration {
        match kind {
            MessageKind::PositionReportA => match vessel {
                Some(v) => self.class_a.interval(
                    v.kinematics.speed_knots,
                    v.kinematics.rate_of_turn,
                    v.nav_status.is_stationary(),
                ),
                None => self.class_a.interval(0.0, 0.0, false),
            },
            MessageKind::Gga | MessageKind::Rmc => secs(self.gps_secs),
            MessageKind::BaseStationReport => secs(self.base_station_secs),
            MessageKind::StaticVoyageData => secs(self.static_voyage_secs),
            MessageKind::AidToNavigation => secs(self.aid_to_navigation_secs),
            MessageKind::PositionReportB => secs(self.class_b_position_secs),
            MessageKind::ExtendedReportB => secs(self.extended_class_b_secs),
            MessageKind::StaticDataB => secs(self.class_b_static_secs),
        }
    }
}
