//! Configuration loader and validator for the NMEA simulator.
//! Parses a TOML scenario file and turns it into the library's scenario, clock, engine and sink types.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use nmea_sim::engine::EngineConfig;
use nmea_sim::movement::MovementModel;
use nmea_sim::output::{
    FileSink, FileSinkConfig, OutputSink, TcpSink, TcpSinkConfig, UdpSink, UdpSinkConfig,
};
use nmea_sim::types::constants::MAX_MMSI;
use nmea_sim::types::{
    AidToNavigation, BaseStation, Dimensions, EpfdType, Eta, Kinematics, Mmsi, NavigationStatus,
    Position, Scenario, VesselClass, VesselState, VoyageData,
};
use nmea_sim::SimulationClock;

/// Default location of the scenario file used by the binary
pub const DEFAULT_CONFIG_PATH: &str = "simulator/config/simple.toml";

/// Highest speed a position report can carry, in knots
const MAX_REPORTED_SPEED: f64 = 102.2;

// ------------------------------------------------------------------------------------------------
// Main Configuration Structs
// ------------------------------------------------------------------------------------------------

/// Main configuration struct for a simulation run.
///
/// This struct contains everything needed to run one scenario: the scenario metadata, the
/// virtual clock, the engine knobs, every simulated entity and the output sinks.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Scenario name, start time and duration
    pub scenario: ScenarioConfig,
    /// Virtual clock speed and tick granularity
    #[serde(default)]
    pub clock: ClockConfig,
    /// Seed, shutdown grace and reporting rate table
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub vessels: Vec<VesselConfig>,
    #[serde(default)]
    pub base_stations: Vec<BaseStationConfig>,
    #[serde(default)]
    pub aids: Vec<AidConfig>,
    /// Where generated sentences go
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
    /// Trace and summary files
    #[serde(default)]
    pub output: OutputConfig,
}

/// Scenario metadata.
#[derive(Debug, Deserialize, Clone)]
pub struct ScenarioConfig {
    pub name: String,
    /// Simulated UTC time at virtual time zero, defaults to the wall clock at load
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Virtual seconds to simulate; the run is open-ended when unset
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Configuration for the virtual clock.
#[derive(Debug, Deserialize, Clone)]
pub struct ClockConfig {
    /// Virtual seconds per real second
    #[serde(default = "default_time_factor")]
    pub time_factor: f64,
    /// Virtual seconds between scheduler ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval: f64,
}

fn default_time_factor() -> f64 {
    1.0
}

fn default_tick_interval() -> f64 {
    1.0
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_factor: default_time_factor(),
            tick_interval: default_tick_interval(),
        }
    }
}

/// One simulated vessel and its initial kinematics.
#[derive(Debug, Deserialize, Clone)]
pub struct VesselConfig {
    pub mmsi: u32,
    pub name: String,
    #[serde(default)]
    pub call_sign: String,
    #[serde(default)]
    pub imo_number: Option<u32>,
    /// ITU ship and cargo type code
    #[serde(default)]
    pub ship_type: u8,
    /// Transponder class, "A" or "B"
    pub class: VesselClass,
    #[serde(default = "default_nav_status")]
    pub nav_status: NavigationStatus,
    #[serde(default)]
    pub epfd: EpfdType,
    /// Initial latitude in decimal degrees
    pub latitude: f64,
    /// Initial longitude in decimal degrees
    pub longitude: f64,
    /// Initial speed over ground in knots
    pub speed: f64,
    /// Initial course over ground in degrees
    pub course: f64,
    /// True heading, defaults to the course
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub eta: Eta,
    /// Static draught in meters
    #[serde(default)]
    pub draught: Option<f64>,
    /// Also emit GGA/RMC fixes for this vessel
    #[serde(default)]
    pub gps_output: bool,
    /// Class B only: also emit Type 19 extended reports
    #[serde(default)]
    pub extended_reports: bool,
    /// Movement model, linear without jitter when omitted
    #[serde(default)]
    pub movement: MovementModel,
}

fn default_nav_status() -> NavigationStatus {
    NavigationStatus::UnderWayUsingEngine
}

/// A fixed AIS base station.
#[derive(Debug, Deserialize, Clone)]
pub struct BaseStationConfig {
    pub mmsi: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Position fixing device, surveyed when omitted
    #[serde(default)]
    pub epfd: Option<EpfdType>,
}

/// An aid to navigation.
#[derive(Debug, Deserialize, Clone)]
pub struct AidConfig {
    pub mmsi: u32,
    pub name: String,
    /// ITU aid type code, 0 to 31
    pub aid_type: u8,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub virtual_aid: bool,
    #[serde(default)]
    pub off_position: bool,
}

/// One output sink, selected by its `type` key.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    File(FileSinkConfig),
    Tcp(TcpSinkConfig),
    Udp(UdpSinkConfig),
}

/// Files written next to the sentence stream.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    /// JSON-lines trace of every generation step
    #[serde(default)]
    pub trace_path: Option<PathBuf>,
    /// JSON run summary written when the run ends
    #[serde(default)]
    pub summary_path: Option<PathBuf>,
}

// ------------------------------------------------------------------------------------------------
// Error Types and Validation
// ------------------------------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Seconds as a Duration, None when the value has no representation
fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

fn validate_position(mmsi: u32, latitude: f64, longitude: f64) -> Result<(), ConfigError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(invalid(format!("Latitude of {} must be between -90 and 90", mmsi)));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid(format!("Longitude of {} must be between -180 and 180", mmsi)));
    }
    Ok(())
}

impl VesselConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_position(self.mmsi, self.latitude, self.longitude)?;
        if !(0.0..=MAX_REPORTED_SPEED).contains(&self.speed) {
            return Err(invalid(format!(
                "Speed of {} must be between 0 and {} knots",
                self.mmsi, MAX_REPORTED_SPEED
            )));
        }
        if !(0.0..360.0).contains(&self.course) {
            return Err(invalid(format!("Course of {} must be in [0, 360)", self.mmsi)));
        }
        if let Some(heading) = self.heading {
            if !(0.0..360.0).contains(&heading) {
                return Err(invalid(format!("Heading of {} must be in [0, 360)", self.mmsi)));
            }
        }
        if self.extended_reports && self.class == VesselClass::A {
            return Err(invalid(format!("Extended reports are Class B only ({})", self.mmsi)));
        }
        if let MovementModel::Waypoint(model) = &self.movement {
            if model.waypoints.is_empty() {
                return Err(invalid(format!("Waypoint movement of {} needs at least one waypoint", self.mmsi)));
            }
        }
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// Configuration Implementation Methods
// ------------------------------------------------------------------------------------------------

impl Config {
    /// Read, parse and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(path)?;
        Self::from_toml(&config_str)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(config_str: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(duration) = self.scenario.duration {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(invalid("Scenario duration must be positive"));
            }
            if seconds(duration).is_none() {
                return Err(invalid(format!("Scenario duration of {:e} s is out of range", duration)));
            }
        }
        if !self.clock.time_factor.is_finite() || self.clock.time_factor <= 0.0 {
            return Err(invalid("Time factor must be positive"));
        }
        if !self.clock.tick_interval.is_finite() || self.clock.tick_interval <= 0.0 {
            return Err(invalid("Tick interval must be positive"));
        }
        if seconds(self.clock.tick_interval).is_none() {
            return Err(invalid(format!("Tick interval of {:e} s is out of range", self.clock.tick_interval)));
        }
        self.build_clock()
            .validate()
            .map_err(|e| invalid(e.to_string()))?;
        self.engine
            .rates
            .validate()
            .map_err(|e| invalid(e.to_string()))?;

        if self.vessels.is_empty() && self.base_stations.is_empty() && self.aids.is_empty() {
            return Err(invalid("Scenario must contain at least one vessel, base station or aid"));
        }
        if self.sinks.is_empty() {
            return Err(invalid("At least one sink must be configured"));
        }

        let mut seen = HashSet::new();
        let mmsis = self
            .vessels
            .iter()
            .map(|v| v.mmsi)
            .chain(self.base_stations.iter().map(|b| b.mmsi))
            .chain(self.aids.iter().map(|a| a.mmsi));
        for mmsi in mmsis {
            if mmsi == 0 || mmsi > MAX_MMSI {
                return Err(invalid(format!("MMSI {} is out of range", mmsi)));
            }
            if !seen.insert(mmsi) {
                return Err(invalid(format!("Duplicate MMSI {}", mmsi)));
            }
        }

        for vessel in &self.vessels {
            vessel.validate()?;
        }
        for station in &self.base_stations {
            validate_position(station.mmsi, station.latitude, station.longitude)?;
        }
        for aid in &self.aids {
            validate_position(aid.mmsi, aid.latitude, aid.longitude)?;
            if aid.aid_type > 31 {
                return Err(invalid(format!("Aid type of {} must be between 0 and 31", aid.mmsi)));
            }
        }
        Ok(())
    }

    /// Virtual run length, None for an open-ended run
    pub fn duration(&self) -> Option<Duration> {
        self.scenario.duration.and_then(seconds)
    }

    pub fn build_scenario(&self) -> Scenario {
        let start_time = self.scenario.start_time.unwrap_or_else(Utc::now);
        let mut scenario = Scenario::new(self.scenario.name.clone(), start_time);
        if let Some(duration) = self.duration() {
            scenario = scenario.with_duration(duration);
        }
        scenario.vessels = self.vessels.iter().map(VesselConfig::to_state).collect();
        scenario.base_stations = self
            .base_stations
            .iter()
            .map(|b| {
                let mut station = BaseStation::new(Mmsi(b.mmsi), Position::new(b.latitude, b.longitude));
                if let Some(epfd) = b.epfd {
                    station.epfd = epfd;
                }
                station
            })
            .collect();
        scenario.aids = self
            .aids
            .iter()
            .map(|a| {
                let mut aid = AidToNavigation::new(
                    Mmsi(a.mmsi),
                    a.name.clone(),
                    a.aid_type,
                    Position::new(a.latitude, a.longitude),
                );
                aid.dimensions = a.dimensions;
                aid.virtual_aid = a.virtual_aid;
                aid.off_position = a.off_position;
                aid
            })
            .collect();
        scenario
    }

    pub fn build_clock(&self) -> SimulationClock {
        SimulationClock::new(
            self.clock.time_factor,
            seconds(self.clock.tick_interval).unwrap_or(Duration::MAX),
        )
    }

    /// Unstarted sinks in configuration order
    pub fn build_sinks(&self) -> Vec<Box<dyn OutputSink>> {
        self.sinks
            .iter()
            .map(|sink| -> Box<dyn OutputSink> {
                match sink {
                    SinkConfig::File(c) => Box::new(FileSink::new(c.clone())),
                    SinkConfig::Tcp(c) => Box::new(TcpSink::new(c.clone())),
                    SinkConfig::Udp(c) => Box::new(UdpSink::new(c.clone())),
                }
            })
            .collect()
    }
}

impl VesselConfig {
    pub fn to_state(&self) -> VesselState {
        let mut kinematics = Kinematics::new(
            Position::new(self.latitude, self.longitude),
            self.speed,
            self.course,
        );
        if let Some(heading) = self.heading {
            kinematics.heading_deg = heading;
        }

        let mut vessel = VesselState::new(Mmsi(self.mmsi), self.name.clone(), self.class, kinematics)
            .with_movement(self.movement.clone());
        vessel.call_sign = self.call_sign.clone();
        vessel.imo_number = self.imo_number;
        vessel.ship_type = self.ship_type;
        vessel.dimensions = self.dimensions;
        vessel.nav_status = self.nav_status;
        vessel.epfd = self.epfd;
        vessel.voyage = VoyageData {
            destination: self.destination.clone(),
            eta: self.eta,
            draught: self.draught,
        };
        vessel.gps_output = self.gps_output;
        vessel.extended_reports = self.extended_reports;
        vessel
    }
}
