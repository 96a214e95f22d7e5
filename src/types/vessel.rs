use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::Position;
use crate::movement::MovementModel;

/// Maritime Mobile Service Identity of a vessel or station
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Mmsi(pub u32);

impl fmt::Display for Mmsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:09}", self.0)
    }
}

/// AIS transponder class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VesselClass {
    A,
    B,
}

/// Navigational status as transmitted in Class A position reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum NavigationStatus {
    UnderWayUsingEngine = 0,
    AtAnchor = 1,
    NotUnderCommand = 2,
    RestrictedManoeuvrability = 3,
    ConstrainedByDraught = 4,
    Moored = 5,
    Aground = 6,
    EngagedInFishing = 7,
    UnderWaySailing = 8,
    PowerDrivenTowingAstern = 11,
    PowerDrivenPushingAhead = 12,
    AisSart = 14,
    NotDefined = 15,
}

impl NavigationStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        use NavigationStatus::*;
        Some(match value {
            0 => UnderWayUsingEngine,
            1 => AtAnchor,
            2 => NotUnderCommand,
            3 => RestrictedManoeuvrability,
            4 => ConstrainedByDraught,
            5 => Moored,
            6 => Aground,
            7 => EngagedInFishing,
            8 => UnderWaySailing,
            11 => PowerDrivenTowingAstern,
            12 => PowerDrivenPushingAhead,
            14 => AisSart,
            15 => NotDefined,
            _ => return None,
        })
    }

    /// Anchored or moored vessels get the slow Class A reporting rate
    pub fn is_stationary(&self) -> bool {
        matches!(self, NavigationStatus::AtAnchor | NavigationStatus::Moored)
    }
}

/// Type of electronic position fixing device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EpfdType {
    Undefined = 0,
    Gps = 1,
    Glonass = 2,
    CombinedGpsGlonass = 3,
    LoranC = 4,
    Chayka = 5,
    IntegratedNavigation = 6,
    Surveyed = 7,
    Galileo = 8,
    InternalGnss = 15,
}

impl EpfdType {
    pub fn from_u8(value: u8) -> Option<Self> {
        use EpfdType::*;
        Some(match value {
            0 => Undefined,
            1 => Gps,
            2 => Glonass,
            3 => CombinedGpsGlonass,
            4 => LoranC,
            5 => Chayka,
            6 => IntegratedNavigation,
            7 => Surveyed,
            8 => Galileo,
            15 => InternalGnss,
            _ => return None,
        })
    }
}

impl Default for EpfdType {
    fn default() -> Self {
        EpfdType::Gps
    }
}

/// Distances from the position reference point to the hull, in meters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub to_bow: u16,
    pub to_stern: u16,
    pub to_port: u8,
    pub to_starboard: u8,
}

/// Estimated time of arrival; zero/24/60 fields mean "not available"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eta {
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl Default for Eta {
    fn default() -> Self {
        Self { month: 0, day: 0, hour: 24, minute: 60 }
    }
}

/// Voyage related data carried by static & voyage reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoyageData {
    pub destination: String,
    pub eta: Eta,
    /// Maximum present static draught in meters
    pub draught: Option<f64>,
}

/// The kinematic part of a vessel's state, the only part movement models touch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: Position,
    /// Speed over ground in knots
    pub speed_knots: f64,
    /// Course over ground in degrees, [0, 360)
    pub course_deg: f64,
    /// True heading in degrees, [0, 360)
    pub heading_deg: f64,
    /// Rate of turn in degrees per minute, positive to starboard
    pub rate_of_turn: f64,
}

impl Kinematics {
    pub fn new(position: Position, speed_knots: f64, course_deg: f64) -> Self {
        Self {
            position,
            speed_knots,
            course_deg,
            heading_deg: course_deg,
            rate_of_turn: 0.0,
        }
    }
}

/// The schedulable message kinds.
///
/// AIS kinds are declared in ascending AIS type id order, GPS sentences after them;
/// the derived `Ord` is the message-type tiebreak used by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    PositionReportA,
    BaseStationReport,
    StaticVoyageData,
    PositionReportB,
    ExtendedReportB,
    AidToNavigation,
    StaticDataB,
    Gga,
    Rmc,
}

impl MessageKind {
    /// The AIS message type id, if this kind is an AIS message
    pub fn ais_type(&self) -> Option<u8> {
        match self {
            MessageKind::PositionReportA => Some(1),
            MessageKind::BaseStationReport => Some(4),
            MessageKind::StaticVoyageData => Some(5),
            MessageKind::PositionReportB => Some(18),
            MessageKind::ExtendedReportB => Some(19),
            MessageKind::AidToNavigation => Some(21),
            MessageKind::StaticDataB => Some(24),
            MessageKind::Gga | MessageKind::Rmc => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.ais_type()) {
            (_, Some(t)) => write!(f, "AIS{}", t),
            (MessageKind::Gga, None) => write!(f, "GGA"),
            _ => write!(f, "RMC"),
        }
    }
}

/// A simulated vessel
#[derive(Debug, Clone)]
pub struct VesselState {
    pub mmsi: Mmsi,
    pub name: String,
    pub call_sign: String,
    pub imo_number: Option<u32>,
    /// ITU ship and cargo type code
    pub ship_type: u8,
    pub dimensions: Dimensions,
    pub class: VesselClass,
    pub nav_status: NavigationStatus,
    pub epfd: EpfdType,
    pub kinematics: Kinematics,
    pub voyage: VoyageData,
    /// Emit GGA/RMC sentences for this vessel
    pub gps_output: bool,
    /// Emit Type 19 extended reports (Class B only)
    pub extended_reports: bool,
    pub movement: MovementModel,
    /// Virtual time each message kind was last emitted
    pub last_sent: BTreeMap<MessageKind, Duration>,
    /// Virtual time the kinematics refer to
    pub last_update: Duration,
}

impl VesselState {
    pub fn new(mmsi: Mmsi, name: impl Into<String>, class: VesselClass, kinematics: Kinematics) -> Self {
        Self {
            mmsi,
            name: name.into(),
            call_sign: String::new(),
            imo_number: None,
            ship_type: 0,
            dimensions: Dimensions::default(),
            class,
            nav_status: NavigationStatus::UnderWayUsingEngine,
            epfd: EpfdType::Gps,
            kinematics,
            voyage: VoyageData::default(),
            gps_output: false,
            extended_reports: false,
            movement: MovementModel::default(),
            last_sent: BTreeMap::new(),
            last_update: Duration::ZERO,
        }
    }

    pub fn with_movement(mut self, movement: MovementModel) -> Self {
        self.movement = movement;
        self
    }

    /// The message kinds this vessel transmits
    pub fn message_kinds(&self) -> Vec<MessageKind> {
        let mut kinds = match self.class {
            VesselClass::A => vec![MessageKind::PositionReportA, MessageKind::StaticVoyageData],
            VesselClass::B => {
                let mut k = vec![MessageKind::PositionReportB, MessageKind::StaticDataB];
                if self.extended_reports {
                    k.push(MessageKind::ExtendedReportB);
                }
                k
            }
        };
        if self.gps_output {
            kinds.push(MessageKind::Gga);
            kinds.push(MessageKind::Rmc);
        }
        kinds.sort();
        kinds
    }
}

/// A fixed AIS base station
#[derive(Debug, Clone)]
pub struct BaseStation {
    pub mmsi: Mmsi,
    pub position: Position,
    pub epfd: EpfdType,
    pub last_sent: BTreeMap<MessageKind, Duration>,
}

impl BaseStation {
    pub fn new(mmsi: Mmsi, position: Position) -> Self {
        Self {
            mmsi,
            position,
            epfd: EpfdType::Surveyed,
            last_sent: BTreeMap::new(),
        }
    }
}

/// An aid to navigation (buoy, beacon, light)
#[derive(Debug, Clone)]
pub struct AidToNavigation {
    pub mmsi: Mmsi,
    pub name: String,
    /// ITU aid type code, 0..=31
    pub aid_type: u8,
    pub position: Position,
    pub dimensions: Dimensions,
    pub epfd: EpfdType,
    pub virtual_aid: bool,
    pub off_position: bool,
    pub last_sent: BTreeMap<MessageKind, Duration>,
}

impl AidToNavigation {
    pub fn new(mmsi: Mmsi, name: impl Into<String>, aid_type: u8, position: Position) -> Self {
        Self {
            mmsi,
            name: name.into(),
            aid_type,
            position,
            dimensions: Dimensions::default(),
            epfd: EpfdType::Surveyed,
            virtual_aid: false,
            off_position: false,
            last_sent: BTreeMap::new(),
        }
    }
}
