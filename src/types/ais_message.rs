use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Dimensions, EpfdType, Eta, Mmsi, NavigationStatus, Position};

/// An AIS message ready for encoding, tagged by message type.
///
/// Optional fields encode as the ITU "not available" sentinel when `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AisMessage {
    /// Types 1, 2 and 3
    PositionReport(PositionReport),
    /// Type 4
    BaseStationReport(BaseStationReport),
    /// Type 5
    StaticVoyageData(StaticVoyageData),
    /// Type 18
    ClassBPositionReport(ClassBPositionReport),
    /// Type 19
    ExtendedClassBReport(ExtendedClassBReport),
    /// Type 21
    AidToNavigationReport(AidToNavigationReport),
    /// Type 24, Part A or Part B
    StaticDataReport(StaticDataReport),
}

impl AisMessage {
    pub fn message_type(&self) -> u8 {
        match self {
            AisMessage::PositionReport(m) => m.message_type,
            AisMessage::BaseStationReport(_) => 4,
            AisMessage::StaticVoyageData(_) => 5,
            AisMessage::ClassBPositionReport(_) => 18,
            AisMessage::ExtendedClassBReport(_) => 19,
            AisMessage::AidToNavigationReport(_) => 21,
            AisMessage::StaticDataReport(_) => 24,
        }
    }

    pub fn mmsi(&self) -> Mmsi {
        match self {
            AisMessage::PositionReport(m) => m.mmsi,
            AisMessage::BaseStationReport(m) => m.mmsi,
            AisMessage::StaticVoyageData(m) => m.mmsi,
            AisMessage::ClassBPositionReport(m) => m.mmsi,
            AisMessage::ExtendedClassBReport(m) => m.mmsi,
            AisMessage::AidToNavigationReport(m) => m.mmsi,
            AisMessage::StaticDataReport(m) => m.mmsi,
        }
    }
}

/// Class A position report (types 1, 2, 3)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// 1 (scheduled), 2 (assigned scheduled) or 3 (response to interrogation)
    pub message_type: u8,
    pub repeat: u8,
    pub mmsi: Mmsi,
    pub nav_status: NavigationStatus,
    /// Degrees per minute
    pub rate_of_turn: Option<f64>,
    pub speed_knots: Option<f64>,
    pub position_accuracy: bool,
    pub position: Option<Position>,
    pub course_deg: Option<f64>,
    pub heading_deg: Option<u16>,
    /// UTC second of the fix, 60 when not available
    pub timestamp_second: u8,
    pub maneuver: u8,
    pub raim: bool,
    pub radio_status: u32,
}

/// Base station report (type 4)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStationReport {
    pub mmsi: Mmsi,
    pub utc: DateTime<Utc>,
    pub position_accuracy: bool,
    pub position: Option<Position>,
    pub epfd: EpfdType,
    pub raim: bool,
    pub radio_status: u32,
}

/// Static and voyage related data (type 5)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticVoyageData {
    pub mmsi: Mmsi,
    pub ais_version: u8,
    /// 0 when not available
    pub imo_number: u32,
    pub call_sign: String,
    pub name: String,
    pub ship_type: u8,
    pub dimensions: Dimensions,
    pub epfd: EpfdType,
    pub eta: Eta,
    pub draught: Option<f64>,
    pub destination: String,
    /// Data terminal equipment flag, true means not ready
    pub dte: bool,
}

/// Standard Class B position report (type 18)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassBPositionReport {
    pub mmsi: Mmsi,
    pub speed_knots: Option<f64>,
    pub position_accuracy: bool,
    pub position: Option<Position>,
    pub course_deg: Option<f64>,
    pub heading_deg: Option<u16>,
    pub timestamp_second: u8,
    /// Carrier-sense unit flag
    pub cs_unit: bool,
    pub raim: bool,
    pub radio_status: u32,
}

/// Extended Class B position report (type 19)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedClassBReport {
    pub mmsi: Mmsi,
    pub speed_knots: Option<f64>,
    pub position_accuracy: bool,
    pub position: Option<Position>,
    pub course_deg: Option<f64>,
    pub heading_deg: Option<u16>,
    pub timestamp_second: u8,
    pub name: String,
    pub ship_type: u8,
    pub dimensions: Dimensions,
    pub epfd: EpfdType,
    pub raim: bool,
    pub dte: bool,
}

/// Aid-to-navigation report (type 21)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidToNavigationReport {
    pub mmsi: Mmsi,
    pub aid_type: u8,
    pub name: String,
    pub position_accuracy: bool,
    pub position: Option<Position>,
    pub dimensions: Dimensions,
    pub epfd: EpfdType,
    pub timestamp_second: u8,
    pub off_position: bool,
    pub raim: bool,
    pub virtual_aid: bool,
    pub assigned: bool,
}

/// Static data report (type 24)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticDataReport {
    pub mmsi: Mmsi,
    pub part: StaticDataPart,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StaticDataPart {
    A {
        name: String,
    },
    B {
        ship_type: u8,
        /// Three character manufacturer id
        vendor_id: String,
        unit_model: u8,
        serial_number: u32,
        call_sign: String,
        dimensions: Dimensions,
        epfd: EpfdType,
    },
}
