//! Snapshots of simulated entities as AIS messages.

use chrono::{DateTime, Timelike, Utc};

use crate::types::constants::AIS_TIMESTAMP_NOT_AVAILABLE;
use crate::types::{
    AidToNavigation, AidToNavigationReport, AisMessage, BaseStation, BaseStationReport, ClassBPositionReport,
    ExtendedClassBReport, Kinematics, PositionReport, StaticDataPart, StaticDataReport, StaticVoyageData,
    VesselState,
};

/// Radio status for a SOTDMA unit with no slot reservation information
const SOTDMA_RADIO_STATUS: u32 = 0;
/// Class B "CS" units send this fixed radio status
const CS_RADIO_STATUS: u32 = 0b1100000000000000110;
const SIMULATED_VENDOR_ID: &str = "SIM";

fn timestamp_second(utc: DateTime<Utc>) -> u8 {
    let second = utc.second();
    if second < 60 {
        second as u8
    } else {
        AIS_TIMESTAMP_NOT_AVAILABLE
    }
}

fn heading(kinematics: &Kinematics) -> Option<u16> {
    kinematics
        .heading_deg
        .is_finite()
        .then(|| (kinematics.heading_deg.round() as i64).rem_euclid(360) as u16)
}

pub fn class_a_position(vessel: &VesselState, utc: DateTime<Utc>) -> AisMessage {
    let k = &vessel.kinematics;
    AisMessage::PositionReport(PositionReport {
        message_type: 1,
        repeat: 0,
        mmsi: vessel.mmsi,
        nav_status: vessel.nav_status,
        rate_of_turn: Some(k.rate_of_turn),
        speed_knots: Some(k.speed_knots),
        position_accuracy: false,
        position: Some(k.position),
        course_deg: Some(k.course_deg),
        heading_deg: heading(k),
        timestamp_second: timestamp_second(utc),
        maneuver: 0,
        raim: false,
        radio_status: SOTDMA_RADIO_STATUS,
    })
}

pub fn static_voyage(vessel: &VesselState) -> AisMessage {
    AisMessage::StaticVoyageData(StaticVoyageData {
        mmsi: vessel.mmsi,
        ais_version: 0,
        imo_number: vessel.imo_number.unwrap_or(0),
        call_sign: vessel.call_sign.clone(),
        name: vessel.name.clone(),
        ship_type: vessel.ship_type,
        dimensions: vessel.dimensions,
        epfd: vessel.epfd,
        eta: vessel.voyage.eta,
        draught: vessel.voyage.draught,
        destination: vessel.voyage.destination.clone(),
        dte: false,
    })
}

pub fn class_b_position(vessel: &VesselState, utc: DateTime<Utc>) -> AisMessage {
    let k = &vessel.kinematics;
    AisMessage::ClassBPositionReport(ClassBPositionReport {
        mmsi: vessel.mmsi,
        speed_knots: Some(k.speed_knots),
        position_accuracy: false,
        position: Some(k.position),
        course_deg: Some(k.course_deg),
        heading_deg: heading(k),
        timestamp_second: timestamp_second(utc),
        cs_unit: true,
        raim: false,
        radio_status: CS_RADIO_STATUS,
    })
}

pub fn extended_class_b(vessel: &VesselState, utc: DateTime<Utc>) -> AisMessage {
    let k = &vessel.kinematics;
    AisMessage::ExtendedClassBReport(ExtendedClassBReport {
        mmsi: vessel.mmsi,
        speed_knots: Some(k.speed_knots),
        position_accuracy: false,
        position: Some(k.position),
        course_deg: Some(k.course_deg),
        heading_deg: heading(k),
        timestamp_second: timestamp_second(utc),
        name: vessel.name.clone(),
        ship_type: vessel.ship_type,
        dimensions: vessel.dimensions,
        epfd: vessel.epfd,
        raim: false,
        dte: false,
    })
}

/// Class B static data goes out as Part A followed by Part B
pub fn static_data_b(vessel: &VesselState) -> [AisMessage; 2] {
    let part_a = StaticDataReport {
        mmsi: vessel.mmsi,
        part: StaticDataPart::A { name: vessel.name.clone() },
    };
    let part_b = StaticDataReport {
        mmsi: vessel.mmsi,
        part: StaticDataPart::B {
            ship_type: vessel.ship_type,
            vendor_id: SIMULATED_VENDOR_ID.to_string(),
            unit_model: 0,
            serial_number: vessel.mmsi.0 % (1 << 20),
            call_sign: vessel.call_sign.clone(),
            dimensions: vessel.dimensions,
            epfd: vessel.epfd,
        },
    };
    [AisMessage::StaticDataReport(part_a), AisMessage::StaticDataReport(part_b)]
}

pub fn base_station(station: &BaseStation, utc: DateTime<Utc>) -> AisMessage {
    AisMessage::BaseStationReport(BaseStationReport {
        mmsi: station.mmsi,
        utc,
        position_accuracy: true,
        position: Some(station.position),
        epfd: station.epfd,
        raim: false,
        radio_status: SOTDMA_RADIO_STATUS,
    })
}

pub fn aid_to_navigation(aid: &AidToNavigation, utc: DateTime<Utc>) -> AisMessage {
    AisMessage::AidToNavigationReport(AidToNavigationReport {
        mmsi: aid.mmsi,
        aid_type: aid.aid_type,
        name: aid.name.clone(),
        position_accuracy: true,
        position: Some(aid.position),
        dimensions: aid.dimensions,
        epfd: aid.epfd,
        timestamp_second: timestamp_second(utc),
        off_position: aid.off_position,
        raim: false,
        virtual_aid: aid.virtual_aid,
        assigned: false,
    })
}
