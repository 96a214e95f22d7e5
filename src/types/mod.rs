pub mod ais_message;
pub mod constants;
pub mod position;
pub mod scenario;
pub mod sentence;
pub mod vessel;

pub use ais_message::{
    AidToNavigationReport, AisMessage, BaseStationReport, ClassBPositionReport, ExtendedClassBReport,
    PositionReport, StaticDataPart, StaticDataReport, StaticVoyageData,
};
pub use position::{normalize_course, wrap_longitude, Position};
pub use scenario::Scenario;
pub use sentence::{NmeaSentence, StartDelimiter};
pub use vessel::{
    AidToNavigation, BaseStation, Dimensions, EpfdType, Eta, Kinematics, MessageKind, Mmsi,
    NavigationStatus, VesselClass, VesselState, VoyageData,
};
