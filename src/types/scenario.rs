use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Duration;

use super::{AidToNavigation, BaseStation, Mmsi, VesselState};

/// Everything a simulation run operates on.
///
/// Membership is fixed once the engine starts; the engine only mutates the
/// entities in place.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    /// UTC time corresponding to virtual time zero
    pub start_time: DateTime<Utc>,
    /// Virtual run length, `None` runs until stopped
    pub duration: Option<Duration>,
    pub vessels: Vec<VesselState>,
    pub base_stations: Vec<BaseStation>,
    pub aids: Vec<AidToNavigation>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            start_time,
            duration: None,
            vessels: Vec::new(),
            base_stations: Vec::new(),
            aids: Vec::new(),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// MMSIs of all entities, in declaration order
    pub fn mmsis(&self) -> impl Iterator<Item = Mmsi> + '_ {
        self.vessels
            .iter()
            .map(|v| v.mmsi)
            .chain(self.base_stations.iter().map(|b| b.mmsi))
            .chain(self.aids.iter().map(|a| a.mmsi))
    }

    /// Return the first MMSI used by more than one entity
    pub fn find_duplicate_mmsi(&self) -> Option<Mmsi> {
        let mut seen = HashSet::new();
        self.mmsis().find(|mmsi| !seen.insert(*mmsi))
    }

    pub fn entity_count(&self) -> usize {
        self.vessels.len() + self.base_stations.len() + self.aids.len()
    }

    pub fn vessel(&self, mmsi: Mmsi) -> Option<&VesselState> {
        self.vessels.iter().find(|v| v.mmsi == mmsi)
    }
}
