
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

use crate::clock::SimulationClock;
use crate::engine::{EngineConfig, SimulationEngine};
use crate::movement::{LinearModel, MovementModel};
use crate::output::MemorySink;
use crate::types::{Kinematics, Mmsi, Position, Scenario, VesselClass, VesselState};

pub(super) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Class A vessel heading east at 15 kn with GPS output and no jitter
pub(super) fn eastbound_vessel(mmsi: u32) -> VesselState {
    let kinematics = Kinematics::new(Position::new(37.7749, -122.4194), 15.0, 90.0);
    let mut vessel = VesselState::new(Mmsi(mmsi), "EASTBOUND", VesselClass::A, kinematics)
        .with_movement(MovementModel::Linear(LinearModel::new(0.0, 0.0, 0.0)));
    vessel.call_sign = "WDC1234".to_string();
    vessel.gps_output = true;
    vessel
}

pub(super) fn single_vessel_scenario(duration: Option<Duration>) -> Scenario {
    let mut scenario = Scenario::new("single vessel", start_time());
    scenario.duration = duration;
    scenario.vessels.push(eastbound_vessel(367001234));
    scenario
}

/// Engine with one memory sink, seeded, at time factor 1 and 1 s ticks
pub(super) fn engine_with_memory_sink(scenario: Scenario) -> (SimulationEngine, MemorySink) {
    let sink = MemorySink::new("memory");
    let mut engine = SimulationEngine::new(
        scenario,
        SimulationClock::new(1.0, Duration::from_secs(1)),
        EngineConfig::default().with_seed(7),
    );
    engine.add_sink(Box::new(sink.clone())).unwrap();
    (engine, sink)
}
