pub mod types;
pub mod codec;
pub mod ais;
pub mod movement;
pub mod clock;
pub mod engine;
pub mod output;
pub mod utils;

pub use ais::AisEncoder;
pub use clock::SimulationClock;
pub use engine::{EngineConfig, SimulationEngine};
pub use movement::MovementModel;
pub use output::OutputSink;
