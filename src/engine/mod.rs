use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::ais::AisError;
use crate::clock::ClockError;
use crate::codec::CodecError;
use crate::output::SinkError;
use crate::types::Mmsi;

pub mod node;
pub mod rates;
pub mod scheduler;
pub mod trace;

pub use node::{EngineHandle, RunSummary, SimulationEngine, SinkSummary};
pub use rates::{ClassAReportingTable, RateTable, SpeedBreakpoint};
pub use scheduler::{DueEntry, Scheduler};
pub use trace::{TraceEvent, TraceEventKind, TraceSink};

#[cfg(any(test, feature = "test"))]
pub use trace::CollectingTraceSink;

#[cfg(test)]
mod tests;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine is {found}, expected {expected}")]
    InvalidState { expected: EngineState, found: EngineState },
    #[error("Invalid clock configuration: {0}")]
    Clock(#[from] ClockError),
    #[error("Duplicate MMSI in scenario: {0}")]
    DuplicateMmsi(Mmsi),
    #[error("Invalid rate table: {0}")]
    InvalidRate(String),
    #[error("Sink {name} failed to start: {source}")]
    SinkStart { name: String, source: SinkError },
    #[error("Engine task failed: {0}")]
    TaskFailed(String),
}

/// Failure to turn one due (entity, message kind) pair into sentences
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Ais(#[from] AisError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Lifecycle of a [`SimulationEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::Running => "running",
            EngineState::Stopping => "stopping",
            EngineState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Engine settings that are not part of the scenario itself
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Seed for movement jitter; runs with the same seed and scenario are reproducible
    #[serde(default)]
    pub seed: Option<u64>,
    /// How long sinks may take to flush on shutdown
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    #[serde(default)]
    pub rates: RateTable,
}

fn default_shutdown_grace_ms() -> u64 {
    2000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            shutdown_grace_ms: default_shutdown_grace_ms(),
            rates: RateTable::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
