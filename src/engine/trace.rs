use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to one due (entity, message kind) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventKind {
    Emitted,
    EncodingFailed,
}

/// A structured record of one generation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Simulated UTC time of the emission
    pub timestamp: DateTime<Utc>,
    pub virtual_time_ms: u64,
    pub kind: TraceEventKind,
    /// MMSI of the entity
    pub entity_id: u32,
    /// `AIS1`, `AIS5`, `GGA` and so on
    pub message_type: String,
    pub sentences: Vec<String>,
    /// Wall-clock time spent moving the entity and encoding
    pub generation_duration_us: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Receives a trace event for every processed pair
#[async_trait]
pub trait TraceSink: Send + Sync {
    /// Record one event; called from the engine loop and must not block
    fn record(&self, event: &TraceEvent);

    /// Flush anything buffered, called once when the engine stops
    async fn close(&self) {}
}

/// Keeps every event in memory
#[cfg(any(test, feature = "test"))]
#[derive(Debug, Default)]
pub struct CollectingTraceSink {
    events: std::sync::Mutex<Vec<TraceEvent>>,
}

#[cfg(any(test, feature = "test"))]
impl CollectingTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[cfg(any(test, feature = "test"))]
#[async_trait]
impl TraceSink for CollectingTraceSink {
    fn record(&self, event: &TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
