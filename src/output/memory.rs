use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{OutputSink, SinkCounters, SinkError, SinkStats};

/// In-memory sink collecting every sentence, for tests
#[derive(Clone)]
pub struct MemorySink {
    name: String,
    lines: Arc<Mutex<Vec<String>>>,
    counters: Arc<SinkCounters>,
    running: bool,
    fail_start: bool,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(SinkCounters::default()),
            running: false,
            fail_start: false,
        }
    }

    /// A sink whose `start` fails, as a port already in use would
    pub fn failing(name: impl Into<String>) -> Self {
        Self { fail_start: true, ..Self::new(name) }
    }

    /// Everything written so far; clones share the same buffer
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&mut self) -> Result<(), SinkError> {
        if self.fail_start {
            return Err(SinkError::Bind {
                address: self.name.clone(),
                source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
            });
        }
        self.running = true;
        Ok(())
    }

    fn write(&self, sentence: &str) -> Result<(), SinkError> {
        if !self.running {
            return Err(SinkError::NotRunning(self.name.clone()));
        }
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(sentence.to_string());
            self.counters.record_sent(sentence.len());
        }
        Ok(())
    }

    async fn close(&mut self, _grace: Duration) -> Result<(), SinkError> {
        self.running = false;
        Ok(())
    }

    fn stats(&self) -> SinkStats {
        self.counters.snapshot()
    }
}
