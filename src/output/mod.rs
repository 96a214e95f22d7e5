use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

pub mod file;
pub mod tcp;
pub mod udp;

pub use file::{FileSink, FileSinkConfig};
pub use tcp::{TcpSink, TcpSinkConfig};
pub use udp::{UdpSink, UdpSinkConfig};

#[cfg(any(test, feature = "test"))]
mod memory;
#[cfg(any(test, feature = "test"))]
pub use memory::MemorySink;

#[cfg(test)]
mod tests;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to bind {address}: {source}")]
    Bind { address: String, source: std::io::Error },
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Sink {0} is not running")]
    NotRunning(String),
    #[error("Sink {0} is already running")]
    AlreadyRunning(String),
    #[error("Sink {0} is closed")]
    Closed(String),
    #[error("Sink writer task failed: {0}")]
    TaskFailed(String),
}

/// A destination for generated sentences.
///
/// `write` never blocks: every implementation hands the sentence to its own background task.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Name used in logs and run summaries
    fn name(&self) -> &str;

    /// Open files or sockets and spawn the background tasks
    async fn start(&mut self) -> Result<(), SinkError>;

    /// Queue a complete sentence, including its `\r\n` terminator
    fn write(&self, sentence: &str) -> Result<(), SinkError>;

    /// Flush queued sentences for at most `grace`, then release all resources
    async fn close(&mut self, grace: Duration) -> Result<(), SinkError>;

    /// Snapshot of the sink counters
    fn stats(&self) -> SinkStats;
}

/// Point-in-time sink statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkStats {
    /// Sentences delivered (per client for TCP)
    pub sent: u64,
    /// Sentences discarded because a queue was full or closed
    pub dropped: u64,
    pub errors: u64,
    pub bytes: u64,
    /// Currently connected clients (TCP only)
    pub clients: u64,
    /// Clients disconnected by the sink or the peer (TCP only)
    pub disconnects: u64,
}

/// Shared counters updated by a sink and its background tasks
#[derive(Debug, Default)]
pub struct SinkCounters {
    sent: AtomicU64,
    dropped: AtomicU64,
    errors: AtomicU64,
    bytes: AtomicU64,
    clients: AtomicU64,
    disconnects: AtomicU64,
}

impl SinkCounters {
    pub fn record_sent(&self, bytes: usize) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_connected(&self) {
        self.clients.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_disconnected(&self) {
        self.clients.fetch_sub(1, Ordering::Relaxed);
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SinkStats {
        SinkStats {
            sent: self.sent.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            clients: self.clients.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
        }
    }
}

fn default_true() -> bool {
    true
}
