use async_trait::async_trait;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::{OutputSink, SinkCounters, SinkError, SinkStats};

/// UDP sink settings
#[derive(Debug, Clone, Deserialize)]
pub struct UdpSinkConfig {
    /// Destination address, unicast, broadcast or multicast group
    pub destination: String,
    /// Local address to send from
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub broadcast: bool,
    /// TTL for multicast destinations
    #[serde(default)]
    pub multicast_ttl: Option<u32>,
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Sentences waiting for the sender task; further sentences are dropped
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

fn default_bind_address() -> String {
    "0.0.0.0:0".to_string()
}

fn default_send_timeout_ms() -> u64 {
    100
}

fn default_buffer() -> usize {
    64
}

impl UdpSinkConfig {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            bind_address: default_bind_address(),
            broadcast: false,
            multicast_ttl: None,
            send_timeout_ms: default_send_timeout_ms(),
            buffer: default_buffer(),
        }
    }
}

/// Best-effort datagram sink, one sentence per datagram
pub struct UdpSink {
    name: String,
    config: UdpSinkConfig,
    sender: Option<mpsc::Sender<String>>,
    task: Option<JoinHandle<()>>,
    counters: Arc<SinkCounters>,
}

impl UdpSink {
    pub fn new(config: UdpSinkConfig) -> Self {
        Self {
            name: format!("udp:{}", config.destination),
            config,
            sender: None,
            task: None,
            counters: Arc::new(SinkCounters::default()),
        }
    }
}

#[async_trait]
impl OutputSink for UdpSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&mut self) -> Result<(), SinkError> {
        if self.sender.is_some() {
            return Err(SinkError::AlreadyRunning(self.name.clone()));
        }
        let destination: SocketAddr = self
            .config
            .destination
            .parse()
            .map_err(|_| SinkError::InvalidAddress(self.config.destination.clone()))?;
        let socket = UdpSocket::bind(self.config.bind_address.as_str())
            .await
            .map_err(|source| SinkError::Bind { address: self.config.bind_address.clone(), source })?;
        socket.set_broadcast(self.config.broadcast)?;
        if let Some(ttl) = self.config.multicast_ttl {
            socket.set_multicast_ttl_v4(ttl)?;
        }

        let (sender, receiver) = mpsc::channel(self.config.buffer.max(1));
        let send_timeout = Duration::from_millis(self.config.send_timeout_ms);
        self.sender = Some(sender);
        self.task = Some(tokio::spawn(send_datagrams(
            socket,
            destination,
            receiver,
            send_timeout,
            self.counters.clone(),
        )));
        tracing::info!("UDP sink sending to {}", destination);
        Ok(())
    }

    /// Hand the sentence to the sender task; a full hand-off buffer drops it
    fn write(&self, sentence: &str) -> Result<(), SinkError> {
        let sender = self.sender.as_ref().ok_or_else(|| SinkError::NotRunning(self.name.clone()))?;
        match sender.try_send(sentence.to_string()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.counters.record_dropped();
                Ok(())
            }
            Err(TrySendError::Closed(_)) => {
                self.counters.record_dropped();
                Err(SinkError::Closed(self.name.clone()))
            }
        }
    }

    async fn close(&mut self, grace: Duration) -> Result<(), SinkError> {
        self.sender.take();
        if let Some(mut task) = self.task.take() {
            if timeout(grace, &mut task).await.is_err() {
                task.abort();
            }
        }
        Ok(())
    }

    fn stats(&self) -> SinkStats {
        self.counters.snapshot()
    }
}

async fn send_datagrams(
    socket: UdpSocket,
    destination: SocketAddr,
    mut receiver: mpsc::Receiver<String>,
    send_timeout: Duration,
    counters: Arc<SinkCounters>,
) {
    while let Some(sentence) = receiver.recv().await {
        match timeout(send_timeout, socket.send_to(sentence.as_bytes(), destination)).await {
            Ok(Ok(sent)) => counters.record_sent(sent),
            Ok(Err(e)) => {
                tracing::warn!("UDP send to {} failed: {}", destination, e);
                counters.record_error();
            }
            Err(_) => {
                tracing::warn!("UDP send to {} timed out after {:?}", destination, send_timeout);
                counters.record_error();
            }
        }
    }
}
