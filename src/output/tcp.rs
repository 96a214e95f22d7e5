use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::{OutputSink, SinkCounters, SinkError, SinkStats};

/// TCP server sink settings
#[derive(Debug, Clone, Deserialize)]
pub struct TcpSinkConfig {
    /// Address to listen on, port 0 picks a free port
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Connections beyond this are refused
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// Sentences buffered per client before it is disconnected
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// A client whose socket write stalls longer than this is disconnected
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// SO_SNDBUF for accepted connections
    #[serde(default)]
    pub send_buffer_size: Option<u32>,
}

fn default_bind_address() -> String {
    "0.0.0.0:10110".to_string()
}

fn default_max_clients() -> usize {
    10
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_send_timeout_ms() -> u64 {
    1000
}

impl Default for TcpSinkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_clients: default_max_clients(),
            queue_capacity: default_queue_capacity(),
            send_timeout_ms: default_send_timeout_ms(),
            send_buffer_size: None,
        }
    }
}

impl TcpSinkConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

/// One connected client: its queue and the task draining it into the socket
struct Client {
    peer: SocketAddr,
    sender: mpsc::Sender<Arc<str>>,
    task: JoinHandle<()>,
}

type ClientRegistry = Arc<Mutex<HashMap<u64, Client>>>;

/// Serves sentences to every connected TCP client.
///
/// Each client has its own bounded queue and writer task, so a slow client only ever affects
/// itself: when its queue overflows or a write exceeds the send timeout it is disconnected.
pub struct TcpSink {
    name: String,
    config: TcpSinkConfig,
    /// Bound address, available once started
    local_addr: Option<SocketAddr>,
    clients: ClientRegistry,
    accept_task: Option<JoinHandle<()>>,
    counters: Arc<SinkCounters>,
}

impl TcpSink {
    pub fn new(config: TcpSinkConfig) -> Self {
        Self {
            name: format!("tcp:{}", config.bind_address),
            config,
            local_addr: None,
            clients: Arc::new(Mutex::new(HashMap::new())),
            accept_task: None,
            counters: Arc::new(SinkCounters::default()),
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn bind(&self) -> Result<TcpListener, SinkError> {
        let address: SocketAddr = self
            .config
            .bind_address
            .parse()
            .map_err(|_| SinkError::InvalidAddress(self.config.bind_address.clone()))?;
        let bind_error = |source| SinkError::Bind { address: address.to_string(), source };

        let socket = (if address.is_ipv4() { TcpSocket::new_v4() } else { TcpSocket::new_v6() }).map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        if let Some(size) = self.config.send_buffer_size {
            // Accepted sockets inherit the listener's buffer size
            socket.set_send_buffer_size(size).map_err(bind_error)?;
        }
        socket.bind(address).map_err(bind_error)?;
        socket.listen(1024).map_err(bind_error)
    }
}

#[async_trait]
impl OutputSink for TcpSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&mut self) -> Result<(), SinkError> {
        if self.accept_task.is_some() {
            return Err(SinkError::AlreadyRunning(self.name.clone()));
        }
        let listener = self.bind()?;
        let local_addr = listener.local_addr()?;
        self.local_addr = Some(local_addr);
        self.name = format!("tcp:{}", local_addr);

        let acceptor = Acceptor {
            listener,
            config: self.config.clone(),
            clients: self.clients.clone(),
            counters: self.counters.clone(),
            next_id: AtomicU64::new(0),
        };
        self.accept_task = Some(tokio::spawn(acceptor.run()));
        tracing::info!("TCP sink listening on {}", local_addr);
        Ok(())
    }

    fn write(&self, sentence: &str) -> Result<(), SinkError> {
        if self.accept_task.is_none() {
            return Err(SinkError::NotRunning(self.name.clone()));
        }
        let line: Arc<str> = Arc::from(sentence);
        let mut clients = self.clients.lock().map_err(|_| SinkError::Closed(self.name.clone()))?;

        let mut overflowed = Vec::new();
        for (id, client) in clients.iter() {
            match client.sender.try_send(line.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.counters.record_dropped();
                    overflowed.push(*id);
                }
                // The writer task already exited and is removing itself
                Err(TrySendError::Closed(_)) => self.counters.record_dropped(),
            }
        }
        for id in overflowed {
            if let Some(client) = clients.remove(&id) {
                tracing::warn!("Disconnecting TCP client {}: send queue full", client.peer);
                client.task.abort();
                self.counters.client_disconnected();
            }
        }
        Ok(())
    }

    async fn close(&mut self, grace: Duration) -> Result<(), SinkError> {
        if let Some(task) = self.accept_task.take() {
            task.abort();
        }
        let drained: Vec<Client> = match self.clients.lock() {
            Ok(mut clients) => clients.drain().map(|(_, c)| c).collect(),
            Err(_) => Vec::new(),
        };

        // Closing each queue lets the writer flush what is left and shut the socket down
        let mut tasks = Vec::with_capacity(drained.len());
        for client in drained {
            drop(client.sender);
            self.counters.client_disconnected();
            tasks.push((client.peer, client.task));
        }
        let flushed = futures::future::join_all(tasks.into_iter().map(|(peer, mut task)| async move {
            if timeout(grace, &mut task).await.is_err() {
                tracing::warn!("TCP client {} did not drain within {:?}", peer, grace);
                task.abort();
            }
        }));
        flushed.await;
        tracing::info!("TCP sink {} closed", self.name);
        Ok(())
    }

    fn stats(&self) -> SinkStats {
        let mut stats = self.counters.snapshot();
        stats.clients = self.client_count() as u64;
        stats
    }
}

struct Acceptor {
    listener: TcpListener,
    config: TcpSinkConfig,
    clients: ClientRegistry,
    counters: Arc<SinkCounters>,
    next_id: AtomicU64,
}

impl Acceptor {
    async fn run(self) {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!("TCP accept failed: {}", e);
                    self.counters.record_error();
                    continue;
                }
            };

            let mut clients = match self.clients.lock() {
                Ok(clients) => clients,
                Err(_) => return,
            };
            if clients.len() >= self.config.max_clients {
                tracing::warn!("Refusing TCP client {}: {} clients connected", peer, clients.len());
                drop(stream);
                continue;
            }
            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!("Could not set TCP_NODELAY for {}: {}", peer, e);
            }

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let (sender, receiver) = mpsc::channel(self.config.queue_capacity.max(1));
            let task = tokio::spawn(write_client(
                id,
                stream,
                receiver,
                self.config.send_timeout(),
                self.clients.clone(),
                self.counters.clone(),
            ));
            clients.insert(id, Client { peer, sender, task });
            self.counters.client_connected();
            tracing::info!("TCP client {} connected ({} total)", peer, clients.len());
        }
    }
}

async fn write_client(
    id: u64,
    mut stream: TcpStream,
    mut receiver: mpsc::Receiver<Arc<str>>,
    send_timeout: Duration,
    clients: ClientRegistry,
    counters: Arc<SinkCounters>,
) {
    let peer = stream.peer_addr().map(|p| p.to_string()).unwrap_or_default();
    while let Some(line) = receiver.recv().await {
        match timeout(send_timeout, stream.write_all(line.as_bytes())).await {
            Ok(Ok(())) => counters.record_sent(line.len()),
            Ok(Err(e)) => {
                tracing::warn!("TCP client {} write failed: {}", peer, e);
                counters.record_error();
                break;
            }
            Err(_) => {
                tracing::warn!("TCP client {} stalled for {:?}, disconnecting", peer, send_timeout);
                counters.record_error();
                break;
            }
        }
    }
    let _ = stream.shutdown().await;

    let removed = clients.lock().map(|mut c| c.remove(&id).is_some()).unwrap_or(false);
    if removed {
        counters.client_disconnected();
    }
}
