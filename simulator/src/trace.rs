//! JSON-lines trace output: one serialized `TraceEvent` per line.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use nmea_sim::engine::{TraceEvent, TraceSink};

/// Writes trace events to a file through a background task
pub struct JsonlTraceSink {
    path: PathBuf,
    sender: Mutex<Option<mpsc::UnboundedSender<String>>>,
    task: Mutex<Option<JoinHandle<std::io::Result<u64>>>>,
}

impl JsonlTraceSink {
    /// Create (truncating) the trace file and start the writer
    pub async fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = File::create(&path).await?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(write_lines(BufWriter::new(file), receiver));
        Ok(Self {
            path,
            sender: Mutex::new(Some(sender)),
            task: Mutex::new(Some(task)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TraceSink for JsonlTraceSink {
    fn record(&self, event: &TraceEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to serialize trace event: {}", e);
                return;
            }
        };
        if let Ok(sender) = self.sender.lock() {
            if let Some(sender) = sender.as_ref() {
                let _ = sender.send(line);
            }
        }
    }

    async fn close(&self) {
        // Dropping the sender ends the writer once the queue is drained
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        let task = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(task) = task {
            match task.await {
                Ok(Ok(lines)) => tracing::info!("Wrote {} trace events to {}", lines, self.path.display()),
                Ok(Err(e)) => tracing::error!("Trace writer for {} failed: {}", self.path.display(), e),
                Err(e) => tracing::error!("Trace writer task failed: {}", e),
            }
        }
    }
}

async fn write_lines(
    mut writer: BufWriter<File>,
    mut receiver: mpsc::UnboundedReceiver<String>,
) -> std::io::Result<u64> {
    let mut lines = 0;
    while let Some(line) = receiver.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        lines += 1;
    }
    writer.flush().await?;
    Ok(lines)
}
