use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};

use super::{OutputSink, SinkCounters, SinkError, SinkStats};

lazy_static! {
    /// What `rotated_path` puts between the stem and the extension
    static ref ROTATED_SUFFIX: Regex = Regex::new(r"^_\d{8}T\d{6}_\d{4,}$").unwrap();
}

/// File sink settings
#[derive(Debug, Clone, Deserialize)]
pub struct FileSinkConfig {
    /// Path of the active output file
    pub path: PathBuf,
    /// Append to an existing file instead of truncating it
    #[serde(default = "super::default_true")]
    pub append: bool,
    /// Rotate once the active file reaches this many bytes
    #[serde(default)]
    pub max_size_bytes: Option<u64>,
    /// Rotate once the active file has been open this many seconds
    #[serde(default)]
    pub rotation_interval_secs: Option<f64>,
    /// Rotated files kept on disk, oldest deleted first
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Write a `#` comment line at the top of each fresh file
    #[serde(default)]
    pub header: bool,
}

fn default_max_files() -> usize {
    5
}

impl FileSinkConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: true,
            max_size_bytes: None,
            rotation_interval_secs: None,
            max_files: default_max_files(),
            header: false,
        }
    }
}

/// Appends sentences to a file through a background writer task
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    sender: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<Result<(), SinkError>>>,
    counters: Arc<SinkCounters>,
}

impl FileSink {
    pub fn new(config: FileSinkConfig) -> Self {
        Self {
            name: format!("file:{}", config.path.display()),
            config,
            sender: None,
            task: None,
            counters: Arc::new(SinkCounters::default()),
        }
    }
}

#[async_trait]
impl OutputSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&mut self) -> Result<(), SinkError> {
        if self.sender.is_some() {
            return Err(SinkError::AlreadyRunning(self.name.clone()));
        }
        if let Some(parent) = self.config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let writer = FileWriter::open(self.config.clone(), self.counters.clone(), self.config.append).await?;
        let (sender, receiver) = mpsc::unbounded_channel();
        self.sender = Some(sender);
        self.task = Some(tokio::spawn(run_writer(writer, receiver)));
        tracing::info!("File sink writing to {}", self.config.path.display());
        Ok(())
    }

    fn write(&self, sentence: &str) -> Result<(), SinkError> {
        let sender = self.sender.as_ref().ok_or_else(|| SinkError::NotRunning(self.name.clone()))?;
        sender.send(sentence.to_string()).map_err(|_| {
            self.counters.record_dropped();
            SinkError::Closed(self.name.clone())
        })
    }

    async fn close(&mut self, grace: Duration) -> Result<(), SinkError> {
        // Dropping the sender lets the writer drain the queue and exit
        self.sender.take();
        let Some(mut task) = self.task.take() else {
            return Ok(());
        };
        match timeout(grace, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(SinkError::TaskFailed(e.to_string())),
            Err(_) => {
                tracing::warn!("File sink {} did not flush within {:?}", self.name, grace);
                task.abort();
                Ok(())
            }
        }
    }

    fn stats(&self) -> SinkStats {
        self.counters.snapshot()
    }
}

struct FileWriter {
    config: FileSinkConfig,
    writer: BufWriter<File>,
    /// Bytes in the active file
    size: u64,
    /// Sentences in the active file
    lines: u64,
    opened_at: Instant,
    sequence: u32,
    counters: Arc<SinkCounters>,
}

impl FileWriter {
    async fn open(config: FileSinkConfig, counters: Arc<SinkCounters>, append: bool) -> Result<Self, SinkError> {
        let (writer, size) = open_active(&config, append).await?;
        Ok(Self {
            config,
            writer,
            size,
            lines: 0,
            opened_at: Instant::now(),
            sequence: 0,
            counters,
        })
    }

    async fn write_line(&mut self, line: &str) -> Result<(), SinkError> {
        if self.rotation_due() {
            self.rotate().await?;
        }
        self.writer.write_all(line.as_bytes()).await?;
        self.size += line.len() as u64;
        self.lines += 1;
        self.counters.record_sent(line.len());

        if self.config.max_size_bytes.map_or(false, |max| self.size >= max) {
            self.rotate().await?;
        }
        Ok(())
    }

    fn rotation_due(&self) -> bool {
        self.lines > 0
            && self
                .config
                .rotation_interval_secs
                .map_or(false, |secs| self.opened_at.elapsed().as_secs_f64() >= secs)
    }

    async fn rotate(&mut self) -> Result<(), SinkError> {
        self.writer.flush().await?;
        // The sequence restarts with every run, never rename over an earlier rotation
        let rotated = loop {
            self.sequence += 1;
            let candidate = rotated_path(&self.config.path, self.sequence);
            if !fs::try_exists(&candidate).await? {
                break candidate;
            }
        };
        fs::rename(&self.config.path, &rotated).await?;
        tracing::info!("Rotated {} to {}", self.config.path.display(), rotated.display());

        let (writer, size) = open_active(&self.config, false).await?;
        self.writer = writer;
        self.size = size;
        self.lines = 0;
        self.opened_at = Instant::now();
        prune_rotated(&self.config.path, self.config.max_files).await
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush().await.map_err(SinkError::from)
    }
}

async fn open_active(config: &FileSinkConfig, append: bool) -> Result<(BufWriter<File>, u64), SinkError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(&config.path)
        .await?;
    let mut size = file.metadata().await?.len();
    let mut writer = BufWriter::new(file);
    if config.header && size == 0 {
        let header = format!("# NMEA sentence log opened {}\r\n", Utc::now().to_rfc3339());
        writer.write_all(header.as_bytes()).await?;
        size += header.len() as u64;
    }
    Ok((writer, size))
}

/// File stem and dotted extension of the active file
fn split_name(path: &Path) -> (String, String) {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, extension)
}

/// `<stem>_<timestamp>_<seq><ext>` next to the active file
fn rotated_path(path: &Path, sequence: u32) -> PathBuf {
    let (stem, extension) = split_name(path);
    let name = format!("{}_{}_{:04}{}", stem, Utc::now().format("%Y%m%dT%H%M%S"), sequence, extension);
    path.with_file_name(name)
}

/// Whether `name` is a rotation of the active file, other files in the directory are left alone
fn is_rotated_name(name: &str, stem: &str, extension: &str) -> bool {
    name.strip_prefix(stem)
        .and_then(|rest| rest.strip_suffix(extension))
        .map_or(false, |suffix| ROTATED_SUFFIX.is_match(suffix))
}

/// Delete the oldest rotated files beyond `max_files`
async fn prune_rotated(path: &Path, max_files: usize) -> Result<(), SinkError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };
    let (stem, extension) = split_name(path);

    let mut rotated = Vec::new();
    let mut entries = fs::read_dir(&dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_rotated_name(&name, &stem, &extension) {
            rotated.push(name);
        }
    }
    // Timestamp then zero-padded sequence, so lexical order is age order
    rotated.sort();

    let excess = rotated.len().saturating_sub(max_files);
    for name in rotated.into_iter().take(excess) {
        fs::remove_file(dir.join(&name)).await?;
        tracing::debug!("Removed rotated file {}", name);
    }
    Ok(())
}

async fn run_writer(mut writer: FileWriter, mut receiver: mpsc::UnboundedReceiver<String>) -> Result<(), SinkError> {
    while let Some(line) = receiver.recv().await {
        write_or_count(&mut writer, &line).await;
        // Drain whatever else is queued before flushing
        while let Ok(line) = receiver.try_recv() {
            write_or_count(&mut writer, &line).await;
        }
        if let Err(e) = writer.flush().await {
            tracing::error!("Failed to flush {}: {}", writer.config.path.display(), e);
            writer.counters.record_error();
        }
    }
    writer.flush().await
}

async fn write_or_count(writer: &mut FileWriter, line: &str) {
    if let Err(e) = writer.write_line(line).await {
        tracing::error!("Failed to write to {}: {}", writer.config.path.display(), e);
        writer.counters.record_error();
        writer.counters.record_dropped();
    }
}
