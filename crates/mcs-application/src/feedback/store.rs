//! Feedback store
//!
//! Durable append-only log: one JSON-lines file per UTC day, all writes
//! funnelled through a single writer task so events from one session land
//! in submission order. Records are acknowledged once the writer has
//! processed them; a failed append is logged and retried once, never
//! surfaced to the originating tool call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use mcs_domain::entities::FeedbackEvent;
use mcs_domain::error::{Error, Result};
use mcs_domain::ports::FeedbackSink;

/// Writer queue depth; senders briefly back-pressure when full
const QUEUE_DEPTH: usize = 1024;

enum Command {
    Record(Box<FeedbackEvent>, oneshot::Sender<()>),
}

/// File name for one UTC day's events
fn day_file(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("feedback-{}.jsonl", date.format("%Y-%m-%d")))
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}

async fn writer_loop(dir: PathBuf, mut rx: mpsc::Receiver<Command>) {
    while let Some(Command::Record(event, ack)) = rx.recv().await {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "unserializable feedback event dropped");
                let _ = ack.send(());
                continue;
            }
        };
        let path = day_file(&dir, event.ts.date_naive());
        if let Err(first) = append_line(&path, &line).await {
            warn!(error = %first, path = %path.display(), "feedback append failed; retrying");
            if let Err(second) = append_line(&path, &line).await {
                // The caller's tool response must not fail on this.
                error!(error = %second, path = %path.display(), "feedback event lost");
            }
        }
        let _ = ack.send(());
    }
    info!("feedback writer stopped");
}

/// Feedback store with an explicit start/stop lifecycle
pub struct FeedbackStore {
    dir: PathBuf,
    running: Option<(mpsc::Sender<Command>, JoinHandle<()>)>,
}

impl FeedbackStore {
    /// Create a store writing under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            running: None,
        }
    }

    /// Directory holding the day files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start the writer task. Idempotent.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::io_with_source("creating feedback directory", e))?;
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let task = tokio::spawn(writer_loop(self.dir.clone(), rx));
        self.running = Some((tx, task));
        Ok(())
    }

    /// Stop the writer, draining queued events first
    pub async fn stop(&mut self) {
        if let Some((tx, task)) = self.running.take() {
            drop(tx);
            let _ = task.await;
        }
    }

    /// A cloneable recorder handle for tool handlers
    pub fn recorder(&self) -> Result<FeedbackRecorder> {
        let (tx, _) = self
            .running
            .as_ref()
            .ok_or_else(|| Error::internal("feedback store not started"))?;
        Ok(FeedbackRecorder { tx: tx.clone() })
    }
}

/// Cloneable write handle implementing the feedback sink port
#[derive(Clone)]
pub struct FeedbackRecorder {
    tx: mpsc::Sender<Command>,
}

#[async_trait]
impl FeedbackSink for FeedbackRecorder {
    async fn record(&self, event: FeedbackEvent) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Record(Box::new(event), ack_tx))
            .await
            .map_err(|_| Error::internal("feedback writer is not running"))?;
        ack_rx
            .await
            .map_err(|_| Error::internal("feedback writer dropped the acknowledgement"))?;
        Ok(())
    }
}

/// Load all events within the sliding window ending now
pub async fn load_window(dir: &Path, window_days: u32) -> Vec<FeedbackEvent> {
    let today = Utc::now().date_naive();
    let mut events = Vec::new();
    for offset in 0..=window_days as i64 {
        let date = today - ChronoDuration::days(offset);
        let path = day_file(dir, date);
        let Ok(content) = tokio::fs::read_to_string(&path).await else {
            continue;
        };
        for line in content.lines() {
            match serde_json::from_str::<FeedbackEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => warn!(error = %e, path = %path.display(), "skipping bad feedback line"),
            }
        }
    }
    events
}

impl std::ops::Drop for FeedbackStore {
    fn drop(&mut self) {
        if let Some((tx, _)) = self.running.take() {
            drop(tx);
        }
    }
}
