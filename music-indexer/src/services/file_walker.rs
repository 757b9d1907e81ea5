//! Directory walker
//!
//! Recursively enumerates a root directory and admits newly discovered files
//! into the durable queue, signalling the ingest worker for each new one.
//!
//! Traversal runs on a blocking thread (walkdir) and streams entries to the
//! async side over a channel, so queue writes and draining can interleave
//! with the walk. Symlinks are followed; walkdir reports symlink loops and
//! unreadable directories as entry errors, which are logged and skipped.

use crate::db::QueueStore;
use crate::models::Classification;
use crate::services::classifier::ContentClassifier;
use crate::services::ingest_worker::IngestWorker;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use walkdir::WalkDir;

/// Channel depth between the traversal thread and the queue writer
const WALK_CHANNEL_CAPACITY: usize = 256;

/// Directory walk errors
#[derive(Debug, Error)]
pub enum WalkError {
    /// Root does not exist or cannot be resolved
    #[error("Root not found: {0}: {1}")]
    RootNotFound(PathBuf, String),

    /// Root exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Queue store failed while admitting files
    #[error("Queue error: {0}")]
    Queue(#[from] indexer_common::Error),

    /// Traversal thread failed
    #[error("Walk task failed: {0}")]
    TaskFailed(String),
}

impl WalkError {
    /// True if the walk of this root can be skipped without stopping the run
    pub fn is_skippable(&self) -> bool {
        matches!(self, WalkError::RootNotFound(..) | WalkError::NotADirectory(_))
    }
}

/// Everything a walk of one root saw
#[derive(Debug, Clone, Default)]
pub struct WalkSummary {
    /// Canonical root that was walked
    pub root: PathBuf,
    /// Files visited (all of them, not just new ones)
    pub files: Vec<PathBuf>,
    /// Directories visited below the root
    pub dirs: Vec<PathBuf>,
    /// Files newly added to Pending
    pub enqueued: usize,
    /// Files already waiting in Pending
    pub already_queued: usize,
    /// Files with a terminal outcome
    pub already_completed: usize,
    /// Entries skipped (unreadable directories, symlink loops)
    pub errors: Vec<String>,
}

enum WalkItem {
    Dir(PathBuf),
    File(PathBuf),
    Skipped(String),
}

/// Walks configured roots and feeds the queue
#[derive(Clone)]
pub struct DirectoryWalker {
    queue: QueueStore,
    classifier: ContentClassifier,
    worker: Option<IngestWorker>,
}

impl DirectoryWalker {
    /// Create a walker that only fills the queue
    pub fn new(queue: QueueStore) -> Self {
        Self {
            classifier: ContentClassifier::new(queue.clone()),
            queue,
            worker: None,
        }
    }

    /// Signal this worker whenever a new file is enqueued
    pub fn with_worker(mut self, worker: IngestWorker) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Walk each root in order
    ///
    /// Missing roots are logged and skipped; queue failures stop the walk.
    pub async fn walk_all(&self, roots: &[PathBuf]) -> Result<Vec<WalkSummary>, WalkError> {
        let mut summaries = Vec::with_capacity(roots.len());

        for root in roots {
            match self.walk(root).await {
                Ok(summary) => summaries.push(summary),
                Err(e) if e.is_skippable() => {
                    tracing::warn!(root = %root.display(), error = %e, "Skipping root");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summaries)
    }

    /// Walk one root directory
    pub async fn walk(&self, root: &Path) -> Result<WalkSummary, WalkError> {
        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| WalkError::RootNotFound(root.to_path_buf(), e.to_string()))?;

        if !tokio::fs::metadata(&root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Err(WalkError::NotADirectory(root));
        }

        tracing::info!(root = %root.display(), "Walking directory");

        let (tx, mut rx) = mpsc::channel(WALK_CHANNEL_CAPACITY);
        let traversal = tokio::task::spawn_blocking({
            let root = root.clone();
            move || traverse(&root, tx)
        });

        let mut summary = WalkSummary {
            root: root.clone(),
            ..Default::default()
        };

        while let Some(item) = rx.recv().await {
            match item {
                WalkItem::Dir(dir) => summary.dirs.push(dir),
                WalkItem::File(file) => {
                    self.admit(&file, &mut summary).await?;
                    summary.files.push(file);
                }
                WalkItem::Skipped(reason) => {
                    tracing::warn!(root = %root.display(), "Skipping entry: {}", reason);
                    summary.errors.push(reason);
                }
            }
        }

        traversal
            .await
            .map_err(|e| WalkError::TaskFailed(e.to_string()))?;

        tracing::info!(
            root = %root.display(),
            files = summary.files.len(),
            dirs = summary.dirs.len(),
            enqueued = summary.enqueued,
            already_queued = summary.already_queued,
            already_completed = summary.already_completed,
            skipped = summary.errors.len(),
            "Walk complete"
        );

        Ok(summary)
    }

    /// Classify a discovered file and enqueue it if new
    async fn admit(&self, file: &Path, summary: &mut WalkSummary) -> Result<(), WalkError> {
        match self.classifier.classify(file).await? {
            Classification::AlreadyCompleted => summary.already_completed += 1,
            Classification::AlreadyQueued => summary.already_queued += 1,
            Classification::New => {
                if self.queue.enqueue(file).await? {
                    tracing::debug!(path = %file.display(), "Queued");
                    summary.enqueued += 1;
                    if let Some(worker) = &self.worker {
                        worker.start();
                    }
                } else {
                    summary.already_queued += 1;
                }
            }
        }

        Ok(())
    }
}

/// Blocking traversal; stops early if the receiver goes away
fn traverse(root: &Path, tx: mpsc::Sender<WalkItem>) {
    let walker = WalkDir::new(root).follow_links(true).min_depth(1);

    for entry in walker {
        let item = match entry {
            Ok(entry) if entry.file_type().is_dir() => WalkItem::Dir(entry.into_path()),
            Ok(entry) if entry.file_type().is_file() => WalkItem::File(entry.into_path()),
            // Sockets, fifos, dangling links
            Ok(_) => continue,
            Err(e) => WalkItem::Skipped(e.to_string()),
        };

        if tx.blocking_send(item).is_err() {
            break;
        }
    }
}
