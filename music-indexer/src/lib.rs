//! music-indexer library interface
//!
//! Exposes the queue, index, collaborators and worker for the binary and for
//! integration testing.

pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{IngestError, IngestResult};

use crate::db::{IndexWriter, QueueStore, SqliteIndex};
use crate::services::{
    AcousticFingerprinter, DirectoryWalker, FpcalcFingerprinter, IngestWorker, LoftyExtractor,
    MetadataSource, WalkError, WalkSummary, WorkerState, WorkerStats,
};
use indexer_common::IndexerConfig;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of one indexing run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: WorkerState,
    pub stats: WorkerStats,
    pub walks: Vec<WalkSummary>,
}

/// Queue, index, worker and walker wired together
#[derive(Clone)]
pub struct Indexer {
    pub queue: QueueStore,
    pub index: Arc<dyn IndexWriter>,
    pub worker: IngestWorker,
    pub walker: DirectoryWalker,
}

impl Indexer {
    /// Open both databases and wire the production collaborators
    pub async fn open(config: &IndexerConfig) -> indexer_common::Result<Self> {
        let queue = QueueStore::open(&config.queue_db).await?;
        let index = SqliteIndex::open(&config.index_db).await?;

        Ok(Self::with_collaborators(
            queue,
            Arc::new(index),
            Arc::new(FpcalcFingerprinter::from_config(&config.fingerprint)),
            Arc::new(LoftyExtractor::new()),
        ))
    }

    pub fn with_collaborators(
        queue: QueueStore,
        index: Arc<dyn IndexWriter>,
        fingerprinter: Arc<dyn AcousticFingerprinter>,
        metadata: Arc<dyn MetadataSource>,
    ) -> Self {
        let worker = IngestWorker::new(queue.clone(), index.clone(), fingerprinter, metadata);
        let walker = DirectoryWalker::new(queue.clone()).with_worker(worker.clone());

        Self {
            queue,
            index,
            worker,
            walker,
        }
    }

    /// Drain leftovers, walk every root, then wait for the worker to finish
    ///
    /// Pending entries from an interrupted run are picked up before the
    /// first root is walked.
    pub async fn run(&self, roots: &[PathBuf]) -> Result<RunReport, WalkError> {
        let leftover = self.queue.counts().await?.pending;
        if leftover > 0 {
            tracing::info!(pending = leftover, "Resuming pending entries from previous run");
        }
        self.worker.start();

        let walks = self.walker.walk_all(roots).await?;
        self.worker.notify_load_complete();

        let state = self.worker.wait_terminated().await;

        Ok(RunReport {
            state,
            stats: self.worker.stats(),
            walks,
        })
    }
}
