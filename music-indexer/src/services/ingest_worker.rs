//! Ingest worker
//!
//! Single-flight drain of the Pending queue. One drain task runs at a time;
//! it takes the oldest Pending path, runs hash → fingerprint → metadata →
//! persist, records the outcome, and loops until Pending is empty.
//!
//! State machine:
//!
//! ```text
//! Idle --start()--> Active --(empty, load not complete)--> Idle
//!                   Active --(empty, load complete)------> Terminated
//!                   Active --(queue store failure)-------> Faulted
//! ```
//!
//! `start()` while Active sets a recheck flag under the same lock the drain
//! consults before going Idle, so an enqueue racing with "Pending is empty"
//! is never left behind.

use crate::db::index::{is_unique_violation, IndexWriter};
use crate::db::QueueStore;
use crate::error::{IngestError, IngestResult};
use crate::models::{NewTrack, Outcome};
use crate::services::classifier::{content_hash, hash_file};
use crate::services::fingerprinter::{AcousticFingerprinter, FingerprintOutcome};
use crate::services::metadata_extractor::MetadataSource;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No drain running; more work may arrive
    Idle,
    /// Drain task running
    Active,
    /// Load complete and Pending empty
    Terminated,
    /// Queue store failed; nothing further is processed
    Faulted,
}

impl WorkerState {
    /// True once the worker will not process anything else
    pub fn is_final(&self) -> bool {
        matches!(self, WorkerState::Terminated | WorkerState::Faulted)
    }
}

/// Counters for the current run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Paths taken off Pending
    pub processed: u64,
    /// Paths recorded as Succeeded
    pub succeeded: u64,
    /// Paths recorded as Failed
    pub failed: u64,
    /// Files linked to an already indexed track
    pub deduplicated: u64,
    /// New tracks stored without a fingerprint
    pub fingerprint_absent: u64,
}

/// What a successful ingest did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    /// New track row plus file row
    Created { track_id: i64 },
    /// File row linked to an existing track
    Linked { track_id: i64 },
}

impl Disposition {
    fn track_id(&self) -> i64 {
        match self {
            Disposition::Created { track_id } | Disposition::Linked { track_id } => *track_id,
        }
    }
}

struct Control {
    state: WorkerState,
    load_complete: bool,
    recheck: bool,
}

struct Inner {
    queue: QueueStore,
    index: Arc<dyn IndexWriter>,
    fingerprinter: Arc<dyn AcousticFingerprinter>,
    metadata: Arc<dyn MetadataSource>,
    control: Mutex<Control>,
    state_tx: watch::Sender<WorkerState>,
    stats: Mutex<WorkerStats>,
    last_error: Mutex<Option<String>>,
}

/// Handle to the ingest worker; clones share one worker
#[derive(Clone)]
pub struct IngestWorker {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl IngestWorker {
    pub fn new(
        queue: QueueStore,
        index: Arc<dyn IndexWriter>,
        fingerprinter: Arc<dyn AcousticFingerprinter>,
        metadata: Arc<dyn MetadataSource>,
    ) -> Self {
        let (state_tx, _) = watch::channel(WorkerState::Idle);
        Self {
            inner: Arc::new(Inner {
                queue,
                index,
                fingerprinter,
                metadata,
                control: Mutex::new(Control {
                    state: WorkerState::Idle,
                    load_complete: false,
                    recheck: false,
                }),
                state_tx,
                stats: Mutex::new(WorkerStats::default()),
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Ensure a drain is running
    ///
    /// Idempotent: spawns a drain task if Idle, otherwise makes the running
    /// drain look at Pending once more before it settles. Must be called
    /// from within a tokio runtime.
    pub fn start(&self) {
        let mut control = lock(&self.inner.control);
        match control.state {
            WorkerState::Idle => {
                control.state = WorkerState::Active;
                control.recheck = false;
                self.inner.state_tx.send_replace(WorkerState::Active);
                drop(control);

                tracing::debug!("Ingest worker activated");
                let worker = self.clone();
                tokio::spawn(async move { worker.drain().await });
            }
            WorkerState::Active => control.recheck = true,
            WorkerState::Terminated | WorkerState::Faulted => {}
        }
    }

    /// Record that every root has been walked
    ///
    /// If no drain is running one is started so that an empty queue still
    /// reaches Terminated.
    pub fn notify_load_complete(&self) {
        let idle = {
            let mut control = lock(&self.inner.control);
            control.load_complete = true;
            control.state == WorkerState::Idle
        };

        tracing::debug!("Load complete");
        if idle {
            self.start();
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.inner.state_tx.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.inner.state_tx.subscribe()
    }

    /// Wait for Terminated or Faulted and return which
    pub async fn wait_terminated(&self) -> WorkerState {
        let mut rx = self.inner.state_tx.subscribe();
        let result = rx.wait_for(|state| state.is_final()).await.map(|state| *state);
        result.unwrap_or(WorkerState::Faulted)
    }

    pub fn stats(&self) -> WorkerStats {
        *lock(&self.inner.stats)
    }

    /// Queue store error that faulted the worker, if any
    pub fn last_error(&self) -> Option<String> {
        lock(&self.inner.last_error).clone()
    }

    /// Drain Pending until empty
    async fn drain(self) {
        loop {
            let next = match self.inner.queue.next_pending().await {
                Ok(next) => next,
                Err(e) => return self.fault(e),
            };

            let Some(path) = next else {
                if self.settle() {
                    return;
                }
                continue;
            };

            let outcome = self.process_path(&path).await;

            if let Err(e) = self.inner.queue.complete(&path, &outcome).await {
                return self.fault(e);
            }
        }
    }

    /// Pending was seen empty; returns true if the drain should exit
    fn settle(&self) -> bool {
        let mut control = lock(&self.inner.control);
        if control.recheck {
            control.recheck = false;
            return false;
        }

        let next = if control.load_complete {
            WorkerState::Terminated
        } else {
            WorkerState::Idle
        };
        control.state = next;
        self.inner.state_tx.send_replace(next);

        if next == WorkerState::Terminated {
            let stats = self.stats();
            tracing::info!(
                processed = stats.processed,
                succeeded = stats.succeeded,
                failed = stats.failed,
                deduplicated = stats.deduplicated,
                "Ingest worker terminated"
            );
        } else {
            tracing::debug!("Ingest worker idle");
        }
        true
    }

    fn fault(&self, err: indexer_common::Error) {
        tracing::error!(error = %err, "Queue store failed, stopping ingest worker");
        *lock(&self.inner.last_error) = Some(err.to_string());

        let mut control = lock(&self.inner.control);
        control.state = WorkerState::Faulted;
        self.inner.state_tx.send_replace(WorkerState::Faulted);
    }

    /// Run the pipeline for one path and turn the result into an outcome
    async fn process_path(&self, path: &Path) -> Outcome {
        tracing::info!(path = %path.display(), "Indexing");

        let outcome = match self.ingest(path).await {
            Ok(disposition) => {
                let linked = matches!(disposition, Disposition::Linked { .. });
                tracing::debug!(
                    path = %path.display(),
                    track_id = disposition.track_id(),
                    linked,
                    "Indexed"
                );
                if linked {
                    lock(&self.inner.stats).deduplicated += 1;
                }
                Outcome::success()
            }
            Err(e) if e.is_duplicate_key() => {
                tracing::debug!(path = %path.display(), error = %e, "Already indexed");
                Outcome::Succeeded(Some(e.to_string()))
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Indexing failed");
                Outcome::Failed(e.to_string())
            }
        };

        let mut stats = lock(&self.inner.stats);
        stats.processed += 1;
        match outcome {
            Outcome::Succeeded(_) => stats.succeeded += 1,
            Outcome::Failed(_) => stats.failed += 1,
        }

        outcome
    }

    async fn ingest(&self, path: &Path) -> IngestResult<Disposition> {
        let (hash, size) = tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || hash_file(&path)
        })
        .await
        .map_err(|e| IngestError::Internal(format!("Hash task failed: {}", e)))??;

        let index = &self.inner.index;

        if let Some(track) = index.find_track_by_content_hash(&hash).await? {
            index.insert_file(path, track.id, size).await?;
            return Ok(Disposition::Linked { track_id: track.id });
        }

        let fingerprint_hash = match self.inner.fingerprinter.fingerprint(path).await {
            FingerprintOutcome::Computed(fingerprint) => Some(content_hash(fingerprint.as_bytes())),
            FingerprintOutcome::Absent(reason) => {
                tracing::debug!(path = %path.display(), reason = %reason, "No fingerprint");
                lock(&self.inner.stats).fingerprint_absent += 1;
                None
            }
        };

        let metadata = self.inner.metadata.extract(path).await?;
        let picture_hash = metadata.picture.as_deref().map(content_hash);

        let track = NewTrack {
            content_hash: hash,
            fingerprint_hash,
            picture_hash,
            metadata,
        };

        let track_id = match index.insert_track(&track).await {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => {
                match index.find_track_by_content_hash(&track.content_hash).await? {
                    Some(existing) => {
                        index.insert_file(path, existing.id, size).await?;
                        return Ok(Disposition::Linked { track_id: existing.id });
                    }
                    None => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        index.insert_file(path, track_id, size).await?;
        Ok(Disposition::Created { track_id })
    }
}
