//! Temporary queue/index databases and a music directory

use super::fakes::{CountingFingerprinter, FakeMetadata, InFlight};
use music_indexer::db::{QueueStore, SqliteIndex};
use music_indexer::Indexer;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// One indexer "installation" on disk plus instrumented collaborators
pub struct TestEnv {
    _state: TempDir,
    _music: TempDir,
    state_dir: PathBuf,
    /// Canonical music root, matching the keys the walker produces
    pub music_root: PathBuf,
    pub queue: QueueStore,
    pub index: SqliteIndex,
    pub in_flight: Arc<InFlight>,
    pub fingerprinter: Arc<CountingFingerprinter>,
    pub metadata: Arc<FakeMetadata>,
}

impl TestEnv {
    pub async fn new() -> Self {
        let state = TempDir::new().unwrap();
        let music = TempDir::new().unwrap();
        let state_dir = state.path().to_path_buf();
        let music_root = std::fs::canonicalize(music.path()).unwrap();

        let queue = QueueStore::open(&state_dir.join("queue.db"))
            .await
            .expect("Failed to open queue");
        let index = SqliteIndex::open(&state_dir.join("index.db"))
            .await
            .expect("Failed to open index");

        let in_flight = InFlight::new();
        Self {
            _state: state,
            _music: music,
            state_dir,
            music_root,
            queue,
            index,
            fingerprinter: Arc::new(CountingFingerprinter::new(in_flight.clone())),
            metadata: Arc::new(FakeMetadata::new(in_flight.clone())),
            in_flight,
        }
    }

    /// Replace the fingerprinter (e.g. with a delay or always-absent one)
    pub fn set_fingerprinter(&mut self, fingerprinter: CountingFingerprinter) {
        self.fingerprinter = Arc::new(fingerprinter);
    }

    pub fn indexer(&self) -> Indexer {
        Indexer::with_collaborators(
            self.queue.clone(),
            Arc::new(self.index.clone()),
            self.fingerprinter.clone(),
            self.metadata.clone(),
        )
    }

    /// Simulate a process restart: close and reopen both stores, fresh fakes
    pub async fn restart(&mut self) {
        self.queue.close().await;
        self.index.pool().close().await;

        self.queue = QueueStore::open(&self.state_dir.join("queue.db"))
            .await
            .expect("Failed to reopen queue");
        self.index = SqliteIndex::open(&self.state_dir.join("index.db"))
            .await
            .expect("Failed to reopen index");

        self.in_flight = InFlight::new();
        self.fingerprinter = Arc::new(CountingFingerprinter::new(self.in_flight.clone()));
        self.metadata = Arc::new(FakeMetadata::new(self.in_flight.clone()));
    }

    /// Write a file under the music root, creating parent directories
    pub fn write_file(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.music_root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn dir(&self, relative: &str) -> PathBuf {
        let path = self.music_root.join(relative);
        std::fs::create_dir_all(&path).unwrap();
        path
    }
}
