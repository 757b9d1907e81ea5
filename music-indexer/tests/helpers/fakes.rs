//! Fake collaborators
//!
//! Both fakes share an `InFlight` tracker so tests can observe whether two
//! paths were ever mid-pipeline at the same time.

use async_trait::async_trait;
use music_indexer::models::TrackMetadata;
use music_indexer::services::{AcousticFingerprinter, FingerprintOutcome, MetadataError, MetadataSource};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Concurrency gauge: current and peak number of active calls
#[derive(Debug, Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Fingerprinter that records each call
pub struct CountingFingerprinter {
    calls: Mutex<Vec<PathBuf>>,
    in_flight: Arc<InFlight>,
    delay: Duration,
    /// Return `Absent` for every file
    absent: bool,
}

impl CountingFingerprinter {
    pub fn new(in_flight: Arc<InFlight>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            in_flight,
            delay: Duration::ZERO,
            absent: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn always_absent(mut self) -> Self {
        self.absent = true;
        self
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AcousticFingerprinter for CountingFingerprinter {
    async fn fingerprint(&self, path: &Path) -> FingerprintOutcome {
        self.in_flight.enter();
        self.calls.lock().unwrap().push(path.to_path_buf());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.exit();

        if self.absent {
            FingerprintOutcome::Absent("fpcalc exited with status 3".to_string())
        } else {
            FingerprintOutcome::Computed(format!("AQAAfake{}", path.display()))
        }
    }
}

/// Metadata source that accepts files starting with "AUDIO"
///
/// The rest of the first line becomes the title.
pub struct FakeMetadata {
    calls: Mutex<Vec<PathBuf>>,
    in_flight: Arc<InFlight>,
}

impl FakeMetadata {
    pub fn new(in_flight: Arc<InFlight>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            in_flight,
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    async fn extract(&self, path: &Path) -> Result<TrackMetadata, MetadataError> {
        self.in_flight.enter();
        self.calls.lock().unwrap().push(path.to_path_buf());
        let result = tokio::fs::read(path).await;
        self.in_flight.exit();

        let bytes = result?;
        let Some(rest) = bytes.strip_prefix(b"AUDIO") else {
            return Err(MetadataError::ReadError(
                "No supported audio stream found".to_string(),
            ));
        };

        let title = String::from_utf8_lossy(rest).trim().to_string();
        Ok(TrackMetadata {
            title: Some(title),
            container: Some("MPEG".to_string()),
            codec: Some("MP3".to_string()),
            duration: Some(180.0),
            bitrate: Some(320_000),
            ..Default::default()
        })
    }
}
