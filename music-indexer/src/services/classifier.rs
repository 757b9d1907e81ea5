//! Content classification
//!
//! Queue membership is decided by path. Content identity (SHA-256 of the raw
//! bytes) is only used later, by the worker, to share one track between
//! byte-identical files.

use crate::db::QueueStore;
use crate::models::Classification;
use indexer_common::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read size for streaming file hashes
const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Read-only classifier over the durable queue
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    queue: QueueStore,
}

impl ContentClassifier {
    pub fn new(queue: QueueStore) -> Self {
        Self { queue }
    }

    /// Classify a path as new, already queued, or already completed
    ///
    /// Never mutates the queue.
    pub async fn classify(&self, path: &Path) -> Result<Classification> {
        self.queue.classify(path).await
    }
}

/// SHA-256 of `bytes` as lowercase hex
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Stream a file through SHA-256 in fixed-size chunks
///
/// Blocking; returns the hex digest and the number of bytes hashed, which is
/// the size recorded for the file. Call from `spawn_blocking`.
pub fn hash_file(path: &Path) -> io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok((format!("{:x}", hasher.finalize()), size))
}
