//! Error types for music-indexer
//!
//! Per-path pipeline errors are split three ways:
//! - fingerprint failures never become an `IngestError` (see `FingerprintOutcome`)
//! - duplicate-key conditions are benign and count as success
//! - everything else is a permanent failure for that path only

use crate::services::metadata_extractor::MetadataError;
use thiserror::Error;

/// Error while ingesting a single path
#[derive(Debug, Error)]
pub enum IngestError {
    /// File could not be stat'ed or read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not a decodable audio file
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Index query or insert failed
    #[error("Index error: {0}")]
    Index(#[from] sqlx::Error),

    /// Background task failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// True for unique-constraint violations on the index
    ///
    /// These mean the row already exists and are recorded as success.
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            IngestError::Index(err) => crate::db::index::is_unique_violation(err),
            _ => false,
        }
    }
}

/// Result of a per-path pipeline step
pub type IngestResult<T> = Result<T, IngestError>;
