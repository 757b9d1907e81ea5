//! Ingest services
//!
//! Leaves first: classifier, collaborators (fingerprint, metadata), walker,
//! and the worker that drains the queue.

pub mod classifier;
pub mod file_walker;
pub mod fingerprinter;
pub mod ingest_worker;
pub mod metadata_extractor;

pub use classifier::{content_hash, hash_file, ContentClassifier};
pub use file_walker::{DirectoryWalker, WalkError, WalkSummary};
pub use fingerprinter::{AcousticFingerprinter, FingerprintOutcome, FpcalcFingerprinter};
pub use ingest_worker::{IngestWorker, WorkerState, WorkerStats};
pub use metadata_extractor::{LoftyExtractor, MetadataError, MetadataSource};
