//! Data models for music-indexer

pub mod queue_entry;
pub mod track;

pub use queue_entry::{Classification, Outcome, QueueCounts, QueueEntry, QueueStatus};
pub use track::{FileRecord, NewTrack, TrackMetadata, TrackRecord};
