//! Database access for music-indexer
//!
//! Two SQLite files: the durable work queue and the track/file index.

pub mod index;
pub mod path_key;
pub mod queue;

pub use index::{IndexWriter, SqliteIndex};
pub use queue::QueueStore;
