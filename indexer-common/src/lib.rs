//! # Indexer Common Library
//!
//! Shared code for the music indexer:
//! - Error and result types
//! - Configuration loading and path resolution
//! - SQLite pool opening with durable settings

pub mod config;
pub mod db;
pub mod error;

pub use config::IndexerConfig;
pub use error::{Error, Result};
