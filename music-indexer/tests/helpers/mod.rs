//! Test Helper Utilities
//!
//! Shared utilities for testing music-indexer

#![allow(dead_code)]

pub mod audio_generator;
pub mod fakes;
pub mod log_capture;
pub mod test_env;

// Re-export commonly used items
pub use audio_generator::{generate_test_library, generate_test_wav, AudioConfig};
pub use fakes::{CountingFingerprinter, FakeMetadata, InFlight};
pub use log_capture::LogCapture;
pub use test_env::TestEnv;
