//! Database pool setup

pub mod init;

pub use init::open_pool;
