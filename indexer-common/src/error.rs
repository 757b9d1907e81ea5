//! Errors raised by the queue store, the track index and config loading

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// SQLite failure from either store
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creating a database directory or reading the config file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is unreadable, malformed, or fails validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// A queue transition named a path that is not pending
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored row could not be decoded (bad status text, bad timestamp)
    #[error("Internal error: {0}")]
    Internal(String),
}
