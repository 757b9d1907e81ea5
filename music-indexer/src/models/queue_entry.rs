//! Work queue entry model
//!
//! A discovered path moves through exactly one transition:
//! PENDING → SUCCEEDED | FAILED. Terminal rows are never rewritten; only an
//! explicit reset removes them.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Queue status of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    /// Discovered, not yet processed
    Pending,
    /// Indexed (or already indexed under a duplicate key)
    Succeeded,
    /// Permanent failure; the reason is kept in `detail`
    Failed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Succeeded => "succeeded",
            QueueStatus::Failed => "failed",
        }
    }

    /// True for SUCCEEDED and FAILED
    pub fn is_completed(&self) -> bool {
        !matches!(self, QueueStatus::Pending)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QueueStatus::Pending),
            "succeeded" => Ok(QueueStatus::Succeeded),
            "failed" => Ok(QueueStatus::Failed),
            other => Err(format!("Unknown queue status: {}", other)),
        }
    }
}

/// Terminal outcome recorded when a path leaves Pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Indexed; optional note (e.g. a swallowed duplicate-key condition)
    Succeeded(Option<String>),
    /// Permanent failure with its error description
    Failed(String),
}

impl Outcome {
    pub fn success() -> Self {
        Outcome::Succeeded(None)
    }

    pub fn status(&self) -> QueueStatus {
        match self {
            Outcome::Succeeded(_) => QueueStatus::Succeeded,
            Outcome::Failed(_) => QueueStatus::Failed,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Outcome::Succeeded(note) => note.as_deref(),
            Outcome::Failed(reason) => Some(reason.as_str()),
        }
    }
}

/// Result of looking a path up in the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Never seen; should be enqueued
    New,
    /// Already waiting in Pending
    AlreadyQueued,
    /// Already has a terminal outcome
    AlreadyCompleted,
}

/// One row of the durable queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub path: PathBuf,
    pub status: QueueStatus,
    /// Failure reason, or a note on a success-equivalent outcome
    pub detail: Option<String>,
    pub discovered_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl QueueEntry {
    pub fn classification(&self) -> Classification {
        if self.status.is_completed() {
            Classification::AlreadyCompleted
        } else {
            Classification::AlreadyQueued
        }
    }
}

/// Row counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: u64,
    pub succeeded: u64,
    pub failed: u64,
}
