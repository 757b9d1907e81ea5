//! Durable work queue
//!
//! Pending and Completed are one table keyed by absolute path (raw bytes,
//! see `path_key`) with a status column. Leaving Pending is a single UPDATE guarded on `status = 'pending'`,
//! so a path is either still pending or has exactly one terminal outcome,
//! never both and never neither.

use crate::db::path_key;
use crate::models::{Classification, Outcome, QueueCounts, QueueEntry, QueueStatus};
use chrono::{DateTime, Utc};
use indexer_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};

/// Durable queue store backed by its own SQLite file
#[derive(Debug, Clone)]
pub struct QueueStore {
    pool: SqlitePool,
}

impl QueueStore {
    /// Open the queue database, creating file and schema if needed
    ///
    /// Must complete before any walking or draining starts.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = indexer_common::db::open_pool(db_path).await?;
        Self::from_pool(pool).await
    }

    /// Use an already opened pool (schema is created if missing)
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue_entries (
                path BLOB PRIMARY KEY,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'succeeded', 'failed')),
                detail TEXT,
                discovered_at TEXT NOT NULL,
                completed_at TEXT
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_queue_entries_status ON queue_entries(status)",
        )
        .execute(&pool)
        .await?;

        tracing::debug!("Queue tables initialized (queue_entries)");

        Ok(Self { pool })
    }

    /// Look up a path in either namespace
    pub async fn get(&self, path: &Path) -> Result<Option<QueueEntry>> {
        let row = sqlx::query(
            r#"
            SELECT path, status, detail, discovered_at, completed_at
            FROM queue_entries
            WHERE path = ?
            "#,
        )
        .bind(path_key::encode(path))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let status: String = row.get("status");
                let status = status.parse::<QueueStatus>().map_err(Error::Internal)?;

                let discovered_at: String = row.get("discovered_at");
                let completed_at: Option<String> = row.get("completed_at");

                Ok(Some(QueueEntry {
                    path: path_key::decode(row.get("path")),
                    status,
                    detail: row.get("detail"),
                    discovered_at: parse_timestamp(&discovered_at)?,
                    completed_at: completed_at.as_deref().map(parse_timestamp).transpose()?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Read-only classification of a path; Completed is checked before Pending
    pub async fn classify(&self, path: &Path) -> Result<Classification> {
        Ok(match self.get(path).await? {
            Some(entry) => entry.classification(),
            None => Classification::New,
        })
    }

    /// Add a path to Pending unless it is already known
    ///
    /// Returns true if a new pending row was created.
    pub async fn enqueue(&self, path: &Path) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO queue_entries (path, status, discovered_at)
            VALUES (?, 'pending', ?)
            "#,
        )
        .bind(path_key::encode(path))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Next pending path, or None when Pending is empty
    pub async fn next_pending(&self) -> Result<Option<PathBuf>> {
        let key: Option<Vec<u8>> = sqlx::query_scalar(
            "SELECT path FROM queue_entries WHERE status = 'pending' ORDER BY rowid LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(key.map(path_key::decode))
    }

    /// Record the terminal outcome and remove the path from Pending
    ///
    /// Fails with `NotFound` if the path is not currently pending.
    pub async fn complete(&self, path: &Path, outcome: &Outcome) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE queue_entries
            SET status = ?, detail = ?, completed_at = ?
            WHERE path = ? AND status = 'pending'
            "#,
        )
        .bind(outcome.status().as_str())
        .bind(outcome.detail())
        .bind(Utc::now().to_rfc3339())
        .bind(path_key::encode(path))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "No pending queue entry for {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Remove every failed entry so the next walk rediscovers those paths
    pub async fn reset_failed(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM queue_entries WHERE status = 'failed'")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count rows per status
    pub async fn counts(&self) -> Result<QueueCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM queue_entries GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = QueueCounts::default();
        for (status, count) in rows {
            let count = count as u64;
            match status.parse::<QueueStatus>().map_err(Error::Internal)? {
                QueueStatus::Pending => counts.pending = count,
                QueueStatus::Succeeded => counts.succeeded = count,
                QueueStatus::Failed => counts.failed = count,
            }
        }

        Ok(counts)
    }

    /// Close the underlying pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid timestamp '{}': {}", value, e)))
}
