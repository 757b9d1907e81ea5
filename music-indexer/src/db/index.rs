//! Track/file index
//!
//! `tracks` is unique on content hash; `files` is unique on filepath (raw
//! bytes, see `path_key`) and always references one track. Unique violations are returned as plain
//! `sqlx::Error::Database` values; callers decide whether they are benign.

use crate::db::path_key;
use crate::models::{FileRecord, NewTrack, TrackRecord};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::Path;

/// Relational index used by the ingest worker
#[async_trait]
pub trait IndexWriter: Send + Sync {
    /// Existing track with this content hash, if any
    async fn find_track_by_content_hash(&self, hash: &str) -> Result<Option<TrackRecord>, sqlx::Error>;

    /// Insert a new track, returning its id
    async fn insert_track(&self, track: &NewTrack) -> Result<i64, sqlx::Error>;

    /// Insert a file row pointing at `track_id`
    async fn insert_file(&self, filepath: &Path, track_id: i64, size: u64) -> Result<i64, sqlx::Error>;

    async fn count_tracks(&self) -> Result<i64, sqlx::Error>;

    async fn count_files(&self) -> Result<i64, sqlx::Error>;
}

/// SQLite implementation of the index
#[derive(Debug, Clone)]
pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    /// Open the index database, creating file and tables if needed
    pub async fn open(db_path: &Path) -> indexer_common::Result<Self> {
        let pool = indexer_common::db::open_pool(db_path).await?;
        Ok(Self::from_pool(pool).await?)
    }

    /// Use an already opened pool (tables are created if missing)
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tracks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                hash TEXT NOT NULL UNIQUE,
                fid TEXT,
                year INTEGER,
                title TEXT,
                artist TEXT,
                album TEXT,
                date TEXT,
                original_date TEXT,
                comment TEXT,
                website TEXT,
                notes TEXT,
                bpm REAL,
                musical_key TEXT,
                picture TEXT,
                container TEXT,
                codec TEXT,
                codec_profile TEXT,
                duration REAL,
                bitrate INTEGER,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filepath BLOB NOT NULL UNIQUE,
                track_id INTEGER NOT NULL REFERENCES tracks(id),
                size INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_track_id ON files(track_id)")
            .execute(&pool)
            .await?;

        tracing::debug!("Index tables initialized (tracks, files)");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Load a file row by path
    pub async fn load_file_by_path(&self, filepath: &Path) -> Result<Option<FileRecord>, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(
            "SELECT id, filepath, track_id, size FROM files WHERE filepath = ?",
        )
        .bind(path_key::encode(filepath))
        .fetch_optional(&self.pool)
        .await
    }

    /// All file rows referencing a track, ordered by path
    pub async fn load_files_for_track(&self, track_id: i64) -> Result<Vec<FileRecord>, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(
            "SELECT id, filepath, track_id, size FROM files WHERE track_id = ? ORDER BY filepath",
        )
        .bind(track_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl IndexWriter for SqliteIndex {
    async fn find_track_by_content_hash(&self, hash: &str) -> Result<Option<TrackRecord>, sqlx::Error> {
        sqlx::query_as::<_, TrackRecord>(
            r#"
            SELECT id, hash, fid, year, title, artist, album, date, original_date,
                   comment, website, notes, bpm, musical_key, picture,
                   container, codec, codec_profile, duration, bitrate
            FROM tracks
            WHERE hash = ?
            "#,
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_track(&self, track: &NewTrack) -> Result<i64, sqlx::Error> {
        let meta = &track.metadata;
        let result = sqlx::query(
            r#"
            INSERT INTO tracks (
                hash, fid, year, title, artist, album, date, original_date,
                comment, website, notes, bpm, musical_key, picture,
                container, codec, codec_profile, duration, bitrate, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&track.content_hash)
        .bind(&track.fingerprint_hash)
        .bind(meta.year.map(i64::from))
        .bind(&meta.title)
        .bind(&meta.artist)
        .bind(&meta.album)
        .bind(&meta.date)
        .bind(&meta.original_date)
        .bind(&meta.comment)
        .bind(&meta.website)
        .bind(&meta.notes)
        .bind(meta.bpm)
        .bind(&meta.key)
        .bind(&track.picture_hash)
        .bind(&meta.container)
        .bind(&meta.codec)
        .bind(&meta.codec_profile)
        .bind(meta.duration)
        .bind(meta.bitrate.and_then(|bps| i64::try_from(bps).ok()))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn insert_file(&self, filepath: &Path, track_id: i64, size: u64) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO files (filepath, track_id, size, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(path_key::encode(filepath))
        .bind(track_id)
        .bind(size as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn count_tracks(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await
    }

    async fn count_files(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await
    }
}

/// True if the error is a UNIQUE/PRIMARY KEY constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
