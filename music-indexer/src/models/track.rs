//! Track and file index records

use crate::db::path_key;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::path::PathBuf;

/// Tags and format properties read from an audio file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub year: Option<u32>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    pub original_date: Option<String>,
    /// All comment frames joined with ','
    pub comment: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub bpm: Option<f64>,
    pub key: Option<String>,
    /// Raw bytes of the first embedded picture
    pub picture: Option<Vec<u8>>,
    pub container: Option<String>,
    pub codec: Option<String>,
    pub codec_profile: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Bits per second
    pub bitrate: Option<u64>,
}

/// Track row to insert; content hash is the dedup key
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrack {
    pub content_hash: String,
    pub fingerprint_hash: Option<String>,
    pub picture_hash: Option<String>,
    pub metadata: TrackMetadata,
}

/// Track row as stored in the index
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TrackRecord {
    pub id: i64,
    #[sqlx(rename = "hash")]
    pub content_hash: String,
    #[sqlx(rename = "fid")]
    pub fingerprint_hash: Option<String>,
    pub year: Option<i64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub date: Option<String>,
    pub original_date: Option<String>,
    pub comment: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub bpm: Option<f64>,
    #[sqlx(rename = "musical_key")]
    pub key: Option<String>,
    #[sqlx(rename = "picture")]
    pub picture_hash: Option<String>,
    pub container: Option<String>,
    pub codec: Option<String>,
    pub codec_profile: Option<String>,
    pub duration: Option<f64>,
    pub bitrate: Option<i64>,
}

/// File row as stored in the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    pub filepath: PathBuf,
    pub track_id: i64,
    pub size: i64,
}

impl<'r> FromRow<'r, SqliteRow> for FileRecord {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let filepath: Vec<u8> = row.try_get("filepath")?;
        Ok(Self {
            id: row.try_get("id")?,
            filepath: path_key::decode(filepath),
            track_id: row.try_get("track_id")?,
            size: row.try_get("size")?,
        })
    }
}
