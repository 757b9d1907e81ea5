//! Audio metadata extraction service
//!
//! Extracts tags and format properties using lofty. Unlike fingerprinting,
//! a failure here means the file is not usable audio and fails the path.

use crate::models::TrackMetadata;
use async_trait::async_trait;
use lofty::config::ParseOptions;
use lofty::file::FileType;
use lofty::mp4::{AudioObjectType, Mp4Codec, Mp4File};
use lofty::mpeg::{Layer, MpegFile, MpegVersion};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Metadata extraction errors
#[derive(Debug, Error)]
pub enum MetadataError {
    /// File could not be parsed as a supported audio format
    #[error("Failed to read audio file: {0}")]
    ReadError(String),

    /// I/O error (file open/read)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Blocking extraction task did not complete
    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}

/// Metadata collaborator
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<TrackMetadata, MetadataError>;
}

/// lofty-backed extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyExtractor;

impl LoftyExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous extraction; call from a blocking context
    pub fn extract_blocking(path: &Path) -> Result<TrackMetadata, MetadataError> {
        // Surface missing/unreadable files as I/O errors before probing
        std::fs::metadata(path)?;

        let tagged_file = Probe::open(path)
            .map_err(|e| MetadataError::ReadError(e.to_string()))?
            .guess_file_type()?
            .read()
            .map_err(|e| MetadataError::ReadError(e.to_string()))?;

        let properties = tagged_file.properties();
        let file_type = tagged_file.file_type();
        let (container, codec) = format_names(file_type);
        let (stream_codec, codec_profile) = stream_details(path, file_type)?;

        let mut metadata = TrackMetadata {
            container: container.map(str::to_string),
            codec: stream_codec.or(codec).map(str::to_string),
            codec_profile,
            duration: Some(properties.duration().as_secs_f64()),
            bitrate: properties.audio_bitrate().map(bits_per_second),
            ..Default::default()
        };

        if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
            read_tag_fields(tag, &mut metadata);
        }

        tracing::debug!(
            file = %path.display(),
            artist = ?metadata.artist,
            title = ?metadata.title,
            container = ?metadata.container,
            duration_s = ?metadata.duration,
            "Extracted metadata"
        );

        Ok(metadata)
    }
}

#[async_trait]
impl MetadataSource for LoftyExtractor {
    async fn extract(&self, path: &Path) -> Result<TrackMetadata, MetadataError> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::extract_blocking(&path))
            .await
            .map_err(|e| MetadataError::TaskFailed(e.to_string()))?
    }
}

fn read_tag_fields(tag: &Tag, metadata: &mut TrackMetadata) {
    metadata.title = tag.title().map(|s| s.to_string());
    metadata.artist = tag.artist().map(|s| s.to_string());
    metadata.album = tag.album().map(|s| s.to_string());
    metadata.year = tag.year();
    metadata.date = non_empty(tag.get_string(&ItemKey::RecordingDate));
    metadata.original_date = non_empty(tag.get_string(&ItemKey::OriginalReleaseDate));
    metadata.website = non_empty(tag.get_string(&ItemKey::AudioFileUrl));
    metadata.notes = non_empty(tag.get_string(&ItemKey::Description));
    metadata.key = non_empty(tag.get_string(&ItemKey::InitialKey));

    let comments: Vec<&str> = tag
        .get_strings(&ItemKey::Comment)
        .filter(|c| !c.trim().is_empty())
        .collect();
    if !comments.is_empty() {
        metadata.comment = Some(comments.join(","));
    }

    metadata.bpm = tag
        .get_string(&ItemKey::Bpm)
        .or_else(|| tag.get_string(&ItemKey::IntegerBpm))
        .and_then(|s| s.trim().parse::<f64>().ok());

    metadata.picture = tag.pictures().first().map(|p| p.data().to_vec());
}

/// Codec and profile carried only by the format-specific property types.
///
/// MPEG and MP4 are read a second time as their concrete file types; other
/// formats have nothing beyond what `format_names` reports.
fn stream_details(
    path: &Path,
    file_type: FileType,
) -> Result<(Option<&'static str>, Option<String>), MetadataError> {
    match file_type {
        FileType::Mpeg => {
            let file = MpegFile::read_from(&mut File::open(path)?, ParseOptions::new())
                .map_err(|e| MetadataError::ReadError(e.to_string()))?;
            let props = file.properties();
            let (codec, profile) = mpeg_stream(props.version(), props.layer());
            Ok((Some(codec), Some(profile)))
        }
        FileType::Mp4 => {
            let file = Mp4File::read_from(&mut File::open(path)?, ParseOptions::new())
                .map_err(|e| MetadataError::ReadError(e.to_string()))?;
            let props = file.properties();
            let codec = mp4_codec_name(props.codec());
            let profile = match props.codec() {
                Mp4Codec::AAC => props.audio_object_type().and_then(aac_profile),
                _ => None,
            };
            Ok((codec, profile.map(str::to_string)))
        }
        _ => Ok((None, None)),
    }
}

/// Codec name and "MPEG-<version> Layer <n>" profile of an MPEG audio stream
fn mpeg_stream(version: &MpegVersion, layer: &Layer) -> (&'static str, String) {
    let version = match version {
        MpegVersion::V1 => "1",
        MpegVersion::V2 => "2",
        MpegVersion::V2_5 => "2.5",
        MpegVersion::V4 => "4",
    };
    let (codec, layer) = match layer {
        Layer::Layer1 => ("MP1", 1),
        Layer::Layer2 => ("MP2", 2),
        Layer::Layer3 => ("MP3", 3),
    };
    (codec, format!("MPEG-{} Layer {}", version, layer))
}

fn mp4_codec_name(codec: &Mp4Codec) -> Option<&'static str> {
    match codec {
        Mp4Codec::AAC => Some("AAC"),
        Mp4Codec::ALAC => Some("ALAC"),
        Mp4Codec::MP3 => Some("MP3"),
        Mp4Codec::FLAC => Some("FLAC"),
        _ => None,
    }
}

fn aac_profile(object_type: AudioObjectType) -> Option<&'static str> {
    match object_type {
        AudioObjectType::AacMain => Some("Main"),
        AudioObjectType::AacLowComplexity => Some("LC"),
        AudioObjectType::AacScalableSampleRate => Some("SSR"),
        AudioObjectType::AacLongTermPrediction => Some("LTP"),
        AudioObjectType::SpectralBandReplication => Some("HE-AAC"),
        AudioObjectType::ParametricStereo => Some("HE-AACv2"),
        AudioObjectType::ErrorResilientAacLowDelay => Some("LD"),
        AudioObjectType::ErrorResilientAacEnhancedLowDelay => Some("ELD"),
        _ => None,
    }
}

/// lofty reports kbps; widened so large values cannot wrap.
fn bits_per_second(kbps: u32) -> u64 {
    u64::from(kbps) * 1000
}

/// Container and codec names for a detected file type
fn format_names(file_type: FileType) -> (Option<&'static str>, Option<&'static str>) {
    match file_type {
        FileType::Mpeg => (Some("MPEG"), Some("MP3")),
        FileType::Flac => (Some("FLAC"), Some("FLAC")),
        FileType::Opus => (Some("Ogg"), Some("Opus")),
        FileType::Vorbis => (Some("Ogg"), Some("Vorbis")),
        FileType::Speex => (Some("Ogg"), Some("Speex")),
        FileType::Aac => (Some("ADTS"), Some("AAC")),
        FileType::Mp4 => (Some("MPEG-4"), None),
        FileType::Aiff => (Some("AIFF"), Some("PCM")),
        FileType::Wav => (Some("WAVE"), Some("PCM")),
        FileType::WavPack => (Some("WavPack"), Some("WavPack")),
        FileType::Ape => (Some("APE"), Some("Monkey's Audio")),
        FileType::Mpc => (Some("Musepack"), Some("Musepack")),
        _ => (None, None),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
