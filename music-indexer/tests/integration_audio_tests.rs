//! Real collaborators end to end: lofty metadata on generated WAV files,
//! fpcalc pointed at a missing binary so every fingerprint is absent.

mod helpers;

use helpers::{generate_test_library, generate_test_wav, AudioConfig, TestEnv};
use music_indexer::db::IndexWriter;
use music_indexer::models::QueueStatus;
use music_indexer::services::{content_hash, FpcalcFingerprinter, LoftyExtractor, WorkerState};
use music_indexer::Indexer;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_wav_library_is_indexed_with_lofty() {
    let env = TestEnv::new().await;
    let album = env.dir("album");
    let tracks = generate_test_library(&album, 3, &AudioConfig::default()).unwrap();
    let copy = env.music_root.join("album/track_001_copy.wav");
    std::fs::copy(&tracks[0], &copy).unwrap();
    let notes = env.write_file("album/notes.txt", b"recorded live");

    let indexer = Indexer::with_collaborators(
        env.queue.clone(),
        Arc::new(env.index.clone()),
        Arc::new(FpcalcFingerprinter::new(
            "/nonexistent/bin/fpcalc",
            Duration::from_secs(5),
        )),
        Arc::new(LoftyExtractor::new()),
    );

    let report = tokio::time::timeout(
        Duration::from_secs(60),
        indexer.run(&[env.music_root.clone()]),
    )
    .await
    .expect("run did not finish")
    .expect("run failed");

    assert_eq!(report.state, WorkerState::Terminated);
    assert_eq!(report.stats.succeeded, 4);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.deduplicated, 1);
    // Three distinct WAVs plus the text file reach the fingerprint step
    assert_eq!(report.stats.fingerprint_absent, 4);

    assert_eq!(env.index.count_tracks().await.unwrap(), 3);
    assert_eq!(env.index.count_files().await.unwrap(), 4);

    let bytes = std::fs::read(&tracks[0]).unwrap();
    let track = env
        .index
        .find_track_by_content_hash(&content_hash(&bytes))
        .await
        .unwrap()
        .expect("first track indexed");
    assert_eq!(track.container.as_deref(), Some("WAVE"));
    assert_eq!(track.codec.as_deref(), Some("PCM"));
    assert_eq!(track.fingerprint_hash, None);
    let duration = track.duration.expect("duration recorded");
    assert!((duration - 1.0).abs() < 0.1, "duration {}", duration);
    assert!(track.bitrate.unwrap_or(0) > 0);

    let files = env.index.load_files_for_track(track.id).await.unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].size as u64, bytes.len() as u64);

    let entry = env.queue.get(&notes).await.unwrap().unwrap();
    assert_eq!(entry.status, QueueStatus::Failed);
}

#[tokio::test]
async fn test_unreadable_root_is_skipped() {
    let env = TestEnv::new().await;
    let wav = env.music_root.join("solo.wav");
    generate_test_wav(&wav, &AudioConfig::default()).unwrap();

    let indexer = Indexer::with_collaborators(
        env.queue.clone(),
        Arc::new(env.index.clone()),
        Arc::new(FpcalcFingerprinter::new("/nonexistent/bin/fpcalc", Duration::from_secs(5))),
        Arc::new(LoftyExtractor::new()),
    );

    let report = indexer
        .run(&[env.music_root.join("missing"), env.music_root.clone()])
        .await
        .unwrap();

    assert_eq!(report.state, WorkerState::Terminated);
    assert_eq!(report.walks.len(), 1);
    assert_eq!(report.stats.succeeded, 1);
}
