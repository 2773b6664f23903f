// Tests for the microphone capture controller: start/stop/cancel lifecycle,
// measured durations, and permission failure semantics.

mod common;

use clinivoice::audio::{CaptureConfig, CaptureController, CaptureState, ScriptedBackend};
use clinivoice::error::{DictationError, RecordingError};
use common::silent_capture;

#[tokio::test]
async fn test_start_stop_produces_clip_with_measured_duration() {
    let mut capture = silent_capture(3.2);

    capture.start().await.expect("start should succeed");
    assert!(capture.is_recording());

    let clip = capture.stop().await.expect("stop should succeed");
    assert_eq!(capture.state(), CaptureState::Idle);

    // 3.2s of 16kHz mono silence
    assert!((clip.duration_seconds - 3.2).abs() < 0.01);
    assert_eq!(clip.samples.len(), 51200);
}

#[tokio::test]
async fn test_duration_frozen_after_stop() {
    let mut capture = silent_capture(1.0);

    capture.start().await.expect("start should succeed");
    let _clip = capture.stop().await.expect("stop should succeed");

    // Sample counter is reset with the buffer when the clip is taken
    let frozen = capture.elapsed_seconds();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(capture.elapsed_seconds(), frozen);
}

#[tokio::test]
async fn test_cancel_from_idle_never_fails() {
    let mut capture = silent_capture(1.0);

    // Pre-permission/idle cancel is a no-op, not an error
    capture.cancel().await;
    assert_eq!(capture.state(), CaptureState::Idle);
    assert_eq!(capture.elapsed_seconds(), 0.0);
}

#[tokio::test]
async fn test_cancel_discards_in_progress_capture() {
    let mut capture = silent_capture(2.0);

    capture.start().await.expect("start should succeed");
    capture.cancel().await;

    assert_eq!(capture.state(), CaptureState::Idle);
    assert_eq!(capture.elapsed_seconds(), 0.0);

    // No artifact to stop: the capture was discarded
    let result = capture.stop().await;
    assert!(matches!(result, Err(DictationError::InvalidState(_))));
}

#[tokio::test]
async fn test_permission_denied_is_retryable() {
    let config = CaptureConfig::default();
    let backend = ScriptedBackend::denied(RecordingError::PermissionDenied);
    let mut capture = CaptureController::new(Box::new(backend), config);

    let err = capture.start().await.expect_err("start should fail");
    assert!(matches!(
        err,
        DictationError::Recording(RecordingError::PermissionDenied)
    ));

    // Terminal for that attempt only: controller is idle again
    assert_eq!(capture.state(), CaptureState::Idle);
}

#[tokio::test]
async fn test_double_start_is_refused() {
    let mut capture = silent_capture(1.0);

    capture.start().await.expect("start should succeed");

    let err = capture.start().await.expect_err("second start should fail");
    assert!(matches!(err, DictationError::InvalidState(_)));

    // First recording is still usable
    assert!(capture.is_recording());
    let clip = capture.stop().await.expect("stop should succeed");
    assert!(!clip.is_empty());
}

#[tokio::test]
async fn test_stop_without_recording_fails() {
    let mut capture = silent_capture(1.0);

    let result = capture.stop().await;
    assert!(matches!(result, Err(DictationError::InvalidState(_))));
}

#[test]
fn test_clip_wav_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("clip.wav");

    let clip = common::clip_of(1.0);
    clip.save(&path).expect("save should succeed");

    let loaded = clinivoice::audio::AudioClip::load(&path).expect("load should succeed");
    assert_eq!(loaded.sample_rate, clip.sample_rate);
    assert_eq!(loaded.samples.len(), clip.samples.len());
}

#[test]
fn test_clip_wav_round_trip() {
    let clip = common::clip_of(0.5);

    let bytes = clip.to_wav_bytes().expect("encode should succeed");
    let decoded =
        clinivoice::audio::AudioClip::from_wav_bytes(&bytes).expect("decode should succeed");

    assert_eq!(decoded.sample_rate, clip.sample_rate);
    assert_eq!(decoded.channels, clip.channels);
    assert_eq!(decoded.samples.len(), clip.samples.len());
    assert!((decoded.duration_seconds - clip.duration_seconds).abs() < 1e-9);
}
