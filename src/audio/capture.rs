use super::backend::{AudioBackend, CaptureConfig};
use super::clip::AudioClip;
use crate::error::{DictationError, DictationResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Capture lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
}

/// Owns the microphone lifecycle for one recording at a time.
///
/// `start` requests the device (suspending on pending permission), `stop`
/// finalizes the buffered audio into an [`AudioClip`], and `cancel` discards
/// an in-progress capture without producing an artifact. Permission and
/// device failures are terminal for that attempt only; the controller
/// returns to idle and a new `start` may be retried.
pub struct CaptureController {
    backend: Box<dyn AudioBackend>,
    config: CaptureConfig,
    state: CaptureState,

    /// Samples accumulated by the drain task while recording
    samples: Arc<Mutex<Vec<i16>>>,

    /// Sample counter observable without locking, for the live duration display
    sample_count: Arc<AtomicUsize>,

    /// Handle for the frame drain task
    drain_task: Option<JoinHandle<()>>,
}

impl CaptureController {
    pub fn new(backend: Box<dyn AudioBackend>, config: CaptureConfig) -> Self {
        Self {
            backend,
            config,
            state: CaptureState::Idle,
            samples: Arc::new(Mutex::new(Vec::new())),
            sample_count: Arc::new(AtomicUsize::new(0)),
            drain_task: None,
        }
    }

    /// Request microphone access and begin capturing.
    ///
    /// The microphone is exclusively owned for the lifetime of one recording;
    /// a second concurrent start is refused.
    pub async fn start(&mut self) -> DictationResult<()> {
        if self.state == CaptureState::Recording {
            return Err(DictationError::InvalidState("recording already in progress"));
        }

        let mut frame_rx = self.backend.start().await.map_err(|e| {
            warn!("audio capture start failed: {}", e);
            DictationError::from(e)
        })?;

        if let Ok(mut samples) = self.samples.lock() {
            samples.clear();
        }
        self.sample_count.store(0, Ordering::SeqCst);

        let samples = Arc::clone(&self.samples);
        let sample_count = Arc::clone(&self.sample_count);

        // Drains frames until the backend closes the channel at stop time
        self.drain_task = Some(tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                sample_count.fetch_add(frame.samples.len(), Ordering::SeqCst);
                if let Ok(mut buffer) = samples.lock() {
                    buffer.extend_from_slice(&frame.samples);
                }
            }
        }));

        self.state = CaptureState::Recording;
        info!("capture started ({})", self.backend.name());

        Ok(())
    }

    /// End capture and finalize the audio artifact.
    ///
    /// No network call happens here; the clip is built from the buffered
    /// samples and its duration is frozen.
    pub async fn stop(&mut self) -> DictationResult<AudioClip> {
        if self.state != CaptureState::Recording {
            return Err(DictationError::InvalidState("no recording to stop"));
        }

        if let Err(e) = self.backend.stop().await {
            warn!("audio backend stop failed: {}", e);
        }

        // The backend closes the frame channel on stop; wait for the drain
        // task to consume everything already captured.
        if let Some(task) = self.drain_task.take() {
            if let Err(e) = task.await {
                warn!("frame drain task failed: {}", e);
            }
        }

        self.state = CaptureState::Idle;

        let samples = self
            .samples
            .lock()
            .map(|mut buffer| std::mem::take(&mut *buffer))
            .unwrap_or_default();

        let clip = AudioClip::from_samples(samples, self.config.sample_rate, self.config.channels);

        info!(
            "capture stopped: {:.1}s ({} samples)",
            clip.duration_seconds,
            clip.samples.len()
        );

        Ok(clip)
    }

    /// Discard any in-progress capture without producing an artifact.
    ///
    /// Always succeeds, including from the idle/pre-permission state.
    pub async fn cancel(&mut self) {
        if self.state == CaptureState::Recording {
            if let Err(e) = self.backend.stop().await {
                warn!("audio backend stop failed during cancel: {}", e);
            }

            if let Some(task) = self.drain_task.take() {
                task.abort();
                let _ = task.await;
            }

            info!("capture cancelled");
        }

        if let Ok(mut samples) = self.samples.lock() {
            samples.clear();
        }
        self.sample_count.store(0, Ordering::SeqCst);
        self.state = CaptureState::Idle;
    }

    /// Seconds of audio captured so far.
    ///
    /// Monotonically non-decreasing while recording; frozen once capture
    /// stops. Derived from the sample counter, not wall-clock time.
    pub fn elapsed_seconds(&self) -> f64 {
        let count = self.sample_count.load(Ordering::SeqCst);
        count as f64 / (self.config.sample_rate as f64 * self.config.channels as f64)
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }
}
