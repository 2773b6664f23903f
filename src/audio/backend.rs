use crate::error::RecordingError;
use anyhow::Result;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since recording started
    pub timestamp_ms: u64,
}

/// Configuration for audio capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate (transcription services expect 16kHz)
    pub sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz for speech transcription
            channels: 1,        // Mono
            buffer_duration_ms: 100,
        }
    }
}

/// Microphone capture backend trait
///
/// The platform microphone sits behind this seam so the capture controller
/// and sessions can be driven by a scripted source in tests.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Request the device and begin capturing.
    ///
    /// Suspends while a permission grant is pending. Returns a channel
    /// receiver that will receive audio frames; the sender side is closed
    /// when capture stops.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, RecordingError>;

    /// Stop capturing audio and release the device
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Scripted capture backend: emits a fixed set of frames and closes.
///
/// Stands in for a real microphone in tests and in server-hosted sessions
/// that receive audio as an upload instead of capturing it locally.
pub struct ScriptedBackend {
    frames: Vec<AudioFrame>,
    deny: Option<RecordingError>,
    capturing: bool,
}

impl ScriptedBackend {
    pub fn with_frames(frames: Vec<AudioFrame>) -> Self {
        Self {
            frames,
            deny: None,
            capturing: false,
        }
    }

    /// Backend that fails every start with the given error (permission
    /// denial, missing device).
    pub fn denied(err: RecordingError) -> Self {
        Self {
            frames: Vec::new(),
            deny: Some(err),
            capturing: false,
        }
    }

    /// Backend producing `seconds` of silence at the given format, split
    /// into 100ms frames.
    pub fn silence(sample_rate: u32, channels: u16, seconds: f64) -> Self {
        let samples_per_frame = (sample_rate as usize / 10) * channels as usize;
        let total_frames = (seconds * 10.0).round() as usize;
        let frames = (0..total_frames)
            .map(|i| AudioFrame {
                samples: vec![0i16; samples_per_frame],
                sample_rate,
                channels,
                timestamp_ms: i as u64 * 100,
            })
            .collect();
        Self::with_frames(frames)
    }
}

#[async_trait::async_trait]
impl AudioBackend for ScriptedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, RecordingError> {
        if let Some(err) = self.deny {
            return Err(err);
        }

        let (tx, rx) = mpsc::channel(self.frames.len() + 1);
        for frame in self.frames.clone() {
            // Capacity covers every frame; send cannot block here
            let _ = tx.send(frame).await;
        }
        self.capturing = true;

        // Sender dropped: the receiver drains the frames and then sees the
        // channel close, which is how capture end is signaled.
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
