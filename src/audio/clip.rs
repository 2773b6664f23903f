use anyhow::{Context, Result};
use hound::{WavReader, WavSpec, WavWriter};
use std::io::Cursor;

/// A finished recording: the finite audio artifact a capture produces.
///
/// Held exclusively by one session until it is consumed by transcription or
/// discarded. Duration is measured from the sample count and frozen at stop
/// time.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Measured duration in seconds
    pub duration_seconds: f64,
}

impl AudioClip {
    pub fn from_samples(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        let duration_seconds =
            samples.len() as f64 / (sample_rate as f64 * channels as f64);

        Self {
            samples,
            sample_rate,
            channels,
            duration_seconds,
        }
    }

    /// Parse an uploaded WAV payload into a clip
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self> {
        let reader = WavReader::new(Cursor::new(bytes)).context("Failed to parse WAV data")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        Ok(Self::from_samples(samples, spec.sample_rate, spec.channels))
    }

    /// Encode the clip as WAV bytes for upload to the transcription service
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut bytes = Vec::new();
        {
            let cursor = Cursor::new(&mut bytes);
            let mut writer =
                WavWriter::new(cursor, spec).context("Failed to create WAV writer")?;

            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }

            writer.finalize().context("Failed to finalize WAV data")?;
        }

        Ok(bytes)
    }

    /// Read a clip from a WAV file on disk
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        Ok(Self::from_samples(samples, spec.sample_rate, spec.channels))
    }

    /// Write the clip to a WAV file on disk
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_wav_bytes()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write WAV file: {}", path.display()))
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
