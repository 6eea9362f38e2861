//! WAV file audio source for feed mode.
//!
//! Exposes a prerecorded file through the same looping ring interface as
//! the microphone, with the write position advancing against an injected
//! clock. Lets the full pipeline run without a capture device, both for
//! diagnosis (`--wav`) and for the end-to-end test.

use crate::audio::source::{RingAudioSource, read_ring};
use crate::clock::{Clock, SystemClock};
use crate::defaults;
use crate::error::{Result, VocmdError};
use std::io::Read;
use std::path::Path;
use std::time::Instant;

/// Audio source that plays WAV file data back as a looping ring.
///
/// The file must match the pipeline sample rate (the transport format is
/// fixed by the external process's command line, so there is no
/// resampling). Mono files are duplicated to stereo.
pub struct WavRingSource<C: Clock = SystemClock> {
    samples: Vec<f32>,
    started_at: Option<Instant>,
    clock: C,
    sample_rate: u32,
}

impl WavRingSource<SystemClock> {
    /// Create from a WAV file on disk.
    pub fn from_path(path: &Path, sample_rate: u32) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(Box::new(std::io::BufReader::new(file)), sample_rate)
    }

    /// Create from any reader (for testing/flexibility).
    pub fn from_reader(reader: Box<dyn Read + Send>, sample_rate: u32) -> Result<Self> {
        Self::from_reader_with_clock(reader, sample_rate, SystemClock)
    }
}

impl<C: Clock> WavRingSource<C> {
    /// Create from a reader with an explicit clock (deterministic tests).
    pub fn from_reader_with_clock(
        reader: Box<dyn Read + Send>,
        sample_rate: u32,
        clock: C,
    ) -> Result<Self> {
        let mut wav_reader = hound::WavReader::new(reader).map_err(|e| VocmdError::AudioCapture {
            message: format!("Failed to parse WAV file: {}", e),
        })?;

        let spec = wav_reader.spec();
        if spec.sample_rate != sample_rate {
            return Err(VocmdError::AudioFormatMismatch {
                expected: format!("{}Hz", sample_rate),
                actual: format!("{}Hz", spec.sample_rate),
            });
        }

        let raw_samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => wav_reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<std::result::Result<Vec<_>, _>>(),
            hound::SampleFormat::Float => wav_reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>(),
        }
        .map_err(|e| VocmdError::AudioCapture {
            message: format!("Failed to read WAV samples: {}", e),
        })?;

        let samples = match spec.channels {
            c if c == defaults::CHANNELS => raw_samples,
            1 => raw_samples.iter().flat_map(|&s| [s, s]).collect(),
            other => {
                return Err(VocmdError::AudioFormatMismatch {
                    expected: format!("1 or {} channels", defaults::CHANNELS),
                    actual: format!("{} channels", other),
                });
            }
        };

        if samples.is_empty() {
            return Err(VocmdError::AudioCapture {
                message: "WAV file contains no samples".to_string(),
            });
        }

        Ok(Self {
            samples,
            started_at: None,
            clock,
            sample_rate,
        })
    }
}

impl<C: Clock> RingAudioSource for WavRingSource<C> {
    fn start(&mut self) -> Result<()> {
        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.started_at = None;
        Ok(())
    }

    fn position(&self) -> Result<usize> {
        let Some(started_at) = self.started_at else {
            return Ok(0);
        };
        let elapsed = self.clock.now().duration_since(started_at);
        // Integer math, frame-aligned so a read never starts mid-frame
        let frames = (elapsed.as_nanos() * self.sample_rate as u128 / 1_000_000_000) as usize;
        Ok((frames * defaults::CHANNELS as usize) % self.samples.len())
    }

    fn buffer_len(&self) -> usize {
        self.samples.len()
    }

    fn read(&self, offset: usize, out: &mut [f32]) -> Result<()> {
        read_ring(&self.samples, offset, out)
    }
}
