//! Real microphone capture using CPAL (Cross-Platform Audio Library).
//!
//! Captured audio is written into a fixed-length looping ring of
//! interleaved stereo f32 samples at the pipeline's sample rate, matching
//! the format the external transcription process is launched with.

use crate::audio::source::{RingAudioSource, read_ring};
use crate::defaults;
use crate::error::{Result, VocmdError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Suppress noisy JACK/ALSA error messages that occur during audio backend probing.
/// These are harmless but confusing to users.
///
/// # Safety
/// This modifies environment variables which is safe when called before spawning threads.
pub fn suppress_audio_warnings() {
    // SAFETY: Called at startup before any threads are spawned
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("ALSA_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// List all available audio input devices in enumeration order.
///
/// The order is what `device_index` in the configuration indexes into, so
/// no filtering or reordering is applied here.
///
/// # Errors
/// Returns `VocmdError::AudioCapture` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| VocmdError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            device_names.push(name);
        }
    }

    Ok(device_names)
}

/// Get the input device at `index` in enumeration order.
///
/// An out-of-range index falls back to the first device rather than
/// failing; the index is user-saved configuration and devices come and go.
///
/// # Errors
/// Returns `VocmdError::AudioDeviceNotFound` if no input device exists at all.
fn device_by_index(index: usize) -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices: Vec<cpal::Device> = host
            .input_devices()
            .map_err(|e| VocmdError::AudioCapture {
                message: format!("Failed to enumerate input devices: {}", e),
            })?
            .collect();

        if devices.is_empty() {
            return host
                .default_input_device()
                .ok_or_else(|| VocmdError::AudioDeviceNotFound {
                    device: "default".to_string(),
                });
        }

        let picked = if index < devices.len() { index } else { 0 };
        if picked != index {
            eprintln!(
                "vocmd: device index {} out of range ({} devices), using device 0",
                index,
                devices.len()
            );
        }
        devices
            .into_iter()
            .nth(picked)
            .ok_or_else(|| VocmdError::AudioDeviceNotFound {
                device: format!("index {}", index),
            })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: We ensure that the stream is only accessed from a single thread at a time
/// through the Mutex wrapper in CpalRingSource. The stream methods are called
/// synchronously and don't cross thread boundaries unsafely.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Write interleaved samples into the ring at the shared write position.
fn push_to_ring(ring: &Mutex<Vec<f32>>, position: &AtomicUsize, data: &[f32]) {
    if let Ok(mut ring) = ring.lock() {
        let len = ring.len();
        if len == 0 {
            return;
        }
        let mut pos = position.load(Ordering::Acquire);
        for &sample in data {
            ring[pos] = sample;
            pos = (pos + 1) % len;
        }
        position.store(pos, Ordering::Release);
    }
}

/// Real looping ring capture implementation using CPAL.
///
/// Tries the preferred format first (f32 / configured rate / stereo), then
/// mono with channel duplication, then i16 with conversion. The transport
/// format is fixed by the external process's command line, so unlike a
/// general recorder there is no native-rate fallback: a device that cannot
/// deliver the configured rate is an error.
pub struct CpalRingSource {
    device: cpal::Device,
    stream: Arc<Mutex<Option<SendableStream>>>,
    ring: Arc<Mutex<Vec<f32>>>,
    position: Arc<AtomicUsize>,
    sample_rate: u32,
}

impl CpalRingSource {
    /// Create a ring source over the device at `device_index`.
    ///
    /// The ring holds `ring_seconds` of interleaved stereo audio at
    /// `sample_rate`.
    pub fn new(device_index: usize, sample_rate: u32, ring_seconds: u32) -> Result<Self> {
        let device = device_by_index(device_index)?;
        let len = sample_rate as usize * defaults::CHANNELS as usize * ring_seconds as usize;

        Ok(Self {
            device,
            stream: Arc::new(Mutex::new(None)),
            ring: Arc::new(Mutex::new(vec![0.0; len])),
            position: Arc::new(AtomicUsize::new(0)),
            sample_rate,
        })
    }

    fn stream_config(&self, channels: u16) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        }
    }

    /// Build the input stream, trying formats in order of preference.
    fn build_stream(&self) -> Result<cpal::Stream> {
        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        // f32 stereo at the configured rate — matches the ring layout directly
        let ring = Arc::clone(&self.ring);
        let position = Arc::clone(&self.position);
        if let Ok(stream) = self.device.build_input_stream(
            &self.stream_config(defaults::CHANNELS),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                push_to_ring(&ring, &position, data);
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // f32 mono — duplicate each sample into both channels
        let ring = Arc::clone(&self.ring);
        let position = Arc::clone(&self.position);
        if let Ok(stream) = self.device.build_input_stream(
            &self.stream_config(1),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let stereo: Vec<f32> = data.iter().flat_map(|&s| [s, s]).collect();
                push_to_ring(&ring, &position, &stereo);
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        // i16 stereo — convert to normalized f32
        let ring = Arc::clone(&self.ring);
        let position = Arc::clone(&self.position);
        if let Ok(stream) = self.device.build_input_stream(
            &self.stream_config(defaults::CHANNELS),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let converted: Vec<f32> =
                    data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                push_to_ring(&ring, &position, &converted);
            },
            err_callback,
            None,
        ) {
            return Ok(stream);
        }

        let native = self
            .device
            .default_input_config()
            .map(|c| format!("{}ch/{}Hz/{:?}", c.channels(), c.sample_rate().0, c.sample_format()))
            .unwrap_or_else(|_| "unknown".to_string());
        Err(VocmdError::AudioFormatMismatch {
            expected: format!("{}Hz f32/i16", self.sample_rate),
            actual: native,
        })
    }
}

impl RingAudioSource for CpalRingSource {
    fn start(&mut self) -> Result<()> {
        {
            let stream_guard = self.stream.lock().map_err(|e| VocmdError::AudioCapture {
                message: format!("Failed to lock stream: {}", e),
            })?;
            if stream_guard.is_some() {
                return Ok(()); // Already started
            }
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| VocmdError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        let mut stream_guard = self.stream.lock().map_err(|e| VocmdError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        *stream_guard = Some(SendableStream(stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut stream_guard = self.stream.lock().map_err(|e| VocmdError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        if let Some(SendableStream(stream)) = stream_guard.take() {
            // Pause errors are not actionable during teardown
            if let Err(e) = stream.pause() {
                eprintln!("vocmd: failed to pause audio stream: {}", e);
            }
        }
        Ok(())
    }

    fn position(&self) -> Result<usize> {
        Ok(self.position.load(Ordering::Acquire))
    }

    fn buffer_len(&self) -> usize {
        self.ring.lock().map(|ring| ring.len()).unwrap_or(0)
    }

    fn read(&self, offset: usize, out: &mut [f32]) -> Result<()> {
        let ring = self.ring.lock().map_err(|e| VocmdError::AudioCapture {
            message: format!("Failed to lock ring: {}", e),
        })?;
        read_ring(&ring, offset, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_to_ring_wraps() {
        let ring = Mutex::new(vec![0.0f32; 4]);
        let position = AtomicUsize::new(3);

        push_to_ring(&ring, &position, &[1.0, 2.0, 3.0]);

        assert_eq!(position.load(Ordering::Acquire), 2);
        let ring = ring.lock().unwrap();
        assert_eq!(*ring, vec![2.0, 3.0, 0.0, 1.0]);
    }

    #[test]
    fn test_push_to_empty_ring_is_noop() {
        let ring = Mutex::new(Vec::new());
        let position = AtomicUsize::new(0);
        push_to_ring(&ring, &position, &[1.0]);
        assert_eq!(position.load(Ordering::Acquire), 0);
    }
}
