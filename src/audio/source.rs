//! Ring-buffer audio source seam.
//!
//! The capture device writes samples into a fixed-length looping buffer
//! and exposes its current write position. Readers chase that position
//! with their own cursor; wraparound handling is the reader's job.
//!
//! This trait allows swapping implementations (real device, WAV playback,
//! or a scripted mock).

use crate::error::{Result, VocmdError};
use std::sync::{Arc, Mutex};

/// Trait for looping ring-buffer audio sources.
///
/// Positions and offsets are in interleaved samples (frames × channels),
/// modulo [`buffer_len`](RingAudioSource::buffer_len).
pub trait RingAudioSource: Send {
    /// Start capturing audio into the ring.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio.
    fn stop(&mut self) -> Result<()>;

    /// Current write position in samples, wrapped modulo the ring length.
    fn position(&self) -> Result<usize>;

    /// Total ring length in samples.
    fn buffer_len(&self) -> usize;

    /// Copy `out.len()` samples starting at ring offset `offset` into `out`.
    ///
    /// The read wraps around the end of the ring. Callers must have
    /// verified via [`position`](RingAudioSource::position) that the
    /// requested range has been written.
    fn read(&self, offset: usize, out: &mut [f32]) -> Result<()>;
}

/// Copy a wrapped range out of a ring slice. Shared by the real sources.
pub(crate) fn read_ring(ring: &[f32], offset: usize, out: &mut [f32]) -> Result<()> {
    if ring.is_empty() {
        return Err(VocmdError::AudioCapture {
            message: "ring buffer is empty".to_string(),
        });
    }
    let len = ring.len();
    let start = offset % len;
    let first = (len - start).min(out.len());
    out[..first].copy_from_slice(&ring[start..start + first]);
    if first < out.len() {
        let rest = out.len() - first;
        out[first..].copy_from_slice(&ring[..rest]);
    }
    Ok(())
}

#[derive(Debug)]
struct MockState {
    started: bool,
    position: usize,
    ring: Vec<f32>,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

/// Scripted ring source for testing.
///
/// Tests drive the write position by hand through the [`MockRingController`],
/// so cursor arithmetic can be exercised without real time or a device.
pub struct MockRingSource {
    state: Arc<Mutex<MockState>>,
}

/// Shared handle for driving a [`MockRingSource`] from a test.
#[derive(Clone)]
pub struct MockRingController {
    state: Arc<Mutex<MockState>>,
}

impl MockRingSource {
    /// Create a mock with a silent ring of `len` samples.
    pub fn new(len: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                started: false,
                position: 0,
                ring: vec![0.0; len],
                should_fail_start: false,
                should_fail_read: false,
                error_message: "mock audio error".to_string(),
            })),
        }
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.should_fail_start = true;
        }
        self
    }

    /// Configure the mock to fail on read
    pub fn with_read_failure(self) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.should_fail_read = true;
        }
        self
    }

    /// Handle for driving position and contents from the test body.
    pub fn controller(&self) -> MockRingController {
        MockRingController {
            state: self.state.clone(),
        }
    }
}

impl MockRingController {
    /// Set the raw write position (wrapped modulo the ring length).
    pub fn set_position(&self, position: usize) {
        if let Ok(mut state) = self.state.lock() {
            let len = state.ring.len();
            state.position = position % len;
        }
    }

    /// Write samples at an offset, wrapping, and advance the position past them.
    pub fn feed(&self, offset: usize, samples: &[f32]) {
        if let Ok(mut state) = self.state.lock() {
            let len = state.ring.len();
            for (i, &sample) in samples.iter().enumerate() {
                let idx = (offset + i) % len;
                state.ring[idx] = sample;
            }
            state.position = (offset + samples.len()) % len;
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().map(|state| state.started).unwrap_or(false)
    }
}

impl RingAudioSource for MockRingSource {
    fn start(&mut self) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| VocmdError::AudioCapture {
            message: "mock state poisoned".to_string(),
        })?;
        if state.should_fail_start {
            return Err(VocmdError::AudioCapture {
                message: state.error_message.clone(),
            });
        }
        state.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| VocmdError::AudioCapture {
            message: "mock state poisoned".to_string(),
        })?;
        state.started = false;
        Ok(())
    }

    fn position(&self) -> Result<usize> {
        let state = self.state.lock().map_err(|_| VocmdError::AudioCapture {
            message: "mock state poisoned".to_string(),
        })?;
        Ok(state.position)
    }

    fn buffer_len(&self) -> usize {
        self.state.lock().map(|state| state.ring.len()).unwrap_or(0)
    }

    fn read(&self, offset: usize, out: &mut [f32]) -> Result<()> {
        let state = self.state.lock().map_err(|_| VocmdError::AudioCapture {
            message: "mock state poisoned".to_string(),
        })?;
        if state.should_fail_read {
            return Err(VocmdError::AudioCapture {
                message: state.error_message.clone(),
            });
        }
        read_ring(&state.ring, offset, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_ring_contiguous() {
        let ring: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let mut out = [0.0; 3];
        read_ring(&ring, 2, &mut out).unwrap();
        assert_eq!(out, [2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_read_ring_wraps_around_end() {
        let ring: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let mut out = [0.0; 4];
        read_ring(&ring, 6, &mut out).unwrap();
        assert_eq!(out, [6.0, 7.0, 0.0, 1.0]);
    }

    #[test]
    fn test_read_ring_empty_ring_errors() {
        let ring: Vec<f32> = Vec::new();
        let mut out = [0.0; 1];
        assert!(read_ring(&ring, 0, &mut out).is_err());
    }

    #[test]
    fn test_mock_start_stop() {
        let mut source = MockRingSource::new(16);
        let controller = source.controller();
        assert!(!controller.is_started());
        source.start().unwrap();
        assert!(controller.is_started());
        source.stop().unwrap();
        assert!(!controller.is_started());
    }

    #[test]
    fn test_mock_start_failure() {
        let mut source = MockRingSource::new(16).with_start_failure();
        assert!(source.start().is_err());
    }

    #[test]
    fn test_mock_feed_advances_position() {
        let source = MockRingSource::new(8);
        let controller = source.controller();

        controller.feed(6, &[1.0, 2.0, 3.0]);
        // 6 + 3 wraps to 1
        assert_eq!(source.position().unwrap(), 1);

        let mut out = [0.0; 3];
        source.read(6, &mut out).unwrap();
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }
}
