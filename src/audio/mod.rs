//! Audio capture: ring-buffer sources and device plumbing.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod source;
pub mod wav;

pub use source::{MockRingController, MockRingSource, RingAudioSource};
