//! The speech-to-command pipeline: capture loop, state machine, and
//! composition root.
//!
//! Audio flows source → capture loop → transport → external process;
//! recognized text flows back through the parser into the mailbox and out
//! as command events. The two flows only share the mailbox and the
//! process liveness flag.

pub mod capture_loop;
pub mod encode;
pub mod mailbox;
pub mod orchestrator;
pub mod state;

pub use capture_loop::{CaptureLoop, CaptureSession, LevelMeter};
pub use encode::{calculate_rms, encode_chunk, sample_to_i16};
pub use mailbox::Mailbox;
pub use orchestrator::{CommandPipeline, PipelineConfig};
pub use state::{PipelineState, StateCell};
