//! vocmd - real-time speech-to-command pipeline.
//!
//! Streams microphone audio to an external transcription process
//! (ffmpeg's whisper filter) and turns its recognized utterances into
//! discrete affirmative/negative command events.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod stt;
pub mod transport;

// L4 composition root - needs everything
#[cfg(all(feature = "cpal-audio", feature = "cli"))]
pub mod app;
#[cfg(feature = "cli")]
pub mod cli;

// Core traits (source → loop → transport)
pub use audio::source::RingAudioSource;
pub use transport::ByteTransport;

// Pipeline
pub use pipeline::orchestrator::{CommandPipeline, PipelineConfig};
pub use pipeline::state::PipelineState;

// Events
pub use events::{CommandBus, CommandEvent, SpokenCommand, Subscription};

// Error handling
pub use error::{Result, VocmdError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        // In a git repo build, GIT_HASH is set → expect "0.1.0+<hash>"
        // In CI without git, expect plain "0.1.0"
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
            let hash_part = ver.split('+').nth(1).unwrap_or("");
            assert_eq!(
                hash_part.len(),
                7,
                "Git hash should be 7 chars, got: {}",
                hash_part
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
