//! Default configuration constants for vocmd.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 48kHz matches the fixed input format the transcription process is
/// launched with (`-ar 48000`). The capture ring, the encoder, and the
/// child's command line must all agree on this value.
pub const SAMPLE_RATE: u32 = 48_000;

/// Number of interleaved audio channels.
///
/// The transcription process consumes 2-channel s16le (`-ac 2`). Mono
/// capture devices are duplicated to stereo at the ring boundary.
pub const CHANNELS: u16 = 2;

/// Frames per encoded chunk written to the transport channel.
///
/// One chunk is 1024 frames × 2 channels = 2048 samples = 4096 bytes,
/// roughly 21ms of audio at 48kHz. Every transport write is exactly one
/// chunk; there are no partial-chunk writes.
pub const CHUNK_FRAMES: usize = 1024;

/// Samples per chunk (frames × channels).
pub const CHUNK_SAMPLES: usize = CHUNK_FRAMES * CHANNELS as usize;

/// Capture loop tick interval in milliseconds.
///
/// Short enough to bound chunk latency (a chunk is ~21ms of audio, so a
/// 10ms tick drains backlog at roughly twice real time) without busy-spinning.
pub const TICK_MS: u64 = 10;

/// Length of the looping capture ring in seconds.
pub const RING_SECONDS: u32 = 10;

/// Timeout for the preflight version probe of the external binary.
pub const PREFLIGHT_TIMEOUT_SECS: u64 = 5;

/// Grace period for the external process to exit after its stdin closes,
/// before it is force-killed.
pub const SHUTDOWN_GRACE_SECS: u64 = 3;

/// External transcription binary.
pub const TRANSCRIBER_BINARY: &str = "ffmpeg";

/// Well-known relative path of the speech model asset.
pub const MODEL_RELATIVE_PATH: &str = "Whisper/ggml-medium.en.bin";

/// Default transcription language.
pub const LANGUAGE: &str = "en";

/// Whisper filter queue size (seconds of audio buffered inside the filter).
pub const WHISPER_QUEUE: u32 = 3;

/// Non-speech audio descriptors the transcription process emits for
/// background noise. Any utterance containing one of these
/// (case-insensitively) is discarded before command mapping.
pub const DENYLIST: &[&str] = &[
    "static",
    "noise",
    "breathing",
    "silence",
    "clicking",
    "crackling",
];

/// Utterances mapping exactly to the affirmative command (1).
pub const AFFIRMATIVE_EXACT: &[&str] = &["one", "1"];

/// Substrings mapping to the affirmative command when no exact match hits.
/// Known mis-transcriptions of "one" in this deployment; tuned data, kept small.
pub const AFFIRMATIVE_CONTAINS: &[&str] = &["one", "won", "wan"];

/// Utterances mapping exactly to the negative command (2).
pub const NEGATIVE_EXACT: &[&str] = &["two", "2"];

/// Substrings mapping to the negative command when no exact match hits.
pub const NEGATIVE_CONTAINS: &[&str] = &["two", "too", "to"];
