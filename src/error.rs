//! Error types for vocmd.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocmdError {
    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio format mismatch: expected {expected}, got {actual}")]
    AudioFormatMismatch { expected: String, actual: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Preflight / launch errors
    #[error("Preflight check failed: {reason}")]
    Preflight { reason: String },

    #[error("Failed to launch {binary}: {message}")]
    Spawn { binary: String, message: String },

    // Transport errors
    #[error("Transport channel closed")]
    TransportClosed,

    #[error("Transport write failed: {message}")]
    Transport { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VocmdError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_preflight_display() {
        let error = VocmdError::Preflight {
            reason: "ffmpeg not installed".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Preflight check failed: ffmpeg not installed"
        );
    }

    #[test]
    fn test_spawn_display() {
        let error = VocmdError::Spawn {
            binary: "ffmpeg".to_string(),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to launch ffmpeg: permission denied"
        );
    }

    #[test]
    fn test_audio_device_not_found_display() {
        let error = VocmdError::AudioDeviceNotFound {
            device: "index 7".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: index 7");
    }

    #[test]
    fn test_audio_format_mismatch_display() {
        let error = VocmdError::AudioFormatMismatch {
            expected: "48kHz".to_string(),
            actual: "44.1kHz".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Audio format mismatch: expected 48kHz, got 44.1kHz"
        );
    }

    #[test]
    fn test_transport_display() {
        let error = VocmdError::Transport {
            message: "broken pipe".to_string(),
        };
        assert_eq!(error.to_string(), "Transport write failed: broken pipe");
        assert_eq!(
            VocmdError::TransportClosed.to_string(),
            "Transport channel closed"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: VocmdError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: VocmdError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<VocmdError>();
        assert_sync::<VocmdError>();
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: VocmdError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }
}
