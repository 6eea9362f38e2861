use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub speech: SpeechConfig,
    pub vocabulary: VocabularyConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Index into the enumerated input devices. Out-of-range values fall
    /// back to device 0.
    pub device_index: usize,
    pub sample_rate: u32,
    /// Length of the looping capture ring in seconds.
    pub ring_seconds: u32,
}

/// External transcription process configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    /// Gates whether the pipeline starts at all. When false the caller
    /// must offer an alternate input method.
    pub enabled: bool,
    pub binary: String,
    pub model_path: PathBuf,
    pub language: String,
    /// Seconds of audio the whisper filter buffers internally.
    pub queue: u32,
}

/// Utterance vocabularies, kept as data rather than logic.
///
/// The containment sets are deployment-tuned mis-transcription lists.
/// Extend them per deployment in the config file; the defaults stay small
/// to keep false-positive command injection bounded and auditable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VocabularyConfig {
    pub affirmative_exact: Vec<String>,
    pub affirmative_contains: Vec<String>,
    pub negative_exact: Vec<String>,
    pub negative_contains: Vec<String>,
    /// Non-speech descriptors dropped before command mapping.
    pub denylist: Vec<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            sample_rate: defaults::SAMPLE_RATE,
            ring_seconds: defaults::RING_SECONDS,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: defaults::TRANSCRIBER_BINARY.to_string(),
            model_path: PathBuf::from(defaults::MODEL_RELATIVE_PATH),
            language: defaults::LANGUAGE.to_string(),
            queue: defaults::WHISPER_QUEUE,
        }
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            affirmative_exact: owned(defaults::AFFIRMATIVE_EXACT),
            affirmative_contains: owned(defaults::AFFIRMATIVE_CONTAINS),
            negative_exact: owned(defaults::NEGATIVE_EXACT),
            negative_contains: owned(defaults::NEGATIVE_CONTAINS),
            denylist: owned(defaults::DENYLIST),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Reject configurations the pipeline cannot run with.
    fn validate(&self) -> anyhow::Result<()> {
        if self.audio.sample_rate == 0 {
            anyhow::bail!("audio.sample_rate must be positive");
        }
        if self.audio.ring_seconds == 0 {
            anyhow::bail!("audio.ring_seconds must be positive");
        }
        if self.speech.binary.is_empty() {
            anyhow::bail!("speech.binary must not be empty");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOCMD_BINARY → speech.binary
    /// - VOCMD_MODEL → speech.model_path
    /// - VOCMD_LANGUAGE → speech.language
    /// - VOCMD_DEVICE_INDEX → audio.device_index
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(binary) = std::env::var("VOCMD_BINARY")
            && !binary.is_empty()
        {
            self.speech.binary = binary;
        }

        if let Ok(model) = std::env::var("VOCMD_MODEL")
            && !model.is_empty()
        {
            self.speech.model_path = PathBuf::from(model);
        }

        if let Ok(language) = std::env::var("VOCMD_LANGUAGE")
            && !language.is_empty()
        {
            self.speech.language = language;
        }

        if let Ok(index) = std::env::var("VOCMD_DEVICE_INDEX")
            && let Ok(index) = index.parse::<usize>()
        {
            self.audio.device_index = index;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/vocmd/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("vocmd")
            .join("config.toml")
    }
}
