//! Command-line interface for vocmd
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Voice-to-command streaming for binary spoken prompts
#[derive(Parser, Debug)]
#[command(
    name = "vocmd",
    version,
    about = "Stream microphone audio to ffmpeg's whisper filter and emit command events"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: level meter + events, -vv: transcriber diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Audio input device index (see `vocmd devices`)
    #[arg(long, value_name = "INDEX")]
    pub device: Option<usize>,

    /// Path to the whisper model file
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Stream a prerecorded WAV file instead of the microphone
    #[arg(long, value_name = "FILE")]
    pub wav: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// Check that the transcription binary and model are available
    Check,

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration inspection actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses_without_arguments() {
        let cli = Cli::parse_from(["vocmd"]);
        assert!(cli.command.is_none());
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::parse_from(["vocmd", "--device", "2", "-vv", "--wav", "clip.wav"]);
        assert_eq!(cli.device, Some(2));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.wav, Some(PathBuf::from("clip.wav")));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        assert!(matches!(
            Cli::parse_from(["vocmd", "devices"]).command,
            Some(Commands::Devices)
        ));
        assert!(matches!(
            Cli::parse_from(["vocmd", "check"]).command,
            Some(Commands::Check)
        ));
        assert!(matches!(
            Cli::parse_from(["vocmd", "config", "show"]).command,
            Some(Commands::Config {
                action: ConfigAction::Show
            })
        ));
    }

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }
}
