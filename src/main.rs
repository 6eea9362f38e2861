use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use vocmd::app::run_stream_command;
use vocmd::audio::capture::list_devices;
use vocmd::cli::{Cli, Commands, ConfigAction};
use vocmd::config::Config;
use vocmd::stt::preflight::check_availability;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            run_stream_command(
                config,
                cli.device,
                cli.model,
                cli.wav,
                cli.quiet,
                cli.verbose,
            )
            .await?;
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(Commands::Check) => {
            let config = load_config(cli.config.as_deref())?;
            run_check(&config).await;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "vocmd", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/vocmd/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    // Apply environment variable overrides
    Ok(config.with_env_overrides())
}

/// List available audio input devices with their config indices.
fn list_audio_devices() -> Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }
    println!("\nSelect one with audio.device_index or --device <INDEX>.");

    Ok(())
}

/// Run the preflight check and print a human-readable verdict.
async fn run_check(config: &Config) {
    println!("Checking speech recognition dependencies...\n");

    print!("{} + whisper model: ", config.speech.binary);
    let report = check_availability(&config.speech.binary, &config.speech.model_path).await;
    if report.available {
        println!("{}", "✓ OK".green());
        println!("  model: {}", config.speech.model_path.display());
    } else {
        println!("{}", "✗ UNAVAILABLE".red());
        println!("  {}", report.reason);
        println!();
        println!("  The pipeline will not start; command input falls back");
        println!("  to the keyboard until this is fixed.");
        std::process::exit(1);
    }

    if !config.speech.enabled {
        println!();
        println!(
            "{}",
            "Note: speech.enabled = false — the pipeline is gated off.".yellow()
        );
    }
}

/// Handle configuration inspection commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&std::path::Path>) -> Result<()> {
    let config_path = custom_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}
