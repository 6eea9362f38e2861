//! Streaming application entry point.
//!
//! Composes the configured pieces — audio source, pipeline, event
//! subscription — and runs until Ctrl+C or pipeline failure.

use crate::audio::capture::{CpalRingSource, suppress_audio_warnings};
use crate::audio::source::RingAudioSource;
use crate::audio::wav::WavRingSource;
use crate::config::Config;
use crate::error::{Result, VocmdError};
use crate::events::CommandEvent;
use crate::pipeline::orchestrator::{CommandPipeline, PipelineConfig};
use crate::pipeline::state::PipelineState;
use std::path::PathBuf;
use std::time::Duration;

/// Width of the `-v` level meter in segments.
const LEVEL_BAR_SEGMENTS: usize = 20;

/// Render an RMS level as a fixed-width meter, e.g. `[####----------------]`.
fn format_level_bar(level: f32) -> String {
    let filled = ((level.clamp(0.0, 1.0) * LEVEL_BAR_SEGMENTS as f32).round() as usize)
        .min(LEVEL_BAR_SEGMENTS);
    let mut bar = String::with_capacity(LEVEL_BAR_SEGMENTS + 2);
    bar.push('[');
    for i in 0..LEVEL_BAR_SEGMENTS {
        bar.push(if i < filled { '#' } else { '-' });
    }
    bar.push(']');
    bar
}

/// Run the streaming command: capture → transcribe → command events.
///
/// # Arguments
/// * `config` - Base configuration (can be overridden by CLI args)
/// * `device` - Optional device index override from CLI
/// * `model` - Optional model path override from CLI
/// * `wav` - Stream a WAV file instead of the microphone
/// * `quiet` - Suppress status messages
/// * `verbosity` - Verbosity level (0=events only, 1=level meter, 2=transcriber diagnostics)
///
/// # Returns
/// Ok(()) on a clean stop, including the unavailable-fallback path.
pub async fn run_stream_command(
    mut config: Config,
    device: Option<usize>,
    model: Option<PathBuf>,
    wav: Option<PathBuf>,
    quiet: bool,
    verbosity: u8,
) -> Result<()> {
    // Suppress noisy JACK/ALSA warnings before audio init
    suppress_audio_warnings();

    // Apply CLI overrides
    if let Some(index) = device {
        config.audio.device_index = index;
    }
    if let Some(path) = model {
        config.speech.model_path = path;
    }

    if !config.speech.enabled {
        eprintln!("vocmd: speech recognition is disabled in the configuration");
        eprintln!("vocmd: use an alternate input method, or set speech.enabled = true");
        return Ok(());
    }

    let mut pipeline_config = PipelineConfig::from_config(&config);
    pipeline_config.log_stderr = verbosity >= 2;
    let mut pipeline = CommandPipeline::with_pipeline_config(pipeline_config, &config);
    let subscription = pipeline.subscribe();

    let source: Box<dyn RingAudioSource> = match &wav {
        Some(path) => Box::new(WavRingSource::from_path(path, config.audio.sample_rate)?),
        None => Box::new(CpalRingSource::new(
            config.audio.device_index,
            config.audio.sample_rate,
            config.audio.ring_seconds,
        )?),
    };

    match pipeline.start(source).await {
        Ok(()) => {}
        Err(VocmdError::Preflight { reason }) => {
            // Unavailable speech recognition must not hang or crash the
            // caller; report and leave them on the fallback input path.
            eprintln!("vocmd: speech recognition unavailable: {}", reason);
            eprintln!("vocmd: falling back — use keyboard input instead");
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    if !quiet {
        eprintln!("vocmd: streaming (say \"one\" or \"two\", Ctrl+C to stop)");
    }

    stream_events(&pipeline, &subscription.events, quiet, verbosity).await;

    if !quiet {
        eprintln!("\nShutting down...");
    }
    pipeline.stop().await;
    Ok(())
}

/// Print command events (and the level meter at `-v`) until Ctrl+C or failure.
async fn stream_events(
    pipeline: &CommandPipeline,
    events: &crossbeam_channel::Receiver<CommandEvent>,
    quiet: bool,
    verbosity: u8,
) {
    let mut poll = tokio::time::interval(Duration::from_millis(50));
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    eprintln!("vocmd: failed to wait for Ctrl+C: {}", e);
                }
                break;
            }
            _ = poll.tick() => {
                for event in events.try_iter() {
                    print_event(event, quiet, verbosity >= 1);
                }
                if pipeline.state() == PipelineState::Failed {
                    eprintln!("vocmd: pipeline failed, stopping");
                    break;
                }
                if verbosity >= 1 {
                    eprint!("\r{} ", format_level_bar(pipeline.loudness()));
                }
            }
        }
    }
}

fn print_event(event: CommandEvent, quiet: bool, clear_meter: bool) {
    if clear_meter {
        eprint!("\r{:40}\r", "");
    }
    match event {
        CommandEvent::Recognized { command } => {
            println!("{:?} ({})", command, command.digit());
        }
        CommandEvent::Unrecognized => {
            if !quiet {
                println!("(unrecognized — please repeat)");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bar_bounds() {
        assert_eq!(format_level_bar(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(format_level_bar(1.0), format!("[{}]", "#".repeat(20)));
        assert_eq!(format_level_bar(7.0), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn test_level_bar_half() {
        let bar = format_level_bar(0.5);
        assert_eq!(bar.matches('#').count(), 10);
        assert_eq!(bar.matches('-').count(), 10);
    }
}
