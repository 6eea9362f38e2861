//! Pipeline composition root.
//!
//! Owns the state machine and, while running, the supervised process,
//! the parser task, and the capture loop. Constructed once at process
//! start and handed to consumers by reference — there is no global
//! instance.

use crate::audio::source::RingAudioSource;
use crate::config::Config;
use crate::defaults;
use crate::error::{Result, VocmdError};
use crate::events::{CommandBus, SubscriberId, Subscription};
use crate::pipeline::capture_loop::{CaptureLoop, CaptureSession, LevelMeter};
use crate::pipeline::mailbox::Mailbox;
use crate::pipeline::state::{PipelineState, StateCell};
use crate::stt::mapper::CommandMapper;
use crate::stt::parser::{OutputParser, TranscriptionEvent};
use crate::stt::preflight::check_availability;
use crate::stt::supervisor::{ProcessConfig, TranscriberProcess};
use crate::transport::ProcessStdinTransport;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Whether the pipeline is allowed to start at all.
    pub enabled: bool,
    /// Launch description for the external process.
    pub process: ProcessConfig,
    /// Model asset verified by preflight.
    pub model_path: PathBuf,
    /// Run the preflight check on every start. Disable only when the
    /// caller has already checked availability and cached the verdict.
    pub run_preflight: bool,
    /// Interleaved samples per transport chunk.
    pub chunk_samples: usize,
    /// Capture loop cadence.
    pub tick_interval: Duration,
    /// Buffered stdout lines between the reader and the parser task.
    pub line_buffer: usize,
    /// Echo the child's stderr chatter (full diagnostics mode).
    pub log_stderr: bool,
}

impl PipelineConfig {
    /// Derive the pipeline configuration from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.speech.enabled,
            process: ProcessConfig::transcription(
                &config.speech.binary,
                &config.speech.model_path,
                &config.speech.language,
                config.speech.queue,
                config.audio.sample_rate,
            ),
            model_path: config.speech.model_path.clone(),
            run_preflight: true,
            chunk_samples: defaults::CHUNK_SAMPLES,
            tick_interval: Duration::from_millis(defaults::TICK_MS),
            line_buffer: 256,
            log_stderr: false,
        }
    }
}

/// Everything owned only while the pipeline is live.
struct ActivePipeline {
    cancel: Arc<AtomicBool>,
    supervisor: TranscriberProcess,
    capture_task: JoinHandle<()>,
    parser_task: JoinHandle<()>,
}

/// The speech-to-command pipeline.
///
/// `start` and `stop` drive the lifecycle state machine; `subscribe`
/// delivers command events. One instance per process, injected into
/// consumers.
pub struct CommandPipeline {
    config: PipelineConfig,
    state: StateCell,
    bus: Arc<CommandBus>,
    mapper: Arc<CommandMapper>,
    parser: Arc<OutputParser>,
    level: LevelMeter,
    active: Option<ActivePipeline>,
}

impl CommandPipeline {
    /// Build a pipeline from the application config.
    pub fn new(config: &Config) -> Self {
        Self::with_pipeline_config(PipelineConfig::from_config(config), config)
    }

    /// Build a pipeline with an explicit [`PipelineConfig`] (tests swap in
    /// stand-in processes here).
    pub fn with_pipeline_config(pipeline_config: PipelineConfig, config: &Config) -> Self {
        Self {
            config: pipeline_config,
            state: StateCell::new(),
            bus: Arc::new(CommandBus::new()),
            mapper: Arc::new(CommandMapper::new(&config.vocabulary)),
            parser: Arc::new(OutputParser::new(&config.vocabulary.denylist)),
            level: LevelMeter::new(),
            active: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state.get()
    }

    /// RMS loudness of the most recent captured chunk, in [0, 1].
    pub fn loudness(&self) -> f32 {
        self.level.get()
    }

    /// Register a command event subscriber.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.bus.unsubscribe(id);
    }

    /// Start streaming from `source`.
    ///
    /// Duplicate start requests while `Starting`/`Streaming` are logged
    /// no-ops. Preflight and launch failures leave the pipeline `Failed`
    /// and are returned to the caller, which decides on a fallback input
    /// method. An explicit restart (another `start`) is legal from
    /// `Failed` and creates a fresh process handle.
    pub async fn start(&mut self, source: Box<dyn RingAudioSource>) -> Result<()> {
        if !self.config.enabled {
            return Err(VocmdError::Preflight {
                reason: "speech recognition is disabled (speech.enabled = false)".to_string(),
            });
        }

        if !self.state.begin_start() {
            return Ok(()); // duplicate start, already logged
        }

        if self.config.run_preflight {
            let report =
                check_availability(&self.config.process.binary, &self.config.model_path).await;
            if !report.available {
                self.state.mark_failed();
                return Err(VocmdError::Preflight {
                    reason: report.reason,
                });
            }
        }

        let (line_tx, line_rx) = mpsc::channel(self.config.line_buffer);
        let mut supervisor =
            match TranscriberProcess::spawn(&self.config.process, line_tx, self.config.log_stderr)
            {
                Ok(supervisor) => supervisor,
                Err(e) => {
                    self.state.mark_failed();
                    return Err(e);
                }
            };

        let Some(stdin) = supervisor.take_stdin() else {
            supervisor.shutdown().await;
            self.state.mark_failed();
            return Err(VocmdError::Spawn {
                binary: self.config.process.binary.clone(),
                message: "child stdin was not piped".to_string(),
            });
        };

        let mailbox = Arc::new(Mailbox::new());
        let parser_task = self.spawn_parser(line_rx, mailbox.clone());

        let mut session =
            match CaptureSession::new(source, self.config.chunk_samples, self.level.clone()) {
                Ok(session) => session,
                Err(e) => {
                    parser_task.abort();
                    supervisor.shutdown().await;
                    self.state.mark_failed();
                    return Err(e);
                }
            };
        if let Err(e) = session.start() {
            parser_task.abort();
            supervisor.shutdown().await;
            self.state.mark_failed();
            return Err(e);
        }

        // Live optimistically once the streams are wired; no handshake.
        // Set before the first tick so an utterance arriving immediately
        // is not dropped by the streaming gate.
        self.state.mark_streaming();

        let cancel = Arc::new(AtomicBool::new(false));
        let capture_loop = CaptureLoop {
            session,
            transport: Box::new(ProcessStdinTransport::new(stdin)),
            process_alive: supervisor.alive_flag(),
            cancel: cancel.clone(),
            state: self.state.clone(),
            mailbox,
            mapper: self.mapper.clone(),
            bus: self.bus.clone(),
            tick_interval: self.config.tick_interval,
        };
        let capture_task = tokio::spawn(capture_loop.run());

        self.active = Some(ActivePipeline {
            cancel,
            supervisor,
            capture_task,
            parser_task,
        });

        Ok(())
    }

    /// Parser task: raw stdout lines → clean text → mailbox.
    ///
    /// Runs on its own context; the only state it shares with the capture
    /// loop is the mailbox, and it never holds the lock across a parse.
    fn spawn_parser(
        &self,
        mut line_rx: mpsc::Receiver<String>,
        mailbox: Arc<Mailbox>,
    ) -> JoinHandle<()> {
        let parser = self.parser.clone();
        tokio::spawn(async move {
            while let Some(line) = line_rx.recv().await {
                if let Some(text) = parser.parse(&line) {
                    mailbox.post(TranscriptionEvent::now(text));
                }
            }
        })
    }

    /// Orderly, idempotent shutdown. Never panics, never returns an
    /// error; individual step failures are logged and the remaining steps
    /// still run. Always ends in `Idle`.
    pub async fn stop(&mut self) {
        self.state.begin_stop();

        if let Some(mut active) = self.active.take() {
            // 1. Signal the capture loop; on exit it closes the
            //    transport's write side (the child's stdin) and stops the
            //    audio source.
            active.cancel.store(true, Ordering::SeqCst);
            let loop_deadline = self.config.tick_interval * 4 + Duration::from_millis(100);
            if tokio::time::timeout(loop_deadline, active.capture_task)
                .await
                .is_err()
            {
                eprintln!("vocmd: capture loop did not stop in time, detaching");
            }

            // 2. Close any stdin still held, grace wait, then force-kill.
            active.supervisor.shutdown().await;

            // 3. The parser task ends when the stdout reader drops its
            //    sender; reap it, or abort if something is still wedged.
            if tokio::time::timeout(Duration::from_millis(500), &mut active.parser_task)
                .await
                .is_err()
            {
                active.parser_task.abort();
            }
        }

        // Subscriptions are tied to the pipeline lifetime
        self.bus.clear();

        self.state.mark_idle();
    }
}
