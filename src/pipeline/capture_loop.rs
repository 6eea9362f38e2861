//! Scheduled capture loop: ring cursor → encoded chunks → transport.
//!
//! One cooperative task samples new audio since the last cursor position,
//! encodes exactly one chunk per tick, and writes it to the transport
//! while the external process is alive. The same tick consumes the
//! mailbox and dispatches command events, so event delivery shares the
//! loop's context exactly as the original per-frame consumer did.

use crate::audio::source::RingAudioSource;
use crate::error::{Result, VocmdError};
use crate::events::{CommandBus, CommandEvent};
use crate::pipeline::encode::{calculate_rms, encode_chunk};
use crate::pipeline::mailbox::Mailbox;
use crate::pipeline::state::StateCell;
use crate::stt::mapper::CommandMapper;
use crate::transport::ByteTransport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared loudness readout, updated once per encoded chunk.
///
/// RMS of the most recent chunk, clamped to [0, 1]. Read by the UI layer
/// for level display; never consulted by the pipeline itself.
#[derive(Clone, Default)]
pub struct LevelMeter {
    level: Arc<Mutex<f32>>,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> f32 {
        self.level.lock().map(|l| *l).unwrap_or(0.0)
    }

    fn set(&self, value: f32) {
        if let Ok(mut level) = self.level.lock() {
            *level = value.clamp(0.0, 1.0);
        }
    }
}

/// Cursor-chasing reader over a ring audio source.
///
/// Owns the source exclusively for the pipeline's lifetime. The cursor
/// only ever advances by whole chunks, modulo the ring length, and never
/// past the source's write position.
pub struct CaptureSession {
    source: Box<dyn RingAudioSource>,
    cursor: usize,
    chunk_samples: usize,
    level: LevelMeter,
}

impl CaptureSession {
    /// Wrap a source. The chunk must fit in the ring, otherwise the
    /// available-samples check could never pass.
    pub fn new(
        source: Box<dyn RingAudioSource>,
        chunk_samples: usize,
        level: LevelMeter,
    ) -> Result<Self> {
        let len = source.buffer_len();
        if chunk_samples == 0 || chunk_samples > len {
            return Err(VocmdError::AudioCapture {
                message: format!(
                    "chunk of {} samples does not fit ring of {}",
                    chunk_samples, len
                ),
            });
        }
        Ok(Self {
            source,
            cursor: 0,
            chunk_samples,
            level,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        self.source.start()
    }

    pub fn stop(&mut self) -> Result<()> {
        self.source.stop()
    }

    /// Interleaved samples written since the cursor, accounting for wraparound.
    fn available(&self) -> Result<usize> {
        let position = self.source.position()?;
        let len = self.source.buffer_len();
        let mut available = position as i64 - self.cursor as i64;
        if available < 0 {
            // The write position lapped the end of the ring
            available += len as i64;
        }
        Ok(available as usize)
    }

    /// Read and encode exactly one chunk if one has accumulated.
    ///
    /// Draining a single chunk per tick bounds per-tick latency; backlog
    /// clears over subsequent ticks since a tick is shorter than a chunk.
    pub fn tick(&mut self) -> Result<Option<Vec<u8>>> {
        if self.available()? < self.chunk_samples {
            return Ok(None);
        }

        let mut samples = vec![0.0f32; self.chunk_samples];
        self.source.read(self.cursor, &mut samples)?;
        self.cursor = (self.cursor + self.chunk_samples) % self.source.buffer_len();

        self.level.set(calculate_rms(&samples));
        Ok(Some(encode_chunk(&samples)))
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }
}

/// The scheduled loop tying capture, transport, and event dispatch together.
pub struct CaptureLoop {
    pub session: CaptureSession,
    pub transport: Box<dyn ByteTransport>,
    /// Cleared by the supervisor's stdout reader when the process dies.
    pub process_alive: Arc<AtomicBool>,
    /// Set once at shutdown; checked every tick.
    pub cancel: Arc<AtomicBool>,
    pub state: StateCell,
    pub mailbox: Arc<Mailbox>,
    pub mapper: Arc<CommandMapper>,
    pub bus: Arc<CommandBus>,
    pub tick_interval: Duration,
}

impl CaptureLoop {
    /// Run until cancelled or the external process dies.
    ///
    /// On exit the transport's write side is closed and the audio source
    /// stopped, regardless of how the loop ended.
    pub async fn run(mut self) {
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                break;
            }

            // Process death: stop writing and fail the pipeline. Detected
            // here, on the liveness check, never mid-write.
            if !self.process_alive.load(Ordering::SeqCst) {
                eprintln!("vocmd: transcriber process died, pipeline failed");
                self.state.mark_failed();
                break;
            }

            match self.session.tick() {
                Ok(Some(chunk)) => {
                    // A single failed write is logged and skipped; the
                    // liveness check above decides whether to give up.
                    if let Err(e) = self.transport.write_chunk(&chunk).await {
                        eprintln!("vocmd: transport write skipped: {}", e);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    eprintln!("vocmd: capture read failed: {}", e);
                }
            }

            self.dispatch_pending();

            tokio::time::sleep(self.tick_interval).await;
        }

        if let Err(e) = self.transport.close().await {
            eprintln!("vocmd: closing transport: {}", e);
        }
        if let Err(e) = self.session.stop() {
            eprintln!("vocmd: stopping audio source: {}", e);
        }
    }

    /// Consume the mailbox and raise at most one command event.
    ///
    /// Events are only raised while streaming; text arriving during
    /// shutdown is dropped with the mailbox.
    fn dispatch_pending(&self) {
        let Some(event) = self.mailbox.take() else {
            return;
        };
        if !self.state.is_streaming() {
            return;
        }
        match self.mapper.map(&event.text).command() {
            Some(command) => self.bus.publish(CommandEvent::Recognized { command }),
            None => self.bus.publish(CommandEvent::Unrecognized),
        }
    }
}
