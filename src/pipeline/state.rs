//! Pipeline lifecycle state machine.
//!
//! One authoritative state per pipeline. All transitions go through
//! [`StateCell`] so illegal moves are impossible and duplicate requests
//! are observable no-ops rather than errors.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Lifecycle state of the speech pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not running; the only state a successful shutdown ends in.
    Idle,
    /// Start requested; preflight and process launch in progress.
    Starting,
    /// The external process is live and audio is flowing.
    Streaming,
    /// Orderly shutdown in progress.
    Stopping,
    /// Unrecoverable failure (preflight, launch, or process death).
    /// Terminal until an explicit restart.
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Starting => "starting",
            PipelineState::Streaming => "streaming",
            PipelineState::Stopping => "stopping",
            PipelineState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Shared, lock-protected pipeline state.
#[derive(Clone)]
pub struct StateCell {
    inner: Arc<Mutex<PipelineState>>,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PipelineState::Idle)),
        }
    }

    pub fn get(&self) -> PipelineState {
        self.inner
            .lock()
            .map(|state| *state)
            .unwrap_or(PipelineState::Failed)
    }

    pub fn is_streaming(&self) -> bool {
        self.get() == PipelineState::Streaming
    }

    /// `Idle`/`Failed` → `Starting`. Returns false (a logged no-op, not an
    /// error) if a start is already in progress or streaming.
    pub fn begin_start(&self) -> bool {
        let Ok(mut state) = self.inner.lock() else {
            return false;
        };
        match *state {
            PipelineState::Idle | PipelineState::Failed => {
                *state = PipelineState::Starting;
                true
            }
            PipelineState::Starting | PipelineState::Streaming => {
                eprintln!("vocmd: start requested while already {}", *state);
                false
            }
            PipelineState::Stopping => {
                eprintln!("vocmd: start requested during shutdown, ignoring");
                false
            }
        }
    }

    /// `Starting` → `Streaming`. The pipeline is considered live
    /// optimistically once the process streams are wired; no handshake.
    pub fn mark_streaming(&self) {
        if let Ok(mut state) = self.inner.lock()
            && *state == PipelineState::Starting
        {
            *state = PipelineState::Streaming;
        }
    }

    /// Any state → `Stopping`. Returns the state being left so the caller
    /// can skip teardown work that was never set up. Safe from any state.
    pub fn begin_stop(&self) -> PipelineState {
        let Ok(mut state) = self.inner.lock() else {
            return PipelineState::Failed;
        };
        let previous = *state;
        *state = PipelineState::Stopping;
        previous
    }

    /// `Stopping` → `Idle`. Shutdown always completes here.
    pub fn mark_idle(&self) {
        if let Ok(mut state) = self.inner.lock() {
            *state = PipelineState::Idle;
        }
    }

    /// Any state → `Failed`.
    pub fn mark_failed(&self) {
        if let Ok(mut state) = self.inner.lock() {
            *state = PipelineState::Failed;
        }
    }
}
