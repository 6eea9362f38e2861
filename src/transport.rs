//! Byte transport: the one-directional conduit carrying encoded audio to
//! the external process.
//!
//! Writes are whole chunks only; the stream has no framing, so a partial
//! write would silently shift every later sample by half a frame.

use crate::error::{Result, VocmdError};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;

/// One-directional byte conduit into the transcription process.
#[async_trait::async_trait]
pub trait ByteTransport: Send {
    /// Write one encoded chunk in its entirety.
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()>;

    /// Close the write side. Idempotent; later writes fail with
    /// [`VocmdError::TransportClosed`].
    async fn close(&mut self) -> Result<()>;
}

/// Transport over the child process's standard input.
pub struct ProcessStdinTransport {
    stdin: Option<ChildStdin>,
}

impl ProcessStdinTransport {
    pub fn new(stdin: ChildStdin) -> Self {
        Self { stdin: Some(stdin) }
    }
}

#[async_trait::async_trait]
impl ByteTransport for ProcessStdinTransport {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VocmdError::TransportClosed);
        };
        stdin
            .write_all(chunk)
            .await
            .map_err(|e| VocmdError::Transport {
                message: e.to_string(),
            })?;
        stdin.flush().await.map_err(|e| VocmdError::Transport {
            message: e.to_string(),
        })
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            // Shutdown delivers EOF to the child; errors here mean the
            // pipe is already gone, which is the state we wanted.
            if let Err(e) = stdin.shutdown().await {
                eprintln!("vocmd: closing transport: {}", e);
            }
        }
        Ok(())
    }
}

/// Capturing transport for tests.
///
/// Records every chunk written and can be told to fail writes.
#[derive(Clone, Default)]
pub struct MockTransport {
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_writes: Arc<Mutex<bool>>,
    closed: Arc<Mutex<bool>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// All chunks written so far.
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.chunks.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.lock().map(|c| *c).unwrap_or(false)
    }

    /// Make subsequent writes fail, as a broken pipe would.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }
}

#[async_trait::async_trait]
impl ByteTransport for MockTransport {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if self.closed.lock().map(|c| *c).unwrap_or(false) {
            return Err(VocmdError::TransportClosed);
        }
        if self.fail_writes.lock().map(|f| *f).unwrap_or(false) {
            return Err(VocmdError::Transport {
                message: "mock broken pipe".to_string(),
            });
        }
        if let Ok(mut chunks) = self.chunks.lock() {
            chunks.push(chunk.to_vec());
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Ok(mut closed) = self.closed.lock() {
            *closed = true;
        }
        Ok(())
    }
}
