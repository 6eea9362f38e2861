//! External transcription process supervision.
//!
//! Spawns the process with fixed arguments, owns its lifetime, feeds its
//! stdout to the line channel in arrival order, and performs the ordered,
//! idempotent shutdown: close stdin → bounded grace wait → force-kill.
//! A handle is never resurrected; restart spawns a fresh one.

use crate::defaults;
use crate::error::{Result, VocmdError};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Launch description for the external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    pub binary: String,
    pub args: Vec<String>,
}

impl ProcessConfig {
    /// The fixed transcription command line: raw s16le stereo on stdin,
    /// whisper filter with JSON output on stdout, no media output.
    pub fn transcription(
        binary: &str,
        model_path: &Path,
        language: &str,
        queue: u32,
        sample_rate: u32,
    ) -> Self {
        let filter = format!(
            "whisper=model={}:language={}:queue={}:destination=-:format=json",
            model_path.display(),
            language,
            queue
        );
        Self {
            binary: binary.to_string(),
            args: vec![
                "-f".to_string(),
                "s16le".to_string(),
                "-ar".to_string(),
                sample_rate.to_string(),
                "-ac".to_string(),
                defaults::CHANNELS.to_string(),
                "-i".to_string(),
                "pipe:0".to_string(),
                "-vn".to_string(),
                "-af".to_string(),
                filter,
                "-f".to_string(),
                "null".to_string(),
                "-".to_string(),
            ],
        }
    }
}

/// A supervised transcription process.
///
/// At most one is alive per pipeline. Liveness is derived from stdout:
/// when the process exits its stdout closes, the reader task sees EOF and
/// clears the flag, and the capture loop picks that up on its next tick.
pub struct TranscriberProcess {
    child: Option<Child>,
    alive: Arc<AtomicBool>,
    stdout_task: Option<JoinHandle<()>>,
    stderr_task: Option<JoinHandle<()>>,
}

impl TranscriberProcess {
    /// Spawn the process with piped stdio and wire its output streams.
    ///
    /// Raw stdout lines are delivered to `line_tx` in arrival order.
    /// Stderr is drained continuously (a full stderr pipe would stall the
    /// child) and echoed only when `log_stderr` is set.
    pub fn spawn(
        config: &ProcessConfig,
        line_tx: mpsc::Sender<String>,
        log_stderr: bool,
    ) -> Result<Self> {
        let mut child = Command::new(&config.binary)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VocmdError::Spawn {
                binary: config.binary.clone(),
                message: e.to_string(),
            })?;

        let alive = Arc::new(AtomicBool::new(true));

        let stdout_task = child.stdout.take().map(|stdout| {
            let alive = alive.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if line_tx.send(line).await.is_err() {
                        break; // receiver gone, pipeline is shutting down
                    }
                }
                // EOF: the process exited or closed its stdout
                alive.store(false, Ordering::SeqCst);
            })
        });

        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if log_stderr {
                        eprintln!("vocmd: transcriber: {}", line);
                    }
                }
            })
        });

        Ok(Self {
            child: Some(child),
            alive,
            stdout_task,
            stderr_task,
        })
    }

    /// Move the child's stdin out for the transport layer.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.as_mut().and_then(|child| child.stdin.take())
    }

    /// Shared liveness flag, cleared when the process's stdout reaches EOF.
    pub fn alive_flag(&self) -> Arc<AtomicBool> {
        self.alive.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Ordered, idempotent shutdown.
    ///
    /// Closes stdin (if the transport has not already taken it), waits up
    /// to the grace period for natural exit, then force-kills. Individual
    /// step failures are logged and never prevent the remaining steps;
    /// this function always completes and never returns an error.
    pub async fn shutdown(&mut self) {
        let Some(mut child) = self.child.take() else {
            return; // already shut down
        };

        // Close stdin so the process sees EOF and can exit on its own
        drop(child.stdin.take());

        let grace = Duration::from_secs(defaults::SHUTDOWN_GRACE_SECS);
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                if !status.success() {
                    eprintln!("vocmd: transcriber exited with {}", status);
                }
            }
            Ok(Err(e)) => {
                eprintln!("vocmd: waiting for transcriber exit: {}", e);
            }
            Err(_) => {
                eprintln!(
                    "vocmd: transcriber still running after {}s grace, killing",
                    defaults::SHUTDOWN_GRACE_SECS
                );
                if let Err(e) = child.kill().await {
                    eprintln!("vocmd: failed to kill transcriber: {}", e);
                }
            }
        }

        self.alive.store(false, Ordering::SeqCst);

        // The reader tasks end at EOF; give them a moment, then detach.
        for task in [self.stdout_task.take(), self.stderr_task.take()]
            .into_iter()
            .flatten()
        {
            if tokio::time::timeout(Duration::from_millis(500), task)
                .await
                .is_err()
            {
                // Detached task dies with the runtime
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> ProcessConfig {
        ProcessConfig {
            binary: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[test]
    fn test_transcription_args_shape() {
        let config = ProcessConfig::transcription(
            "ffmpeg",
            Path::new("Whisper/ggml-medium.en.bin"),
            "en",
            3,
            48_000,
        );
        assert_eq!(config.binary, "ffmpeg");
        let joined = config.args.join(" ");
        assert!(joined.starts_with("-f s16le -ar 48000 -ac 2 -i pipe:0 -vn -af "));
        assert!(joined.contains(
            "whisper=model=Whisper/ggml-medium.en.bin:language=en:queue=3:destination=-:format=json"
        ));
        assert!(joined.ends_with("-f null -"));
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_fails() {
        let (tx, _rx) = mpsc::channel(8);
        let config = ProcessConfig {
            binary: "definitely-not-a-real-binary-9f2c".to_string(),
            args: vec![],
        };
        assert!(matches!(
            TranscriberProcess::spawn(&config, tx, false),
            Err(VocmdError::Spawn { .. })
        ));
    }

    #[tokio::test]
    async fn test_stdout_lines_arrive_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut process =
            TranscriberProcess::spawn(&sh("printf 'a\\nb\\nc\\n'"), tx, false).unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("a"));
        assert_eq!(rx.recv().await.as_deref(), Some("b"));
        assert_eq!(rx.recv().await.as_deref(), Some("c"));

        process.shutdown().await;
    }

    #[tokio::test]
    async fn test_alive_flag_clears_on_exit() {
        let (tx, mut rx) = mpsc::channel(8);
        let process = TranscriberProcess::spawn(&sh("exit 0"), tx, false).unwrap();

        // Drain until the channel closes (reader task finished at EOF)
        while rx.recv().await.is_some() {}
        // The flag store happens right after the last send
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!process.is_alive());
    }

    #[tokio::test]
    async fn test_shutdown_closes_stdin_for_natural_exit() {
        let (tx, _rx) = mpsc::channel(8);
        // cat exits when its stdin closes
        let mut process = TranscriberProcess::spawn(&sh("cat > /dev/null"), tx, false).unwrap();
        assert!(process.is_alive());

        let before = std::time::Instant::now();
        process.shutdown().await;
        assert!(
            before.elapsed() < Duration::from_secs(defaults::SHUTDOWN_GRACE_SECS),
            "cat should exit on EOF well within the grace period"
        );
        assert!(!process.is_alive());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (tx, _rx) = mpsc::channel(8);
        let mut process = TranscriberProcess::spawn(&sh("cat > /dev/null"), tx, false).unwrap();

        process.shutdown().await;
        process.shutdown().await; // second call is a no-op
        assert!(!process.is_alive());
    }

    #[tokio::test]
    async fn test_shutdown_kills_stubborn_process() {
        let (tx, _rx) = mpsc::channel(8);
        // Ignores stdin EOF; must be killed after the grace period
        let mut process =
            TranscriberProcess::spawn(&sh("trap '' TERM; sleep 60"), tx, false).unwrap();

        process.shutdown().await;
        assert!(!process.is_alive());
    }
}
