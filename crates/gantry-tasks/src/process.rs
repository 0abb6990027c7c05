//! Process invocation capability
//!
//! The execution engine never spawns processes itself; it goes through a
//! [`ProcessRunner`]. [`TokioProcessRunner`] is the real implementation,
//! tests substitute scripted runners.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::ProcessError;

/// Options for a single process invocation
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Working directory
    pub cwd: PathBuf,
    /// Extra environment variables
    pub env: HashMap<String, String>,
    /// Kill the process and report failure after this long
    pub timeout: Option<Duration>,
    /// Key used to address the process in [`ProcessRunner::terminate`]
    pub id: Option<String>,
}

impl ProcessOptions {
    /// Create options for a working directory
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the termination key
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// What a finished (or killed) process reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit status was zero
    pub success: bool,
    /// Exit code, `-1` when the process was killed or has none
    pub exit_code: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Wall-clock duration
    pub duration: Duration,
}

impl ProcessOutcome {
    /// Unsuccessful outcome with no output other than a message
    pub fn failed(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: message.into(),
            duration,
        }
    }
}

/// Runs a command to completion
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `command` with `args` and report its outcome.
    ///
    /// Non-zero exits and timeouts are unsuccessful outcomes, not errors.
    async fn run(
        &self,
        command: &str,
        args: &[String],
        options: &ProcessOptions,
    ) -> Result<ProcessOutcome, ProcessError>;

    /// Best-effort termination of the process started with `id`.
    ///
    /// Returns `false` when unsupported or nothing is running under `id`.
    fn terminate(&self, _id: &str) -> bool {
        false
    }
}

/// Process runner backed by `tokio::process`
#[derive(Debug, Default)]
pub struct TokioProcessRunner {
    running: Mutex<HashMap<String, oneshot::Sender<()>>>,
}

impl TokioProcessRunner {
    /// Create a new runner
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, id: &str) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string(), tx);
        rx
    }

    fn unregister(&self, id: &str) {
        self.running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        command: &str,
        args: &[String],
        options: &ProcessOptions,
    ) -> Result<ProcessOutcome, ProcessError> {
        let start = Instant::now();
        debug!(command, ?args, cwd = %options.cwd.display(), "spawning process");

        let mut cmd = Command::new(command);
        cmd.args(args)
            .current_dir(&options.cwd)
            .envs(&options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: command.to_string(),
            source,
        })?;

        // Dropping the sender without sending disables the branch below
        let cancelled = match &options.id {
            Some(id) => self.register(id),
            None => oneshot::channel().1,
        };

        let deadline = async {
            match options.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        // The child is owned by `wait_with_output`; leaving the select drops it and kills it
        let outcome = tokio::select! {
            output = child.wait_with_output() => output
                .map(|output| ProcessOutcome {
                    success: output.status.success(),
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    duration: start.elapsed(),
                })
                .map_err(|source| ProcessError::Wait {
                    command: command.to_string(),
                    source,
                }),
            _ = deadline => {
                warn!(command, timeout = ?options.timeout, "process timed out");
                Ok(ProcessOutcome::failed(
                    format!(
                        "Timed out after {}s",
                        options.timeout.unwrap_or_default().as_secs()
                    ),
                    start.elapsed(),
                ))
            }
            Ok(()) = cancelled => {
                debug!(command, "process terminated");
                Ok(ProcessOutcome::failed("Terminated", start.elapsed()))
            }
        };

        if let Some(id) = &options.id {
            self.unregister(id);
        }
        outcome
    }

    fn terminate(&self, id: &str) -> bool {
        let sender = self
            .running
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        match sender {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}
