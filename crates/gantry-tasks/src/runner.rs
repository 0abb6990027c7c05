//! Single-task execution: one plan entry -> one process invocation

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use gantry_core::config::RunnerConfig;

use crate::error::{Result, TaskError};
use crate::process::{ProcessOptions, ProcessRunner};
use crate::task::{TaskExecution, TaskId};

/// Outcome of running one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    /// The task that was run
    pub task: TaskExecution,
    /// Whether the task succeeded
    pub success: bool,
    /// Process exit code, `-1` when unavailable
    pub exit_code: i32,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl TaskResult {
    /// Unsuccessful result carrying only an error message
    pub fn failure(task: TaskExecution, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            task,
            success: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: message.into(),
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// ID of the task this result belongs to
    pub fn id(&self) -> &TaskId {
        &self.task.id
    }

    /// Wall-clock duration
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Runs individual plan entries through a [`ProcessRunner`]
pub struct TaskRunner {
    root: PathBuf,
    command: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    timeout: Duration,
    process: Arc<dyn ProcessRunner>,
}

impl TaskRunner {
    /// Create a runner using the default command shape
    pub fn new(root: impl Into<PathBuf>, process: Arc<dyn ProcessRunner>) -> Self {
        Self::from_config(root, &RunnerConfig::default(), process)
    }

    /// Create a runner from the `runner` section of the config
    pub fn from_config(
        root: impl Into<PathBuf>,
        config: &RunnerConfig,
        process: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            root: root.into(),
            command: config.command.clone(),
            args: config.args.clone(),
            env: config.env.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            process,
        }
    }

    /// Override the per-task timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The underlying process capability
    pub fn process(&self) -> &Arc<dyn ProcessRunner> {
        &self.process
    }

    /// Working directory for a project path.
    ///
    /// A leading `./` is ignored and `""`, `"."` or `"./"` mean the root itself.
    pub fn working_dir(&self, project_path: &str) -> PathBuf {
        let relative = project_path.strip_prefix("./").unwrap_or(project_path);
        if relative.is_empty() || relative == "." {
            return self.root.clone();
        }
        self.root.join(relative)
    }

    /// Run one task. Never fails: process errors become unsuccessful results.
    pub async fn run_one(&self, task: &TaskExecution) -> TaskResult {
        let cwd = self.working_dir(task.project_path());
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{task}", task.task_name()))
            .collect();
        let options = self.env.iter().fold(
            ProcessOptions::new(cwd)
                .with_timeout(self.timeout)
                .with_id(task.id.to_string()),
            |options, (key, value)| options.with_env(key, value),
        );

        debug!(id = %task.id, command = %self.command, ?args, "running task");

        match self.process.run(&self.command, &args, &options).await {
            Ok(outcome) => TaskResult {
                task: task.clone(),
                success: outcome.success,
                exit_code: outcome.exit_code,
                stdout: outcome.stdout,
                stderr: outcome.stderr,
                duration_ms: outcome.duration.as_millis() as u64,
            },
            Err(e) => {
                warn!(id = %task.id, error = %e, "task could not be run");
                TaskResult::failure(task.clone(), e.to_string(), Duration::ZERO)
            }
        }
    }

    /// Like [`TaskRunner::run_one`], but a failed required task is an error
    pub async fn run_one_strict(&self, task: &TaskExecution) -> Result<TaskResult> {
        let result = self.run_one(task).await;
        if !result.success && task.required {
            return Err(TaskError::TaskExecution {
                id: task.id.clone(),
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }
        Ok(result)
    }
}
