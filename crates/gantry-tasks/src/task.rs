//! Task types and execution plans

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Unique identifier for a task within the workspace
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId {
    /// Project path
    pub project: String,
    /// Task name (e.g., "build", "test", "dev")
    pub task: String,
}

impl TaskId {
    /// Create a new task ID
    pub fn new(project: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            task: task.into(),
        }
    }

    /// Parse a task ID from "project:task" format
    ///
    /// The last colon separates the task, so project paths may contain colons.
    pub fn parse(s: &str) -> Option<Self> {
        let (project, task) = s.rsplit_once(':')?;
        if task.is_empty() {
            return None;
        }
        Some(Self::new(project, task))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project, self.task)
    }
}

/// One resolved, schedulable unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskExecution {
    /// Identity key, `project:task`
    pub id: TaskId,
    /// Run without waiting for completion before moving on
    pub background: bool,
    /// Whether a failure halts the remaining plan
    pub required: bool,
    /// Delay in milliseconds: before start for blocking tasks, after start for background tasks
    pub delay_ms: u64,
}

impl TaskExecution {
    /// Create a blocking, required task with no delay
    pub fn new(project: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(project, task),
            background: false,
            required: true,
            delay_ms: 0,
        }
    }

    /// Set the background flag
    pub fn with_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// Set the required flag
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the delay in milliseconds
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Project path this task runs in
    pub fn project_path(&self) -> &str {
        &self.id.project
    }

    /// Task name
    pub fn task_name(&self) -> &str {
        &self.id.task
    }

    /// Configured delay
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    fn flags(&self) -> String {
        let mut flags = Vec::new();
        if self.background {
            flags.push("[async]".to_string());
        }
        if !self.required {
            flags.push("[optional]".to_string());
        }
        if self.delay_ms > 0 {
            flags.push(format!("[delay {}ms]", self.delay_ms));
        }
        flags.join(" ")
    }
}

/// How a plan was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMode {
    /// Only the start task's declared dependencies
    NonRecursive,
    /// Transitive, depth-first, deduplicated
    Recursive,
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonRecursive => write!(f, "non-recursive"),
            Self::Recursive => write!(f, "recursive"),
        }
    }
}

/// Ordered list of tasks, dependencies before dependents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    mode: ResolutionMode,
    entries: Vec<TaskExecution>,
}

impl ExecutionPlan {
    /// Create a plan from already ordered entries
    pub fn new(mode: ResolutionMode, entries: Vec<TaskExecution>) -> Self {
        Self { mode, entries }
    }

    /// Resolution mode used to build the plan
    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Plan entries in execution order
    pub fn entries(&self) -> &[TaskExecution] {
        &self.entries
    }

    /// Iterate over entries in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, TaskExecution> {
        self.entries.iter()
    }

    /// Task IDs in execution order
    pub fn ids(&self) -> Vec<&TaskId> {
        self.entries.iter().map(|e| &e.id).collect()
    }

    /// Position of a task in the plan
    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.entries.iter().position(|e| &e.id == id)
    }

    /// The start task, always last
    pub fn target(&self) -> Option<&TaskExecution> {
        self.entries.last()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the plan has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a human-readable summary of the plan
    pub fn describe(&self) -> String {
        let mut out = format!("Execution plan ({}, {} tasks):\n", self.mode, self.len());
        for (i, entry) in self.entries.iter().enumerate() {
            let flags = entry.flags();
            if flags.is_empty() {
                out.push_str(&format!("  {}. {}\n", i + 1, entry.id));
            } else {
                out.push_str(&format!("  {}. {} {}\n", i + 1, entry.id, flags));
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a ExecutionPlan {
    type Item = &'a TaskExecution;
    type IntoIter = std::slice::Iter<'a, TaskExecution>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
