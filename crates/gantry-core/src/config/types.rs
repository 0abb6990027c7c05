//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration for Gantry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Workspace name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Per-project, per-task dependency lists
    pub projects: WorkspaceGraph,

    /// Fallback flags keyed by task name
    pub tasks: HashMap<String, TaskDefaults>,

    /// (project, task) pairs resolved transitively
    pub recursive: Vec<RecursivePolicy>,

    /// How a single task is turned into a process
    pub runner: RunnerConfig,
}

impl Config {
    /// Defaults configured for a task name, if any
    pub fn task_defaults(&self, task: &str) -> Option<&TaskDefaults> {
        self.tasks.get(task)
    }

    /// Whether `(project, task)` is opted into recursive resolution
    pub fn is_recursive(&self, project: &str, task: &str) -> bool {
        self.recursive
            .iter()
            .any(|entry| entry.project == project && entry.tasks.iter().any(|t| t == task))
    }
}

/// Mapping of project path -> task name -> ordered dependency list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceGraph {
    projects: HashMap<String, HashMap<String, Vec<Dependency>>>,
}

impl WorkspaceGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the dependencies of `task` in `project`
    pub fn insert(
        &mut self,
        project: impl Into<String>,
        task: impl Into<String>,
        dependencies: Vec<Dependency>,
    ) {
        self.projects
            .entry(project.into())
            .or_default()
            .insert(task.into(), dependencies);
    }

    /// Builder form of [`WorkspaceGraph::insert`]
    pub fn with_task(
        mut self,
        project: impl Into<String>,
        task: impl Into<String>,
        dependencies: Vec<Dependency>,
    ) -> Self {
        self.insert(project, task, dependencies);
        self
    }

    /// Dependencies declared for `(project, task)`; empty when unconfigured
    pub fn dependencies(&self, project: &str, task: &str) -> &[Dependency] {
        self.projects
            .get(project)
            .and_then(|tasks| tasks.get(task))
            .map(|deps| deps.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the project appears in the graph
    pub fn contains_project(&self, project: &str) -> bool {
        self.projects.contains_key(project)
    }

    /// All configured project paths, sorted
    pub fn project_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.projects.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Iterate over every `(project, task, dependencies)` triple
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[Dependency])> {
        self.projects.iter().flat_map(|(project, tasks)| {
            tasks
                .iter()
                .map(move |(task, deps)| (project.as_str(), task.as_str(), deps.as_slice()))
        })
    }

    /// Number of configured projects
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Check if no project is configured
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// One edge in the workspace graph
///
/// A bare string names the project and inherits the task being resolved;
/// the table form may override the task and any scheduling flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    /// Bare project path
    Simple(String),
    /// Project path with optional overrides
    Detailed(DetailedDependency),
}

impl Dependency {
    /// Bare dependency on a project
    pub fn simple(project: impl Into<String>) -> Self {
        Self::Simple(project.into())
    }

    /// Path of the project this edge points at
    pub fn project_path(&self) -> &str {
        match self {
            Self::Simple(path) => path,
            Self::Detailed(detail) => &detail.project_path,
        }
    }

    /// Explicit task override
    pub fn task(&self) -> Option<&str> {
        match self {
            Self::Simple(_) => None,
            Self::Detailed(detail) => detail.task.as_deref(),
        }
    }

    /// Explicit background flag
    pub fn background(&self) -> Option<bool> {
        match self {
            Self::Simple(_) => None,
            Self::Detailed(detail) => detail.background,
        }
    }

    /// Explicit required flag
    pub fn required(&self) -> Option<bool> {
        match self {
            Self::Simple(_) => None,
            Self::Detailed(detail) => detail.required,
        }
    }

    /// Explicit delay in milliseconds
    pub fn delay(&self) -> Option<u64> {
        match self {
            Self::Simple(_) => None,
            Self::Detailed(detail) => detail.delay,
        }
    }
}

impl From<&str> for Dependency {
    fn from(path: &str) -> Self {
        Self::Simple(path.to_string())
    }
}

impl From<DetailedDependency> for Dependency {
    fn from(detail: DetailedDependency) -> Self {
        Self::Detailed(detail)
    }
}

/// Table form of a dependency. Unset fields stay `None` until resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedDependency {
    /// Path of the project depended on
    #[serde(alias = "projectPath")]
    pub project_path: String,

    /// Task to run in that project (defaults to the task being resolved)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    /// Run without waiting for completion
    #[serde(
        default,
        rename = "async",
        alias = "background",
        skip_serializing_if = "Option::is_none"
    )]
    pub background: Option<bool>,

    /// Whether a failure halts the rest of the plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Delay in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

impl DetailedDependency {
    /// Create a dependency on a project with no overrides
    pub fn new(project_path: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            task: None,
            background: None,
            required: None,
            delay: None,
        }
    }

    /// Override the task name
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Override the background flag
    pub fn with_background(mut self, background: bool) -> Self {
        self.background = Some(background);
        self
    }

    /// Override the required flag
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Override the delay (milliseconds)
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }
}

/// Per-task-name fallback flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDefaults {
    /// Run without waiting for completion
    #[serde(rename = "async", alias = "background")]
    pub background: bool,

    /// Whether a failure halts the rest of the plan
    pub required: bool,

    /// Delay in milliseconds
    pub delay: u64,
}

impl Default for TaskDefaults {
    fn default() -> Self {
        Self {
            background: false,
            required: true,
            delay: 0,
        }
    }
}

/// Opts a project's tasks into recursive resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecursivePolicy {
    /// Project path
    pub project: String,

    /// Task names resolved recursively for this project
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl RecursivePolicy {
    /// Create a policy entry
    pub fn new(project: impl Into<String>, tasks: &[&str]) -> Self {
        Self {
            project: project.into(),
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Command shape used to run one task in a project directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Program to invoke
    pub command: String,

    /// Arguments; `{task}` is replaced by the task name
    pub args: Vec<String>,

    /// Per-task timeout in seconds
    pub timeout_secs: u64,

    /// Extra environment variables
    pub env: HashMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: "npm".to_string(),
            args: vec!["run".to_string(), "{task}".to_string()],
            timeout_secs: 600,
            env: HashMap::new(),
        }
    }
}

impl RunnerConfig {
    /// Arguments with the task placeholder substituted
    pub fn args_for(&self, task: &str) -> Vec<String> {
        self.args.iter().map(|a| a.replace("{task}", task)).collect()
    }
}
