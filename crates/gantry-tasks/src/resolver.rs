//! Dependency resolution: workspace graph -> ordered execution plan
//!
//! Two traversal policies are supported. A `(project, task)` pair listed in
//! the config's `recursive` section is expanded transitively, depth-first and
//! post-order, with deduplication by task ID and cycle detection. Every other
//! start point only schedules its directly declared dependencies.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use gantry_core::config::{Config, Dependency, TaskDefaults};

use crate::error::{Result, TaskError};
use crate::task::{ExecutionPlan, ResolutionMode, TaskExecution, TaskId};

/// Turns a workspace configuration plus a start point into an execution plan
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    config: &'a Config,
}

/// Mutable state of one recursive traversal
#[derive(Debug, Default)]
struct Traversal {
    /// Nodes on the current DFS path, for cycle detection
    path: Vec<TaskId>,
    /// Nodes already emitted
    finalized: HashSet<TaskId>,
    /// Emitted nodes in post-order
    order: Vec<TaskExecution>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a validated configuration
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Resolve the plan for running `task` in `project`.
    ///
    /// Fails only on a cycle reachable in recursive mode. Projects missing
    /// from the graph are still scheduled; they simply have no dependencies.
    #[instrument(skip(self))]
    pub fn resolve(&self, project: &str, task: &str) -> Result<ExecutionPlan> {
        let mode = self.mode_for(project, task);
        let entries = match mode {
            ResolutionMode::NonRecursive => self.resolve_direct(project, task),
            ResolutionMode::Recursive => self.resolve_recursive(project, task)?,
        };

        info!(
            %mode,
            task_count = entries.len(),
            "execution plan resolved"
        );
        Ok(ExecutionPlan::new(mode, entries))
    }

    /// Resolution mode for a start point
    pub fn mode_for(&self, project: &str, task: &str) -> ResolutionMode {
        if self.config.is_recursive(project, task) {
            ResolutionMode::Recursive
        } else {
            ResolutionMode::NonRecursive
        }
    }

    fn resolve_direct(&self, project: &str, task: &str) -> Vec<TaskExecution> {
        let deps = self.config.projects.dependencies(project, task);
        let mut entries: Vec<TaskExecution> = deps
            .iter()
            .map(|dep| self.materialize(dep, task))
            .collect();
        entries.push(self.root_execution(project, task));
        entries
    }

    fn resolve_recursive(&self, project: &str, task: &str) -> Result<Vec<TaskExecution>> {
        let mut traversal = Traversal::default();
        self.visit(self.root_execution(project, task), &mut traversal)?;
        Ok(traversal.order)
    }

    fn visit(&self, node: TaskExecution, traversal: &mut Traversal) -> Result<()> {
        if let Some(start) = traversal.path.iter().position(|id| *id == node.id) {
            let mut cycle: Vec<&str> = traversal.path[start..]
                .iter()
                .map(|id| id.project.as_str())
                .collect();
            cycle.push(node.project_path());
            return Err(TaskError::CircularDependency {
                path: cycle.join(" -> "),
            });
        }

        if traversal.finalized.contains(&node.id) {
            debug!(id = %node.id, "already scheduled, skipping");
            return Ok(());
        }

        traversal.path.push(node.id.clone());
        for dep in self
            .config
            .projects
            .dependencies(node.project_path(), node.task_name())
        {
            let child = self.materialize(dep, node.task_name());
            self.visit(child, traversal)?;
        }
        traversal.path.pop();

        traversal.finalized.insert(node.id.clone());
        traversal.order.push(node);
        Ok(())
    }

    /// Build the task execution for one dependency edge.
    ///
    /// Explicit fields win, then the task's configured defaults, then the
    /// hardcoded fallback.
    fn materialize(&self, dep: &Dependency, inherited_task: &str) -> TaskExecution {
        let task = dep.task().unwrap_or(inherited_task);
        let defaults = self.defaults_for(task);

        TaskExecution::new(dep.project_path(), task)
            .with_background(dep.background().unwrap_or(defaults.background))
            .with_required(dep.required().unwrap_or(defaults.required))
            .with_delay(dep.delay().unwrap_or(defaults.delay))
    }

    /// The start task never takes per-dependency overrides
    fn root_execution(&self, project: &str, task: &str) -> TaskExecution {
        let defaults = self.defaults_for(task);
        TaskExecution::new(project, task)
            .with_background(defaults.background)
            .with_required(defaults.required)
            .with_delay(defaults.delay)
    }

    fn defaults_for(&self, task: &str) -> TaskDefaults {
        self.config
            .task_defaults(task)
            .copied()
            .unwrap_or_default()
    }
}
