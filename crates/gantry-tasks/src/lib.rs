//! Gantry Tasks - Dependency resolution and execution engine
//!
//! This crate turns a workspace configuration plus a start point into an
//! ordered execution plan, and walks that plan with support for background
//! tasks, delays and fail-fast cancellation.

pub mod error;
pub mod executor;
pub mod process;
pub mod reporter;
pub mod resolver;
pub mod runner;
pub mod task;

pub use error::{ProcessError, TaskError};
pub use executor::{BackgroundProcess, BackgroundStatus, ExecutionSummary, Executor};
pub use process::{ProcessOptions, ProcessOutcome, ProcessRunner, TokioProcessRunner};
pub use reporter::{TaskEvent, TaskReporter, TaskReporterRegistry, TracingReporter};
pub use resolver::Resolver;
pub use runner::{TaskResult, TaskRunner};
pub use task::{ExecutionPlan, ResolutionMode, TaskExecution, TaskId};
