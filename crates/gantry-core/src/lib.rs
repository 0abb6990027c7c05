//! Gantry Core - Core library for the Gantry task orchestrator
//!
//! This crate provides the workspace configuration model, its loading and
//! validation, and the shared error types used by the task engine and CLI.

pub mod config;
pub mod error;

pub use config::{
    Config, Dependency, DetailedDependency, RecursivePolicy, RunnerConfig, TaskDefaults,
    WorkspaceGraph,
};
pub use error::{ConfigError, GantryError, Result};
