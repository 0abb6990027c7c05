//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_projects(config)?;
    validate_recursive(config)?;
    validate_runner(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_projects(config: &Config) -> Result<()> {
    if !config.projects.is_empty() {
        debug!(count = config.projects.len(), "validating projects");
    }
    for (project, task, deps) in config.projects.iter() {
        if task.is_empty() {
            return Err(ConfigError::invalid(
                format!("projects.{}", project),
                "task name cannot be empty",
            )
            .into());
        }

        for (i, dep) in deps.iter().enumerate() {
            if dep.project_path().is_empty() {
                return Err(ConfigError::invalid(
                    format!("projects.{}.{}[{}]", project, task, i),
                    "dependency project path cannot be empty",
                )
                .into());
            }
            if dep.task().is_some_and(str::is_empty) {
                return Err(ConfigError::invalid(
                    format!("projects.{}.{}[{}].task", project, task, i),
                    "task override cannot be empty",
                )
                .into());
            }
        }
    }

    Ok(())
}

fn validate_recursive(config: &Config) -> Result<()> {
    for (i, entry) in config.recursive.iter().enumerate() {
        if entry.project.is_empty() {
            return Err(ConfigError::invalid(
                format!("recursive[{}].project", i),
                "project cannot be empty",
            )
            .into());
        }
        if entry.tasks.is_empty() {
            return Err(ConfigError::invalid(
                format!("recursive[{}].tasks", i),
                "at least one task is required",
            )
            .into());
        }
    }

    Ok(())
}

fn validate_runner(config: &Config) -> Result<()> {
    if config.runner.command.trim().is_empty() {
        return Err(ConfigError::invalid("runner.command", "command cannot be empty").into());
    }

    if config.runner.timeout_secs == 0 {
        return Err(
            ConfigError::invalid("runner.timeout_secs", "timeout must be greater than 0").into(),
        );
    }

    Ok(())
}
