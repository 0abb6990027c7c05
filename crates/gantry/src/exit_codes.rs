//! Exit codes for the CLI

use gantry_core::GantryError;
use gantry_tasks::TaskError;

/// Success
pub const SUCCESS: i32 = 0;

/// General error, or at least one task failed
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Circular dependency in the workspace graph
pub const CYCLE_ERROR: i32 = 3;

/// Map an error to the process exit code
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(TaskError::CircularDependency { .. }) = err.downcast_ref::<TaskError>() {
        return CYCLE_ERROR;
    }
    if let Some(GantryError::Config(_)) = err.downcast_ref::<GantryError>() {
        return CONFIG_ERROR;
    }
    ERROR
}
