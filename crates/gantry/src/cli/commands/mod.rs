//! CLI commands

mod init;
mod plan;
mod run;
mod workspace;

pub use init::InitCommand;
pub use plan::PlanCommand;
pub use run::RunCommand;
