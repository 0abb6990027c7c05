//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{InitCommand, PlanCommand, RunCommand};

/// Gantry - Monorepo task orchestrator
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a task and its dependencies
    Run(RunCommand),

    /// Show the execution plan for a task without running it
    Plan(PlanCommand),

    /// Create a starter configuration file
    Init(InitCommand),
}

impl Cli {
    /// Whether info-level logs should reach the console
    pub fn wants_info_logs(&self) -> bool {
        self.verbose || matches!(&self.command, Commands::Run(cmd) if cmd.debug)
    }

    /// Execute the CLI command, returning the process exit code
    pub fn execute(&self) -> anyhow::Result<i32> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match &self.command {
            Commands::Run(cmd) => cmd.execute(self),
            Commands::Plan(cmd) => cmd.execute(self),
            Commands::Init(cmd) => cmd.execute(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_flags() {
        let cli = Cli::try_parse_from([
            "gantry",
            "--format",
            "json",
            "run",
            "test",
            "--project",
            "apps/web",
            "--debug",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Run(cmd) => {
                assert_eq!(cmd.task, "test");
                assert_eq!(cmd.project.as_deref(), Some("apps/web"));
                assert!(cmd.debug);
                assert!(!cmd.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gantry", "plan", "build", "-v", "-C", "/tmp"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.directory, Some(std::path::PathBuf::from("/tmp")));
    }

    #[test]
    fn test_debug_raises_console_logging() {
        let cli = Cli::try_parse_from(["gantry", "run", "dev", "--debug"]).unwrap();
        assert!(cli.wants_info_logs());

        let cli = Cli::try_parse_from(["gantry", "plan", "dev"]).unwrap();
        assert!(!cli.wants_info_logs());
    }

    #[test]
    fn test_subcommands() {
        let names: Vec<String> = Cli::command()
            .get_subcommands()
            .map(|c| c.get_name().to_string())
            .collect();
        for expected in ["run", "plan", "init"] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert!(!names.iter().any(|n| n == "completions"));
    }

    #[test]
    fn test_run_requires_task() {
        assert!(Cli::try_parse_from(["gantry", "run"]).is_err());
    }
}
