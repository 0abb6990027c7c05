//! Plan command - print the resolved execution plan

use clap::Args;
use tracing::info;

use gantry_tasks::Resolver;

use super::workspace::WorkspaceContext;
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Show the execution plan for a task without running it
#[derive(Debug, Args)]
pub struct PlanCommand {
    /// Task to plan
    pub task: String,

    /// Project path relative to the workspace root (defaults to the current directory)
    #[arg(short, long)]
    pub project: Option<String>,
}

impl PlanCommand {
    /// Execute the plan command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        info!(task = %self.task, project = ?self.project, "executing plan command");
        let cwd = std::env::current_dir()?;
        let ctx = WorkspaceContext::load(&cwd, self.project.as_deref())?;
        let plan = Resolver::new(&ctx.config).resolve(&ctx.project, &self.task)?;

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", output::header("Execution plan"));
                    println!(
                        "{}",
                        output::key_value(
                            "workspace",
                            &output::path_style()
                                .apply_to(ctx.root.display())
                                .to_string()
                        )
                    );
                    if let Some(path) = &ctx.config_path {
                        println!(
                            "{}",
                            output::key_value(
                                "config",
                                &output::path_style().apply_to(path.display()).to_string()
                            )
                        );
                    } else {
                        output::warning("No configuration file found, using defaults");
                    }
                    let project = if ctx.project_configured {
                        ctx.project.clone()
                    } else {
                        format!("{} (not configured)", ctx.project)
                    };
                    println!("{}", output::key_value("project", &project));
                    println!("{}", output::key_value("mode", &plan.mode().to_string()));
                    println!();
                }
                println!("{}", plan.describe());
            }
        }

        Ok(exit_codes::SUCCESS)
    }
}
