//! Run command - resolve a task's dependencies and execute them

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use tracing::info;

use gantry_tasks::{
    ExecutionSummary, Executor, Resolver, TaskEvent, TaskReporter, TaskReporterRegistry,
    TaskRunner, TokioProcessRunner,
};

use super::workspace::WorkspaceContext;
use crate::cli::output::{self, plural};
use crate::cli::{Cli, OutputFormat};
use crate::exit_codes;

/// Lines of stderr shown per failed task
const STDERR_TAIL_LINES: usize = 10;

/// Run a task and its dependencies
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Task to run (e.g., build, test, dev)
    pub task: String,

    /// Project path relative to the workspace root (defaults to the current directory)
    #[arg(short, long)]
    pub project: Option<String>,

    /// Log every start, completion and delay
    #[arg(long)]
    pub debug: bool,

    /// Show execution plan without running
    #[arg(long)]
    pub dry_run: bool,

    /// Per-task timeout in seconds (overrides runner.timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl RunCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<i32> {
        info!(
            task = %self.task,
            project = ?self.project,
            dry_run = self.dry_run,
            "executing run command"
        );
        let cwd = std::env::current_dir()?;
        let ctx = WorkspaceContext::load(&cwd, self.project.as_deref())?;
        let plan = Resolver::new(&ctx.config).resolve(&ctx.project, &self.task)?;

        if !cli.quiet && cli.format == OutputFormat::Text {
            println!();
            output::info(&format!(
                "{} task{} for {} ({})",
                plan.len(),
                plural(plan.len()),
                output::task_style().apply_to(format!("{}:{}", ctx.project, self.task)),
                plan.mode()
            ));

            if cli.verbose || self.dry_run {
                println!();
                println!("{}", plan.describe());
            }

            if self.dry_run {
                println!(
                    "{}",
                    style("[DRY RUN - no tasks will be executed]").yellow().bold()
                );
            }

            println!();
        }

        if self.dry_run {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            }
            return Ok(exit_codes::SUCCESS);
        }

        let mut runner = TaskRunner::from_config(
            &ctx.root,
            &ctx.config.runner,
            Arc::new(TokioProcessRunner::new()),
        );
        if let Some(secs) = self.timeout {
            runner = runner.with_timeout(Duration::from_secs(secs));
        }

        let mut reporters = TaskReporterRegistry::new();
        if !cli.quiet && cli.format == OutputFormat::Text {
            reporters.register(ConsoleReporter::new(cli.verbose));
        }

        let executor = Executor::new(Arc::new(runner), Arc::new(reporters));
        let summary = executor.execute(&plan, self.debug).await;

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            OutputFormat::Text if !cli.quiet => print_failures(&summary),
            OutputFormat::Text => {}
        }

        if summary.is_success() {
            Ok(exit_codes::SUCCESS)
        } else {
            Ok(exit_codes::ERROR)
        }
    }
}

fn print_failures(summary: &ExecutionSummary) {
    let failures: Vec<_> = summary.failures().collect();
    if failures.is_empty() {
        return;
    }

    println!();
    println!(
        "  {} {}/{} tasks failed:",
        style("✗").red().bold(),
        failures.len(),
        summary.total_tasks
    );
    for result in failures {
        println!(
            "    {} {} (exit code {})",
            style("✗").red(),
            result.id(),
            result.exit_code
        );
        for line in tail(&result.stderr, STDERR_TAIL_LINES) {
            println!("      {}", style(line).dim());
        }
    }
}

/// Last `n` non-empty lines of `text`
fn tail(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].to_vec()
}

/// Console reporter with live progress
struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TaskReporter for ConsoleReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { id, background } => {
                println!(
                    "  {} {} {}",
                    style("▸").dim(),
                    style(id).bold(),
                    if *background {
                        style("(background)").cyan().to_string()
                    } else {
                        String::new()
                    }
                );
            }
            TaskEvent::Completed { id, duration } => {
                println!(
                    "  {} {} {}",
                    style("✓").green(),
                    style(id).green(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim()
                );
            }
            TaskEvent::Failed {
                id,
                duration,
                exit_code,
                error,
            } => {
                let detail = if self.verbose {
                    error.trim().to_string()
                } else {
                    format!("exit code {}", exit_code)
                };
                println!(
                    "  {} {} {} {}",
                    style("✗").red(),
                    style(id).red(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim(),
                    style(detail).red().dim()
                );
            }
            TaskEvent::Skipped { id, reason } => {
                println!(
                    "  {} {} {}",
                    style("○").yellow(),
                    style(id).yellow(),
                    style(format!("({})", reason)).dim()
                );
            }
            TaskEvent::Terminated { id } => {
                println!(
                    "  {} {} {}",
                    style("■").red(),
                    style(id).red(),
                    style("(terminated)").dim()
                );
            }
            TaskEvent::AllCompleted {
                total,
                succeeded,
                failed,
                skipped,
                duration,
            } => {
                println!();
                println!(
                    "  {} {}/{} succeeded, {} failed, {} skipped ({:.1}s)",
                    if *failed == 0 {
                        style("✓").green().bold()
                    } else {
                        style("✗").red().bold()
                    },
                    succeeded,
                    total,
                    failed,
                    skipped,
                    duration.as_secs_f64()
                );
            }
        }
    }
}
