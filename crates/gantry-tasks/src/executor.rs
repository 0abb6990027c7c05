//! Plan execution with background tasks, delays and fail-fast cancellation
//!
//! Entries are started strictly in plan order. A blocking entry sleeps for its
//! delay, runs, and is waited on. A background entry is spawned, then its
//! delay gates the next entry. The first failure of a required task, blocking
//! or background, halts the walk: background work still in flight is
//! terminated and entries not yet started are skipped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, instrument, warn};

use crate::reporter::{TaskEvent, TaskReporter};
use crate::runner::{TaskResult, TaskRunner};
use crate::task::{ExecutionPlan, TaskExecution, TaskId};

/// Lifecycle of a background task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundStatus {
    Starting,
    Running,
    Completed,
    Failed,
    Terminated,
}

impl BackgroundStatus {
    /// Still in flight
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

/// Tracks one dispatched background task
#[derive(Debug)]
pub struct BackgroundProcess {
    /// The task being run
    pub task: TaskExecution,
    /// When it was dispatched
    pub started_at: DateTime<Utc>,
    /// Current status
    pub status: BackgroundStatus,
    started: Instant,
    abort: AbortHandle,
}

/// Aggregate outcome of executing a plan
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    /// Number of plan entries
    pub total_tasks: usize,
    /// Results that succeeded
    pub successful_tasks: usize,
    /// Results that failed, including terminated background tasks
    pub failed_tasks: usize,
    /// Entries never started because the plan halted
    pub skipped_tasks: usize,
    /// One result per started entry, in plan order
    pub results: Vec<TaskResult>,
    /// Entries never started
    pub skipped: Vec<TaskId>,
    /// Background tasks terminated after a required failure
    pub terminated: Vec<TaskId>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionSummary {
    /// True when no task failed
    pub fn is_success(&self) -> bool {
        self.failed_tasks == 0
    }

    /// Result for a task, if it was started
    pub fn result(&self, id: &TaskId) -> Option<&TaskResult> {
        self.results.iter().find(|r| r.id() == id)
    }

    /// Failed results in plan order
    pub fn failures(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

/// Completion message sent by a background task: (plan index, result)
type Completion = (usize, TaskResult);

/// State owned by a single `execute` call
struct Run {
    verbose: bool,
    halted: bool,
    results: Vec<(usize, TaskResult)>,
    background: HashMap<usize, BackgroundProcess>,
    terminated: Vec<TaskId>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Run {
    fn new(verbose: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            verbose,
            halted: false,
            results: Vec::new(),
            background: HashMap::new(),
            terminated: Vec::new(),
            tx,
            rx,
        }
    }

    fn has_active_background(&self) -> bool {
        self.background.values().any(|p| p.status.is_active())
    }

    fn trace(&self, message: std::fmt::Arguments<'_>) {
        if self.verbose {
            info!("{}", message);
        } else {
            debug!("{}", message);
        }
    }
}

/// Walks an execution plan
pub struct Executor {
    runner: Arc<TaskRunner>,
    reporter: Arc<dyn TaskReporter>,
}

impl Executor {
    /// Create a new executor
    pub fn new(runner: Arc<TaskRunner>, reporter: Arc<dyn TaskReporter>) -> Self {
        Self { runner, reporter }
    }

    /// Execute every entry of `plan` in order.
    ///
    /// Task failures never surface as errors; they are reflected in the
    /// returned summary. `verbose` adds a trace of delays and background state.
    #[instrument(skip_all, fields(tasks = plan.len(), verbose = verbose))]
    pub async fn execute(&self, plan: &ExecutionPlan, verbose: bool) -> ExecutionSummary {
        let start = Instant::now();
        let mut run = Run::new(verbose);
        let mut dispatched = 0;

        for (index, task) in plan.iter().enumerate() {
            self.drain_completions(&mut run);
            if run.halted {
                break;
            }

            if task.background {
                self.dispatch_background(index, task, &mut run);
                dispatched += 1;
                self.pause(task, &mut run).await;
            } else {
                self.pause(task, &mut run).await;
                if run.halted {
                    break;
                }
                dispatched += 1;
                run.trace(format_args!("{} started", task.id));
                self.reporter.report(&TaskEvent::Started {
                    id: task.id.clone(),
                    background: false,
                });
                let result = self.run_blocking(task, &mut run).await;
                self.record(index, result, &mut run);
            }
        }

        self.join_background(&mut run).await;

        let skipped: Vec<TaskId> = plan.entries()[dispatched..]
            .iter()
            .map(|t| t.id.clone())
            .collect();
        for id in &skipped {
            self.reporter.report(&TaskEvent::Skipped {
                id: id.clone(),
                reason: "a required task failed".to_string(),
            });
        }

        run.results.sort_by_key(|(index, _)| *index);
        let results: Vec<TaskResult> = run.results.into_iter().map(|(_, r)| r).collect();
        let successful_tasks = results.iter().filter(|r| r.success).count();
        let failed_tasks = results.len() - successful_tasks;
        let duration = start.elapsed();

        self.reporter.report(&TaskEvent::AllCompleted {
            total: plan.len(),
            succeeded: successful_tasks,
            failed: failed_tasks,
            skipped: skipped.len(),
            duration,
        });

        info!(
            total = plan.len(),
            succeeded = successful_tasks,
            failed = failed_tasks,
            skipped = skipped.len(),
            "plan execution finished"
        );

        ExecutionSummary {
            total_tasks: plan.len(),
            successful_tasks,
            failed_tasks,
            skipped_tasks: skipped.len(),
            results,
            skipped,
            terminated: run.terminated,
            duration_ms: duration.as_millis() as u64,
        }
    }

    fn dispatch_background(&self, index: usize, task: &TaskExecution, run: &mut Run) {
        run.trace(format_args!("{} started in background", task.id));
        self.reporter.report(&TaskEvent::Started {
            id: task.id.clone(),
            background: true,
        });

        let runner = self.runner.clone();
        let owned = task.clone();
        let handle = tokio::spawn(async move { runner.run_one(&owned).await });
        let abort = handle.abort_handle();

        // Forward the result, or the abort/panic, to the orchestrator
        let tx = run.tx.clone();
        let fallback = task.clone();
        tokio::spawn(async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => TaskResult::failure(
                    fallback,
                    format!("Background task ended: {}", e),
                    Duration::ZERO,
                ),
            };
            let _ = tx.send((index, result));
        });

        run.background.insert(
            index,
            BackgroundProcess {
                task: task.clone(),
                started_at: Utc::now(),
                status: BackgroundStatus::Starting,
                started: Instant::now(),
                abort,
            },
        );
        if let Some(process) = run.background.get_mut(&index) {
            process.status = BackgroundStatus::Running;
        }
    }

    /// Sleep for the entry's delay, reacting to background completions meanwhile.
    /// Returns early once the run halts.
    async fn pause(&self, task: &TaskExecution, run: &mut Run) {
        let delay = task.delay();
        if delay.is_zero() {
            return;
        }
        run.trace(format_args!(
            "{} delay {}ms ({})",
            task.id,
            task.delay_ms,
            if task.background { "after start" } else { "before start" }
        ));

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return,
                Some((index, result)) = run.rx.recv() => {
                    self.complete_background(index, result, run);
                    if run.halted {
                        return;
                    }
                }
            }
        }
    }

    /// Run a blocking entry to completion, handling background completions
    /// that arrive meanwhile. A required background failure halts the run and
    /// cancels other background work, but the blocking task is let finish.
    async fn run_blocking(&self, task: &TaskExecution, run: &mut Run) -> TaskResult {
        let running = self.runner.run_one(task);
        tokio::pin!(running);
        loop {
            tokio::select! {
                biased;
                Some((index, result)) = run.rx.recv() => {
                    self.complete_background(index, result, run);
                }
                result = &mut running => return result,
            }
        }
    }

    fn drain_completions(&self, run: &mut Run) {
        while let Ok((index, result)) = run.rx.try_recv() {
            self.complete_background(index, result, run);
        }
    }

    async fn join_background(&self, run: &mut Run) {
        if run.has_active_background() {
            run.trace(format_args!(
                "waiting for {} background task(s)",
                run.background.values().filter(|p| p.status.is_active()).count()
            ));
        }
        while run.has_active_background() {
            match run.rx.recv().await {
                Some((index, result)) => self.complete_background(index, result, run),
                None => break,
            }
        }

        if run.verbose {
            for process in run.background.values() {
                info!(
                    id = %process.task.id,
                    status = ?process.status,
                    started_at = %process.started_at,
                    "background task settled"
                );
            }
        }
    }

    fn complete_background(&self, index: usize, result: TaskResult, run: &mut Run) {
        let Some(process) = run.background.get_mut(&index) else {
            warn!(id = %result.id(), "completion for unknown background task");
            return;
        };
        if !process.status.is_active() {
            debug!(id = %result.id(), status = ?process.status, "ignoring late completion");
            return;
        }
        process.status = if result.success {
            BackgroundStatus::Completed
        } else {
            BackgroundStatus::Failed
        };
        self.record(index, result, run);
    }

    fn record(&self, index: usize, result: TaskResult, run: &mut Run) {
        let id = result.id().clone();
        let required = result.task.required;
        let failed = !result.success;

        if failed {
            self.reporter.report(&TaskEvent::Failed {
                id: id.clone(),
                duration: result.duration(),
                exit_code: result.exit_code,
                error: result.stderr.trim().to_string(),
            });
        } else {
            self.reporter.report(&TaskEvent::Completed {
                id: id.clone(),
                duration: result.duration(),
            });
        }
        run.trace(format_args!(
            "{} finished (success: {}, exit code {})",
            id, result.success, result.exit_code
        ));
        run.results.push((index, result));

        if failed && required && !run.halted {
            self.halt(&id, run);
        } else if failed {
            debug!(%id, "optional task failed, continuing");
        }
    }

    /// Stop dispatching and terminate background work still in flight
    fn halt(&self, cause: &TaskId, run: &mut Run) {
        warn!(id = %cause, "required task failed, halting execution");
        run.halted = true;

        // Settle background tasks that already reported before terminating the rest
        self.drain_completions(run);

        let process_runner = self.runner.process();
        let mut active: Vec<usize> = run
            .background
            .iter()
            .filter(|(_, p)| p.status.is_active())
            .map(|(index, _)| *index)
            .collect();
        active.sort_unstable();

        for index in active {
            let Some(process) = run.background.get_mut(&index) else {
                continue;
            };
            let key = process.task.id.to_string();
            if !process_runner.terminate(&key) {
                debug!(id = %key, "process runner could not terminate task");
            }
            process.abort.abort();
            process.status = BackgroundStatus::Terminated;

            let id = process.task.id.clone();
            let result = TaskResult::failure(
                process.task.clone(),
                format!("Terminated after required task {} failed", cause),
                process.started.elapsed(),
            );
            self.reporter.report(&TaskEvent::Terminated { id: id.clone() });
            run.results.push((index, result));
            run.terminated.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::process::{ProcessOptions, ProcessOutcome, ProcessRunner};
    use crate::reporter::CollectingReporter;
    use crate::task::ResolutionMode;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    struct Script {
        duration: Duration,
        success: bool,
    }

    /// Scripted process runner keyed by task id
    #[derive(Default)]
    struct FakeProcess {
        scripts: HashMap<String, Script>,
        started: Mutex<Vec<(String, tokio::time::Instant)>>,
        terminated: Mutex<Vec<String>>,
    }

    impl FakeProcess {
        fn script(mut self, id: &str, millis: u64, success: bool) -> Self {
            self.scripts.insert(
                id.to_string(),
                Script {
                    duration: Duration::from_millis(millis),
                    success,
                },
            );
            self
        }

        fn started_ids(&self) -> Vec<String> {
            self.started
                .lock()
                .unwrap()
                .iter()
                .map(|(id, _)| id.clone())
                .collect()
        }

        fn started_at(&self, id: &str) -> tokio::time::Instant {
            self.started
                .lock()
                .unwrap()
                .iter()
                .find(|(started, _)| started == id)
                .map(|(_, at)| *at)
                .unwrap()
        }
    }

    #[async_trait]
    impl ProcessRunner for FakeProcess {
        async fn run(
            &self,
            _command: &str,
            _args: &[String],
            options: &ProcessOptions,
        ) -> Result<ProcessOutcome, ProcessError> {
            let id = options.id.clone().unwrap_or_default();
            self.started
                .lock()
                .unwrap()
                .push((id.clone(), tokio::time::Instant::now()));
            let script = self.scripts.get(&id).copied().unwrap_or(Script {
                duration: Duration::ZERO,
                success: true,
            });
            tokio::time::sleep(script.duration).await;
            Ok(ProcessOutcome {
                success: script.success,
                exit_code: if script.success { 0 } else { 1 },
                stdout: String::new(),
                stderr: if script.success {
                    String::new()
                } else {
                    format!("{} failed", id)
                },
                duration: script.duration,
            })
        }

        fn terminate(&self, id: &str) -> bool {
            self.terminated.lock().unwrap().push(id.to_string());
            true
        }
    }

    fn executor(process: &Arc<FakeProcess>) -> (Executor, Arc<CollectingReporter>) {
        let reporter = Arc::new(CollectingReporter::default());
        let runner = Arc::new(TaskRunner::new("/repo", process.clone()));
        (Executor::new(runner, reporter.clone()), reporter)
    }

    fn plan(entries: Vec<TaskExecution>) -> ExecutionPlan {
        ExecutionPlan::new(ResolutionMode::NonRecursive, entries)
    }

    fn task(project: &str) -> TaskExecution {
        TaskExecution::new(project, "test")
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_succeed() {
        let process = Arc::new(FakeProcess::default());
        let (executor, reporter) = executor(&process);

        let summary = executor
            .execute(&plan(vec![task("b"), task("c"), task("a")]), false)
            .await;

        assert_eq!(summary.total_tasks, 3);
        assert_eq!(summary.successful_tasks, 3);
        assert_eq!(summary.failed_tasks, 0);
        assert_eq!(summary.skipped_tasks, 0);
        assert!(summary.is_success());
        assert_eq!(process.started_ids(), vec!["b:test", "c:test", "a:test"]);
        assert!(matches!(
            reporter.events().last(),
            Some(TaskEvent::AllCompleted { total: 3, succeeded: 3, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_required_failure_skips_rest() {
        let process = Arc::new(FakeProcess::default().script("x:test", 10, false));
        let (executor, reporter) = executor(&process);

        let summary = executor
            .execute(&plan(vec![task("x"), task("y")]), false)
            .await;

        assert_eq!(summary.successful_tasks, 0);
        assert_eq!(summary.failed_tasks, 1);
        assert_eq!(summary.skipped_tasks, 1);
        assert_eq!(summary.skipped, vec![TaskId::new("y", "test")]);
        assert_eq!(process.started_ids(), vec!["x:test"]);
        assert!(summary.result(&TaskId::new("y", "test")).is_none());
        assert!(reporter.events().contains(&TaskEvent::Skipped {
            id: TaskId::new("y", "test"),
            reason: "a required task failed".to_string(),
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_optional_failure_continues() {
        let process = Arc::new(FakeProcess::default().script("x:test", 10, false));
        let (executor, _) = executor(&process);

        let summary = executor
            .execute(&plan(vec![task("x").with_required(false), task("y")]), true)
            .await;

        assert_eq!(summary.failed_tasks, 1);
        assert_eq!(summary.successful_tasks, 1);
        assert_eq!(summary.skipped_tasks, 0);
        assert_eq!(process.started_ids(), vec!["x:test", "y:test"]);
        assert_eq!(summary.failures().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_required_failure_halts_and_terminates() {
        let process = Arc::new(
            FakeProcess::default()
                .script("b:test", 100, false)
                .script("c:test", 10_000, true),
        );
        let (executor, reporter) = executor(&process);

        let summary = executor
            .execute(
                &plan(vec![
                    task("a"),
                    task("b").with_background(true),
                    task("c").with_background(true),
                    task("d").with_delay(1_000),
                ]),
                false,
            )
            .await;

        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.successful_tasks, 1);
        assert_eq!(summary.failed_tasks, 2);
        assert_eq!(summary.skipped_tasks, 1);
        assert_eq!(summary.skipped, vec![TaskId::new("d", "test")]);
        assert_eq!(summary.terminated, vec![TaskId::new("c", "test")]);
        assert_eq!(*process.terminated.lock().unwrap(), vec!["c:test".to_string()]);
        assert!(!process.started_ids().contains(&"d:test".to_string()));
        assert!(reporter.events().contains(&TaskEvent::Terminated {
            id: TaskId::new("c", "test"),
        }));

        let ids: Vec<String> = summary.results.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["a:test", "b:test", "c:test"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_optional_failure_does_not_halt() {
        let process = Arc::new(FakeProcess::default().script("b:test", 50, false));
        let (executor, _) = executor(&process);

        let summary = executor
            .execute(
                &plan(vec![
                    task("b").with_background(true).with_required(false),
                    task("c").with_delay(200),
                ]),
                false,
            )
            .await;

        assert_eq!(summary.failed_tasks, 1);
        assert_eq!(summary.successful_tasks, 1);
        assert_eq!(summary.skipped_tasks, 0);
        assert!(summary.terminated.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_failure_during_final_join_terminates_others() {
        let process = Arc::new(
            FakeProcess::default()
                .script("x:test", 100, false)
                .script("y:test", 10_000, true),
        );
        let (executor, _) = executor(&process);

        let summary = executor
            .execute(
                &plan(vec![
                    task("x").with_background(true),
                    task("y").with_background(true),
                ]),
                false,
            )
            .await;

        assert_eq!(summary.failed_tasks, 2);
        assert_eq!(summary.skipped_tasks, 0);
        assert_eq!(summary.terminated, vec![TaskId::new("y", "test")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_finished_during_blocking_run_keeps_its_result() {
        let process = Arc::new(
            FakeProcess::default()
                .script("a:test", 10, true)
                .script("b:test", 1_000, false),
        );
        let (executor, _) = executor(&process);

        let summary = executor
            .execute(&plan(vec![task("a").with_background(true), task("b")]), false)
            .await;

        assert_eq!(summary.successful_tasks, 1);
        assert_eq!(summary.failed_tasks, 1);
        assert_eq!(summary.skipped_tasks, 0);
        assert!(summary.terminated.is_empty());
        assert!(process.terminated.lock().unwrap().is_empty());
        let a = summary.result(&TaskId::new("a", "test")).unwrap();
        assert!(a.success);
        assert_eq!(a.duration_ms, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_failure_during_blocking_run_keeps_exit_code() {
        let process = Arc::new(
            FakeProcess::default()
                .script("y:test", 50, false)
                .script("b:test", 100, false),
        );
        let (executor, _) = executor(&process);

        let summary = executor
            .execute(
                &plan(vec![
                    task("y").with_background(true).with_required(false),
                    task("b"),
                ]),
                false,
            )
            .await;

        assert_eq!(summary.failed_tasks, 2);
        assert!(summary.terminated.is_empty());
        let y = summary.result(&TaskId::new("y", "test")).unwrap();
        assert_eq!(y.exit_code, 1);
        assert_eq!(y.stderr, "y:test failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_required_background_failure_during_blocking_run_cancels_others() {
        let process = Arc::new(
            FakeProcess::default()
                .script("a:test", 100, false)
                .script("c:test", 10_000, true)
                .script("b:test", 1_000, true),
        );
        let (executor, reporter) = executor(&process);

        let summary = executor
            .execute(
                &plan(vec![
                    task("a").with_background(true),
                    task("c").with_background(true),
                    task("b"),
                    task("d"),
                ]),
                false,
            )
            .await;

        assert_eq!(summary.successful_tasks, 1);
        assert_eq!(summary.failed_tasks, 2);
        assert_eq!(summary.skipped, vec![TaskId::new("d", "test")]);
        assert_eq!(summary.terminated, vec![TaskId::new("c", "test")]);
        assert!(summary.result(&TaskId::new("b", "test")).unwrap().success);
        assert!(!process.started_ids().contains(&"d:test".to_string()));

        // c is cancelled while b is still running, not after it
        let events = reporter.events();
        let terminated = events
            .iter()
            .position(|e| {
                *e == TaskEvent::Terminated {
                    id: TaskId::new("c", "test"),
                }
            })
            .unwrap();
        let b_done = events
            .iter()
            .position(|e| matches!(e, TaskEvent::Completed { id, .. } if id.project == "b"))
            .unwrap();
        assert!(terminated < b_done);
    }

    #[tokio::test]
    async fn test_halt_settles_reported_completions_first() {
        let process = Arc::new(FakeProcess::default());
        let (executor, _) = executor(&process);
        let mut run = Run::new(false);
        let background = task("a").with_background(true);
        run.background.insert(
            0,
            BackgroundProcess {
                task: background.clone(),
                started_at: Utc::now(),
                status: BackgroundStatus::Running,
                started: Instant::now(),
                abort: tokio::spawn(async {}).abort_handle(),
            },
        );
        run.tx
            .send((
                0,
                TaskResult {
                    task: background,
                    success: true,
                    exit_code: 0,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration_ms: 10,
                },
            ))
            .unwrap();

        executor.halt(&TaskId::new("b", "test"), &mut run);

        assert!(run.halted);
        assert!(run.terminated.is_empty());
        assert!(process.terminated.lock().unwrap().is_empty());
        assert_eq!(run.background[&0].status, BackgroundStatus::Completed);
        assert!(run.results[0].1.success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_delay_applies_before_start() {
        let process = Arc::new(FakeProcess::default());
        let (executor, _) = executor(&process);
        let begin = tokio::time::Instant::now();

        executor
            .execute(&plan(vec![task("a").with_delay(300)]), false)
            .await;

        assert!(process.started_at("a:test") - begin >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_delay_gates_next_entry() {
        let process = Arc::new(FakeProcess::default().script("api:test", 5_000, true));
        let (executor, _) = executor(&process);

        let summary = executor
            .execute(
                &plan(vec![
                    task("api").with_background(true).with_delay(500),
                    task("web"),
                ]),
                false,
            )
            .await;

        let api = process.started_at("api:test");
        let web = process.started_at("web:test");
        assert!(web - api >= Duration::from_millis(500));
        assert!(web - api < Duration::from_millis(5_000));
        assert_eq!(summary.successful_tasks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trailing_background_is_joined() {
        let process = Arc::new(FakeProcess::default().script("b:test", 2_000, true));
        let (executor, _) = executor(&process);

        let summary = executor
            .execute(&plan(vec![task("a"), task("b").with_background(true)]), false)
            .await;

        assert_eq!(summary.successful_tasks, 2);
        let b = summary.result(&TaskId::new("b", "test")).unwrap();
        assert!(b.success);
        assert_eq!(b.duration_ms, 2_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_plan_order() {
        let process = Arc::new(FakeProcess::default().script("slow:test", 1_000, true));
        let (executor, _) = executor(&process);

        let summary = executor
            .execute(
                &plan(vec![task("slow").with_background(true), task("fast")]),
                false,
            )
            .await;

        let ids: Vec<String> = summary.results.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec!["slow:test", "fast:test"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_plan() {
        let process = Arc::new(FakeProcess::default());
        let (executor, _) = executor(&process);

        let summary = executor.execute(&plan(vec![]), false).await;

        assert_eq!(summary.total_tasks, 0);
        assert!(summary.results.is_empty());
        assert!(summary.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_serializes() {
        let process = Arc::new(FakeProcess::default());
        let (executor, _) = executor(&process);

        let summary = executor.execute(&plan(vec![task("a")]), false).await;
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["total_tasks"], 1);
        assert_eq!(json["results"][0]["task"]["id"]["project"], "a");
    }

    #[test]
    fn test_background_status_is_active() {
        assert!(BackgroundStatus::Starting.is_active());
        assert!(BackgroundStatus::Running.is_active());
        assert!(!BackgroundStatus::Completed.is_active());
        assert!(!BackgroundStatus::Failed.is_active());
        assert!(!BackgroundStatus::Terminated.is_active());
    }
}
