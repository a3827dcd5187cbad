//! Sequential, fail-fast task execution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::graph::TaskGraph;
use crate::reporter::{BuildReporter, NullReporter};

/// Outcome of one executed task.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task_name: String,
    pub duration: Duration,
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub root: String,
    pub executed: Vec<TaskOutcome>,
    pub total_duration: Duration,
}

impl RunSummary {
    pub fn executed_names(&self) -> Vec<&str> {
        self.executed.iter().map(|o| o.task_name.as_str()).collect()
    }
}

/// Runs tasks of a [`TaskGraph`] one at a time.
///
/// Each body runs at most once per call to [`run`](Self::run). The first
/// failing body stops the run; no later task in the plan is invoked.
pub struct TaskExecutor<C> {
    graph: TaskGraph<C>,
    reporter: Arc<dyn BuildReporter>,
}

impl<C> TaskExecutor<C> {
    pub fn new(graph: TaskGraph<C>) -> Self {
        Self {
            graph,
            reporter: Arc::new(NullReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn BuildReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn graph(&self) -> &TaskGraph<C> {
        &self.graph
    }

    /// Executes `root` after all of its transitive prerequisites.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskNotFound`] before anything runs if `root` is
    /// unknown, and [`Error::TaskFailed`] wrapping the body's error if any task fails.
    pub fn run(&self, root: &str, ctx: &mut C) -> Result<RunSummary> {
        let order = self.graph.execution_order(root)?;
        self.reporter.plan(root, &order);
        debug!(root, order = ?order, "resolved execution order");

        let start = Instant::now();
        let mut executed = Vec::with_capacity(order.len());

        for (position, name) in order.iter().enumerate() {
            let task = self.graph.get(name).ok_or_else(|| Error::TaskNotFound {
                name: name.clone(),
                available: String::new(),
            })?;

            self.reporter.task_started(name);
            debug!(task = %name, "running task");
            let task_start = Instant::now();
            let result = task.run(ctx);
            let duration = task_start.elapsed();

            match result {
                Ok(()) => {
                    self.reporter.task_finished(name, duration, true);
                    executed.push(TaskOutcome {
                        task_name: name.clone(),
                        duration,
                    });
                }
                Err(e) => {
                    self.reporter.task_finished(name, duration, false);
                    error!(task = %name, error = %e, "task failed, aborting build");
                    for skipped in &order[position + 1..] {
                        self.reporter.task_skipped(skipped);
                    }
                    return Err(Error::TaskFailed {
                        task: name.clone(),
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(RunSummary {
            root: root.to_string(),
            executed,
            total_duration: start.elapsed(),
        })
    }
}
