//! Trait for reporting build progress.

use std::path::Path;
use std::time::Duration;

use crate::version::{Version, VersionDecision};

/// Receives build events so the core library never writes to stdout/stderr.
///
/// Every method has an empty default, so implementors only override what
/// they display.
pub trait BuildReporter: Send + Sync {
    /// Called once before the first task runs with the full execution order.
    fn plan(&self, _root: &str, _order: &[String]) {}

    fn task_started(&self, _task: &str) {}

    fn task_finished(&self, _task: &str, _duration: Duration, _success: bool) {}

    /// Called for every planned task that did not run because an earlier one failed.
    fn task_skipped(&self, _task: &str) {}

    fn warning(&self, _message: &str) {}

    /// Reports the version decision against the previous publication.
    fn version_computed(&self, _previous: Version, _decision: &VersionDecision) {}

    /// Reports a passing gate with a one-line summary.
    fn gate_passed(&self, _gate: &str, _summary: &str) {}

    fn staged(&self, _dir: &Path, _files: usize) {}
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl BuildReporter for NullReporter {}
