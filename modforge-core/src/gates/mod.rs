//! Quality gates over external checking tools.
//!
//! A gate runs its configured command, reads a JSON report from a file or
//! from standard output, and turns a threshold violation into
//! [`Error::QualityGate`]. Problems with the tool itself (it could not be
//! started, or produced no readable report) are [`Error::ToolInvocation`].
//! A tool that exits non-zero but still writes a readable report is judged by
//! its report, since test runners commonly exit non-zero on failures.

pub mod coverage;
pub mod lint;

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::command_validator::CommandValidator;
use crate::error::{Error, Result};

pub use coverage::{coverage_percent, CoverageGate, CoverageReport, MissedUnit};
pub use lint::{LintFinding, LintGate, LintReport};
pub use test::{TestFailure, TestGate, TestReport};

/// Most offending items listed in a gate failure message.
pub const MAX_REPORTED_ITEMS: usize = 20;

/// The three gate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    Lint,
    Test,
    Coverage,
}

impl GateKind {
    /// Name of the task that runs this gate.
    pub fn task_name(&self) -> &'static str {
        match self {
            GateKind::Lint => "analyze",
            GateKind::Test => "test",
            GateKind::Coverage => "code-coverage",
        }
    }

    /// Prefix of the CI result file name.
    pub fn results_kind(&self) -> &'static str {
        match self {
            GateKind::Lint => "Lint",
            GateKind::Test => "Test",
            GateKind::Coverage => "Coverage",
        }
    }
}

/// Captured output of an external tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external tool commands.
pub trait ToolRunner: Send + Sync {
    /// Runs `command` for `gate` with `cwd` as working directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolInvocation`] if the command cannot be started.
    /// A command that runs and exits non-zero is not an error here.
    fn run(&self, gate: &str, command: &str, cwd: &Path) -> Result<ToolOutput>;
}

/// Runs commands through `sh -c`.
#[derive(Debug, Clone, Default)]
pub struct ShellToolRunner {
    validator: CommandValidator,
}

impl ShellToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(mut self, validator: CommandValidator) -> Self {
        self.validator = validator;
        self
    }
}

impl ToolRunner for ShellToolRunner {
    fn run(&self, gate: &str, command: &str, cwd: &Path) -> Result<ToolOutput> {
        self.validator.validate(gate, command)?;
        debug!(gate, command, cwd = %cwd.display(), "invoking tool");

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::ToolInvocation {
                gate: gate.to_string(),
                message: format!("Failed to execute '{}': {}", command, e),
            })?;

        Ok(ToolOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs a gate's tool and parses its JSON report.
///
/// When `report` is set, a stale report file is removed before the tool
/// runs and the fresh one is read afterwards; otherwise stdout is parsed.
pub(crate) fn collect_report<T: DeserializeOwned>(
    runner: &dyn ToolRunner,
    gate: &str,
    command: &str,
    report: Option<&Path>,
    cwd: &Path,
) -> Result<T> {
    let report_path = report.map(|p| cwd.join(p));
    if let Some(path) = &report_path {
        if path.exists() {
            fs::remove_file(path).map_err(|e| Error::ToolInvocation {
                gate: gate.to_string(),
                message: format!("Failed to remove stale report {}: {}", path.display(), e),
            })?;
        }
    }

    let output = runner.run(gate, command, cwd)?;

    let raw = match &report_path {
        Some(path) => fs::read_to_string(path).map_err(|e| Error::ToolInvocation {
            gate: gate.to_string(),
            message: format!(
                "Report {} not readable ({}); tool exited with {}: {}",
                path.display(),
                e,
                describe_exit(&output),
                output.stderr.trim()
            ),
        })?,
        None => output.stdout.clone(),
    };

    serde_json::from_str(raw.trim()).map_err(|e| Error::ToolInvocation {
        gate: gate.to_string(),
        message: format!(
            "Unparseable report ({}); tool exited with {}: {}",
            e,
            describe_exit(&output),
            output.stderr.trim()
        ),
    })
}

fn describe_exit(output: &ToolOutput) -> String {
    match output.exit_code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

/// Joins offending items, keeping at most [`MAX_REPORTED_ITEMS`].
pub(crate) fn render_items(items: &[String]) -> String {
    let mut lines: Vec<String> = items
        .iter()
        .take(MAX_REPORTED_ITEMS)
        .map(|item| format!("  - {}", item))
        .collect();
    if items.len() > MAX_REPORTED_ITEMS {
        lines.push(format!("  ... and {} more", items.len() - MAX_REPORTED_ITEMS));
    }
    lines.join("\n")
}
