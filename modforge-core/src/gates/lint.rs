//! Lint gate.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::LintGateConfig;
use crate::error::{Error, Result};

use super::{collect_report, render_items, GateKind, ToolRunner};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintFinding {
    pub rule: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<u64>,
}

fn default_severity() -> String {
    "warning".to_string()
}

impl LintFinding {
    fn location(&self) -> String {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => format!("{}:{}", file, line),
            (Some(file), None) => file.clone(),
            _ => "<unknown>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintReport {
    #[serde(default)]
    pub findings: Vec<LintFinding>,
}

pub struct LintGate<'a> {
    config: &'a LintGateConfig,
}

impl<'a> LintGate<'a> {
    pub fn new(config: &'a LintGateConfig) -> Self {
        Self { config }
    }

    /// Runs the lint tool in `cwd` and returns its report.
    pub fn collect(&self, runner: &dyn ToolRunner, cwd: &Path) -> Result<LintReport> {
        collect_report(
            runner,
            GateKind::Lint.task_name(),
            &self.config.command,
            self.config.report.as_deref(),
            cwd,
        )
    }

    /// Findings whose severity is listed in `fail_on`.
    pub fn counted<'r>(&self, report: &'r LintReport) -> Vec<&'r LintFinding> {
        report
            .findings
            .iter()
            .filter(|f| {
                self.config
                    .fail_on
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(&f.severity))
            })
            .collect()
    }

    /// Checks the report against `max_findings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QualityGate`] listing the counted findings when there are too many.
    pub fn evaluate(&self, report: &LintReport) -> Result<String> {
        let counted = self.counted(report);
        if counted.len() > self.config.max_findings {
            let items: Vec<String> = counted
                .iter()
                .map(|f| format!("{} [{}] {} {}", f.rule, f.severity, f.location(), f.message))
                .collect();
            return Err(Error::QualityGate {
                gate: GateKind::Lint.task_name().to_string(),
                report: format!(
                    "{} finding(s) with severity {} (allowed: {})\n{}",
                    counted.len(),
                    self.config.fail_on.join("/"),
                    self.config.max_findings,
                    render_items(&items)
                ),
            });
        }

        Ok(format!(
            "{} counted finding(s), {} total",
            counted.len(),
            report.findings.len()
        ))
    }
}
