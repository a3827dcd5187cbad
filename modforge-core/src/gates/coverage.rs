//! Code coverage gate.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::CoverageGateConfig;
use crate::error::{Error, Result};

use super::{collect_report, render_items, GateKind, ToolRunner};

/// An instrumentable unit that was never executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissedUnit {
    pub file: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Instrumentable units found.
    #[serde(default)]
    pub analyzed: u64,
    /// Units executed at least once.
    #[serde(default)]
    pub executed: u64,
    #[serde(default)]
    pub missed: Vec<MissedUnit>,
}

impl CoverageReport {
    pub fn percent(&self) -> f64 {
        coverage_percent(self.executed, self.analyzed)
    }
}

/// Percentage of executed units; 0.0 when nothing was instrumentable.
pub fn coverage_percent(executed: u64, analyzed: u64) -> f64 {
    if analyzed == 0 {
        return 0.0;
    }
    executed as f64 / analyzed as f64 * 100.0
}

pub struct CoverageGate<'a> {
    config: &'a CoverageGateConfig,
}

impl<'a> CoverageGate<'a> {
    pub fn new(config: &'a CoverageGateConfig) -> Self {
        Self { config }
    }

    pub fn collect(&self, runner: &dyn ToolRunner, cwd: &Path) -> Result<CoverageReport> {
        collect_report(
            runner,
            GateKind::Coverage.task_name(),
            &self.config.command,
            self.config.report.as_deref(),
            cwd,
        )
    }

    /// Checks the computed percentage against `min_percent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QualityGate`] listing missed units when coverage is too low.
    pub fn evaluate(&self, report: &CoverageReport) -> Result<String> {
        let percent = report.percent();
        if percent < self.config.min_percent {
            let items: Vec<String> = report
                .missed
                .iter()
                .map(|m| {
                    let location = match m.line {
                        Some(line) => format!("{}:{}", m.file, line),
                        None => m.file.clone(),
                    };
                    match &m.command {
                        Some(command) => format!("{} {}", location, command),
                        None => location,
                    }
                })
                .collect();
            return Err(Error::QualityGate {
                gate: GateKind::Coverage.task_name().to_string(),
                report: format!(
                    "coverage {:.2}% is below the required {:.2}% ({} of {} units executed)\n{}",
                    percent,
                    self.config.min_percent,
                    report.executed,
                    report.analyzed,
                    render_items(&items)
                ),
            });
        }

        Ok(format!(
            "{:.2}% ({} of {} units executed)",
            percent, report.executed, report.analyzed
        ))
    }
}
