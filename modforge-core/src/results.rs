//! CI result files.
//!
//! In CI runs every gate leaves an XML record in the results directory named
//! `<Kind>Results_<runtimeMajor>_<YYYYMMDD-HHMMSS>.xml`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::gates::{CoverageReport, GateKind, LintReport, TestReport};

pub struct ResultsWriter {
    dir: PathBuf,
    runtime_major: u64,
    timestamp: DateTime<Local>,
}

impl ResultsWriter {
    pub fn new(dir: impl Into<PathBuf>, runtime_major: u64) -> Self {
        Self::at(dir, runtime_major, Local::now())
    }

    /// Creates a writer with a fixed timestamp.
    pub fn at(dir: impl Into<PathBuf>, runtime_major: u64, timestamp: DateTime<Local>) -> Self {
        Self {
            dir: dir.into(),
            runtime_major,
            timestamp,
        }
    }

    pub fn file_name(&self, kind: GateKind) -> String {
        format!(
            "{}Results_{}_{}.xml",
            kind.results_kind(),
            self.runtime_major,
            self.timestamp.format("%Y%m%d-%H%M%S")
        )
    }

    pub fn write_lint(&self, report: &LintReport) -> Result<PathBuf> {
        let mut body = String::new();
        for f in &report.findings {
            let _ = writeln!(
                body,
                "  <finding rule=\"{}\" severity=\"{}\" file=\"{}\" line=\"{}\">{}</finding>",
                escape(&f.rule),
                escape(&f.severity),
                escape(f.file.as_deref().unwrap_or_default()),
                f.line.unwrap_or_default(),
                escape(&f.message)
            );
        }
        let xml = format!(
            "<lintResults findings=\"{}\">\n{}</lintResults>\n",
            report.findings.len(),
            body
        );
        self.write(GateKind::Lint, &xml)
    }

    pub fn write_test(&self, report: &TestReport) -> Result<PathBuf> {
        let mut body = String::new();
        for f in &report.failures {
            let _ = writeln!(
                body,
                "  <testcase name=\"{}\">\n    <failure message=\"{}\"/>\n  </testcase>",
                escape(&f.name),
                escape(&f.message)
            );
        }
        let xml = format!(
            "<testsuite tests=\"{}\" failures=\"{}\" skipped=\"{}\">\n{}</testsuite>\n",
            report.total(),
            report.failed,
            report.skipped,
            body
        );
        self.write(GateKind::Test, &xml)
    }

    pub fn write_coverage(&self, report: &CoverageReport) -> Result<PathBuf> {
        let mut body = String::new();
        for m in &report.missed {
            let _ = writeln!(
                body,
                "  <missed file=\"{}\" line=\"{}\">{}</missed>",
                escape(&m.file),
                m.line.unwrap_or_default(),
                escape(m.command.as_deref().unwrap_or_default())
            );
        }
        let xml = format!(
            "<coverage analyzed=\"{}\" executed=\"{}\" percent=\"{:.2}\">\n{}</coverage>\n",
            report.analyzed,
            report.executed,
            report.percent(),
            body
        );
        self.write(GateKind::Coverage, &xml)
    }

    fn write(&self, kind: GateKind, xml: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(self.file_name(kind));
        fs::write(&path, format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n{}", xml))?;
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_pattern() {
        let timestamp = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        let writer = ResultsWriter::at("out/results", 7, timestamp);
        assert_eq!(writer.file_name(GateKind::Test), "TestResults_7_20260307-090501.xml");
        assert_eq!(writer.file_name(GateKind::Lint), "LintResults_7_20260307-090501.xml");
        assert_eq!(
            writer.file_name(GateKind::Coverage),
            "CoverageResults_7_20260307-090501.xml"
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"a<b & "c">"#), "a&lt;b &amp; &quot;c&quot;&gt;");
    }
}
