//! The `run` command.

use std::sync::Arc;

use anyhow::Result;

use crate::formatting::{format_duration, print_section_header, print_summary_box, SectionStyle};

use super::reporter::CliReporter;
use super::{build_pipeline, load_context, GlobalOpts};

pub fn cmd_run(opts: &GlobalOpts, task: &str) -> Result<()> {
    let mut ctx = load_context(opts)?;
    let pipeline = build_pipeline(Arc::new(CliReporter::new()))?;

    let summary = match pipeline.run(task, &mut ctx) {
        Ok(summary) => summary,
        Err(e) => {
            println!();
            let title = match e.failed_task() {
                Some(failed) => format!("Build failed in task '{}'", failed),
                None => "Build failed".to_string(),
            };
            print_section_header(&title, SectionStyle::Error);
            return Err(e.into());
        }
    };

    println!();
    print_section_header("Build succeeded", SectionStyle::Success);

    let tasks = summary.executed.len().to_string();
    let duration = format_duration(summary.total_duration.as_secs_f64());
    let version = ctx
        .version()
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "-".to_string());
    let staged = ctx
        .staging_dir()
        .ok()
        .filter(|dir| dir.is_dir())
        .map(|dir| dir.display().to_string())
        .unwrap_or_else(|| "-".to_string());

    print_summary_box(
        "Build Summary",
        &[
            ("Task", task),
            ("Tasks run", &tasks),
            ("Version", &version),
            ("Staged", &staged),
            ("Duration", &duration),
        ],
    );
    println!();

    Ok(())
}
