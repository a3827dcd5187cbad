//! Build reporter for the terminal.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::ProgressBar;
use modforge_core::reporter::BuildReporter;
use modforge_core::version::{Version, VersionDecision};
use owo_colors::OwoColorize;

use crate::formatting::{create_progress_bar, format_duration, print_key_value, print_section_header, print_warning, SectionStyle, Status};

/// Prints build events above a progress bar.
#[derive(Default)]
pub struct CliReporter {
    progress: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `print` with the progress bar suspended, so lines are not
    /// overdrawn.
    fn emit<F: FnOnce()>(&self, print: F) {
        match self.progress.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(pb) => pb.suspend(print),
                None => print(),
            },
            Err(_) => print(),
        }
    }

    fn finish_progress(&self) {
        if let Ok(mut guard) = self.progress.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl BuildReporter for CliReporter {
    fn plan(&self, root: &str, order: &[String]) {
        print_section_header(&format!("Running '{}'", root), SectionStyle::Primary);
        print_key_value("Plan", &order.join(" → "));
        println!();

        if let Ok(mut guard) = self.progress.lock() {
            *guard = Some(create_progress_bar(order.len() as u64));
        }
    }

    fn task_started(&self, task: &str) {
        if let Ok(guard) = self.progress.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(task.to_string());
            }
        }
    }

    fn task_finished(&self, task: &str, duration: Duration, success: bool) {
        let status = if success { Status::Success } else { Status::Error };
        let elapsed = format_duration(duration.as_secs_f64());
        self.emit(|| {
            println!(
                "  {} {} {}",
                status.colored_symbol(),
                task.bold(),
                format!("({})", elapsed).bright_black()
            )
        });

        let complete = match self.progress.lock() {
            Ok(guard) => guard.as_ref().map_or(false, |pb| {
                pb.inc(1);
                pb.position() >= pb.length().unwrap_or(0)
            }),
            Err(_) => false,
        };
        if complete || !success {
            self.finish_progress();
        }
    }

    fn task_skipped(&self, task: &str) {
        println!("  {}", Status::Skipped.format(&format!("{} (skipped)", task)));
    }

    fn warning(&self, message: &str) {
        self.emit(|| print_warning(message));
    }

    fn version_computed(&self, previous: Version, decision: &VersionDecision) {
        self.emit(|| {
            println!(
                "    {} {} → {} {}",
                "version".bright_black().bold(),
                previous,
                decision.version.to_string().cyan().bold(),
                format!("({})", decision.bump.as_str()).bright_black()
            )
        });
    }

    fn gate_passed(&self, gate: &str, summary: &str) {
        self.emit(|| {
            println!(
                "    {} {}",
                format!("{}:", gate).bright_black().bold(),
                summary
            )
        });
    }

    fn staged(&self, dir: &Path, files: usize) {
        self.emit(|| {
            println!(
                "    {} {} file(s) → {}",
                "staged".bright_black().bold(),
                files,
                dir.display()
            )
        });
    }
}
