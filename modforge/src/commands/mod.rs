//! Command implementations for the CLI.

mod info;
mod reporter;
mod run;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use modforge_core::{BuildConfig, BuildContext, BuildReporter, Pipeline, Services, CONFIG_FILE_NAME};

pub use info::{cmd_status, cmd_tasks, cmd_validate};
pub use run::cmd_run;

/// Options shared by every subcommand.
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub source_root: PathBuf,
    pub output_root: Option<PathBuf>,
}

impl GlobalOpts {
    fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.source_root.join(CONFIG_FILE_NAME))
    }
}

fn load_context(opts: &GlobalOpts) -> Result<BuildContext> {
    let path = opts.config_path();
    let config = BuildConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let ctx = BuildContext::new(&opts.source_root, config);
    Ok(match &opts.output_root {
        Some(dir) => ctx.with_output_root(dir),
        None => ctx,
    })
}

fn build_pipeline(reporter: Arc<dyn BuildReporter>) -> Result<Pipeline> {
    let services = Services::new(modforge_formats::synchronizer()).with_reporter(reporter);
    Ok(Pipeline::new(services)?)
}
