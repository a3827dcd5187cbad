mod commands;
mod formatting;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;

use commands::GlobalOpts;

#[derive(Parser)]
#[command(name = "modforge")]
#[command(about = "Build, version, and stage a packaged module")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to <source-root>/modforge.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, default_value = ".")]
    source_root: PathBuf,

    /// Overrides output.dir from the configuration
    #[arg(long, global = true)]
    output_root: Option<PathBuf>,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, global = true, action)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task and everything it depends on
    Run {
        #[arg(default_value = modforge_core::DEFAULT_ROOT)]
        task: String,
    },
    /// List the declared tasks
    Tasks {
        #[arg(long, action)]
        json: bool,
    },
    /// Check the configuration and the files it points at
    Validate {
        #[arg(long, action)]
        json: bool,
    },
    /// Show manifest and spec versions and staged outputs
    Status {
        #[arg(long, action)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            formatting::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let opts = GlobalOpts {
        config: cli.config,
        source_root: cli.source_root,
        output_root: cli.output_root,
    };

    match cli.command {
        Commands::Run { task } => commands::cmd_run(&opts, &task),
        Commands::Tasks { json } => commands::cmd_tasks(json),
        Commands::Validate { json } => commands::cmd_validate(&opts, json),
        Commands::Status { json } => commands::cmd_status(&opts, json),
    }
}
