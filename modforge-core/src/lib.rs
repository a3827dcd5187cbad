//! Core library for building, versioning, and staging a packaged module.

pub mod command_validator;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod executor;
pub mod gates;
pub mod graph;
pub mod manifest;
pub mod pipeline;
pub mod reporter;
pub mod results;
pub mod source;
pub mod stage;
pub mod surface;
pub mod task;
pub mod version;

pub use command_validator::CommandValidator;
pub use config::{BuildConfig, CONFIG_FILE_NAME};
pub use context::BuildContext;
pub use environment::{EnvironmentKind, EnvironmentProbe, EnvironmentReport, PreviousRelease};
pub use error::{Error, Result};
pub use executor::{RunSummary, TaskExecutor, TaskOutcome};
pub use gates::{GateKind, ShellToolRunner, ToolOutput, ToolRunner};
pub use graph::TaskGraph;
pub use manifest::{ManifestRecord, ManifestSynchronizer, ManifestUpdate, MetadataAdapter, SyncTargets};
pub use pipeline::{Pipeline, Services, DEFAULT_ROOT, ROOT_TASKS};
pub use reporter::{BuildReporter, NullReporter};
pub use results::ResultsWriter;
pub use source::{PackageSource, Publication, PublicationIndex};
pub use stage::{StageReport, Stager};
pub use surface::{IsolatedContext, PublicSurface, SurfaceIntrospector};
pub use task::Task;
pub use version::{next_version, BumpType, SurfaceComparison, Version, VersionDecision};
