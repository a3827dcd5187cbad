//! The fixed task set of a module build.
//!
//! | task            | prerequisites                              |
//! |-----------------|--------------------------------------------|
//! | `clean`         |                                            |
//! | `detect`        |                                            |
//! | `analyze`       | `detect`                                   |
//! | `test`          | `detect`                                   |
//! | `code-coverage` | `detect`                                   |
//! | `probe`         | `detect`                                   |
//! | `introspect`    |                                            |
//! | `version`       | `probe`, `introspect`                      |
//! | `manifest`      | `version`                                  |
//! | `stage`         | `manifest`                                 |
//! | `build`         | `analyze`, `test`, `code-coverage`, `stage` |
//! | `clean-build`   | `clean`, `build`                           |
//! | `default`       | `build`                                    |

use std::sync::Arc;

use tracing::{info, warn};

use crate::context::BuildContext;
use crate::environment::{EnvironmentKind, EnvironmentProbe};
use crate::error::Result;
use crate::executor::{RunSummary, TaskExecutor};
use crate::gates::{CoverageGate, GateKind, LintGate, ShellToolRunner, TestGate, ToolRunner};
use crate::graph::TaskGraph;
use crate::manifest::{ManifestSynchronizer, SyncTargets};
use crate::reporter::{BuildReporter, NullReporter};
use crate::results::ResultsWriter;
use crate::source::{self, PackageSource};
use crate::stage::{self, Stager};
use crate::surface::SurfaceIntrospector;
use crate::task::Task;
use crate::version::next_version;

pub const DEFAULT_ROOT: &str = "default";

/// Tasks intended to be requested directly.
pub const ROOT_TASKS: [&str; 7] = [
    "default",
    "build",
    "clean-build",
    "analyze",
    "test",
    "code-coverage",
    "clean",
];

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Collaborators the task bodies call out to.
pub struct Services {
    reporter: Arc<dyn BuildReporter>,
    runner: Arc<dyn ToolRunner>,
    synchronizer: Arc<ManifestSynchronizer>,
    source: Option<Arc<dyn PackageSource>>,
    env: EnvLookup,
}

impl Services {
    /// Services backed by the process environment, `sh`, and the configured registry.
    pub fn new(synchronizer: ManifestSynchronizer) -> Self {
        Self {
            reporter: Arc::new(NullReporter),
            runner: Arc::new(ShellToolRunner::new()),
            synchronizer: Arc::new(synchronizer),
            source: None,
            env: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn BuildReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Uses `source` instead of the one described by `[registry]`.
    pub fn with_source(mut self, source: Arc<dyn PackageSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(env);
        self
    }
}

/// A module build: the task graph plus the executor that runs it.
pub struct Pipeline {
    executor: TaskExecutor<BuildContext>,
}

impl Pipeline {
    /// Declares and validates the task graph.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the graph is invalid.
    pub fn new(services: Services) -> Result<Self> {
        let services = Arc::new(services);
        let graph = TaskGraph::new(declare_tasks(&services))?;
        let executor = TaskExecutor::new(graph).with_reporter(Arc::clone(&services.reporter));
        Ok(Self { executor })
    }

    pub fn graph(&self) -> &TaskGraph<BuildContext> {
        self.executor.graph()
    }

    /// Runs `root` against `ctx`.
    pub fn run(&self, root: &str, ctx: &mut BuildContext) -> Result<RunSummary> {
        self.executor.run(root, ctx)
    }
}

fn declare_tasks(services: &Arc<Services>) -> Vec<Task<BuildContext>> {
    vec![
        Task::new("clean", |ctx: &mut BuildContext| {
            ctx.check_output_root()?;
            stage::clean(ctx.output_root())?;
            Ok(())
        })
        .describe("Remove the output directory"),
        detect_task(services).describe("Decide whether this is a CI or a local run"),
        gate_task(services, GateKind::Lint)
            .depends_on(["detect"])
            .describe("Run static analysis"),
        gate_task(services, GateKind::Test)
            .depends_on(["detect"])
            .describe("Run the test suite"),
        gate_task(services, GateKind::Coverage)
            .depends_on(["detect"])
            .describe("Check code coverage"),
        probe_task(services)
            .depends_on(["detect"])
            .describe("Look up the previous publication"),
        Task::new("introspect", |ctx: &mut BuildContext| {
            let config = &ctx.config().surface;
            let artifact = ctx.resolve(&ctx.config().module.artifact);
            let surface = SurfaceIntrospector::from_config(config)?.introspect(&artifact)?;
            info!(exports = surface.len(), "introspected public surface");
            ctx.set_surface(surface)
        })
        .describe("Extract the exported operations from the implementation artifact"),
        version_task(services)
            .depends_on(["probe", "introspect"])
            .describe("Compute the release version"),
        manifest_task(services)
            .depends_on(["version"])
            .describe("Write version and exports into the manifest and spec"),
        stage_task(services)
            .depends_on(["manifest"])
            .describe("Copy the module into the versioned output directory"),
        Task::group("build", ["analyze", "test", "code-coverage", "stage"])
            .describe("Run all gates and stage the module"),
        Task::group("clean-build", ["clean", "build"]).describe("Clean, then build"),
        Task::group(DEFAULT_ROOT, ["build"]).describe("Alias for build"),
    ]
}

fn detect_task(services: &Arc<Services>) -> Task<BuildContext> {
    let services = Arc::clone(services);
    Task::new("detect", move |ctx: &mut BuildContext| {
        let kind = EnvironmentProbe::new(ctx.config().environment.ci_variable.clone())
            .detect_kind_with(|name| (services.env)(name));
        info!(kind = kind.as_str(), "detected environment");
        ctx.set_environment_kind(kind)
    })
}

fn probe_task(services: &Arc<Services>) -> Task<BuildContext> {
    let services = Arc::clone(services);
    Task::new("probe", move |ctx: &mut BuildContext| {
        let config = ctx.config();
        let kind = ctx.environment_kind()?;
        let source = match &services.source {
            Some(source) => Some(Arc::clone(source)),
            None if kind.is_ci() => source::from_config(&config.registry, ctx.source_root())?,
            None => None,
        };
        let probe =
            EnvironmentProbe::new(config.environment.ci_variable.clone()).with_source(source);
        let report = probe.probe_kind(kind, ctx.module_name())?;

        if report.kind == EnvironmentKind::Local {
            services.reporter.warning(
                "Local build: the staged artifact is for local verification only and must not be published",
            );
        }
        ctx.set_environment(report)
    })
}

fn version_task(services: &Arc<Services>) -> Task<BuildContext> {
    let services = Arc::clone(services);
    Task::new("version", move |ctx: &mut BuildContext| {
        let environment = ctx.environment()?;
        let surface = ctx.surface()?;
        let decision = next_version(
            environment.kind,
            &environment.previous,
            surface,
            ctx.config().surface.comparison,
        )?;
        info!(
            previous = %environment.previous.version,
            next = %decision.version,
            bump = decision.bump.as_str(),
            "computed version"
        );
        services
            .reporter
            .version_computed(environment.previous.version, &decision);
        ctx.set_version(decision)
    })
}

fn manifest_task(services: &Arc<Services>) -> Task<BuildContext> {
    let services = Arc::clone(services);
    Task::new("manifest", move |ctx: &mut BuildContext| {
        let targets = SyncTargets::from_context(ctx);
        services
            .synchronizer
            .sync(&targets, ctx.version()?, ctx.surface()?)
    })
}

fn stage_task(services: &Arc<Services>) -> Task<BuildContext> {
    let services = Arc::clone(services);
    Task::new("stage", move |ctx: &mut BuildContext| {
        ctx.check_output_root()?;
        let stager = Stager::new(ctx.config().exclude_patterns()?).ignore_dir(ctx.output_root());
        let source_dir = ctx.resolve(&ctx.config().module.source);
        let report = stager.stage(&source_dir, &ctx.staging_dir()?)?;
        services.reporter.staged(&report.dir, report.files.len());
        Ok(())
    })
}

fn gate_task(services: &Arc<Services>, kind: GateKind) -> Task<BuildContext> {
    let services = Arc::clone(services);
    Task::new(kind.task_name(), move |ctx: &mut BuildContext| {
        let config = ctx.config();
        let is_ci = ctx.environment_kind()?.is_ci();
        let results = is_ci.then(|| ResultsWriter::new(ctx.results_dir(), config.runtime_major()));
        let runner = services.runner.as_ref();
        let cwd = ctx.source_root();

        let summary = match kind {
            GateKind::Lint => match &config.gates.lint {
                Some(gate_config) => {
                    let gate = LintGate::new(gate_config);
                    let report = gate.collect(runner, cwd)?;
                    if let Some(writer) = &results {
                        writer.write_lint(&report)?;
                    }
                    Some(gate.evaluate(&report)?)
                }
                None => None,
            },
            GateKind::Test => match &config.gates.test {
                Some(gate_config) => {
                    let gate = TestGate::new(gate_config);
                    let report = gate.collect(runner, cwd)?;
                    if let Some(writer) = &results {
                        writer.write_test(&report)?;
                    }
                    Some(gate.evaluate(&report)?)
                }
                None => None,
            },
            GateKind::Coverage => match &config.gates.coverage {
                Some(gate_config) => {
                    let gate = CoverageGate::new(gate_config);
                    let report = gate.collect(runner, cwd)?;
                    if let Some(writer) = &results {
                        writer.write_coverage(&report)?;
                    }
                    Some(gate.evaluate(&report)?)
                }
                None => None,
            },
        };

        match summary {
            Some(summary) => services.reporter.gate_passed(kind.task_name(), &summary),
            None => {
                warn!(gate = kind.task_name(), "no command configured, skipping");
                services.reporter.warning(&format!(
                    "No command configured for '{}'; gate skipped",
                    kind.task_name()
                ));
            }
        }
        Ok(())
    })
}
