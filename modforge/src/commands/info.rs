//! Read-only commands: task listing, validation, and status.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use modforge_core::manifest::SyncTargets;
use modforge_core::{EnvironmentProbe, NullReporter, SurfaceIntrospector, ROOT_TASKS};
use serde_json::json;

use crate::formatting::{print_error, print_key_value, print_name_list, print_section_header, print_separator_with_spacing, print_success, print_task_table, SectionStyle, TaskRow};

use super::{build_pipeline, load_context, GlobalOpts};

pub fn cmd_tasks(json: bool) -> Result<()> {
    let pipeline = build_pipeline(Arc::new(NullReporter))?;
    let graph = pipeline.graph();

    if json {
        let mut tasks = Vec::with_capacity(graph.len());
        for task in graph.tasks() {
            tasks.push(json!({
                "name": task.name(),
                "depends_on": task.prerequisites(),
                "required_by": graph.dependents(task.name())?,
                "description": task.description(),
                "root": ROOT_TASKS.contains(&task.name()),
            }));
        }
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    print_section_header("Tasks", SectionStyle::Primary);
    let rows: Vec<TaskRow<'_>> = graph
        .tasks()
        .iter()
        .map(|task| TaskRow {
            name: task.name(),
            prerequisites: task.prerequisites(),
            description: task.description(),
            root: ROOT_TASKS.contains(&task.name()),
        })
        .collect();
    print_task_table(&rows);
    println!();
    Ok(())
}

pub fn cmd_validate(opts: &GlobalOpts, json: bool) -> Result<()> {
    let ctx = load_context(opts)?;
    build_pipeline(Arc::new(NullReporter))?;

    let module = &ctx.config().module;
    let mut issues = Vec::new();

    for (label, path) in [
        ("module.source", ctx.resolve(&module.source)),
        ("module.artifact", ctx.resolve(&module.artifact)),
        ("module.manifest", ctx.resolve(&module.manifest)),
        ("module.spec", ctx.resolve(&module.spec)),
    ] {
        if !path.exists() {
            issues.push(format!("{} not found: {}", label, path.display()));
        }
    }
    if let Err(e) = ctx.check_output_root() {
        issues.push(e.to_string());
    }
    if let Err(e) = modforge_formats::manifest_adapter_for(&module.manifest) {
        issues.push(e.to_string());
    }
    if let Err(e) = modforge_formats::spec_adapter_for(&module.spec) {
        issues.push(e.to_string());
    }
    if let Err(e) = SurfaceIntrospector::from_config(&ctx.config().surface) {
        issues.push(e.to_string());
    }

    if json {
        let output = json!({
            "valid": issues.is_empty(),
            "module": ctx.module_name(),
            "issues": issues,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if issues.is_empty() {
        print_success(&format!("Configuration for '{}' is valid", ctx.module_name()));
        println!();
    } else {
        print_section_header("Validation Failed", SectionStyle::Error);
        for issue in &issues {
            print_error(issue);
        }
        println!();
    }

    if !issues.is_empty() {
        bail!("{} validation issue(s) found", issues.len());
    }
    Ok(())
}

pub fn cmd_status(opts: &GlobalOpts, json: bool) -> Result<()> {
    let ctx = load_context(opts)?;
    let targets = SyncTargets::from_context(&ctx);
    let (manifest, spec) = modforge_formats::synchronizer().read(&targets);
    let manifest = manifest?;
    let spec = spec?;

    let environment = EnvironmentProbe::new(ctx.config().environment.ci_variable.clone()).detect_kind();
    let staged = staged_versions(&ctx.output_root().join(ctx.module_name()))?;
    let manifest_version = manifest.version.map(|v| v.to_string());
    let spec_version = spec.version.map(|v| v.to_string());
    let in_sync = manifest_version == spec_version;
    let exports = manifest.exports.unwrap_or_default();

    if json {
        let output = json!({
            "module": ctx.module_name(),
            "environment": environment.as_str(),
            "manifest_version": manifest_version,
            "spec_version": spec_version,
            "in_sync": in_sync,
            "exports": exports,
            "staged": staged,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_section_header("Module Status", SectionStyle::Primary);
    print_key_value("Module", ctx.module_name());
    print_key_value("Environment", environment.as_str());
    print_key_value("Manifest version", manifest_version.as_deref().unwrap_or("(none)"));
    print_key_value("Spec version", spec_version.as_deref().unwrap_or("(none)"));
    if !in_sync {
        print_error("Manifest and spec versions differ");
    }
    print_separator_with_spacing();

    print_key_value("Exports", &format!("{} operation(s)", exports.len()));
    print_name_list(&exports);
    println!();
    print_key_value("Staged versions", &format!("{}", staged.len()));
    print_name_list(&staged);
    println!();

    Ok(())
}

fn staged_versions(module_dir: &Path) -> Result<Vec<String>> {
    if !module_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut versions = Vec::new();
    for entry in fs::read_dir(module_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            versions.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    versions.sort();
    Ok(versions)
}
