//! Implementation of the `forge build` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use libforge_lib::execute::{EnvScope, ExecuteConfig};
use libforge_lib::pipeline::{self, BuildRequest};

use crate::TargetArgs;
use crate::cmd::{layout_for, resolve_target};
use crate::output::{format_duration, print_json, print_stat, print_success};

/// Run the full pipeline and print a summary of the package.
pub fn cmd_build(args: &TargetArgs, root: Option<PathBuf>, refetch: bool, jobs: Option<usize>, json: bool) -> Result<()> {
  let target = resolve_target(args)?;
  let layout = layout_for(&target.recipe, root);

  let mut execute = ExecuteConfig::default();
  if let Some(jobs) = jobs {
    execute.jobs = jobs.max(1);
  }

  let request = BuildRequest {
    recipe: target.recipe,
    settings: target.settings,
    options: target.options,
    env: target.env,
    layout,
    refetch,
    execute,
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let mut scope = EnvScope::inherit();
  let report = rt
    .block_on(pipeline::run(&request, &mut scope))
    .with_context(|| format!("Build of {} failed", request.recipe.id()))?;

  if json {
    return print_json(&report.manifest);
  }

  let manifest = &report.manifest;
  print_success(&format!(
    "Built {} {} for {} in {}",
    manifest.name,
    manifest.version,
    report.platform,
    format_duration(report.elapsed)
  ));
  print_stat("Package", &request.layout.package.display().to_string());
  print_stat("Libraries", &manifest.library_names.join(", "));
  if !manifest.system_libraries.is_empty() {
    print_stat("System libraries", &manifest.system_libraries.join(", "));
  }
  print_stat("Licenses", &manifest.license_files.join(", "));
  print_stat("Artifacts", &manifest.artifacts.len().to_string());
  print_stat("Patches applied", &report.patches_applied.to_string());
  for step in &report.invoke.steps {
    print_stat(step.step.as_str(), &format_duration(step.elapsed));
  }

  Ok(())
}
