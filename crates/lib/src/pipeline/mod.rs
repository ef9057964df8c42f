//! The recipe build driver.
//!
//! Runs every stage strictly in order:
//!
//! 1. resolve the platform from settings
//! 2. assemble configure arguments (pure; fails fast on missing environment)
//! 3. fetch and unpack sources unless a pristine tree is already present
//! 4. pre-build removals, recipe patches, toolchain patches
//! 5. configure, build, install
//! 6. package
//!
//! The first error aborts the build and leaves the work root as it is.

mod types;

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

pub use types::{BuildLayout, BuildReport, BuildRequest, RecipeError};

use crate::consts::PATCHED_MARKER_FILE;
use crate::execute::{EnvScope, EnvSource, InvokeRequest, invoke_build};
use crate::fetch::fetch_and_unpack;
use crate::options::OptionSet;
use crate::package::package;
use crate::patch::{Patch, PatchError, apply_patches};
use crate::platform::{self, PlatformDescriptor};
use crate::recipe::{Recipe, apply_pre_build_removals};
use crate::settings::Settings;
use crate::toolchain::{BuildArguments, build_arguments, toolchain_patches};

/// Resolve the platform and assemble the configure arguments without
/// touching the filesystem.
pub fn plan(
  recipe: &Recipe,
  settings: &Settings,
  options: &OptionSet,
  env: &impl EnvSource,
) -> Result<(PlatformDescriptor, BuildArguments), RecipeError> {
  let platform = platform::resolve(settings)?;
  let arguments = build_arguments(&recipe.configure, &platform, options, env)?;
  Ok((platform, arguments))
}

/// Make sure `layout.sources` holds the recipe's pristine sources.
///
/// An existing tree is kept unless `refetch` is set or an earlier build
/// patched it; a patched tree is re-extracted from the (cached) archive.
///
/// Returns `true` if sources were unpacked, `false` if an existing tree was kept.
pub async fn prepare_sources(recipe: &Recipe, layout: &BuildLayout, refetch: bool) -> Result<bool, RecipeError> {
  if layout.sources.is_dir() && !refetch {
    if !is_patched(&layout.sources) {
      info!(path = ?layout.sources, "using existing source tree");
      return Ok(false);
    }
    info!(path = ?layout.sources, "source tree was patched by an earlier build, unpacking a fresh copy");
  }
  fetch_and_unpack(&recipe.source, &layout.downloads, &layout.sources).await?;
  Ok(true)
}

/// Whether patches have been (or were being) applied to the tree at `sources`.
pub fn is_patched(sources: &Path) -> bool {
  sources.join(PATCHED_MARKER_FILE).exists()
}

/// Record the patch targets before the tree is modified, so a build that
/// fails halfway through patching still leaves the tree marked.
fn mark_patched(sources: &Path, patches: &[Patch]) -> Result<(), PatchError> {
  let marker = sources.join(PATCHED_MARKER_FILE);
  let targets: Vec<String> = patches.iter().map(|p| p.target.display().to_string()).collect();
  std::fs::write(&marker, targets.join("\n") + "\n").map_err(|e| PatchError::fs(&marker, e))
}

/// Build and package one recipe.
///
/// `scope` is the environment the build starts from; `request.env` is layered
/// on top of it for the duration of the call.
pub async fn run(request: &BuildRequest, scope: &mut EnvScope) -> Result<BuildReport, RecipeError> {
  let started = Instant::now();
  let recipe = &request.recipe;
  let layout = &request.layout;

  let mut profile_env = scope.push("profile", request.env.clone());

  let (platform, arguments) = plan(recipe, &request.settings, &request.options, &*profile_env)?;
  info!(recipe = %recipe.id(), platform = %platform, "building recipe");

  prepare_sources(recipe, layout, request.refetch).await?;

  apply_pre_build_removals(recipe, &layout.sources)?;

  let mut patches = recipe.patches.clone();
  patches.extend(toolchain_patches(&recipe.configure, &platform));
  if !patches.is_empty() {
    mark_patched(&layout.sources, &patches)?;
  }
  apply_patches(&patches, &layout.sources)?;
  debug!(count = patches.len(), "source tree patched");

  let invoke = invoke_build(
    &InvokeRequest {
      source_root: layout.sources.clone(),
      package_root: layout.package.clone(),
      arguments: &arguments,
    },
    &platform,
    &mut profile_env,
    &request.execute,
  )
  .await?;

  let manifest = package(recipe, &platform, &layout.sources, &layout.package)?;

  let report = BuildReport {
    platform,
    arguments,
    invoke,
    manifest,
    patches_applied: patches.len(),
    elapsed: started.elapsed(),
  };
  info!(recipe = %recipe.id(), elapsed_ms = report.elapsed.as_millis() as u64, "recipe built");
  Ok(report)
}
