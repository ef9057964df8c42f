mod args;
mod build;
mod fetch;
mod info;
mod recipes;

pub use args::cmd_args;
pub use build::cmd_build;
pub use fetch::cmd_fetch;
pub use info::cmd_info;
pub use recipes::cmd_recipes;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use libforge_lib::options::OptionSet;
use libforge_lib::pipeline::BuildLayout;
use libforge_lib::platform::{self, host_settings};
use libforge_lib::profile::load_profile;
use libforge_lib::recipe::{self, Recipe};
use libforge_lib::settings::Settings;

use crate::TargetArgs;

/// Everything a command needs to describe one build target.
pub(crate) struct Target {
  pub recipe: Recipe,
  pub settings: Settings,
  pub options: OptionSet,
  pub env: BTreeMap<String, String>,
}

/// Merge host defaults, the profile and command-line flags, in that order.
///
/// Settings are merged first: which options exist depends on the target os.
pub(crate) fn resolve_target(args: &TargetArgs) -> Result<Target> {
  let recipe = recipe::builtin(&args.recipe)?;

  let profile = match &args.profile {
    Some(path) => {
      Some(load_profile(path).with_context(|| format!("Failed to load profile: {}", path.display()))?)
    }
    None => None,
  };

  let mut settings = host_settings();
  if let Some(profile) = &profile {
    settings.merge(&profile.settings);
  }
  for pair in &args.settings {
    settings.set_pair(pair).context("Invalid --setting")?;
  }
  let os = platform::resolve(&settings).context("Invalid settings")?.os;

  let mut options = OptionSet::default();
  if let (Some(profile), Some(path)) = (&profile, &args.profile) {
    profile
      .apply_options(os, &mut options)
      .with_context(|| format!("Invalid options in profile: {}", path.display()))?;
  }
  for pair in &args.options {
    options.set_pair(os, pair).context("Invalid --option")?;
  }

  let env = profile.map(|p| p.env).unwrap_or_default();

  debug!(recipe = %recipe.id(), settings = ?settings, options = ?options, "resolved build target");
  Ok(Target {
    recipe,
    settings,
    options,
    env,
  })
}

pub(crate) fn layout_for(recipe: &Recipe, root: Option<PathBuf>) -> BuildLayout {
  match root {
    Some(root) => BuildLayout::new(&root),
    None => BuildLayout::default_for(recipe),
  }
}
