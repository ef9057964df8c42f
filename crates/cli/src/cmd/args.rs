//! Implementation of the `forge args` command.
//!
//! Resolves the platform and prints the configure arguments a build would use.
//! Nothing is fetched, patched or run.

use anyhow::{Context, Result};

use libforge_lib::execute::EnvScope;
use libforge_lib::pipeline::plan;
use libforge_lib::toolchain::toolchain_patches;

use crate::TargetArgs;
use crate::cmd::resolve_target;
use crate::output::{print_info, print_json, print_stat, print_success};

pub fn cmd_args(args: &TargetArgs, json: bool) -> Result<()> {
  let target = resolve_target(args)?;

  let mut scope = EnvScope::inherit();
  let layer = scope.push("profile", target.env.clone());
  let (platform, arguments) = plan(&target.recipe, &target.settings, &target.options, &*layer)
    .with_context(|| format!("Cannot configure {}", target.recipe.id()))?;
  let patches = toolchain_patches(&target.recipe.configure, &platform);

  if json {
    let output = serde_json::json!({
      "recipe": target.recipe.id(),
      "platform": platform,
      "options": target.options.pruned_for(platform.os),
      "settings": target.settings,
      "arguments": arguments,
      "cppflags": arguments.cppflags(),
      "cflags": arguments.cflags(),
      "patches": patches,
    });
    return print_json(&output);
  }

  print_success(&format!("{} for {}", target.recipe.id(), platform));
  println!();
  println!("Configure:");
  for token in arguments.tokens() {
    println!("  {}", token);
  }
  print_stat("Host", arguments.host().unwrap_or("(default)"));

  if !arguments.env().is_empty() {
    println!();
    println!("Environment:");
    for (key, value) in arguments.env() {
      println!("  {}={}", key, value);
    }
  }
  if let Some(cppflags) = arguments.cppflags() {
    print_stat("CPPFLAGS", &cppflags);
  }
  if let Some(cflags) = arguments.cflags() {
    print_stat("CFLAGS", &cflags);
  }
  if let Some(activation) = arguments.activation() {
    print_stat("Activation", &format!("{:?}", activation));
  }
  if !patches.is_empty() {
    println!();
    print_info(&format!("{} toolchain patch(es) would be applied", patches.len()));
  }

  Ok(())
}
