//! Implementation of the `forge fetch` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use libforge_lib::pipeline::prepare_sources;
use libforge_lib::recipe;

use crate::cmd::layout_for;
use crate::output::{print_info, print_success};

pub fn cmd_fetch(name: &str, root: Option<PathBuf>, refetch: bool) -> Result<()> {
  let recipe = recipe::builtin(name)?;
  let layout = layout_for(&recipe, root);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let fetched = rt
    .block_on(prepare_sources(&recipe, &layout, refetch))
    .with_context(|| format!("Failed to fetch {}", recipe.source.url))?;

  if fetched {
    print_success(&format!("Sources unpacked to {}", layout.sources.display()));
  } else {
    print_info(&format!(
      "Sources already present at {} (use --refetch to replace them)",
      layout.sources.display()
    ));
  }
  Ok(())
}
