//! Built-in recipes.
//!
//! A recipe is plain data: where the sources live, which configure tokens and
//! toolchain bundles apply, what to patch or delete before building and what
//! the package exposes to consumers.

mod libgpg_error;
mod types;

use std::path::Path;

use tracing::{debug, warn};

pub use types::{PreBuildRemoval, Recipe, SystemLibrary};

use crate::patch::PatchError;
use crate::settings::ConfigError;

/// Recipe used when none is named.
pub const DEFAULT_RECIPE: &str = libgpg_error::NAME;

/// Names of every built-in recipe.
pub fn names() -> Vec<&'static str> {
  vec![libgpg_error::NAME]
}

/// Look up a built-in recipe by name (case-insensitive).
pub fn builtin(name: &str) -> Result<Recipe, ConfigError> {
  match name.to_ascii_lowercase().as_str() {
    libgpg_error::NAME => Ok(libgpg_error::recipe()),
    _ => Err(ConfigError::UnknownRecipe(name.to_string())),
  }
}

/// Delete the recipe's pre-build removals from `source_root`.
///
/// Files that are already gone are skipped.
pub fn apply_pre_build_removals(recipe: &Recipe, source_root: &Path) -> Result<usize, PatchError> {
  let mut removed = 0;
  for removal in &recipe.pre_build_removals {
    let path = source_root.join(&removal.path);
    if !path.exists() {
      debug!(path = ?removal.path, "pre-build removal already absent");
      continue;
    }
    std::fs::remove_file(&path).map_err(|e| PatchError::fs(&path, e))?;
    warn!(path = ?removal.path, reason = %removal.reason, "removed file before build");
    removed += 1;
  }
  Ok(removed)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  #[test]
  fn builtin_lookup() {
    assert_eq!(builtin("libgpg-error").unwrap().version, "1.36");
    assert_eq!(builtin("LibGPG-Error").unwrap().name, "libgpg-error");
    assert_eq!(
      builtin("openssl").unwrap_err(),
      ConfigError::UnknownRecipe("openssl".to_string())
    );
  }

  #[test]
  fn every_listed_name_resolves() {
    for name in names() {
      assert!(builtin(name).is_ok(), "{name} is listed but not built in");
    }
    assert!(names().contains(&DEFAULT_RECIPE));
  }

  #[test]
  #[traced_test]
  fn removes_ro_po_and_logs_reason() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("po")).unwrap();
    std::fs::write(temp.path().join("po/ro.po"), "msgid \"\"").unwrap();
    std::fs::write(temp.path().join("po/de.po"), "msgid \"\"").unwrap();

    let removed = apply_pre_build_removals(&builtin(DEFAULT_RECIPE).unwrap(), temp.path()).unwrap();

    assert_eq!(removed, 1);
    assert!(!temp.path().join("po/ro.po").exists());
    assert!(temp.path().join("po/de.po").exists());
    assert!(logs_contain("removed file before build"));
  }

  #[test]
  fn missing_removal_target_is_not_an_error() {
    let temp = TempDir::new().unwrap();
    let removed = apply_pre_build_removals(&builtin(DEFAULT_RECIPE).unwrap(), temp.path()).unwrap();
    assert_eq!(removed, 0);
  }
}
