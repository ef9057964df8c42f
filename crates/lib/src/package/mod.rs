//! Packaging of an installed build.
//!
//! After `make install` has populated the package root this module copies the
//! license files, deletes stale non-portable artifacts and writes the
//! `PackageManifest` consumers read.

mod types;

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

pub use types::{PackageError, PackageManifest};

use crate::consts::{LICENSES_SUBFOLDER, PACKAGE_MANIFEST_FILE};
use crate::platform::PlatformDescriptor;
use crate::recipe::Recipe;
use crate::util::hash::hash_directory;

/// Finish the package at `package_root` and write its manifest.
///
/// # Errors
///
/// `PackageError::MissingLicense` if a license file the recipe names is not in
/// the source tree; `PackageError::FileSystem` for any other I/O failure.
pub fn package(
  recipe: &Recipe,
  platform: &PlatformDescriptor,
  source_root: &Path,
  package_root: &Path,
) -> Result<PackageManifest, PackageError> {
  let license_files = copy_licenses(recipe, source_root, package_root)?;
  remove_stale_artifacts(recipe, package_root)?;

  let mut manifest = PackageManifest {
    name: recipe.name.clone(),
    version: recipe.version.clone(),
    license: recipe.license.clone(),
    platform: platform.triple(),
    library_names: recipe.library_names_for(platform.os),
    system_libraries: recipe.system_libraries_for(platform.os),
    license_files,
    artifacts: list_artifacts(package_root)?,
    digest: String::new(),
  };
  manifest.digest = hash_directory(package_root, &[PACKAGE_MANIFEST_FILE])?.0;

  write_manifest(&manifest, package_root)?;
  info!(
    name = %manifest.name,
    version = %manifest.version,
    libs = ?manifest.library_names,
    "package ready"
  );
  Ok(manifest)
}

/// Read a manifest written by a previous `package` call.
pub fn read_manifest(package_root: &Path) -> Result<PackageManifest, PackageError> {
  let path = package_root.join(PACKAGE_MANIFEST_FILE);
  let content = fs::read_to_string(&path).map_err(|e| PackageError::fs(&path, e))?;
  Ok(serde_json::from_str(&content)?)
}

fn copy_licenses(recipe: &Recipe, source_root: &Path, package_root: &Path) -> Result<Vec<String>, PackageError> {
  let licenses_dir = package_root.join(LICENSES_SUBFOLDER);
  fs::create_dir_all(&licenses_dir).map_err(|e| PackageError::fs(&licenses_dir, e))?;

  let mut copied = Vec::new();
  for license in &recipe.license_files {
    let src = source_root.join(license);
    if !src.is_file() {
      return Err(PackageError::MissingLicense(src));
    }
    let Some(file_name) = license.file_name() else {
      return Err(PackageError::MissingLicense(src));
    };
    let dest = licenses_dir.join(file_name);
    fs::copy(&src, &dest).map_err(|e| PackageError::fs(&dest, e))?;
    debug!(license = ?license, "copied license file");
    copied.push(format!("{}/{}", LICENSES_SUBFOLDER, file_name.to_string_lossy()));
  }
  Ok(copied)
}

fn remove_stale_artifacts(recipe: &Recipe, package_root: &Path) -> Result<(), PackageError> {
  for artifact in &recipe.stale_artifacts {
    let path = package_root.join(artifact);
    if path.is_file() {
      fs::remove_file(&path).map_err(|e| PackageError::fs(&path, e))?;
      debug!(artifact = ?artifact, "removed stale artifact");
    }
  }
  Ok(())
}

fn list_artifacts(package_root: &Path) -> Result<Vec<String>, PackageError> {
  let lib_dir = package_root.join("lib");
  if !lib_dir.is_dir() {
    return Ok(Vec::new());
  }

  let mut artifacts = Vec::new();
  for entry in WalkDir::new(&lib_dir).sort_by_file_name() {
    let entry = entry.map_err(|e| PackageError::fs(&lib_dir, e))?;
    if entry.file_type().is_dir() {
      continue;
    }
    let rel = entry.path().strip_prefix(package_root).unwrap_or(entry.path());
    artifacts.push(rel.to_string_lossy().replace('\\', "/"));
  }
  Ok(artifacts)
}

fn write_manifest(manifest: &PackageManifest, package_root: &Path) -> Result<(), PackageError> {
  let path = package_root.join(PACKAGE_MANIFEST_FILE);
  let json = serde_json::to_string_pretty(manifest)?;
  fs::write(&path, json).map_err(|e| PackageError::fs(&path, e))?;
  debug!(path = ?path, "wrote package manifest");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::{Arch, Compiler, Os};
  use crate::recipe;
  use tempfile::TempDir;

  struct Fixture {
    _temp: TempDir,
    source: std::path::PathBuf,
    package: std::path::PathBuf,
  }

  fn installed_tree() -> Fixture {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("sources");
    let package = temp.path().join("package");
    fs::create_dir_all(&source).unwrap();
    fs::create_dir_all(package.join("lib")).unwrap();
    fs::write(source.join("COPYING"), "GPL").unwrap();
    fs::write(package.join("lib/libgpg-error.a"), "archive").unwrap();
    fs::write(package.join("lib/libgpg-error.la"), "libtool").unwrap();
    Fixture {
      _temp: temp,
      source,
      package,
    }
  }

  fn platform(os: Os) -> PlatformDescriptor {
    PlatformDescriptor::new(os, Arch::X86_64, Compiler::native_for(os))
  }

  #[test]
  fn packages_linux_build() {
    let fx = installed_tree();
    let recipe = recipe::builtin("libgpg-error").unwrap();

    let manifest = package(&recipe, &platform(Os::Linux), &fx.source, &fx.package).unwrap();

    assert_eq!(manifest.library_names, vec!["gpg-error"]);
    assert!(manifest.system_libraries.is_empty());
    assert_eq!(manifest.license_files, vec!["licenses/COPYING"]);
    assert_eq!(manifest.artifacts, vec!["lib/libgpg-error.a"]);
    assert_eq!(manifest.platform, "x86_64-Linux");
    assert!(fx.package.join("licenses/COPYING").is_file());
    assert!(!fx.package.join("lib/libgpg-error.la").exists());
  }

  #[test]
  fn ws2_32_listed_iff_windows() {
    let recipe = recipe::builtin("libgpg-error").unwrap();
    for os in [Os::Linux, Os::Macos, Os::Windows, Os::FreeBsd, Os::Android, Os::Ios] {
      let fx = installed_tree();
      let manifest = package(&recipe, &platform(os), &fx.source, &fx.package).unwrap();

      assert_eq!(
        manifest.library_names.contains(&"ws2_32".to_string()),
        os == Os::Windows,
        "unexpected ws2_32 membership on {os}"
      );
      assert_eq!(manifest.library_names[0], "gpg-error");
    }
  }

  #[test]
  fn manifest_is_written_and_readable() {
    let fx = installed_tree();
    let recipe = recipe::builtin("libgpg-error").unwrap();

    let manifest = package(&recipe, &platform(Os::Windows), &fx.source, &fx.package).unwrap();
    let read_back = read_manifest(&fx.package).unwrap();

    assert_eq!(manifest, read_back);
    assert_eq!(read_back.system_libraries, vec!["ws2_32"]);
    assert_eq!(read_back.digest.len(), 64);
  }

  #[test]
  fn missing_license_is_an_error() {
    let fx = installed_tree();
    fs::remove_file(fx.source.join("COPYING")).unwrap();
    let recipe = recipe::builtin("libgpg-error").unwrap();

    let err = package(&recipe, &platform(Os::Linux), &fx.source, &fx.package).unwrap_err();

    assert!(matches!(err, PackageError::MissingLicense(_)));
  }

  #[test]
  fn absent_stale_artifact_is_fine() {
    let fx = installed_tree();
    fs::remove_file(fx.package.join("lib/libgpg-error.la")).unwrap();
    let recipe = recipe::builtin("libgpg-error").unwrap();

    assert!(package(&recipe, &platform(Os::Linux), &fx.source, &fx.package).is_ok());
  }
}
