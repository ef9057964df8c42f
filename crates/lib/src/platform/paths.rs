use std::path::PathBuf;

use crate::consts::APP_NAME;

/// Environment variable that overrides the work root for all recipes.
pub const ROOT_ENV: &str = "LIBFORGE_ROOT";

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the directory for cache files for the application
#[cfg(windows)]
pub fn cache_dir() -> PathBuf {
  let local_appdata = std::env::var("LOCALAPPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join("AppData").join("Local"));
  local_appdata.join(APP_NAME).join("Cache")
}

/// Returns the directory for cache files for the application
#[cfg(not(windows))]
pub fn cache_dir() -> PathBuf {
  let cache_home = std::env::var("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".cache"));
  cache_home.join(APP_NAME)
}

/// Returns the directory under which recipe work roots are created.
///
/// `LIBFORGE_ROOT` takes precedence over the cache directory.
pub fn work_base_dir() -> PathBuf {
  match std::env::var(ROOT_ENV) {
    Ok(root) if !root.is_empty() => PathBuf::from(root),
    _ => cache_dir().join("work"),
  }
}
