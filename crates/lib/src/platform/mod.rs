//! Platform descriptor resolution.
//!
//! A `PlatformDescriptor` is derived once, at the start of a build, from the
//! externally supplied `Settings`. Nothing downstream mutates it.

pub mod arch;
pub mod compiler;
pub mod os;
pub mod paths;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use arch::Arch;
pub use compiler::Compiler;
pub use os::Os;

use crate::settings::{ConfigError, Settings};

/// Target os, architecture and compiler for one build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformDescriptor {
  pub os: Os,
  pub arch: Arch,
  pub compiler: Compiler,
  pub compiler_version: Option<String>,
}

impl PlatformDescriptor {
  pub fn new(os: Os, arch: Arch, compiler: Compiler) -> Self {
    Self {
      os,
      arch,
      compiler,
      compiler_version: None,
    }
  }

  /// Describe the machine we are running on with its native compiler.
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn host() -> Option<Self> {
    let os = Os::current()?;
    Some(Self::new(os, Arch::current()?, Compiler::native_for(os)))
  }

  /// Returns the short platform string (e.g., "x86_64-Linux")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl fmt::Display for PlatformDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({}", self.triple(), self.compiler)?;
    if let Some(version) = &self.compiler_version {
      write!(f, " {}", version)?;
    }
    write!(f, ")")
  }
}

/// Resolve settings into a `PlatformDescriptor`.
///
/// `os` and `arch` are required. `compiler` falls back to the native
/// toolchain of the target os; `compiler.version` is optional.
pub fn resolve(settings: &Settings) -> Result<PlatformDescriptor, ConfigError> {
  let os_value = settings.require("os")?;
  let os = Os::from_setting(os_value).ok_or_else(|| ConfigError::InvalidSetting {
    key: "os".to_string(),
    value: os_value.to_string(),
  })?;

  let arch_value = settings.require("arch")?;
  let arch = Arch::from_setting(arch_value).ok_or_else(|| ConfigError::InvalidSetting {
    key: "arch".to_string(),
    value: arch_value.to_string(),
  })?;

  let compiler = settings
    .get("compiler")
    .map(Compiler::from_setting)
    .unwrap_or_else(|| Compiler::native_for(os));

  let descriptor = PlatformDescriptor {
    os,
    arch,
    compiler,
    compiler_version: settings.get("compiler.version").map(str::to_string),
  };

  debug!(platform = %descriptor, "resolved platform");
  Ok(descriptor)
}

/// Settings describing the host, used as defaults beneath user settings.
pub fn host_settings() -> Settings {
  match PlatformDescriptor::host() {
    Some(host) => Settings::new()
      .with("os", host.os.as_str())
      .with("arch", host.arch.as_str()),
    None => Settings::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolves_linux_x86_64_with_native_compiler() {
    let settings = Settings::new().with("os", "Linux").with("arch", "x86_64");
    let platform = resolve(&settings).unwrap();

    assert_eq!(platform.os, Os::Linux);
    assert_eq!(platform.arch, Arch::X86_64);
    assert_eq!(platform.compiler, Compiler::Gcc);
    assert_eq!(platform.compiler_version, None);
  }

  #[test]
  fn explicit_compiler_and_version_are_kept() {
    let settings = Settings::new()
      .with("os", "Windows")
      .with("arch", "x86")
      .with("compiler", "Visual Studio")
      .with("compiler.version", "16");
    let platform = resolve(&settings).unwrap();

    assert_eq!(platform.compiler, Compiler::Msvc);
    assert_eq!(platform.compiler_version.as_deref(), Some("16"));
    assert_eq!(platform.to_string(), "x86-Windows (Visual Studio 16)");
  }

  #[test]
  fn missing_os_is_a_configuration_error() {
    let settings = Settings::new().with("arch", "x86_64");
    assert_eq!(resolve(&settings), Err(ConfigError::MissingSetting("os".to_string())));
  }

  #[test]
  fn missing_arch_is_a_configuration_error() {
    let settings = Settings::new().with("os", "Linux");
    assert_eq!(resolve(&settings), Err(ConfigError::MissingSetting("arch".to_string())));
  }

  #[test]
  fn unknown_arch_is_rejected() {
    let settings = Settings::new().with("os", "Linux").with("arch", "mips");
    assert!(matches!(
      resolve(&settings),
      Err(ConfigError::InvalidSetting { ref key, ref value }) if key == "arch" && value == "mips"
    ));
  }

  #[test]
  fn host_settings_resolve() {
    let platform = resolve(&host_settings()).unwrap();
    assert_eq!(Some(platform.os), Os::current());
  }
}
