use std::fmt;

use serde::{Deserialize, Serialize};

/// Target operating systems a recipe can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
  Linux,
  Macos,
  Windows,
  FreeBsd,
  Android,
  Ios,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::Macos),
      "windows" => Some(Self::Windows),
      "freebsd" => Some(Self::FreeBsd),
      "android" => Some(Self::Android),
      "ios" => Some(Self::Ios),
      _ => None,
    }
  }

  /// Parse a settings value. Matching is case-insensitive.
  pub fn from_setting(value: &str) -> Option<Self> {
    match value.to_ascii_lowercase().as_str() {
      "linux" => Some(Self::Linux),
      "macos" | "darwin" => Some(Self::Macos),
      "windows" => Some(Self::Windows),
      "freebsd" => Some(Self::FreeBsd),
      "android" => Some(Self::Android),
      "ios" => Some(Self::Ios),
      _ => None,
    }
  }

  /// Returns the settings spelling for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "Linux",
      Self::Macos => "Macos",
      Self::Windows => "Windows",
      Self::FreeBsd => "FreeBSD",
      Self::Android => "Android",
      Self::Ios => "iOS",
    }
  }

  /// Whether position-independent code is a meaningful option on this OS.
  ///
  /// Windows images are relocated by the loader, so `-fPIC` does not apply.
  pub fn supports_pic(&self) -> bool {
    !matches!(self, Self::Windows)
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn current_returns_supported_os() {
    assert!(Os::current().is_some(), "Current OS should be supported");
  }

  #[test]
  fn from_setting_is_case_insensitive() {
    assert_eq!(Os::from_setting("linux"), Some(Os::Linux));
    assert_eq!(Os::from_setting("WINDOWS"), Some(Os::Windows));
    assert_eq!(Os::from_setting("Darwin"), Some(Os::Macos));
    assert_eq!(Os::from_setting("Plan9"), None);
  }

  #[test]
  fn only_windows_lacks_pic() {
    assert!(!Os::Windows.supports_pic());
    for os in [Os::Linux, Os::Macos, Os::FreeBsd, Os::Android, Os::Ios] {
      assert!(os.supports_pic(), "{os} should support PIC");
    }
  }
}
