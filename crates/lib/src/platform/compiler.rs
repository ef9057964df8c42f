use std::fmt;

use serde::{Deserialize, Serialize};

use super::os::Os;

/// Compiler identity from the `compiler` setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compiler {
  Gcc,
  Clang,
  AppleClang,
  /// Microsoft Visual C++ (`Visual Studio` or `msvc` in settings)
  Msvc,
  Other(String),
}

impl Compiler {
  pub fn from_setting(value: &str) -> Self {
    match value.to_ascii_lowercase().as_str() {
      "gcc" => Self::Gcc,
      "clang" => Self::Clang,
      "apple-clang" => Self::AppleClang,
      "visual studio" | "msvc" => Self::Msvc,
      _ => Self::Other(value.to_string()),
    }
  }

  /// The toolchain assumed when settings name no compiler.
  pub fn native_for(os: Os) -> Self {
    match os {
      Os::Linux => Self::Gcc,
      Os::Macos | Os::Ios => Self::AppleClang,
      Os::Windows => Self::Msvc,
      Os::FreeBsd | Os::Android => Self::Clang,
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Gcc => "gcc",
      Self::Clang => "clang",
      Self::AppleClang => "apple-clang",
      Self::Msvc => "Visual Studio",
      Self::Other(name) => name,
    }
  }
}

impl fmt::Display for Compiler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn visual_studio_and_msvc_are_the_same_compiler() {
    assert_eq!(Compiler::from_setting("Visual Studio"), Compiler::Msvc);
    assert_eq!(Compiler::from_setting("msvc"), Compiler::Msvc);
  }

  #[test]
  fn unknown_names_are_preserved() {
    assert_eq!(
      Compiler::from_setting("intel-cc"),
      Compiler::Other("intel-cc".to_string())
    );
    assert_eq!(Compiler::from_setting("intel-cc").as_str(), "intel-cc");
  }
}
