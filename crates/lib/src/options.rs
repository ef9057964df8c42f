//! User-chosen build options.

use serde::{Deserialize, Serialize};

use crate::platform::Os;
use crate::settings::{ConfigError, parse_pair};

const ALL_OPTIONS: &[&str] = &["shared", "fPIC"];

/// Linkage and code-generation choices for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
  /// Build shared libraries instead of static archives.
  pub shared: bool,
  /// Compile position-independent code.
  pub fpic: bool,
}

impl Default for OptionSet {
  fn default() -> Self {
    Self {
      shared: false,
      fpic: true,
    }
  }
}

impl OptionSet {
  /// Names of the options that exist when targeting `os`.
  pub fn declared(os: Os) -> &'static [&'static str] {
    if os.supports_pic() { ALL_OPTIONS } else { &["shared"] }
  }

  /// Parse `name=value` (as passed with `-o`) and apply it for a build
  /// targeting `os`.
  pub fn set_pair(&mut self, os: Os, pair: &str) -> Result<(), ConfigError> {
    let (name, value) = parse_pair(pair)?;
    self.set(os, name, value)
  }

  /// Set one option. Names are case-insensitive but must be declared for `os`.
  pub fn set(&mut self, os: Os, name: &str, value: &str) -> Result<(), ConfigError> {
    let declared = Self::declared(os)
      .iter()
      .find(|declared| declared.eq_ignore_ascii_case(name))
      .ok_or_else(|| {
        if ALL_OPTIONS.iter().any(|known| known.eq_ignore_ascii_case(name)) {
          ConfigError::UndeclaredOption {
            name: name.to_string(),
            os: os.to_string(),
          }
        } else {
          ConfigError::UnknownOption(name.to_string())
        }
      })?;

    let flag = parse_bool(value).ok_or_else(|| ConfigError::InvalidOption {
      name: name.to_string(),
      value: value.to_string(),
    })?;

    match *declared {
      "shared" => self.shared = flag,
      _ => self.fpic = flag,
    }
    Ok(())
  }

  /// Drop options that do not exist on `os`.
  ///
  /// `fPIC` is not an option on Windows, so it is forced off there.
  pub fn pruned_for(self, os: Os) -> Self {
    if os.supports_pic() {
      self
    } else {
      Self { fpic: false, ..self }
    }
  }
}

fn parse_bool(value: &str) -> Option<bool> {
  match value.to_ascii_lowercase().as_str() {
    "true" | "1" | "yes" | "on" => Some(true),
    "false" | "0" | "no" | "off" => Some(false),
    _ => None,
  }
}
