//! Opaque build settings and configuration errors.
//!
//! Settings are a flat, ordered key/value map (`os`, `arch`, `compiler`,
//! `compiler.version`, ...). They are supplied by CLI flags or a Lua profile
//! and interpreted only by the platform resolver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::placeholder::PlaceholderError;

/// Errors raised for missing or invalid build inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  /// A required setting is absent.
  #[error("missing required setting '{0}'")]
  MissingSetting(String),

  /// A setting has a value this system does not understand.
  #[error("invalid value '{value}' for setting '{key}'")]
  InvalidSetting { key: String, value: String },

  /// A `key=value` pair could not be parsed.
  #[error("expected key=value, got '{0}'")]
  MalformedPair(String),

  /// An option name is not declared by the recipe.
  #[error("unknown option '{0}'")]
  UnknownOption(String),

  /// An option exists, but not when targeting this os.
  #[error("option '{name}' does not exist when building for {os}")]
  UndeclaredOption { name: String, os: String },

  /// An option value is not a boolean.
  #[error("invalid value '{value}' for option '{name}' (expected true or false)")]
  InvalidOption { name: String, value: String },

  /// A toolchain bundle needs an environment variable that is not set.
  #[error("environment variable {var} is required when building with {compiler}")]
  MissingEnv { var: String, compiler: String },

  /// A placeholder in a toolchain token could not be resolved.
  #[error("toolchain placeholder error: {0}")]
  Placeholder(#[from] PlaceholderError),

  /// No recipe with the given name exists.
  #[error("unknown recipe '{0}'")]
  UnknownRecipe(String),
}

/// Externally supplied build settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings(BTreeMap<String, String>);

impl Settings {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style insertion.
  pub fn with(mut self, key: &str, value: &str) -> Self {
    self.set(key, value);
    self
  }

  pub fn set(&mut self, key: &str, value: &str) {
    self.0.insert(key.to_string(), value.to_string());
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
  }

  /// Returns the value for `key`, or a `MissingSetting` error.
  pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
    self.get(key).ok_or_else(|| ConfigError::MissingSetting(key.to_string()))
  }

  /// Parse a `key=value` pair (as passed with `-s`) and insert it.
  pub fn set_pair(&mut self, pair: &str) -> Result<(), ConfigError> {
    let (key, value) = parse_pair(pair)?;
    self.set(key, value);
    Ok(())
  }

  /// Overlay `other` on top of `self`; keys in `other` win.
  pub fn merge(&mut self, other: &Settings) {
    for (key, value) in &other.0 {
      self.0.insert(key.clone(), value.clone());
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Settings {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

/// Split `key=value`, trimming whitespace around both halves.
pub fn parse_pair(pair: &str) -> Result<(&str, &str), ConfigError> {
  let (key, value) = pair
    .split_once('=')
    .ok_or_else(|| ConfigError::MalformedPair(pair.to_string()))?;
  let key = key.trim();
  if key.is_empty() {
    return Err(ConfigError::MalformedPair(pair.to_string()));
  }
  Ok((key, value.trim()))
}
