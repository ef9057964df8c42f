//! Lua build profiles.
//!
//! A profile is a Lua file returning a table:
//!
//! ```lua
//! return {
//!   settings = {
//!     os = "Windows",
//!     arch = "x86_64",
//!     compiler = { name = "Visual Studio", version = "16" },
//!   },
//!   options = { shared = false },
//!   env = { AUTOMAKE_PERLLIBDIR = "/usr/share/automake-1.16" },
//! }
//! ```
//!
//! Scripts see a global `host` table (`host.os`, `host.arch`) describing the
//! machine they run on, so a profile can default to the host.

use std::collections::BTreeMap;
use std::path::Path;

use mlua::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::options::OptionSet;
use crate::platform::{Os, PlatformDescriptor};
use crate::settings::{ConfigError, Settings};

#[derive(Debug, Error)]
pub enum ProfileError {
  #[error("cannot read profile {path}: {message}")]
  Read { path: String, message: String },

  #[error("lua error in profile: {0}")]
  Lua(String),

  #[error("invalid profile: {0}")]
  Invalid(String),
}

fn lua_err(e: LuaError) -> ProfileError {
  ProfileError::Lua(e.to_string())
}

/// Settings, options and environment overrides from one profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
  pub settings: Settings,
  pub options: BTreeMap<String, bool>,
  pub env: BTreeMap<String, String>,
}

impl Profile {
  /// Apply the profile's options on top of `options` for a build targeting `os`.
  pub fn apply_options(&self, os: Os, options: &mut OptionSet) -> Result<(), ConfigError> {
    for (name, value) in &self.options {
      options.set(os, name, if *value { "true" } else { "false" })?;
    }
    Ok(())
  }
}

/// Evaluate the profile file at `path`.
pub fn load_profile(path: &Path) -> Result<Profile, ProfileError> {
  let source = std::fs::read_to_string(path).map_err(|e| ProfileError::Read {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  debug!(path = ?path, "loading profile");
  eval_profile(&source, &format!("@{}", path.display()))
}

/// Evaluate profile source code. `chunk_name` appears in Lua error messages.
pub fn eval_profile(source: &str, chunk_name: &str) -> Result<Profile, ProfileError> {
  let lua = Lua::new();
  register_host(&lua).map_err(lua_err)?;

  let root = match lua.load(source).set_name(chunk_name).eval::<LuaValue>().map_err(lua_err)? {
    LuaValue::Table(root) => root,
    other => {
      return Err(ProfileError::Invalid(format!(
        "profile must return a table, got {}",
        other.type_name()
      )));
    }
  };

  let mut profile = Profile::default();

  if let Some(settings) = section(&root, "settings")? {
    for pair in settings.pairs::<String, LuaValue>() {
      let (key, value) = pair.map_err(lua_err)?;
      match value {
        LuaValue::Table(compiler) if key == "compiler" => {
          if let Some(name) = optional_string(&compiler, "name", "settings.compiler.name")? {
            profile.settings.set("compiler", &name);
          }
          if let Some(version) = optional_string(&compiler, "version", "settings.compiler.version")? {
            profile.settings.set("compiler.version", &version);
          }
        }
        other => {
          let text = expect_string(other, &format!("settings.{}", key))?;
          profile.settings.set(&key, &text);
        }
      }
    }
  }

  if let Some(options) = section(&root, "options")? {
    for pair in options.pairs::<String, LuaValue>() {
      let (name, value) = pair.map_err(lua_err)?;
      match value {
        LuaValue::Boolean(flag) => {
          profile.options.insert(name, flag);
        }
        other => {
          return Err(ProfileError::Invalid(format!(
            "options.{} must be a boolean, got {}",
            name,
            other.type_name()
          )));
        }
      }
    }
  }

  if let Some(env) = section(&root, "env")? {
    for pair in env.pairs::<String, LuaValue>() {
      let (key, value) = pair.map_err(lua_err)?;
      let text = expect_string(value, &format!("env.{}", key))?;
      profile.env.insert(key, text);
    }
  }

  Ok(profile)
}

fn register_host(lua: &Lua) -> LuaResult<()> {
  let host = lua.create_table()?;
  if let Some(platform) = PlatformDescriptor::host() {
    host.set("os", platform.os.as_str())?;
    host.set("arch", platform.arch.as_str())?;
  }
  lua.globals().set("host", host)
}

fn section(root: &LuaTable, name: &str) -> Result<Option<LuaTable>, ProfileError> {
  match root.get::<LuaValue>(name).map_err(lua_err)? {
    LuaValue::Nil => Ok(None),
    LuaValue::Table(table) => Ok(Some(table)),
    other => Err(ProfileError::Invalid(format!(
      "{} must be a table, got {}",
      name,
      other.type_name()
    ))),
  }
}

fn optional_string(table: &LuaTable, key: &str, label: &str) -> Result<Option<String>, ProfileError> {
  match table.get::<LuaValue>(key).map_err(lua_err)? {
    LuaValue::Nil => Ok(None),
    value => expect_string(value, label).map(Some),
  }
}

fn expect_string(value: LuaValue, label: &str) -> Result<String, ProfileError> {
  match value {
    LuaValue::String(s) => {
      let text: &str = &s.to_str().map_err(lua_err)?;
      Ok(text.to_string())
    }
    other => Err(ProfileError::Invalid(format!(
      "{} must be a string, got {}",
      label,
      other.type_name()
    ))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn full_profile_round_trips_into_settings() {
    let profile = eval_profile(
      r#"
      return {
        settings = {
          os = "Windows",
          arch = "x86_64",
          compiler = { name = "Visual Studio", version = "16" },
          build_type = "Release",
        },
        options = { shared = true },
        env = { AUTOMAKE_PERLLIBDIR = "/mnt/c/automake" },
      }
      "#,
      "test",
    )
    .unwrap();

    assert_eq!(profile.settings.get("os"), Some("Windows"));
    assert_eq!(profile.settings.get("compiler"), Some("Visual Studio"));
    assert_eq!(profile.settings.get("compiler.version"), Some("16"));
    assert_eq!(profile.settings.get("build_type"), Some("Release"));
    assert_eq!(profile.options.get("shared"), Some(&true));
    assert_eq!(
      profile.env.get("AUTOMAKE_PERLLIBDIR").map(String::as_str),
      Some("/mnt/c/automake")
    );
  }

  #[test]
  fn sections_are_optional() {
    let profile = eval_profile("return {}", "test").unwrap();
    assert_eq!(profile, Profile::default());
  }

  #[test]
  fn host_global_is_available() {
    let profile = eval_profile(
      "return { settings = { os = host.os or 'Linux', arch = host.arch or 'x86_64' } }",
      "test",
    )
    .unwrap();
    assert!(profile.settings.get("os").is_some());
    assert!(profile.settings.get("arch").is_some());
  }

  #[test]
  fn non_string_setting_is_rejected() {
    let err = eval_profile("return { settings = { os = 'Linux', arch = 64 } }", "test").unwrap_err();
    assert!(matches!(err, ProfileError::Invalid(msg) if msg.contains("settings.arch")));
  }

  #[test]
  fn numeric_compiler_version_is_rejected() {
    let err = eval_profile(
      "return { settings = { compiler = { name = 'gcc', version = 9 } } }",
      "test",
    )
    .unwrap_err();
    assert!(matches!(err, ProfileError::Invalid(msg) if msg.contains("compiler.version")));
  }

  #[test]
  fn non_table_return_is_rejected() {
    assert!(matches!(eval_profile("return 42", "test"), Err(ProfileError::Invalid(_))));
  }

  #[test]
  fn lua_syntax_error_is_reported() {
    assert!(matches!(eval_profile("return {", "test"), Err(ProfileError::Lua(_))));
  }

  #[test]
  fn options_apply_to_option_set() {
    let profile = eval_profile("return { options = { shared = true, fPIC = false } }", "test").unwrap();
    let mut options = OptionSet::default();
    profile.apply_options(Os::Linux, &mut options).unwrap();
    assert!(options.shared);
    assert!(!options.fpic);
  }

  #[test]
  fn unknown_option_is_a_config_error() {
    let profile = eval_profile("return { options = { lto = true } }", "test").unwrap();
    let mut options = OptionSet::default();
    assert_eq!(
      profile.apply_options(Os::Linux, &mut options),
      Err(ConfigError::UnknownOption("lto".to_string()))
    );
  }

  #[test]
  fn windows_profile_cannot_set_fpic() {
    let profile = eval_profile("return { options = { fPIC = true } }", "test").unwrap();
    let mut options = OptionSet::default();
    assert!(matches!(
      profile.apply_options(Os::Windows, &mut options),
      Err(ConfigError::UndeclaredOption { .. })
    ));
  }

  #[test]
  fn load_profile_reads_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("linux.lua");
    std::fs::write(&path, "return { settings = { os = 'Linux', arch = 'x86' } }").unwrap();

    let profile = load_profile(&path).unwrap();
    assert_eq!(profile.settings.get("arch"), Some("x86"));
  }

  #[test]
  fn missing_file_is_read_error() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
      load_profile(&temp.path().join("missing.lua")),
      Err(ProfileError::Read { .. })
    ));
  }
}
