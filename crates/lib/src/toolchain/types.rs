use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::patch::PatchSet;
use crate::platform::{Arch, Compiler, Os, PlatformDescriptor};

/// How a required environment variable's value is cleaned up before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnvNormalizer {
  /// Use the value as is.
  Verbatim,
  /// Turn a WSL mount path (`/mnt/c/...`) into an msys path (`/c/...`).
  StripMountPrefix,
}

impl EnvNormalizer {
  pub fn apply(&self, value: &str) -> String {
    match self {
      Self::Verbatim => value.to_string(),
      Self::StripMountPrefix => match value.strip_prefix("/mnt") {
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => value.to_string(),
      },
    }
  }
}

/// An environment variable a toolchain bundle cannot work without.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredEnv {
  pub name: String,
  pub normalizer: EnvNormalizer,
}

/// Vendor developer environments that can be captured as an env layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Activation {
  /// The MSVC developer prompt (`vcvarsall.bat <arch>`).
  VsDevEnv,
}

/// Everything substituted when building with one compiler vendor.
#[derive(Debug, Clone, Default)]
pub struct ToolchainBundle {
  pub required_env: Vec<RequiredEnv>,
  /// Environment overrides for the child processes.
  pub env: BTreeMap<String, String>,
  /// Configure tokens; may contain `$${env:NAME}` placeholders.
  pub tokens: Vec<String>,
  /// Preprocessor defines (`name=value`), passed through `CPPFLAGS`.
  pub defines: Vec<String>,
  /// Compiler flags, passed through `CFLAGS`/`CXXFLAGS`.
  pub flags: Vec<String>,
  /// Resource compiler command per architecture, emitted as `RC=`/`WINDRES=`.
  pub resource_compilers: Vec<(Arch, String)>,
  /// Source patches this toolchain needs.
  pub patches: PatchSet,
  pub activation: Option<Activation>,
}

/// Compiler identity to override bundle.
#[derive(Debug, Clone, Default)]
pub struct ToolchainTable(HashMap<Compiler, ToolchainBundle>);

impl ToolchainTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, compiler: Compiler, bundle: ToolchainBundle) -> Self {
    self.0.insert(compiler, bundle);
    self
  }

  pub fn get(&self, compiler: &Compiler) -> Option<&ToolchainBundle> {
    self.0.get(compiler)
  }

  pub fn values(&self) -> impl Iterator<Item = &ToolchainBundle> {
    self.0.values()
  }
}

/// One host-triple entry; `None` fields match anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTriple {
  pub os: Option<Os>,
  pub arch: Arch,
  pub compiler: Option<Compiler>,
  pub triple: String,
}

impl HostTriple {
  pub fn new(os: Option<Os>, arch: Arch, compiler: Option<Compiler>, triple: &str) -> Self {
    Self {
      os,
      arch,
      compiler,
      triple: triple.to_string(),
    }
  }

  /// How many constrained fields match, or `None` if any constraint fails.
  pub(crate) fn specificity(&self, platform: &PlatformDescriptor) -> Option<usize> {
    if self.arch != platform.arch {
      return None;
    }
    let mut score = 1;
    if let Some(os) = self.os {
      if os != platform.os {
        return None;
      }
      score += 1;
    }
    if let Some(compiler) = &self.compiler {
      if *compiler != platform.compiler {
        return None;
      }
      // A compiler match outranks an os match
      score += 2;
    }
    Some(score)
  }
}

/// What the argument builder needs to know about a recipe.
#[derive(Debug, Clone, Default)]
pub struct ConfigureSpec {
  /// Tokens passed on every platform.
  pub base_tokens: Vec<String>,
  pub toolchains: ToolchainTable,
  pub host_triples: Vec<HostTriple>,
}

/// Configure tokens plus environment overrides for one build.
///
/// Only `BuildArgumentsBuilder` can add to it; once built it is read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildArguments {
  tokens: Vec<String>,
  env: BTreeMap<String, String>,
  host: Option<String>,
  defines: Vec<String>,
  flags: Vec<String>,
  activation: Option<Activation>,
}

impl BuildArguments {
  pub fn tokens(&self) -> &[String] {
    &self.tokens
  }

  pub fn env(&self) -> &BTreeMap<String, String> {
    &self.env
  }

  /// Host triple override, if the platform needs one.
  pub fn host(&self) -> Option<&str> {
    self.host.as_deref()
  }

  pub fn defines(&self) -> &[String] {
    &self.defines
  }

  pub fn flags(&self) -> &[String] {
    &self.flags
  }

  pub fn activation(&self) -> Option<Activation> {
    self.activation
  }

  pub fn contains(&self, token: &str) -> bool {
    self.tokens.iter().any(|t| t == token)
  }

  /// Full configure command line (after `./configure`).
  pub fn configure_args(&self, prefix: &str) -> Vec<String> {
    let mut args = self.tokens.clone();
    args.push(format!("--prefix={}", prefix));
    if let Some(host) = &self.host {
      args.push(format!("--host={}", host));
    }
    args
  }

  /// `CPPFLAGS` fragment for the defines (`-Dname=value ...`).
  pub fn cppflags(&self) -> Option<String> {
    if self.defines.is_empty() {
      return None;
    }
    Some(self.defines.iter().map(|d| format!("-D{}", d)).collect::<Vec<_>>().join(" "))
  }

  /// `CFLAGS`/`CXXFLAGS` fragment for the compiler flags.
  pub fn cflags(&self) -> Option<String> {
    if self.flags.is_empty() { None } else { Some(self.flags.join(" ")) }
  }
}

/// Append-only construction of `BuildArguments`.
#[derive(Debug, Default)]
pub struct BuildArgumentsBuilder {
  inner: BuildArguments,
}

impl BuildArgumentsBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn token(&mut self, token: impl Into<String>) -> &mut Self {
    self.inner.tokens.push(token.into());
    self
  }

  pub fn tokens<I, S>(&mut self, tokens: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.inner.tokens.extend(tokens.into_iter().map(Into::into));
    self
  }

  /// Add an environment override. Later values for the same key win.
  pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
    self.inner.env.insert(key.to_string(), value.to_string());
    self
  }

  pub fn host(&mut self, triple: &str) -> &mut Self {
    self.inner.host = Some(triple.to_string());
    self
  }

  pub fn defines(&mut self, defines: &[String]) -> &mut Self {
    self.inner.defines.extend_from_slice(defines);
    self
  }

  pub fn flags(&mut self, flags: &[String]) -> &mut Self {
    self.inner.flags.extend_from_slice(flags);
    self
  }

  pub fn activation(&mut self, activation: Option<Activation>) -> &mut Self {
    self.inner.activation = activation;
    self
  }

  pub fn finish(self) -> BuildArguments {
    self.inner
  }
}
