//! Toolchain argument assembly.
//!
//! Turns a `PlatformDescriptor` and an `OptionSet` into `BuildArguments`.
//! Compiler-specific behaviour is data: a `ToolchainTable` maps compiler
//! identity to a `ToolchainBundle`, and host triples come from a lookup table.
//! Adding a toolchain means adding table entries, not branches here.

mod types;

use std::collections::BTreeMap;

use tracing::debug;

pub use types::{
  Activation, BuildArguments, BuildArgumentsBuilder, ConfigureSpec, EnvNormalizer, HostTriple, RequiredEnv,
  ToolchainBundle, ToolchainTable,
};

use crate::execute::EnvSource;
use crate::options::OptionSet;
use crate::patch::PatchSet;
use crate::placeholder::{self, PlaceholderError, Resolver};
use crate::platform::PlatformDescriptor;
use crate::settings::ConfigError;

/// Assemble configure tokens and environment overrides.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnv` if the active toolchain bundle requires
/// an environment variable that `env` does not provide, and
/// `ConfigError::Placeholder` if a bundle token cannot be resolved.
pub fn build_arguments(
  spec: &ConfigureSpec,
  platform: &PlatformDescriptor,
  options: &OptionSet,
  env: &impl EnvSource,
) -> Result<BuildArguments, ConfigError> {
  let options = options.pruned_for(platform.os);
  let mut args = BuildArgumentsBuilder::new();

  args.tokens(&spec.base_tokens);

  if platform.os.supports_pic() && options.fpic {
    args.token("--with-pic");
  }

  if options.shared {
    args.tokens(["--disable-static", "--enable-shared"]);
  } else {
    args.tokens(["--disable-shared", "--enable-static"]);
  }

  if let Some(triple) = host_triple(&spec.host_triples, platform) {
    args.host(triple);
  }

  if let Some(bundle) = spec.toolchains.get(&platform.compiler) {
    debug!(compiler = %platform.compiler, "applying toolchain bundle");
    apply_bundle(&mut args, bundle, platform, env)?;
  }

  Ok(args.finish())
}

/// Look up the host triple override for `platform`.
///
/// The most specific matching entry wins; no match means "use the default".
pub fn host_triple<'a>(entries: &'a [HostTriple], platform: &PlatformDescriptor) -> Option<&'a str> {
  entries
    .iter()
    .filter_map(|entry| entry.specificity(platform).map(|score| (score, entry)))
    .max_by_key(|(score, _)| *score)
    .map(|(_, entry)| entry.triple.as_str())
}

/// Patches the active toolchain bundle needs, if any.
pub fn toolchain_patches(spec: &ConfigureSpec, platform: &PlatformDescriptor) -> PatchSet {
  spec
    .toolchains
    .get(&platform.compiler)
    .map(|bundle| bundle.patches.clone())
    .unwrap_or_default()
}

fn apply_bundle(
  args: &mut BuildArgumentsBuilder,
  bundle: &ToolchainBundle,
  platform: &PlatformDescriptor,
  env: &impl EnvSource,
) -> Result<(), ConfigError> {
  let resolver = BundleEnv::collect(bundle, platform, env)?;

  for (key, value) in &bundle.env {
    args.env(key, value);
  }

  for token in &bundle.tokens {
    args.token(placeholder::substitute(token, &resolver)?);
  }

  if let Some((_, rc)) = bundle.resource_compilers.iter().find(|(arch, _)| *arch == platform.arch) {
    args.token(format!("RC={}", rc));
    args.token(format!("WINDRES={}", rc));
  }

  args
    .defines(&bundle.defines)
    .flags(&bundle.flags)
    .activation(bundle.activation);

  Ok(())
}

/// Placeholder resolver over the bundle's required (normalised) variables,
/// falling back to the caller's environment.
struct BundleEnv<'a, E: EnvSource> {
  required: BTreeMap<String, String>,
  fallback: &'a E,
}

impl<'a, E: EnvSource> BundleEnv<'a, E> {
  fn collect(bundle: &ToolchainBundle, platform: &PlatformDescriptor, env: &'a E) -> Result<Self, ConfigError> {
    let mut required = BTreeMap::new();
    for var in &bundle.required_env {
      let value = env
        .var(&var.name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingEnv {
          var: var.name.clone(),
          compiler: platform.compiler.to_string(),
        })?;
      required.insert(var.name.clone(), var.normalizer.apply(&value));
    }
    Ok(Self {
      required,
      fallback: env,
    })
  }
}

impl<E: EnvSource> Resolver for BundleEnv<'_, E> {
  fn resolve_env(&self, name: &str) -> Result<String, PlaceholderError> {
    self
      .required
      .get(name)
      .cloned()
      .or_else(|| self.fallback.var(name))
      .ok_or_else(|| PlaceholderError::UnresolvedEnv(name.to_string()))
  }
}
