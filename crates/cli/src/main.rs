mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use libforge_lib::recipe::DEFAULT_RECIPE;

/// forge - build autotools libraries for any platform from declarative recipes
#[derive(Parser)]
#[command(name = "forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Which recipe to build and for what.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
  /// Recipe name
  #[arg(default_value = DEFAULT_RECIPE)]
  pub recipe: String,

  /// Build setting as key=value (os, arch, compiler, compiler.version, ...)
  #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
  pub settings: Vec<String>,

  /// Build option as name=value (shared, fPIC)
  #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
  pub options: Vec<String>,

  /// Lua profile supplying settings, options and environment
  #[arg(long, value_name = "FILE")]
  pub profile: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Fetch, patch, configure, build, install and package a recipe
  Build {
    #[command(flatten)]
    target: TargetArgs,

    /// Work root (default: $LIBFORGE_ROOT or the cache directory)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Re-download and re-extract sources even if a source tree exists
    #[arg(long)]
    refetch: bool,

    /// Parallel make jobs
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show the configure arguments a build would use, without building
  Args {
    #[command(flatten)]
    target: TargetArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Download and unpack a recipe's sources
  Fetch {
    /// Recipe name
    #[arg(default_value = DEFAULT_RECIPE)]
    recipe: String,

    /// Work root (default: $LIBFORGE_ROOT or the cache directory)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Re-download and re-extract even if a source tree exists
    #[arg(long)]
    refetch: bool,
  },

  /// Display host platform information
  Info {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// List built-in recipes
  Recipes {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build {
      target,
      root,
      refetch,
      jobs,
      json,
    } => cmd::cmd_build(&target, root, refetch, jobs, json),
    Commands::Args { target, json } => cmd::cmd_args(&target, json),
    Commands::Fetch { recipe, root, refetch } => cmd::cmd_fetch(&recipe, root, refetch),
    Commands::Info { json } => cmd::cmd_info(json),
    Commands::Recipes { json } => cmd::cmd_recipes(json),
  }
}
