use anyhow::Result;

use libforge_lib::platform::PlatformDescriptor;
use libforge_lib::platform::paths::{cache_dir, work_base_dir};

use crate::output::{print_json, print_stat, print_warning};

pub fn cmd_info(json: bool) -> Result<()> {
  let host = PlatformDescriptor::host();

  if json {
    return print_json(&serde_json::json!({
      "host": host,
      "cache_dir": cache_dir(),
      "work_dir": work_base_dir(),
    }));
  }

  println!("System:");
  match &host {
    Some(platform) => {
      print_stat("Platform", &platform.triple());
      print_stat("OS", platform.os.as_str());
      print_stat("Arch", platform.arch.as_str());
      print_stat("Compiler", platform.compiler.as_str());
    }
    None => print_warning("Could not detect platform."),
  }
  print_stat("Cache", &cache_dir().display().to_string());
  print_stat("Work root", &work_base_dir().display().to_string());
  Ok(())
}
