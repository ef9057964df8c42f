use anyhow::Result;

use libforge_lib::recipe;

use crate::output::{print_json, symbols};

pub fn cmd_recipes(json: bool) -> Result<()> {
  let mut recipes = Vec::new();
  for name in recipe::names() {
    recipes.push(recipe::builtin(name)?);
  }

  if json {
    let list: Vec<_> = recipes
      .iter()
      .map(|r| {
        serde_json::json!({
          "name": r.name,
          "version": r.version,
          "license": r.license,
          "homepage": r.homepage,
          "url": r.source.url,
        })
      })
      .collect();
    return print_json(&list);
  }

  for r in &recipes {
    println!("{} {} {}", symbols::INFO, r.id(), r.license);
    println!("    {}", r.description);
  }
  Ok(())
}
