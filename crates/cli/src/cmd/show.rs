use anyhow::{Context, Result};

use vinfo_lib::{Build, Manifest};

use crate::output::{OutputFormat, format_bytes, print_info, print_json, print_stat, symbols};

pub fn cmd_show(source: &str, format: OutputFormat) -> Result<()> {
  let manifest = Manifest::from_source(source).with_context(|| format!("Failed to read manifest: {}", source))?;

  if format.is_json() {
    return print_json(&manifest);
  }

  print_info(&format!(
    "Manifest version {} with {} build(s)",
    manifest.version_attr().as_str(),
    manifest.builds(None).len()
  ));
  for build in manifest.builds(None) {
    println!();
    print_build(build, 0);
  }
  Ok(())
}

fn print_build(build: &Build, depth: usize) {
  let indent = "  ".repeat(depth);
  println!(
    "{}{} {} {} (schema {})",
    indent,
    symbols::ARROW,
    build.product(),
    build.fullversion(),
    build.schema()
  );
  print_stat(&format!("{}Date", indent), build.datetime());
  if let Some(target) = build.target() {
    print_stat(&format!("{}Target", indent), target);
  }
  if let Some(platform) = build.platform() {
    print_stat(&format!("{}Platform", indent), platform);
  }
  if !build.lang().is_empty() {
    print_stat(&format!("{}Languages", indent), build.lang());
  }
  for repo in build.repositories() {
    print_stat(&format!("{}Repository", indent), repo.uri());
  }
  for item in build.metadata_entries() {
    print_stat(&format!("{}{}", indent, item.key), &item.value);
  }
  if !build.files().is_empty() {
    let total: u64 = build.files().iter().filter_map(|f| f.size).sum();
    print_stat(
      &format!("{}Files", indent),
      &format!("{} ({})", build.files().len(), format_bytes(total)),
    );
  }
  for component in build.components() {
    print_build(component, depth + 1);
  }
  for component in build.direct_components() {
    print_build(component, depth + 1);
  }
}
