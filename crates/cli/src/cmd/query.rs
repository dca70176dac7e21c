//! Read-only projections: `versions`, `dates`, `target` and `files`.
//!
//! Each accepts a manifest path or inline XML and prints one value per line.

use anyhow::{Context, Result};

use vinfo_lib::Manifest;

fn load(source: &str) -> Result<Manifest> {
  Manifest::from_source(source).with_context(|| format!("Failed to read manifest: {}", source))
}

pub fn cmd_versions(source: &str, product: Option<&str>) -> Result<()> {
  for version in load(source)?.version_strings(product) {
    println!("{}", version);
  }
  Ok(())
}

pub fn cmd_dates(source: &str, product: Option<&str>) -> Result<()> {
  for date in load(source)?.version_dates(product) {
    println!("{}", date);
  }
  Ok(())
}

pub fn cmd_target(source: &str) -> Result<()> {
  if let Some(target) = load(source)?.target() {
    println!("{}", target);
  }
  Ok(())
}

pub fn cmd_files(source: &str) -> Result<()> {
  let manifest = load(source)?;
  let Some(build) = manifest.first_build() else {
    return Ok(());
  };
  for file in build.files() {
    match file.size {
      Some(size) => println!("{}\t{}\t{}", file.name, file.checksum, size),
      None => println!("{}\t{}", file.name, file.checksum),
    }
  }
  Ok(())
}
