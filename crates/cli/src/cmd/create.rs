//! Implementation of the `vinfo create` command.
//!
//! Writes a fresh manifest with one build. Fields the caller does not know
//! yet get placeholder values that later tooling overwrites.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use vinfo_lib::{Manifest, NewBuild};

use crate::output::{print_stat, print_success};

const SUBPRODUCT: &str = "SIF";
const COMPILER_TARGET: &str = "None";
const LICENSE_MODEL: &str = "None";
const FORMAT: &str = "Folder";
const PLATFORM: &str = "independent";
const LANG: &str = "mul";

pub fn cmd_create(product: &str, version: &str, build: &str, output: &Path, encoding: &str) -> Result<()> {
  if output.exists() {
    fs::remove_file(output).with_context(|| format!("Failed to replace {}", output.display()))?;
  }

  let datetime = Local::now().format("%Y/%m/%d:%H:%M:%S").to_string();
  let mut manifest = Manifest::new();
  manifest.add_build(NewBuild {
    product,
    version,
    subproduct: SUBPRODUCT,
    build,
    datetime: &datetime,
    compiler_target: COMPILER_TARGET,
    license_model: LICENSE_MODEL,
    format: FORMAT,
    platform: PLATFORM,
    lang: LANG,
  });
  manifest
    .save(output, encoding)
    .with_context(|| format!("Failed to write manifest: {}", output.display()))?;

  let written = dunce::canonicalize(output).unwrap_or_else(|_| output.to_path_buf());
  print_success(&format!("Created {}", written.display()));
  print_stat("Build", &format!("{} {} {}", product, version, build));
  print_stat("Date", &datetime);
  Ok(())
}
