//! Commands that modify the first build of an existing manifest.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use vinfo_lib::Manifest;

use crate::output::{print_success, print_warning};

pub struct ComponentOptions<'a> {
  pub product: Option<&'a str>,
  pub direct: bool,
  pub prune: bool,
}

fn load_target(path: &Path) -> Result<Manifest> {
  Manifest::load(path).with_context(|| format!("Failed to read manifest: {}", path.display()))
}

pub fn cmd_add_component(manifest_path: &Path, source_path: &Path, options: &ComponentOptions<'_>, encoding: &str) -> Result<()> {
  let mut manifest = load_target(manifest_path)?;
  let mut source =
    Manifest::load(source_path).with_context(|| format!("Failed to read component manifest: {}", source_path.display()))?;

  if options.prune {
    let removed = source.prune_components();
    debug!(removed, "pruned nested components");
  }

  let Some(build) = manifest.first_build_mut() else {
    bail!("{} has no build to add components to", manifest_path.display());
  };
  let added = if options.direct {
    build.add_direct_components(&source, options.product)
  } else {
    build.add_components(&source, options.product)
  };

  manifest
    .save(manifest_path, encoding)
    .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;

  if added == 0 {
    print_warning(&format!("No matching builds in {}", source_path.display()));
  } else {
    print_success(&format!("Added {} component(s) to {}", added, manifest_path.display()));
  }
  Ok(())
}

pub fn cmd_add_files(manifest_path: &Path, dir: &Path, encoding: &str) -> Result<()> {
  let mut manifest = load_target(manifest_path)?;
  let Some(build) = manifest.first_build_mut() else {
    bail!("{} has no build to record files in", manifest_path.display());
  };
  let count = build
    .add_files_from_dir(dir)
    .with_context(|| format!("Failed to scan {}", dir.display()))?;

  manifest
    .save(manifest_path, encoding)
    .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;
  print_success(&format!("Recorded {} file(s) from {}", count, dir.display()));
  Ok(())
}
