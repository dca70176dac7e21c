//! `fetch` and `publish`: copy artifacts from and to a location.

use std::path::Path;

use anyhow::{Context, Result};

use vinfo_lib::{AccessMode, Credentials, Location, SystemMounter, open_location};

use crate::output::{print_success, symbols};

pub fn cmd_fetch(uri: &str, remote: &str, local: &Path, credentials: &Credentials) -> Result<()> {
  let location = Location::parse(uri)?;
  let mounter = SystemMounter::new(location.protocol()?);
  let mut transport =
    open_location(uri, AccessMode::Read, credentials, mounter).with_context(|| format!("Failed to open {}", uri))?;

  let copied = transport.download(remote, local);
  transport.close()?;
  let copied = copied.with_context(|| format!("Failed to download {}", remote))?;

  print_success(&format!(
    "Fetched {} file(s): {} {} {}",
    copied,
    remote,
    symbols::ARROW,
    local.display()
  ));
  Ok(())
}

pub fn cmd_publish(uri: &str, local: &Path, remote: &str, credentials: &Credentials) -> Result<()> {
  let location = Location::parse(uri)?;
  let mounter = SystemMounter::new(location.protocol()?);
  let mut transport =
    open_location(uri, AccessMode::Write, credentials, mounter).with_context(|| format!("Failed to open {}", uri))?;

  let copied = transport.upload(local, remote);
  transport.close()?;
  let copied = copied.with_context(|| format!("Failed to upload {}", local.display()))?;

  print_success(&format!(
    "Published {} file(s): {} {} {}",
    copied,
    local.display(),
    symbols::ARROW,
    remote
  ));
  Ok(())
}
