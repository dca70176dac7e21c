//! Network volume mounting.
//!
//! [`VolumeMounter`] attaches a `//server/volume` share to a local path.
//! [`SystemMounter`] does this with the platform's own tools:
//! - Windows: `net use`, mapping the share to a free drive letter
//! - macOS: `mount_smbfs` / `mount_afp` under `/Volumes`
//!
//! Shares that are already mounted are reused and never unmounted by us.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::location::{Protocol, TransportError};

/// Drive letters tried for new Windows mappings, in order.
pub const DRIVE_LETTERS: [&str; 9] = ["Z:", "Y:", "X:", "W:", "V:", "U:", "T:", "S:", "R:"];

/// Attaches network shares to the local filesystem.
pub trait VolumeMounter {
  /// Mount `server_path` (`//server/volume`) and return the local path it
  /// is reachable at.
  fn connect(&mut self, server_path: &str, credentials: &Credentials) -> Result<PathBuf, TransportError>;

  /// Detach a mount returned by [`VolumeMounter::connect`].
  ///
  /// Returns `false` when nothing was unmounted.
  fn disconnect(&mut self, local_path: &Path) -> Result<bool, TransportError>;
}

/// Mounts shares using the operating system's command-line tools.
#[derive(Debug)]
pub struct SystemMounter {
  protocol: Protocol,
  /// Mounts this instance created, and is therefore allowed to remove.
  added: Vec<PathBuf>,
}

impl SystemMounter {
  pub fn new(protocol: Protocol) -> Self {
    Self {
      protocol,
      added: Vec::new(),
    }
  }

  pub fn protocol(&self) -> Protocol {
    self.protocol
  }

  #[cfg(windows)]
  fn find_or_mount(&self, server_path: &str, credentials: &Credentials) -> Result<(PathBuf, bool), TransportError> {
    let unc = server_path.replace('/', "\\");
    let listing = run("net", &["use"])?;

    let mut used = Vec::new();
    for (drive, remote) in listing.lines().filter_map(parse_net_use_line) {
      if remote.eq_ignore_ascii_case(&unc) {
        return Ok((PathBuf::from(format!("{}\\", drive)), false));
      }
      used.push(drive);
    }

    let drive = free_drive(&used).ok_or_else(|| TransportError::Mount {
      server_path: server_path.to_string(),
      message: "no free drive letter".to_string(),
    })?;
    let user = format!("/USER:{}", credentials.qualified_username());
    let output = run("net", &["use", drive, &unc, credentials.password(), &user])?;
    if !output.contains("completed successfully") {
      return Err(TransportError::Mount {
        server_path: server_path.to_string(),
        message: output.trim().to_string(),
      });
    }
    Ok((PathBuf::from(format!("{}\\", drive)), true))
  }

  #[cfg(target_os = "macos")]
  fn find_or_mount(&self, server_path: &str, credentials: &Credentials) -> Result<(PathBuf, bool), TransportError> {
    let share = server_path.trim_start_matches('/');
    let listing = run("/bin/df", &[])?;
    if let Some(existing) = listing.lines().find_map(|line| parse_df_line(line, share)) {
      return Ok((existing, false));
    }

    let local = default_mount_point(server_path);
    std::fs::create_dir_all(&local).map_err(|source| TransportError::Io {
      path: local.clone(),
      source,
    })?;

    let login = format!("{}:{}", credentials.username(), credentials.password());
    let local_arg = local.to_string_lossy();
    let output = match self.protocol {
      Protocol::Smb => run("/sbin/mount_smbfs", &[&format!("//{}@{}", login, share), &local_arg])?,
      Protocol::Afp => run("/sbin/mount_afp", &[&format!("afp://{}@{}", login, share), &local_arg])?,
      Protocol::Ftp => return Err(TransportError::Unsupported("mounting ftp locations".to_string())),
    };
    if output.to_ascii_lowercase().contains("fail") {
      return Err(TransportError::Mount {
        server_path: server_path.to_string(),
        message: output.trim().to_string(),
      });
    }
    Ok((local, true))
  }

  #[cfg(not(any(windows, target_os = "macos")))]
  fn find_or_mount(&self, _server_path: &str, _credentials: &Credentials) -> Result<(PathBuf, bool), TransportError> {
    Err(TransportError::Unsupported(format!(
      "mounting {} shares on this platform",
      self.protocol
    )))
  }

  #[cfg(windows)]
  fn unmount(&self, local_path: &Path) -> Result<bool, TransportError> {
    let drive = local_path.to_string_lossy();
    let output = run("net", &["use", drive.trim_end_matches('\\'), "/delete"])?;
    Ok(output.contains("deleted successfully"))
  }

  #[cfg(not(windows))]
  fn unmount(&self, local_path: &Path) -> Result<bool, TransportError> {
    run("umount", &[&local_path.to_string_lossy()])?;
    Ok(true)
  }
}

impl VolumeMounter for SystemMounter {
  fn connect(&mut self, server_path: &str, credentials: &Credentials) -> Result<PathBuf, TransportError> {
    if self.protocol == Protocol::Ftp {
      return Err(TransportError::Unsupported("mounting ftp locations".to_string()));
    }

    let (local, created) = self.find_or_mount(server_path, credentials)?;
    if created {
      info!(server_path = %server_path, local = ?local, "mounted share");
      self.added.push(local.clone());
    } else {
      debug!(server_path = %server_path, local = ?local, "reusing existing mount");
    }
    Ok(local)
  }

  fn disconnect(&mut self, local_path: &Path) -> Result<bool, TransportError> {
    let Some(index) = self.added.iter().position(|p| p == local_path) else {
      debug!(local = ?local_path, "leaving mount we did not create");
      return Ok(false);
    };
    let removed = self.unmount(local_path)?;
    if removed {
      info!(local = ?local_path, "unmounted share");
      self.added.remove(index);
    } else {
      warn!(local = ?local_path, "unmount did not report success");
    }
    Ok(removed)
  }
}

/// Run a command and return its combined stdout and stderr.
fn run(program: &str, args: &[&str]) -> Result<String, TransportError> {
  debug!(program = %program, "running mount command");
  let output = Command::new(program)
    .args(args)
    .output()
    .map_err(|source| TransportError::Command {
      command: program.to_string(),
      source,
    })?;
  let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
  text.push_str(&String::from_utf8_lossy(&output.stderr));
  if !output.status.success() {
    debug!(program = %program, status = ?output.status.code(), "mount command exited unsuccessfully");
  }
  Ok(text)
}

/// Parse one row of `net use` output into `(drive, remote)`.
///
/// Only rows with status `OK` and a drive letter are of interest, e.g.
/// `OK           Z:        \\server\builds     Microsoft Windows Network`.
pub fn parse_net_use_line(line: &str) -> Option<(String, String)> {
  let mut fields = line.split_whitespace();
  if fields.next()? != "OK" {
    return None;
  }
  let drive = fields.next()?;
  let is_drive = drive.len() == 2 && drive.ends_with(':') && drive.starts_with(|c: char| c.is_ascii_alphabetic());
  if !is_drive {
    return None;
  }
  let remote = fields.next()?;
  Some((drive.to_ascii_uppercase(), remote.to_string()))
}

/// First letter from [`DRIVE_LETTERS`] not already in `used`.
pub fn free_drive(used: &[String]) -> Option<&'static str> {
  DRIVE_LETTERS
    .iter()
    .copied()
    .find(|letter| !used.iter().any(|u| u.eq_ignore_ascii_case(letter)))
}

/// Find the mount point of `share` (`server/volume`) in one line of `df`
/// output.
///
/// The device column shows `//user@server/volume` without the password and
/// in any case; the mount point is everything after the last `%` column.
pub fn parse_df_line(line: &str, share: &str) -> Option<PathBuf> {
  let device = line.split_whitespace().next()?;
  if !device.starts_with("//") {
    return None;
  }
  let device_share = device.trim_start_matches('/');
  let device_share = device_share.split_once('@').map_or(device_share, |(_, rest)| rest);
  let share = share.split_once('@').map_or(share, |(_, rest)| rest);
  if !device_share.eq_ignore_ascii_case(share) {
    return None;
  }

  let percent = line.rfind('%')?;
  let mount_point = line[percent + 1..].trim();
  if mount_point.is_empty() {
    return None;
  }
  Some(PathBuf::from(mount_point))
}

/// Default macOS mount point for `//server/volume`: `/Volumes/server/volume`.
pub fn default_mount_point(server_path: &str) -> PathBuf {
  let share = server_path.trim_start_matches('/');
  let share = share.split_once('@').map_or(share, |(_, rest)| rest);
  Path::new("/Volumes").join(share)
}
