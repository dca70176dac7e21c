//! File transfer to and from artifact locations.
//!
//! SMB and AFP locations are served by [`MountedShare`], which mounts the
//! share volume and then works on the local mount point. Remote paths are
//! always `/`-separated and relative to the current directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{Location, Protocol, TransportError};
use crate::config::Credentials;
use crate::mount::VolumeMounter;

/// How a location is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
  /// Missing directories are errors; uploads are refused.
  Read,
  /// Missing directories are created.
  Write,
}

/// A connection to a remote location.
pub trait RemoteTransport {
  /// The location this transport was opened on.
  fn location(&self) -> &Location;

  /// Names of the entries in the current directory, sorted.
  fn list_directory(&self) -> Result<Vec<String>, TransportError>;

  /// Move to `path` relative to the current directory, or back to the
  /// location root for `None`.
  fn change_directory(&mut self, path: Option<&str>) -> Result<(), TransportError>;

  /// Current directory relative to the location root, e.g. `/` or `/a/b`.
  fn current_directory(&self) -> String;

  /// Copy `remote` (file or directory) to `local`, replacing whatever is
  /// there. Returns the number of files copied.
  fn download(&self, remote: &str, local: &Path) -> Result<usize, TransportError>;

  /// Copy `local` (file or directory) to `remote`, replacing whatever is
  /// there. Returns the number of files copied.
  fn upload(&mut self, local: &Path, remote: &str) -> Result<usize, TransportError>;

  /// Release the connection. Further calls are no-ops.
  fn close(&mut self) -> Result<(), TransportError>;
}

/// Open `uri` with the transport matching its protocol.
pub fn open_location<M>(
  uri: &str,
  mode: AccessMode,
  credentials: &Credentials,
  mounter: M,
) -> Result<Box<dyn RemoteTransport>, TransportError>
where
  M: VolumeMounter + 'static,
{
  let location = Location::parse(uri)?;
  match location.protocol()? {
    Protocol::Smb | Protocol::Afp => Ok(Box::new(MountedShare::open(location, mode, credentials, mounter)?)),
    Protocol::Ftp => Err(TransportError::Unsupported("ftp transfer".to_string())),
  }
}

/// A share volume mounted on the local filesystem.
pub struct MountedShare<M: VolumeMounter> {
  location: Location,
  mode: AccessMode,
  mounter: M,
  mount_point: PathBuf,
  root: PathBuf,
  /// Current directory relative to `root`.
  current: Vec<String>,
  closed: bool,
}

impl<M: VolumeMounter> MountedShare<M> {
  /// Mount the location's volume and root the transport at its sub-path.
  pub fn open(
    location: Location,
    mode: AccessMode,
    credentials: &Credentials,
    mut mounter: M,
  ) -> Result<Self, TransportError> {
    let mount_point = mounter.connect(&location.server_path(), credentials)?;
    let root = join_remote(&mount_point, location.share().1);

    if let Err(err) = ensure_dir(&root, mode) {
      if let Err(disconnect_err) = mounter.disconnect(&mount_point) {
        warn!(error = %disconnect_err, "failed to release mount after open error");
      }
      return Err(err);
    }

    info!(location = %location, root = ?root, "opened share");
    Ok(Self {
      location,
      mode,
      mounter,
      mount_point,
      root,
      current: Vec::new(),
      closed: false,
    })
  }

  pub fn mode(&self) -> AccessMode {
    self.mode
  }

  /// Local directory the transport is rooted at.
  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn mounter(&self) -> &M {
    &self.mounter
  }

  fn current_path(&self) -> PathBuf {
    self.current.iter().fold(self.root.clone(), |path, part| path.join(part))
  }
}

impl<M: VolumeMounter> RemoteTransport for MountedShare<M> {
  fn location(&self) -> &Location {
    &self.location
  }

  fn list_directory(&self) -> Result<Vec<String>, TransportError> {
    let dir = self.current_path();
    let entries = fs::read_dir(&dir).map_err(|source| TransportError::Io {
      path: dir.clone(),
      source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|source| TransportError::Io {
        path: dir.clone(),
        source,
      })?;
      names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
  }

  fn change_directory(&mut self, path: Option<&str>) -> Result<(), TransportError> {
    let Some(path) = path else {
      self.current.clear();
      return Ok(());
    };

    let mut next = self.current.clone();
    for part in path.split(['/', '\\']) {
      match part {
        "" | "." => {}
        ".." => {
          next.pop();
        }
        name => next.push(name.to_string()),
      }
    }
    let target = next.iter().fold(self.root.clone(), |p, part| p.join(part));
    ensure_dir(&target, self.mode)?;
    debug!(directory = ?target, "changed directory");
    self.current = next;
    Ok(())
  }

  fn current_directory(&self) -> String {
    format!("/{}", self.current.join("/"))
  }

  fn download(&self, remote: &str, local: &Path) -> Result<usize, TransportError> {
    let source = join_remote(&self.current_path(), remote);
    if !source.exists() {
      return Err(TransportError::BadPath(source));
    }
    let copied = copy_tree(&source, local)?;
    info!(remote = %remote, local = ?local, files = copied, "downloaded");
    Ok(copied)
  }

  fn upload(&mut self, local: &Path, remote: &str) -> Result<usize, TransportError> {
    if self.mode == AccessMode::Read {
      return Err(TransportError::ReadOnly);
    }
    if !local.exists() {
      return Err(TransportError::BadPath(local.to_path_buf()));
    }
    let destination = join_remote(&self.current_path(), remote);
    let copied = copy_tree(local, &destination)?;
    info!(local = ?local, remote = %remote, files = copied, "uploaded");
    Ok(copied)
  }

  fn close(&mut self) -> Result<(), TransportError> {
    if self.closed {
      return Ok(());
    }
    self.closed = true;
    self.mounter.disconnect(&self.mount_point)?;
    debug!(location = %self.location, "closed share");
    Ok(())
  }
}

impl<M: VolumeMounter> Drop for MountedShare<M> {
  fn drop(&mut self) {
    if let Err(err) = self.close() {
      warn!(error = %err, "failed to release mount");
    }
  }
}

/// Join a `/`-separated remote path onto a local directory.
fn join_remote(base: &Path, remote: &str) -> PathBuf {
  remote
    .split(['/', '\\'])
    .filter(|part| !part.is_empty() && *part != ".")
    .fold(base.to_path_buf(), |path, part| path.join(part))
}

/// Check that `dir` is a directory, creating it when writing.
fn ensure_dir(dir: &Path, mode: AccessMode) -> Result<(), TransportError> {
  if dir.is_dir() {
    return Ok(());
  }
  match mode {
    AccessMode::Read => Err(TransportError::BadPath(dir.to_path_buf())),
    AccessMode::Write => fs::create_dir_all(dir).map_err(|_| TransportError::BadPath(dir.to_path_buf())),
  }
}

/// Remove a file or directory tree if present.
fn remove_existing(path: &Path) -> Result<(), TransportError> {
  let result = match fs::symlink_metadata(path) {
    Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
    Ok(_) => fs::remove_file(path),
    Err(_) => return Ok(()),
  };
  result.map_err(|source| TransportError::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// Copy a file or directory tree to `dst`, replacing `dst`.
fn copy_tree(src: &Path, dst: &Path) -> Result<usize, TransportError> {
  let io_err = |path: &Path| {
    let path = path.to_path_buf();
    move |source| TransportError::Io { path, source }
  };

  remove_existing(dst)?;
  if let Some(parent) = dst.parent() {
    fs::create_dir_all(parent).map_err(io_err(parent))?;
  }

  if src.is_file() {
    fs::copy(src, dst).map_err(io_err(dst))?;
    return Ok(1);
  }

  let mut copied = 0;
  for entry in WalkDir::new(src) {
    let entry = entry.map_err(|e| TransportError::Walk {
      path: src.to_path_buf(),
      message: e.to_string(),
    })?;
    let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
    let target = dst.join(relative);
    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).map_err(io_err(target.as_path()))?;
    } else {
      fs::copy(entry.path(), &target).map_err(io_err(target.as_path()))?;
      copied += 1;
    }
  }
  Ok(copied)
}
