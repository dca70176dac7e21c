//! Artifact locations.
//!
//! Release tooling hands out locations as URIs such as
//! `smb://fileserver/builds/Product/1.0/win32`. [`Location`] splits those
//! into scheme, server, path and query; [`transport`] turns them into a
//! [`transport::RemoteTransport`].

pub mod transport;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Errors from locations, transports and volume mounts.
#[derive(Debug, Error)]
pub enum TransportError {
  #[error("protocol not recognized: {0}")]
  BadProtocol(String),

  #[error("{0} is not supported here")]
  Unsupported(String),

  #[error("path does not exist or cannot be created: {0}")]
  BadPath(PathBuf),

  #[error("cannot upload to a location opened read-only")]
  ReadOnly,

  #[error("could not mount {server_path}: {message}")]
  Mount { server_path: String, message: String },

  #[error("missing {name}; pass it explicitly or set {env}")]
  MissingCredentials { name: &'static str, env: &'static str },

  #[error("failed to run {command}: {source}")]
  Command {
    command: String,
    #[source]
    source: io::Error,
  },

  #[error("I/O error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to walk {path}: {message}")]
  Walk { path: PathBuf, message: String },
}

/// Transfer protocols a location can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
  Ftp,
  Smb,
  Afp,
}

impl Protocol {
  pub fn as_str(self) -> &'static str {
    match self {
      Protocol::Ftp => "ftp",
      Protocol::Smb => "smb",
      Protocol::Afp => "afp",
    }
  }
}

impl fmt::Display for Protocol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A parsed `scheme://server/path[?query|@query]` location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
  scheme: String,
  server: String,
  path: String,
  query: String,
}

impl Location {
  /// Split a location URI into its parts.
  ///
  /// - `scheme` is everything before the first `:`
  /// - slashes (either kind) after the colon are skipped
  /// - `server` runs up to the next `/`
  /// - a query starts at the first `?`, or failing that the first `@`
  /// - without a query, trailing slashes are trimmed from the path
  pub fn parse(uri: &str) -> Result<Self, TransportError> {
    let (scheme, rest) = uri
      .split_once(':')
      .ok_or_else(|| TransportError::BadProtocol(uri.to_string()))?;
    let rest = rest.trim_start_matches(['/', '\\']);

    let (server, rest) = rest.split_once('/').unwrap_or((rest, ""));

    let (path, query) = if let Some((path, query)) = rest.split_once('?') {
      (path, query)
    } else if let Some((path, query)) = rest.split_once('@') {
      (path, query)
    } else {
      (rest.trim_end_matches(['/', '\\']), "")
    };

    Ok(Self {
      scheme: scheme.to_string(),
      server: server.to_string(),
      path: path.to_string(),
      query: query.to_string(),
    })
  }

  pub fn scheme(&self) -> &str {
    &self.scheme
  }

  pub fn server(&self) -> &str {
    &self.server
  }

  /// Path below the server, without a leading slash.
  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  /// Protocol named by the scheme prefix.
  pub fn protocol(&self) -> Result<Protocol, TransportError> {
    let scheme = self.scheme.to_ascii_lowercase();
    if scheme.starts_with("ftp") {
      Ok(Protocol::Ftp)
    } else if scheme.starts_with("smb") {
      Ok(Protocol::Smb)
    } else if scheme.starts_with("afp") {
      Ok(Protocol::Afp)
    } else {
      Err(TransportError::BadProtocol(self.scheme.clone()))
    }
  }

  /// The share volume (first path segment) and the path inside it.
  pub fn share(&self) -> (&str, &str) {
    self.path.split_once('/').unwrap_or((self.path.as_str(), ""))
  }

  /// `//server/volume`, the form mount commands expect.
  pub fn server_path(&self) -> String {
    format!("//{}/{}", self.server, self.share().0)
  }
}

impl FromStr for Location {
  type Err = TransportError;

  fn from_str(uri: &str) -> Result<Self, Self::Err> {
    Self::parse(uri)
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}://{}/{}", self.scheme, self.server, self.path)?;
    if !self.query.is_empty() {
      write!(f, "?{}", self.query)?;
    }
    Ok(())
  }
}
