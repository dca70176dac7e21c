use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::build::SchemaVersion;
use crate::util::hash::HashError;

/// Broad classes of manifest failure.
///
/// Parse failures of every kind are fatal to the parse call; callers that
/// only care about *why* a document was rejected can match on this instead
/// of the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A manifest or build version is missing or not numeric.
  Version,
  /// A build matches no known attribute layout, or the source is not valid manifest content.
  Schema,
  /// The document does not have exactly one `<versioninfo>` container.
  Structure,
  /// A path given to a load or merge does not exist.
  SourceNotFound,
  /// Reading or writing a file failed, or its text encoding is unsupported.
  Io,
}

/// Errors raised while loading, parsing, mutating or saving a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("manifest version '{0}' does not seem to be a number")]
  Version(String),

  #[error("no version attributes found in build tag for product '{product}'")]
  MissingBuildVersion { product: String },

  #[error("unknown or missing attributes in build tag for product '{product}'")]
  UnknownSchema { product: String },

  #[error("build '{product}' has an invalid date/time pair '{date} {time}'")]
  InvalidTimestamp {
    product: String,
    date: String,
    time: String,
  },

  #[error("file record '{name}' has a non-numeric size '{size}'")]
  InvalidFileSize { name: String, size: String },

  #[error("failed to parse manifest XML: {0}")]
  Xml(#[from] roxmltree::Error),

  #[error("build '{product}' uses the {schema} layout, which has no '{attribute}' attribute")]
  NotApplicable {
    product: String,
    schema: SchemaVersion,
    attribute: &'static str,
  },

  #[error("no <versioninfo> tag found in manifest")]
  MissingVersionInfo,

  #[error("multiple <versioninfo> tags found in manifest ({0} present)")]
  MultipleVersionInfo(usize),

  #[error("manifest source does not exist: {0}")]
  SourceNotFound(PathBuf),

  #[error("failed to read manifest {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write manifest {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("manifest {path} is not valid {encoding} text")]
  Decode { path: PathBuf, encoding: &'static str },

  #[error("unsupported text encoding '{0}'")]
  UnsupportedEncoding(String),

  #[error("failed to record build files: {0}")]
  Hash(#[from] HashError),
}

impl ManifestError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      ManifestError::Version(_) | ManifestError::MissingBuildVersion { .. } => ErrorKind::Version,
      ManifestError::UnknownSchema { .. }
      | ManifestError::InvalidTimestamp { .. }
      | ManifestError::InvalidFileSize { .. }
      | ManifestError::Xml(_)
      | ManifestError::Decode { .. }
      | ManifestError::NotApplicable { .. } => ErrorKind::Schema,
      ManifestError::MissingVersionInfo | ManifestError::MultipleVersionInfo(_) => ErrorKind::Structure,
      ManifestError::SourceNotFound(_) => ErrorKind::SourceNotFound,
      ManifestError::Read { .. }
      | ManifestError::Write { .. }
      | ManifestError::UnsupportedEncoding(_)
      | ManifestError::Hash(_) => ErrorKind::Io,
    }
  }
}
