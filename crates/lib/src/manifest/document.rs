//! The manifest document: schema version plus an ordered list of builds.

use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use super::build::{Build, BuildChild, FileRecord, NewBuild};
use super::error::ManifestError;
use super::{encoding, parse, write};

/// Schema version written into new manifests.
pub const CURRENT_MANIFEST_VERSION: &str = "2.0";

/// Encoding of written manifests unless told otherwise.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// The `version` attribute of the `<manifest>` root.
///
/// Keeps the attribute text so it is written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestVersion {
  raw: String,
  value: f64,
}

impl ManifestVersion {
  pub fn as_str(&self) -> &str {
    &self.raw
  }

  pub fn value(&self) -> f64 {
    self.value
  }
}

impl FromStr for ManifestVersion {
  type Err = ManifestError;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    let value: f64 = raw
      .trim()
      .parse()
      .map_err(|_| ManifestError::Version(raw.to_string()))?;
    if !value.is_finite() {
      return Err(ManifestError::Version(raw.to_string()));
    }
    Ok(Self {
      raw: raw.trim().to_string(),
      value,
    })
  }
}

/// A build manifest (`versioninfo.xml`).
///
/// Build order is significant: the first build is the primary one for
/// the legacy [`Manifest::target`] query.
///
/// # Example
///
/// ```
/// use vinfo_lib::{Manifest, NewBuild};
///
/// let mut manifest = Manifest::new();
/// let build = manifest.add_build(NewBuild {
///   product: "Design Premium",
///   version: "CS4",
///   subproduct: "Application",
///   build: "20080311.m.154",
///   datetime: "2008/03/11:15:00:00",
///   compiler_target: "None",
///   license_model: "Retail",
///   format: "RIBS Installer",
///   platform: "win32",
///   lang: "en_US,fr_CA,es_MX,en_GB",
/// });
/// build.add_metadata("AdobeCode", "45FB0721-29BD-4C62-98C5-D1396787462F");
///
/// let reparsed = Manifest::parse(&manifest.to_xml("UTF-8")).unwrap();
/// assert_eq!(reparsed.builds(None).len(), 1);
/// assert_eq!(reparsed.version_strings(None), vec!["Design Premium CS4 20080311.m.154"]);
/// assert_eq!(
///   reparsed.first_build().unwrap().metadata("AdobeCode"),
///   Some("45FB0721-29BD-4C62-98C5-D1396787462F")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
  pub(crate) version: ManifestVersion,
  pub(crate) builds: Vec<Build>,
}

impl Default for Manifest {
  fn default() -> Self {
    Self::new()
  }
}

impl Manifest {
  /// An empty manifest at the current schema version.
  pub fn new() -> Self {
    Self {
      version: ManifestVersion {
        raw: CURRENT_MANIFEST_VERSION.to_string(),
        value: 2.0,
      },
      builds: Vec::new(),
    }
  }

  /// Parse serialized manifest text.
  pub fn parse(text: &str) -> Result<Self, ManifestError> {
    parse::parse_document(text)
  }

  /// Read and parse the manifest file at `path`.
  ///
  /// The text encoding comes from a byte-order mark or the XML declaration,
  /// defaulting to UTF-8. Lines are trimmed and rejoined before parsing, so
  /// tags that a producer wrapped across several lines still parse.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        ManifestError::SourceNotFound(path.to_path_buf())
      } else {
        ManifestError::Read {
          path: path.to_path_buf(),
          source: e,
        }
      }
    })?;
    let content = encoding::decode(&bytes).map_err(|used| ManifestError::Decode {
      path: path.to_path_buf(),
      encoding: used.name(),
    })?;
    Self::parse(&parse::rejoin_lines(&content))
  }

  /// Load `source` as a file if such a file exists, otherwise parse it as
  /// manifest text.
  pub fn from_source(source: &str) -> Result<Self, ManifestError> {
    if Path::new(source).is_file() {
      Self::load(source)
    } else {
      Self::parse(source)
    }
  }

  /// Indented XML with the given encoding in the declaration.
  ///
  /// The text itself is a Rust string; [`Manifest::to_bytes`] applies the
  /// encoding.
  pub fn to_xml(&self, encoding: &str) -> String {
    write::write_document(self, encoding)
  }

  /// [`Manifest::to_xml`] output encoded as its declaration says.
  ///
  /// `encoding` is any WHATWG encoding label, e.g. `UTF-8`, `ISO-8859-1`
  /// or `UTF-16`. Unknown labels fail with
  /// [`ManifestError::UnsupportedEncoding`].
  pub fn to_bytes(&self, encoding: &str) -> Result<Vec<u8>, ManifestError> {
    encoding::encode(&self.to_xml(encoding), encoding)
  }

  /// Write [`Manifest::to_bytes`] output to `path`, replacing any existing file.
  pub fn save(&self, path: impl AsRef<Path>, encoding: &str) -> Result<(), ManifestError> {
    let path = path.as_ref();
    let bytes = self.to_bytes(encoding)?;
    fs::write(path, bytes).map_err(|e| ManifestError::Write {
      path: path.to_path_buf(),
      source: e,
    })
  }

  /// Numeric schema version of the document.
  pub fn version(&self) -> f64 {
    self.version.value()
  }

  pub fn version_attr(&self) -> &ManifestVersion {
    &self.version
  }

  /// Append a new 2.0 build and return it for further mutation.
  pub fn add_build(&mut self, info: NewBuild<'_>) -> &mut Build {
    self.builds.push(Build::from_new(&info));
    let last = self.builds.len() - 1;
    &mut self.builds[last]
  }

  /// Top-level builds, in document order, optionally limited to one product.
  ///
  /// The product match is exact and case-sensitive.
  pub fn builds(&self, product: Option<&str>) -> Vec<&Build> {
    self
      .builds
      .iter()
      .filter(|build| product.is_none_or(|p| build.product == p))
      .collect()
  }

  /// Mutable access to the top-level builds, optionally limited to one product.
  pub fn builds_mut(&mut self, product: Option<&str>) -> Vec<&mut Build> {
    self
      .builds
      .iter_mut()
      .filter(|build| product.is_none_or(|p| build.product == p))
      .collect()
  }

  pub fn first_build(&self) -> Option<&Build> {
    self.builds.first()
  }

  pub fn first_build_mut(&mut self) -> Option<&mut Build> {
    self.builds.first_mut()
  }

  /// `"<product> <fullversion>"` for each selected build.
  pub fn version_strings(&self, product: Option<&str>) -> Vec<String> {
    self
      .builds(product)
      .into_iter()
      .map(|build| format!("{} {}", build.product(), build.fullversion()))
      .collect()
  }

  /// The canonical datetime of each selected build.
  pub fn version_dates(&self, product: Option<&str>) -> Vec<String> {
    self
      .builds(product)
      .into_iter()
      .map(|build| build.datetime().to_string())
      .collect()
  }

  /// The `target` of the first build when that build predates schema 2.0.
  ///
  /// `None` means the query does not apply: the first build is a 2.0
  /// record, or there are no builds.
  pub fn target(&self) -> Option<&str> {
    self.builds.first().and_then(Build::target)
  }

  /// Drop every `components` grouping except the first one in document order.
  ///
  /// Removed groupings take their whole subtree with them, so at most one
  /// level of component nesting survives. Returns how many groupings were
  /// removed; a second call always returns 0.
  pub fn prune_components(&mut self) -> usize {
    let mut kept = false;
    let mut removed = 0;
    for build in &mut self.builds {
      prune_build(build, &mut kept, &mut removed);
    }
    removed
  }
}

impl FromStr for Manifest {
  type Err = ManifestError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    Self::parse(text)
  }
}

// Pre-order walk over each build's children as stored, which is
// document order for parsed builds.
fn prune_build(build: &mut Build, kept: &mut bool, removed: &mut usize) {
  build.children.retain_mut(|child| match child {
    BuildChild::Components(_) if *kept => {
      *removed += 1;
      false
    }
    BuildChild::Components(builds) => {
      *kept = true;
      for nested in builds {
        prune_build(nested, kept, removed);
      }
      true
    }
    BuildChild::DirectComponents(builds) => {
      for nested in builds {
        prune_build(nested, kept, removed);
      }
      true
    }
    _ => true,
  });
}

/// Load `path` and return its version strings.
pub fn version_strings(path: impl AsRef<Path>, product: Option<&str>) -> Result<Vec<String>, ManifestError> {
  Ok(Manifest::load(path)?.version_strings(product))
}

/// Load `path` and return its build dates.
pub fn version_dates(path: impl AsRef<Path>, product: Option<&str>) -> Result<Vec<String>, ManifestError> {
  Ok(Manifest::load(path)?.version_dates(product))
}

/// Load `path` and return the legacy target of its first build.
pub fn target(path: impl AsRef<Path>) -> Result<Option<String>, ManifestError> {
  Ok(Manifest::load(path)?.target().map(str::to_string))
}

/// Load `path` and return the file records of its first build.
pub fn files(path: impl AsRef<Path>) -> Result<Vec<FileRecord>, ManifestError> {
  Ok(
    Manifest::load(path)?
      .first_build()
      .map(|build| build.files().into_iter().cloned().collect())
      .unwrap_or_default(),
  )
}
