//! Build records and their schema variants.
//!
//! A [`Build`] is one version record inside a manifest. Three historical
//! attribute layouts exist; the layout is resolved once when a build is
//! parsed and kept as a [`BuildFields`] variant, so accessors never have to
//! inspect attributes again.
//!
//! | Variant      | Detected by               | Build number attribute |
//! |--------------|---------------------------|------------------------|
//! | 1.0 legacy   | `version_major`           | `version_build`        |
//! | 1.1 transit. | `version` + `target`      | `version_build`        |
//! | 2.0 current  | `compilertarget`          | `build`                |

use std::fmt;
use std::path::Path;

use serde::Serialize;

use super::document::Manifest;
use super::error::ManifestError;
use crate::util::hash::scan_directory;

/// Attribute layout a build record was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SchemaVersion {
  #[serde(rename = "1.0")]
  V1_0,
  #[serde(rename = "1.1")]
  V1_1,
  #[serde(rename = "2.0")]
  V2_0,
}

impl SchemaVersion {
  pub fn as_str(self) -> &'static str {
    match self {
      SchemaVersion::V1_0 => "1.0",
      SchemaVersion::V1_1 => "1.1",
      SchemaVersion::V2_0 => "2.0",
    }
  }

  pub fn as_f64(self) -> f64 {
    match self {
      SchemaVersion::V1_0 => 1.0,
      SchemaVersion::V1_1 => 1.1,
      SchemaVersion::V2_0 => 2.0,
    }
  }

  /// True for every layout older than 2.0.
  pub fn is_legacy(self) -> bool {
    self < SchemaVersion::V2_0
  }
}

impl fmt::Display for SchemaVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Fields carried by 1.0 and 1.1 build records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyFields {
  pub version_build: String,
  /// `%Y%m%d`, as stored.
  pub date: String,
  /// `%H%M%S`, as stored.
  pub time: String,
  /// `date` and `time` combined as `%Y/%m/%d:%H:%M:%S`.
  pub datetime: String,
  pub target: String,
  pub phase_major: String,
  pub phase_minor: String,
}

/// Fields carried by 2.0 build records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentFields {
  pub subproduct: String,
  pub build: String,
  pub datetime: String,
  pub compilertarget: String,
  pub licensemodel: String,
  pub format: String,
  pub platform: String,
}

/// Schema-specific part of a build, tagged by layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "schema")]
pub enum BuildFields {
  #[serde(rename = "1.0")]
  Legacy(LegacyFields),
  #[serde(rename = "1.1")]
  Transitional(LegacyFields),
  #[serde(rename = "2.0")]
  Current(CurrentFields),
}

impl BuildFields {
  pub fn schema(&self) -> SchemaVersion {
    match self {
      BuildFields::Legacy(_) => SchemaVersion::V1_0,
      BuildFields::Transitional(_) => SchemaVersion::V1_1,
      BuildFields::Current(_) => SchemaVersion::V2_0,
    }
  }

  fn legacy(&self) -> Option<&LegacyFields> {
    match self {
      BuildFields::Legacy(fields) | BuildFields::Transitional(fields) => Some(fields),
      BuildFields::Current(_) => None,
    }
  }

  fn current(&self) -> Option<&CurrentFields> {
    match self {
      BuildFields::Current(fields) => Some(fields),
      _ => None,
    }
  }
}

/// A source-control or artifact repository a build was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
  scheme: String,
  authority: String,
  path: String,
  query: String,
  uri: String,
}

impl Repository {
  pub fn new(
    scheme: impl Into<String>,
    authority: impl Into<String>,
    path: impl Into<String>,
    query: impl Into<String>,
  ) -> Self {
    let scheme = scheme.into();
    let authority = authority.into();
    let path = path.into();
    let query = query.into();
    let uri = format!("{}://{}{}{}", scheme, authority, path, query);
    Self {
      scheme,
      authority,
      path,
      query,
      uri,
    }
  }

  pub fn scheme(&self) -> &str {
    &self.scheme
  }

  pub fn authority(&self) -> &str {
    &self.authority
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  /// `scheme://authority` followed by the path and query, unseparated.
  pub fn uri(&self) -> &str {
    &self.uri
  }
}

/// One `key = value` metadata entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataItem {
  pub key: String,
  pub value: String,
}

/// One entry of a build's file log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
  /// Path relative to the build root.
  pub name: String,
  /// Opaque checksum string (persisted as the `md5` attribute).
  pub checksum: String,
  pub size: Option<u64>,
}

/// Inputs for a new 2.0 build record.
///
/// Every field is stored verbatim; empty strings are allowed.
#[derive(Debug, Clone, Copy)]
pub struct NewBuild<'a> {
  pub product: &'a str,
  pub version: &'a str,
  pub subproduct: &'a str,
  /// Build number, e.g. `20080311.m.154`.
  pub build: &'a str,
  /// `%Y/%m/%d:%H:%M:%S`.
  pub datetime: &'a str,
  pub compiler_target: &'a str,
  pub license_model: &'a str,
  pub format: &'a str,
  pub platform: &'a str,
  /// Comma separated locale list, e.g. `en_US,fr_CA`.
  pub lang: &'a str,
}

/// One child element of a build.
///
/// Builds keep their children in document order. Sibling groupings of the
/// same kind stay separate, so pruning sees each `components` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "lowercase")]
pub enum BuildChild {
  Repository(Repository),
  Components(Vec<Build>),
  DirectComponents(Vec<Build>),
  Metadata(Vec<MetadataItem>),
  FileInfo(Vec<FileRecord>),
}

impl BuildChild {
  /// Position of this kind in the layout new children are written in.
  fn rank(&self) -> u8 {
    match self {
      BuildChild::Repository(_) => 0,
      BuildChild::Components(_) => 1,
      BuildChild::DirectComponents(_) => 2,
      BuildChild::Metadata(_) => 3,
      BuildChild::FileInfo(_) => 4,
    }
  }

  fn repository(&self) -> Option<&Repository> {
    match self {
      BuildChild::Repository(repo) => Some(repo),
      _ => None,
    }
  }

  fn components(&self) -> Option<&[Build]> {
    match self {
      BuildChild::Components(builds) => Some(builds),
      _ => None,
    }
  }

  fn direct_components(&self) -> Option<&[Build]> {
    match self {
      BuildChild::DirectComponents(builds) => Some(builds),
      _ => None,
    }
  }

  fn metadata(&self) -> Option<&[MetadataItem]> {
    match self {
      BuildChild::Metadata(items) => Some(items),
      _ => None,
    }
  }

  fn files(&self) -> Option<&[FileRecord]> {
    match self {
      BuildChild::FileInfo(files) => Some(files),
      _ => None,
    }
  }

  fn components_mut(&mut self) -> Option<&mut Vec<Build>> {
    match self {
      BuildChild::Components(builds) => Some(builds),
      _ => None,
    }
  }

  fn direct_components_mut(&mut self) -> Option<&mut Vec<Build>> {
    match self {
      BuildChild::DirectComponents(builds) => Some(builds),
      _ => None,
    }
  }

  fn metadata_mut(&mut self) -> Option<&mut Vec<MetadataItem>> {
    match self {
      BuildChild::Metadata(items) => Some(items),
      _ => None,
    }
  }

  fn files_mut(&mut self) -> Option<&mut Vec<FileRecord>> {
    match self {
      BuildChild::FileInfo(files) => Some(files),
      _ => None,
    }
  }
}

/// One build's version metadata and its nested collections.
///
/// A collection exists once it has been written to or seen in a parsed
/// document, which keeps an empty `<components/>` distinct from no
/// components at all. Parsed builds keep their children in document
/// order; children added through the API go into the repository,
/// components, directcomponents, metadata, fileinfo layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Build {
  pub(crate) product: String,
  pub(crate) version: String,
  pub(crate) lang: String,
  pub(crate) fields: BuildFields,
  pub(crate) children: Vec<BuildChild>,
}

impl Build {
  pub(crate) fn from_new(info: &NewBuild<'_>) -> Self {
    Self::with_fields(
      info.product,
      info.version,
      info.lang,
      BuildFields::Current(CurrentFields {
        subproduct: info.subproduct.to_string(),
        build: info.build.to_string(),
        datetime: info.datetime.to_string(),
        compilertarget: info.compiler_target.to_string(),
        licensemodel: info.license_model.to_string(),
        format: info.format.to_string(),
        platform: info.platform.to_string(),
      }),
    )
  }

  pub(crate) fn with_fields(product: &str, version: &str, lang: &str, fields: BuildFields) -> Self {
    Self {
      product: product.to_string(),
      version: version.to_string(),
      lang: lang.to_string(),
      fields,
      children: Vec::new(),
    }
  }

  pub fn product(&self) -> &str {
    &self.product
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  pub fn lang(&self) -> &str {
    &self.lang
  }

  pub fn schema(&self) -> SchemaVersion {
    self.fields.schema()
  }

  pub fn fields(&self) -> &BuildFields {
    &self.fields
  }

  /// The build number: `version_build` before 2.0, `build` from 2.0 on.
  pub fn build_number(&self) -> &str {
    match &self.fields {
      BuildFields::Legacy(f) | BuildFields::Transitional(f) => &f.version_build,
      BuildFields::Current(f) => &f.build,
    }
  }

  /// `version` and build number separated by a space.
  pub fn fullversion(&self) -> String {
    format!("{} {}", self.version, self.build_number())
  }

  /// Canonical `%Y/%m/%d:%H:%M:%S` timestamp.
  pub fn datetime(&self) -> &str {
    match &self.fields {
      BuildFields::Legacy(f) | BuildFields::Transitional(f) => &f.datetime,
      BuildFields::Current(f) => &f.datetime,
    }
  }

  /// Legacy `target`; `None` for 2.0 builds.
  pub fn target(&self) -> Option<&str> {
    self.fields.legacy().map(|f| f.target.as_str())
  }

  pub fn subproduct(&self) -> Option<&str> {
    self.fields.current().map(|f| f.subproduct.as_str())
  }

  pub fn compiler_target(&self) -> Option<&str> {
    self.fields.current().map(|f| f.compilertarget.as_str())
  }

  pub fn license_model(&self) -> Option<&str> {
    self.fields.current().map(|f| f.licensemodel.as_str())
  }

  pub fn format(&self) -> Option<&str> {
    self.fields.current().map(|f| f.format.as_str())
  }

  pub fn platform(&self) -> Option<&str> {
    self.fields.current().map(|f| f.platform.as_str())
  }

  /// Child elements in document order.
  pub fn children(&self) -> &[BuildChild] {
    &self.children
  }

  pub fn repositories(&self) -> Vec<&Repository> {
    self.children.iter().filter_map(BuildChild::repository).collect()
  }

  /// Builds of every `components` grouping, in order.
  pub fn components(&self) -> Vec<&Build> {
    self.children.iter().filter_map(BuildChild::components).flatten().collect()
  }

  /// Whether a `components` grouping exists, even an empty one.
  pub fn has_components(&self) -> bool {
    self.children.iter().any(|child| child.components().is_some())
  }

  pub fn direct_components(&self) -> Vec<&Build> {
    self
      .children
      .iter()
      .filter_map(BuildChild::direct_components)
      .flatten()
      .collect()
  }

  pub fn has_direct_components(&self) -> bool {
    self.children.iter().any(|child| child.direct_components().is_some())
  }

  /// Look up a metadata value by key.
  pub fn metadata(&self, key: &str) -> Option<&str> {
    self
      .metadata_entries()
      .into_iter()
      .find(|item| item.key == key)
      .map(|item| item.value.as_str())
  }

  /// Metadata entries in insertion order, one per key.
  pub fn metadata_entries(&self) -> Vec<&MetadataItem> {
    self.children.iter().filter_map(BuildChild::metadata).flatten().collect()
  }

  pub fn files(&self) -> Vec<&FileRecord> {
    self.children.iter().filter_map(BuildChild::files).flatten().collect()
  }

  pub fn set_compiler_target(&mut self, value: impl Into<String>) -> Result<(), ManifestError> {
    self.current_mut("compilertarget")?.compilertarget = value.into();
    Ok(())
  }

  pub fn set_license_model(&mut self, value: impl Into<String>) -> Result<(), ManifestError> {
    self.current_mut("licensemodel")?.licensemodel = value.into();
    Ok(())
  }

  pub fn set_format(&mut self, value: impl Into<String>) -> Result<(), ManifestError> {
    self.current_mut("format")?.format = value.into();
    Ok(())
  }

  pub fn set_platform(&mut self, value: impl Into<String>) -> Result<(), ManifestError> {
    self.current_mut("platform")?.platform = value.into();
    Ok(())
  }

  pub fn set_lang(&mut self, value: impl Into<String>) {
    self.lang = value.into();
  }

  fn current_mut(&mut self, attribute: &'static str) -> Result<&mut CurrentFields, ManifestError> {
    let schema = self.schema();
    match &mut self.fields {
      BuildFields::Current(fields) => Ok(fields),
      _ => Err(ManifestError::NotApplicable {
        product: self.product.clone(),
        schema,
        attribute,
      }),
    }
  }

  /// Append a repository record and return it.
  pub fn add_repository(
    &mut self,
    scheme: impl Into<String>,
    authority: impl Into<String>,
    path: impl Into<String>,
    query: impl Into<String>,
  ) -> &Repository {
    let at = self.insert_child(BuildChild::Repository(Repository::new(scheme, authority, path, query)));
    match &self.children[at] {
      BuildChild::Repository(repo) => repo,
      _ => unreachable!("inserted child is a repository"),
    }
  }

  /// Set a metadata value.
  ///
  /// An existing entry with the same key is removed first, so the key
  /// appears once and moves to the end of the list.
  pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
    let key = key.into();
    for items in self.children.iter_mut().filter_map(BuildChild::metadata_mut) {
      items.retain(|item| item.key != key);
    }
    let item = MetadataItem {
      key,
      value: value.into(),
    };
    match self.children.iter_mut().rev().find_map(BuildChild::metadata_mut) {
      Some(items) => items.push(item),
      None => {
        self.insert_child(BuildChild::Metadata(vec![item]));
      }
    }
  }

  /// Append a file record. Duplicates are kept.
  pub fn add_file(&mut self, path: impl Into<String>, checksum: impl Into<String>, size: Option<u64>) {
    let record = FileRecord {
      name: path.into(),
      checksum: checksum.into(),
      size,
    };
    match self.children.iter_mut().rev().find_map(BuildChild::files_mut) {
      Some(files) => files.push(record),
      None => {
        self.insert_child(BuildChild::FileInfo(vec![record]));
      }
    }
  }

  /// Record every regular file below `root` with its SHA-256 and size.
  ///
  /// Returns the number of records appended.
  pub fn add_files_from_dir(&mut self, root: &Path) -> Result<usize, ManifestError> {
    let scanned = scan_directory(root)?;
    let count = scanned.len();
    for file in scanned {
      self.add_file(file.relative_path, file.hash.0, Some(file.size));
    }
    Ok(count)
  }

  /// Deep-copy the builds of `source` (optionally only those of `product`)
  /// into this build's first `components` grouping.
  ///
  /// The grouping is created even when nothing matches. Returns the number
  /// of builds copied.
  pub fn add_components(&mut self, source: &Manifest, product: Option<&str>) -> usize {
    self.merge(source, product, BuildChild::components_mut, BuildChild::Components)
  }

  /// Like [`Build::add_components`], for the `directcomponents` list.
  pub fn add_direct_components(&mut self, source: &Manifest, product: Option<&str>) -> usize {
    self.merge(
      source,
      product,
      BuildChild::direct_components_mut,
      BuildChild::DirectComponents,
    )
  }

  /// Load the manifest at `path` and merge its builds into `components`.
  ///
  /// Fails without touching this build when the file is missing or invalid.
  pub fn add_component_file(&mut self, path: impl AsRef<Path>, product: Option<&str>) -> Result<usize, ManifestError> {
    let source = Manifest::load(path)?;
    Ok(self.add_components(&source, product))
  }

  /// Load the manifest at `path` and merge its builds into `directcomponents`.
  pub fn add_direct_component_file(
    &mut self,
    path: impl AsRef<Path>,
    product: Option<&str>,
  ) -> Result<usize, ManifestError> {
    let source = Manifest::load(path)?;
    Ok(self.add_direct_components(&source, product))
  }

  fn merge(
    &mut self,
    source: &Manifest,
    product: Option<&str>,
    grouping: fn(&mut BuildChild) -> Option<&mut Vec<Build>>,
    wrap: fn(Vec<Build>) -> BuildChild,
  ) -> usize {
    let copied: Vec<Build> = source.builds(product).into_iter().cloned().collect();
    let count = copied.len();
    match self.children.iter_mut().find_map(grouping) {
      Some(builds) => builds.extend(copied),
      None => {
        self.insert_child(wrap(copied));
      }
    }
    count
  }

  /// Insert a child after the last child of the same kind, or at its place
  /// in the write layout when it is the first of its kind. Returns its index.
  fn insert_child(&mut self, child: BuildChild) -> usize {
    let rank = child.rank();
    let at = match self.children.iter().rposition(|c| c.rank() == rank) {
      Some(last) => last + 1,
      None => self
        .children
        .iter()
        .position(|c| c.rank() > rank)
        .unwrap_or(self.children.len()),
    };
    self.children.insert(at, child);
    at
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> NewBuild<'static> {
    NewBuild {
      product: "Photoshop",
      version: "11.0",
      subproduct: "Application",
      build: "20080311.m.154",
      datetime: "2008/03/11:15:00:00",
      compiler_target: "Release",
      license_model: "Retail",
      format: "RIBS Installer",
      platform: "win32",
      lang: "en_US",
    }
  }

  fn legacy_build() -> Build {
    Build::with_fields(
      "Acrobat",
      "8.0",
      "mul",
      BuildFields::Transitional(LegacyFields {
        version_build: "42".into(),
        date: "20070101".into(),
        time: "120000".into(),
        datetime: "2007/01/01:12:00:00".into(),
        target: "Release".into(),
        phase_major: "GM".into(),
        phase_minor: "".into(),
      }),
    )
  }

  #[test]
  fn new_build_is_current_schema() {
    let build = Build::from_new(&sample());
    assert_eq!(build.schema(), SchemaVersion::V2_0);
    assert_eq!(build.fullversion(), "11.0 20080311.m.154");
    assert_eq!(build.compiler_target(), Some("Release"));
    assert_eq!(build.target(), None);
    assert!(!build.has_components());
    assert!(build.metadata_entries().is_empty());
  }

  #[test]
  fn legacy_fullversion_uses_version_build() {
    let build = legacy_build();
    assert_eq!(build.fullversion(), "8.0 42");
    assert_eq!(build.target(), Some("Release"));
    assert_eq!(build.platform(), None);
  }

  #[test]
  fn setters_update_current_fields() {
    let mut build = Build::from_new(&sample());
    build.set_compiler_target("Debug").unwrap();
    build.set_license_model("Volume").unwrap();
    build.set_format("Folder").unwrap();
    build.set_platform("osx10").unwrap();
    build.set_lang("mul");

    assert_eq!(build.compiler_target(), Some("Debug"));
    assert_eq!(build.license_model(), Some("Volume"));
    assert_eq!(build.format(), Some("Folder"));
    assert_eq!(build.platform(), Some("osx10"));
    assert_eq!(build.lang(), "mul");
  }

  #[test]
  fn current_only_setter_on_legacy_build_is_rejected() {
    let mut build = legacy_build();
    let before = build.clone();
    let err = build.set_platform("win32").unwrap_err();
    assert!(matches!(
      err,
      ManifestError::NotApplicable {
        attribute: "platform",
        schema: SchemaVersion::V1_1,
        ..
      }
    ));
    assert_eq!(build, before);

    build.set_lang("en_US");
    assert_eq!(build.lang(), "en_US");
  }

  #[test]
  fn repository_uri_is_composed() {
    let mut build = Build::from_new(&sample());
    let repo = build.add_repository("perforce", "p4.example.com:1666", "//depot/main/...", "@1234");
    assert_eq!(repo.uri(), "perforce://p4.example.com:1666//depot/main/...@1234");
    assert_eq!(build.repositories().len(), 1);
  }

  #[test]
  fn metadata_last_write_wins_with_single_entry() {
    let mut build = Build::from_new(&sample());
    build.add_metadata("AdobeCode", "first");
    build.add_metadata("Owner", "release");
    build.add_metadata("AdobeCode", "second");

    assert_eq!(build.metadata("AdobeCode"), Some("second"));
    let keys: Vec<_> = build.metadata_entries().iter().map(|m| m.key.as_str()).collect();
    assert_eq!(keys, vec!["Owner", "AdobeCode"]);
  }

  #[test]
  fn files_are_an_append_log() {
    let mut build = Build::from_new(&sample());
    build.add_file("setup.exe", "abc", None);
    build.add_file("setup.exe", "abc", Some(10));

    assert_eq!(build.files().len(), 2);
    assert_eq!(build.files()[1].size, Some(10));
  }

  #[test]
  fn schema_versions_order_and_classify() {
    assert!(SchemaVersion::V1_0.is_legacy());
    assert!(SchemaVersion::V1_1.is_legacy());
    assert!(!SchemaVersion::V2_0.is_legacy());
    assert_eq!(SchemaVersion::V1_1.as_f64(), 1.1);
    assert_eq!(SchemaVersion::V2_0.to_string(), "2.0");
  }
}
