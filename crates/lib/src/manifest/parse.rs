//! XML to manifest model.
//!
//! Schema detection happens per build, since component builds copied in
//! from other manifests may have been written under an older layout.

use chrono::NaiveDateTime;
use roxmltree::{Document, Node};

use super::build::{Build, BuildChild, BuildFields, CurrentFields, FileRecord, LegacyFields, Repository, SchemaVersion};
use super::document::{Manifest, ManifestVersion};
use super::error::ManifestError;
use super::tags;

const LEGACY_DATETIME_INPUT: &str = "%Y%m%d %H%M%S";
const DATETIME_OUTPUT: &str = "%Y/%m/%d:%H:%M:%S";

/// Trim every line and join them back together.
///
/// A line ending in `"` keeps one trailing space so that an attribute
/// wrapped onto the next line does not run into the previous value.
pub(crate) fn rejoin_lines(content: &str) -> String {
  let mut joined = String::with_capacity(content.len());
  for line in content.lines() {
    let line = line.trim();
    joined.push_str(line);
    if line.ends_with('"') {
      joined.push(' ');
    }
  }
  joined
}

pub(crate) fn parse_document(text: &str) -> Result<Manifest, ManifestError> {
  let doc = Document::parse(text)?;
  let root = doc.root_element();

  let version: ManifestVersion = root.attribute(tags::VERSION).unwrap_or_default().parse()?;

  // `descendants` yields the root first; the root is never its own container
  let containers: Vec<Node> = root
    .descendants()
    .skip(1)
    .filter(|node| node.has_tag_name(tags::VERSIONINFO))
    .collect();
  let versioninfo = match containers.as_slice() {
    [] => return Err(ManifestError::MissingVersionInfo),
    [single] => *single,
    many => return Err(ManifestError::MultipleVersionInfo(many.len())),
  };

  let builds = child_builds(versioninfo)?;
  Ok(Manifest { version, builds })
}

fn child_builds(parent: Node) -> Result<Vec<Build>, ManifestError> {
  parent
    .children()
    .filter(|node| node.has_tag_name(tags::BUILD))
    .map(parse_build)
    .collect()
}

/// Resolve the layout of a `<build>` element. Checks run in a fixed order,
/// so `version_major` always wins.
pub(crate) fn detect_schema(node: Node) -> Option<SchemaVersion> {
  if node.has_attribute("version_major") {
    Some(SchemaVersion::V1_0)
  } else if node.has_attribute(tags::VERSION) && node.has_attribute("target") {
    Some(SchemaVersion::V1_1)
  } else if node.has_attribute("compilertarget") {
    Some(SchemaVersion::V2_0)
  } else {
    None
  }
}

/// Collapse 1.0 `version_major/minor/sub` into one version string.
///
/// A sub version of `0` (or none at all) is left off: `7/0/0` is `7.0`,
/// `7/0/1` is `7.0.1`.
pub(crate) fn collapse_legacy_version(major: &str, minor: &str, sub: &str) -> String {
  if sub.is_empty() || sub == "0" {
    format!("{}.{}", major, minor)
  } else {
    format!("{}.{}.{}", major, minor, sub)
  }
}

/// Combine legacy `date` (`%Y%m%d`) and `time` (`%H%M%S`) into the
/// canonical `%Y/%m/%d:%H:%M:%S` form.
pub(crate) fn legacy_datetime(date: &str, time: &str) -> Option<String> {
  NaiveDateTime::parse_from_str(&format!("{} {}", date, time), LEGACY_DATETIME_INPUT)
    .ok()
    .map(|dt| dt.format(DATETIME_OUTPUT).to_string())
}

fn attr(node: Node, name: &str) -> String {
  node.attribute(name).unwrap_or_default().to_string()
}

fn parse_build(node: Node) -> Result<Build, ManifestError> {
  let product = attr(node, "product");
  let schema = detect_schema(node).ok_or_else(|| ManifestError::UnknownSchema {
    product: product.clone(),
  })?;

  let mut version = attr(node, tags::VERSION);
  if schema == SchemaVersion::V1_0 {
    let collapsed = collapse_legacy_version(
      node.attribute("version_major").unwrap_or_default(),
      node.attribute("version_minor").unwrap_or_default(),
      node.attribute("version_sub").unwrap_or_default(),
    );
    // Without a major number the plain `version` attribute is authoritative
    if !collapsed.starts_with('.') {
      version = collapsed;
    }
  }
  if version.is_empty() {
    return Err(ManifestError::MissingBuildVersion { product });
  }

  let fields = match schema {
    SchemaVersion::V1_0 | SchemaVersion::V1_1 => {
      let date = attr(node, "date");
      let time = attr(node, "time");
      let datetime = legacy_datetime(&date, &time).ok_or_else(|| ManifestError::InvalidTimestamp {
        product: product.clone(),
        date: date.clone(),
        time: time.clone(),
      })?;
      let legacy = LegacyFields {
        version_build: attr(node, "version_build"),
        date,
        time,
        datetime,
        target: attr(node, "target"),
        phase_major: attr(node, "phase_major"),
        phase_minor: attr(node, "phase_minor"),
      };
      if schema == SchemaVersion::V1_0 {
        BuildFields::Legacy(legacy)
      } else {
        BuildFields::Transitional(legacy)
      }
    }
    SchemaVersion::V2_0 => BuildFields::Current(CurrentFields {
      subproduct: attr(node, "subproduct"),
      build: attr(node, "build"),
      datetime: attr(node, "datetime"),
      compilertarget: attr(node, "compilertarget"),
      licensemodel: attr(node, "licensemodel"),
      format: attr(node, "format"),
      platform: attr(node, "platform"),
    }),
  };

  let mut build = Build::with_fields(&product, &version, node.attribute("lang").unwrap_or_default(), fields);

  for child in node.children().filter(Node::is_element) {
    match child.tag_name().name() {
      tags::REPOSITORY => build.children.push(BuildChild::Repository(Repository::new(
        attr(child, "scheme"),
        attr(child, "authority"),
        attr(child, "path"),
        attr(child, "query"),
      ))),
      tags::COMPONENTS => build.children.push(BuildChild::Components(child_builds(child)?)),
      tags::DIRECT_COMPONENTS => build
        .children
        .push(BuildChild::DirectComponents(child_builds(child)?)),
      tags::METADATA => {
        build.children.push(BuildChild::Metadata(Vec::new()));
        for item in child.children().filter(|n| n.has_tag_name(tags::ITEM)) {
          build.add_metadata(attr(item, "key"), attr(item, "value"));
        }
      }
      tags::FILEINFO => {
        let files: Vec<FileRecord> = child
          .children()
          .filter(|n| n.has_tag_name(tags::FILE))
          .map(parse_file)
          .collect::<Result<_, _>>()?;
        build.children.push(BuildChild::FileInfo(files));
      }
      _ => {}
    }
  }

  Ok(build)
}

fn parse_file(node: Node) -> Result<FileRecord, ManifestError> {
  let name = attr(node, "name");
  let size = match node.attribute("size") {
    Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| ManifestError::InvalidFileSize {
      name: name.clone(),
      size: raw.to_string(),
    })?),
    None => None,
  };
  Ok(FileRecord {
    name,
    checksum: attr(node, "md5"),
    size,
  })
}
