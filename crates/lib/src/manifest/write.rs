//! Manifest model to indented XML.
//!
//! Output is deterministic: attributes are written in a fixed order per
//! element, and a build's children come out in the order the build holds
//! them. Pre-2.0 builds are written in the 1.1 layout, so a 1.0 record
//! loses its split version attributes here.

use super::build::{Build, BuildChild, BuildFields};
use super::document::Manifest;
use super::tags;

const INDENT: &str = "  ";

struct XmlWriter {
  out: String,
  depth: usize,
}

impl XmlWriter {
  fn new(encoding: &str) -> Self {
    let mut out = String::new();
    out.push_str(&format!("<?xml version=\"1.0\" encoding=\"{}\"?>\n", escape(encoding)));
    Self { out, depth: 0 }
  }

  fn tag(&mut self, name: &str, attrs: &[(&str, &str)], close: &str) {
    for _ in 0..self.depth {
      self.out.push_str(INDENT);
    }
    self.out.push('<');
    self.out.push_str(name);
    for (key, value) in attrs {
      self.out.push(' ');
      self.out.push_str(key);
      self.out.push_str("=\"");
      self.out.push_str(&escape(value));
      self.out.push('"');
    }
    self.out.push_str(close);
    self.out.push('\n');
  }

  fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) {
    self.tag(name, attrs, "/>");
  }

  fn start(&mut self, name: &str, attrs: &[(&str, &str)]) {
    self.tag(name, attrs, ">");
    self.depth += 1;
  }

  fn end(&mut self, name: &str) {
    self.depth -= 1;
    for _ in 0..self.depth {
      self.out.push_str(INDENT);
    }
    self.out.push_str("</");
    self.out.push_str(name);
    self.out.push_str(">\n");
  }

  /// Writes `name` as a container of `children`, self-closed when empty.
  fn group<T>(&mut self, name: &str, children: &[T], mut each: impl FnMut(&mut Self, &T)) {
    if children.is_empty() {
      self.empty(name, &[]);
      return;
    }
    self.start(name, &[]);
    for child in children {
      each(self, child);
    }
    self.end(name);
  }
}

pub(crate) fn write_document(manifest: &Manifest, encoding: &str) -> String {
  let mut w = XmlWriter::new(encoding);
  w.start(tags::MANIFEST, &[(tags::VERSION, manifest.version.as_str())]);
  w.group(tags::VERSIONINFO, &manifest.builds, write_build);
  w.end(tags::MANIFEST);
  w.out
}

fn write_build(w: &mut XmlWriter, build: &Build) {
  let attrs: Vec<(&str, &str)> = match &build.fields {
    BuildFields::Legacy(f) | BuildFields::Transitional(f) => vec![
      ("product", build.product.as_str()),
      (tags::VERSION, build.version.as_str()),
      ("version_build", f.version_build.as_str()),
      ("date", f.date.as_str()),
      ("time", f.time.as_str()),
      ("target", f.target.as_str()),
      ("phase_major", f.phase_major.as_str()),
      ("phase_minor", f.phase_minor.as_str()),
      ("lang", build.lang.as_str()),
    ],
    BuildFields::Current(f) => vec![
      ("product", build.product.as_str()),
      (tags::VERSION, build.version.as_str()),
      ("subproduct", f.subproduct.as_str()),
      ("build", f.build.as_str()),
      ("datetime", f.datetime.as_str()),
      ("compilertarget", f.compilertarget.as_str()),
      ("licensemodel", f.licensemodel.as_str()),
      ("format", f.format.as_str()),
      ("platform", f.platform.as_str()),
      ("lang", build.lang.as_str()),
    ],
  };

  if build.children.is_empty() {
    w.empty(tags::BUILD, &attrs);
    return;
  }

  w.start(tags::BUILD, &attrs);
  for child in &build.children {
    match child {
      BuildChild::Repository(repo) => w.empty(
        tags::REPOSITORY,
        &[
          ("scheme", repo.scheme()),
          ("authority", repo.authority()),
          ("path", repo.path()),
          ("query", repo.query()),
        ],
      ),
      BuildChild::Components(builds) => w.group(tags::COMPONENTS, builds, write_build),
      BuildChild::DirectComponents(builds) => w.group(tags::DIRECT_COMPONENTS, builds, write_build),
      BuildChild::Metadata(items) => w.group(tags::METADATA, items, |w, item| {
        w.empty(tags::ITEM, &[("key", item.key.as_str()), ("value", item.value.as_str())]);
      }),
      BuildChild::FileInfo(files) => w.group(tags::FILEINFO, files, |w, file| {
        let size = file.size.map(|s| s.to_string());
        let mut attrs = vec![("name", file.name.as_str()), ("md5", file.checksum.as_str())];
        if let Some(size) = &size {
          attrs.push(("size", size.as_str()));
        }
        w.empty(tags::FILE, &attrs);
      }),
    }
  }
  w.end(tags::BUILD);
}

/// Escape text for use inside a double-quoted attribute value.
///
/// Whitespace control characters become character references so that
/// attribute-value normalization on reparse leaves them intact.
fn escape(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\n' => escaped.push_str("&#10;"),
      '\r' => escaped.push_str("&#13;"),
      '\t' => escaped.push_str("&#9;"),
      _ => escaped.push(c),
    }
  }
  escaped
}
