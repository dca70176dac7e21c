//! Manifest tests against on-disk fixtures.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use vinfo_lib::manifest::{self, BuildChild, ErrorKind, SchemaVersion};
use vinfo_lib::{Manifest, ManifestError, NewBuild};

fn fixture(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn design_premium() -> NewBuild<'static> {
  NewBuild {
    product: "Design Premium",
    version: "CS4",
    subproduct: "Suite",
    build: "20080311.m.154",
    datetime: "2008/03/11:14:02:51",
    compiler_target: "Release",
    license_model: "Retail",
    format: "DVD",
    platform: "win32",
    lang: "en_US",
  }
}

mod loading {
  use super::*;

  #[test]
  fn legacy_1_0_collapses_split_versions() {
    let manifest = Manifest::load(fixture("v1_0.xml")).unwrap();
    assert_eq!(manifest.version(), 1.0);
    assert_eq!(
      manifest.version_strings(None),
      vec!["Illustrator 13.0.2 20070314.r.12", "Bridge 2.1 118"]
    );
    assert_eq!(
      manifest.version_dates(None),
      vec!["2007/03/14:09:30:00", "2007/03/01:23:59:59"]
    );
    assert_eq!(manifest.builds(None)[0].schema(), SchemaVersion::V1_0);
  }

  #[test]
  fn legacy_target_comes_from_first_build() {
    assert_eq!(
      manifest::target(fixture("v1_0.xml")).unwrap().as_deref(),
      Some("Release")
    );
    assert_eq!(
      manifest::target(fixture("v1_1.xml")).unwrap().as_deref(),
      Some("Release")
    );
    assert_eq!(manifest::target(fixture("v2_0.xml")).unwrap(), None);
  }

  #[test]
  fn transitional_1_1_keeps_metadata() {
    let manifest = Manifest::load(fixture("v1_1.xml")).unwrap();
    let build = manifest.first_build().unwrap();
    assert_eq!(build.schema(), SchemaVersion::V1_1);
    assert_eq!(build.fullversion(), "5.0 20071102.m.444");
    assert_eq!(build.lang(), "en_US,fr_FR");
    assert_eq!(
      build.metadata("AdobeCode"),
      Some("{D6E3A9C2-0000-0000-0000-000000000001}")
    );
  }

  #[test]
  fn nested_components_and_files() {
    let manifest = Manifest::load(fixture("v2_0.xml")).unwrap();
    let suite = manifest.first_build().unwrap();
    assert_eq!(suite.repositories()[0].uri(), "perforce://p4.example.com:1666//suites/main?change=54321");

    let products: Vec<_> = suite.components().iter().map(|b| b.product()).collect();
    assert_eq!(products, vec!["Photoshop", "Illustrator"]);
    assert_eq!(suite.components()[0].components()[0].product(), "Camera Raw");

    let files = manifest::files(fixture("v2_0.xml")).unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].size, Some(1048576));
    assert_eq!(files[1].name, "payloads/Photoshop.zip");
    assert_eq!(files[1].size, None);
  }

  #[test]
  fn direct_components_may_precede_components() {
    let manifest = Manifest::load(fixture("direct_first.xml")).unwrap();
    let suite = manifest.first_build().unwrap();
    assert!(matches!(suite.children()[0], BuildChild::Metadata(_)));
    assert!(matches!(suite.children()[1], BuildChild::DirectComponents(_)));
    assert!(matches!(suite.children()[4], BuildChild::Repository(_)));

    let products: Vec<_> = suite.components().iter().map(|b| b.product()).collect();
    assert_eq!(products, vec!["Photoshop", "Illustrator"]);
    assert_eq!(suite.direct_components()[0].components()[0].product(), "Camera Raw");
  }

  #[test]
  fn attributes_wrapped_across_lines() {
    let manifest = Manifest::load(fixture("wrapped.xml")).unwrap();
    let build = manifest.first_build().unwrap();
    assert_eq!(build.product(), "Acrobat");
    assert_eq!(build.platform(), Some("mac"));
    assert_eq!(build.lang(), "en_US");
  }

  #[test]
  fn two_versioninfo_containers_is_structure_error() {
    let err = Manifest::load(fixture("two_versioninfo.xml")).unwrap_err();
    assert!(matches!(err, ManifestError::MultipleVersionInfo(2)));
    assert_eq!(err.kind(), ErrorKind::Structure);
  }

  #[test]
  fn missing_file_is_source_not_found() {
    let err = Manifest::load(fixture("does_not_exist.xml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    assert!(manifest::version_strings(fixture("does_not_exist.xml"), None).is_err());
  }

  #[test]
  fn from_source_accepts_path_or_text() {
    let path = fixture("v1_1.xml");
    let from_path = Manifest::from_source(path.to_str().unwrap()).unwrap();
    let from_text = Manifest::from_source(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(from_path, from_text);
  }
}

mod writing {
  use super::*;

  #[test]
  fn current_fixture_is_reproduced_exactly() {
    let path = fixture("v2_0.xml");
    let manifest = Manifest::load(&path).unwrap();
    assert_eq!(manifest.to_xml("UTF-8"), fs::read_to_string(&path).unwrap());
  }

  #[test]
  fn document_child_order_is_reproduced_exactly() {
    let path = fixture("direct_first.xml");
    let manifest = Manifest::load(&path).unwrap();
    assert_eq!(manifest.to_xml("UTF-8"), fs::read_to_string(&path).unwrap());
  }

  #[test]
  fn mutation_api_manifest_round_trips() {
    let mut source = Manifest::new();
    source
      .add_build(NewBuild {
        product: "Photoshop",
        version: "11.0",
        subproduct: "Application",
        build: "20080310.m.88",
        datetime: "2008/03/10:22:10:05",
        compiler_target: "Release",
        license_model: "Retail",
        format: "Folder",
        platform: "win32",
        lang: "mul",
      })
      .add_file("Photoshop.exe", "0cc175b9c0f1b6a831c399e269772661", Some(42));
    source.add_build(NewBuild {
      product: "Bridge",
      version: "3.0",
      subproduct: "Application",
      build: "20080318.m.7",
      datetime: "2008/03/18:17:00:00",
      compiler_target: "Release",
      license_model: "Retail",
      format: "Folder",
      platform: "win32",
      lang: "mul",
    });

    let mut manifest = Manifest::new();
    let suite = manifest.add_build(design_premium());
    suite.add_repository("perforce", "p4.example.com:1666", "//suites/main", "@1234");
    suite.add_repository("git", "git.example.com", "/suite.git", "");
    assert_eq!(suite.add_components(&source, Some("Photoshop")), 1);
    assert_eq!(suite.add_component_file(fixture("v1_1.xml"), None).unwrap(), 1);
    assert_eq!(suite.add_direct_components(&source, Some("Bridge")), 1);
    suite.add_metadata("AdobeCode", "{45FB0721-29BD-4C62-98C5-D1396787462F}");
    suite.add_metadata("Owner", "release & packaging <qa>");
    suite.add_file("Setup.exe", "d41d8cd98f00b204e9800998ecf8427e", Some(1048576));
    suite.add_file("payloads/Photoshop.zip", "0cc175b9c0f1b6a831c399e269772661", None);
    manifest.add_build(NewBuild {
      product: "Acrobat",
      lang: "",
      ..design_premium()
    });

    let reparsed = Manifest::parse(&manifest.to_xml("UTF-8")).unwrap();
    assert_eq!(reparsed, manifest);

    let suite = reparsed.first_build().unwrap();
    assert_eq!(suite.repositories().len(), 2);
    assert_eq!(suite.components().len(), 2);
    assert_eq!(suite.direct_components()[0].product(), "Bridge");
    assert_eq!(suite.metadata("Owner"), Some("release & packaging <qa>"));
    assert_eq!(suite.files()[1].size, None);
  }

  #[test]
  fn non_ascii_text_is_saved_in_declared_encoding() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("versioninfo.xml");

    let mut manifest = Manifest::new();
    manifest.add_build(NewBuild {
      product: "Café",
      ..design_premium()
    });
    manifest.save(&out, "ISO-8859-1").unwrap();

    let bytes = fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>"));
    assert!(bytes.windows(5).any(|w| w == b"Caf\xe9\""));
    assert_eq!(Manifest::load(&out).unwrap(), manifest);

    manifest.save(&out, "UTF-16").unwrap();
    assert!(fs::read(&out).unwrap().starts_with(&[0xff, 0xfe, b'<', 0]));
    assert_eq!(Manifest::load(&out).unwrap(), manifest);
  }

  #[test]
  fn unknown_encoding_is_rejected_before_writing() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("versioninfo.xml");
    let err = Manifest::new().save(&out, "EBCDIC-42").unwrap_err();
    assert!(matches!(err, ManifestError::UnsupportedEncoding(_)));
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!out.exists());
  }

  #[test]
  fn save_and_reload_round_trips() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("versioninfo.xml");
    let original = Manifest::load(fixture("v1_1.xml")).unwrap();
    original.save(&out, "UTF-8").unwrap();
    assert_eq!(Manifest::load(&out).unwrap(), original);
  }

  #[test]
  fn legacy_1_0_is_written_in_1_1_layout() {
    let manifest = Manifest::load(fixture("v1_0.xml")).unwrap();
    let xml = manifest.to_xml("UTF-8");
    assert!(!xml.contains("version_major"));

    let reparsed = Manifest::parse(&xml).unwrap();
    assert_eq!(reparsed.builds(None)[0].schema(), SchemaVersion::V1_1);
    assert_eq!(reparsed.version_strings(None), manifest.version_strings(None));
    assert_eq!(reparsed.version_dates(None), manifest.version_dates(None));
  }

  #[test]
  fn manifest_serializes_to_json() {
    let manifest = Manifest::load(fixture("v2_0.xml")).unwrap();
    let value = serde_json::to_value(&manifest).unwrap();
    assert_eq!(value["builds"][0]["product"], "Design Premium");
    assert_eq!(value["builds"][0]["fields"]["schema"], "2.0");
    assert_eq!(value["builds"][0]["fields"]["platform"], "win32");
  }
}

mod composing {
  use super::*;

  #[test]
  fn suite_with_components_and_metadata() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("versioninfo.xml");

    let mut manifest = Manifest::new();
    let build = manifest.add_build(design_premium());
    build.add_metadata("AdobeCode", "{00000000-0000-0000-0000-000000000000}");
    build.add_metadata("AdobeCode", "{45FB0721-29BD-4C62-98C5-D1396787462F}");
    let added = build
      .add_component_file(fixture("v1_0.xml"), Some("Bridge"))
      .unwrap();
    assert_eq!(added, 1);
    manifest.save(&out, "UTF-8").unwrap();

    let reloaded = Manifest::load(&out).unwrap();
    let suite = reloaded.first_build().unwrap();
    assert_eq!(
      reloaded.version_strings(Some("Design Premium")),
      vec!["Design Premium CS4 20080311.m.154"]
    );
    assert_eq!(suite.metadata_entries().len(), 1);
    assert_eq!(
      suite.metadata("AdobeCode"),
      Some("{45FB0721-29BD-4C62-98C5-D1396787462F}")
    );
    assert_eq!(suite.components()[0].fullversion(), "2.1 118");
  }

  #[test]
  fn missing_component_file_leaves_build_untouched() {
    let mut manifest = Manifest::new();
    let build = manifest.add_build(design_premium());
    let err = build
      .add_direct_component_file(fixture("nope.xml"), None)
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    assert!(!build.has_direct_components());
  }

  #[test]
  fn prune_keeps_first_grouping_only() {
    let mut manifest = Manifest::load(fixture("v2_0.xml")).unwrap();
    assert_eq!(manifest.prune_components(), 2);
    assert_eq!(manifest.prune_components(), 0);

    let suite = manifest.first_build().unwrap();
    assert_eq!(suite.components().len(), 2);
    assert!(suite.components().iter().all(|c| !c.has_components()));
  }

  #[test]
  fn prune_follows_loaded_document_order() {
    let mut manifest = Manifest::load(fixture("direct_first.xml")).unwrap();
    assert_eq!(manifest.prune_components(), 2);

    let suite = manifest.first_build().unwrap();
    assert!(!suite.has_components());
    let bridge = suite.direct_components()[0];
    assert_eq!(bridge.components()[0].product(), "Camera Raw");
    assert_eq!(manifest.prune_components(), 0);
  }

  #[test]
  fn design_premium_end_to_end() {
    let mut manifest = Manifest::new();
    let build = manifest.add_build(NewBuild {
      product: "Design Premium",
      version: "CS4",
      subproduct: "Application",
      build: "20080311.m.154",
      datetime: "2008/03/11:15:00:00",
      compiler_target: "None",
      license_model: "Retail",
      format: "RIBS Installer",
      platform: "win32",
      lang: "en_US,fr_CA,es_MX,en_GB",
    });
    build.add_metadata("AdobeCode", "45FB0721-29BD-4C62-98C5-D1396787462F");

    let reparsed = Manifest::parse(&manifest.to_xml("UTF-8")).unwrap();
    let builds = reparsed.builds(None);
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].fullversion(), "CS4 20080311.m.154");
    assert_eq!(builds[0].lang(), "en_US,fr_CA,es_MX,en_GB");
    assert_eq!(builds[0].format(), Some("RIBS Installer"));
    assert_eq!(
      builds[0].metadata("AdobeCode"),
      Some("45FB0721-29BD-4C62-98C5-D1396787462F")
    );
  }

  #[test]
  fn files_from_directory_are_recorded() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("sub")).unwrap();
    fs::write(temp.path().join("b.txt"), "hello world").unwrap();
    fs::write(temp.path().join("sub/a.txt"), "").unwrap();

    let mut manifest = Manifest::new();
    let build = manifest.add_build(design_premium());
    assert_eq!(build.add_files_from_dir(temp.path()).unwrap(), 2);

    let names: Vec<_> = build.files().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["b.txt", "sub/a.txt"]);
    assert_eq!(
      build.files()[0].checksum,
      "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
    assert_eq!(build.files()[0].size, Some(11));
  }
}
