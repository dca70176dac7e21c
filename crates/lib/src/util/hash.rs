//! Hashing utilities for build file records.
//!
//! This module provides:
//! - `ContentHash`: A full 64-character SHA-256 hash of a file's contents
//! - `scan_directory()`: Deterministic listing of a build output directory
//! - `hash_file()`: Single file hashing

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// A full 64-character SHA-256 hash for content verification.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error while hashing files.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
  #[error("failed to walk directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: String, message: String },
}

/// One regular file found by [`scan_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
  /// Path relative to the scanned root, always using `/` separators.
  pub relative_path: String,
  pub hash: ContentHash,
  pub size: u64,
}

/// List every regular file below `root` with its hash and size.
///
/// Entries are sorted by relative path. Directories contribute no entry of
/// their own and symlinks are not followed.
///
/// # Example
///
/// ```ignore
/// for file in scan_directory(Path::new("out/Release"))? {
///   println!("{} {}", file.relative_path, file.hash);
/// }
/// ```
pub fn scan_directory(root: &Path) -> Result<Vec<ScannedFile>, HashError> {
  let mut files = Vec::new();

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.map_err(|e| HashError::WalkDir { message: e.to_string() })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let entry_path = entry.path();
    let relative_path = entry_path
      .strip_prefix(root)
      .unwrap_or(entry_path)
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");

    let size = entry
      .metadata()
      .map_err(|e| HashError::ReadFile {
        path: entry_path.display().to_string(),
        message: e.to_string(),
      })?
      .len();

    files.push(ScannedFile {
      relative_path,
      hash: hash_file(entry_path)?,
      size,
    });
  }

  // WalkDir sorts per directory; make the whole list ordered by path
  files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
  Ok(files)
}

/// Hash a file's contents.
///
/// Returns the full 64-character SHA-256 hash of the file.
pub fn hash_file(path: &Path) -> Result<ContentHash, HashError> {
  let mut file = fs::File::open(path).map_err(|e| HashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|e| HashError::ReadFile {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  fn hash_bytes(data: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    ContentHash(hex::encode(hasher.finalize()))
  }

  #[test]
  fn hash_bytes_matches_known_digest() {
    assert_eq!(
      hash_bytes(b"hello world").0,
      "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
  }

  #[test]
  fn hash_file_matches_hash_bytes() {
    let temp = tempdir().unwrap();
    let file_path = temp.path().join("test.txt");
    fs::write(&file_path, "hello world").unwrap();

    let hash = hash_file(&file_path).unwrap();
    assert_eq!(hash.0.len(), 64);
    assert_eq!(hash, hash_bytes(b"hello world"));
  }

  #[test]
  fn hash_file_missing_is_read_error() {
    let temp = tempdir().unwrap();
    let err = hash_file(&temp.path().join("nope")).unwrap_err();
    assert!(matches!(err, HashError::ReadFile { .. }));
  }

  #[test]
  fn scan_empty_directory() {
    let temp = tempdir().unwrap();
    assert!(scan_directory(temp.path()).unwrap().is_empty());
  }

  #[test]
  fn scan_lists_nested_files_sorted_with_forward_slashes() {
    let temp = tempdir().unwrap();
    fs::create_dir_all(temp.path().join("bin/tools")).unwrap();
    fs::write(temp.path().join("setup.exe"), "setup").unwrap();
    fs::write(temp.path().join("bin/tools/a.dll"), "a").unwrap();
    fs::write(temp.path().join("bin/readme.txt"), "readme!").unwrap();

    let files = scan_directory(temp.path()).unwrap();
    let names: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(names, vec!["bin/readme.txt", "bin/tools/a.dll", "setup.exe"]);
    assert_eq!(files[0].size, 7);
    assert_eq!(files[2].hash, hash_bytes(b"setup"));
  }
}
