//! vinfo-lib: build manifests and artifact locations for release tooling
//!
//! This crate provides the pieces build scripts use to describe and move
//! release artifacts:
//! - `Manifest`: the hierarchical version/build document (`versioninfo.xml`)
//! - `Location`: parsed `scheme://server/path` artifact locations
//! - `RemoteTransport`: uniform list/download/upload over a location
//! - `VolumeMounter`: attaches network shares to a local path

pub mod config;
pub mod location;
pub mod manifest;
pub mod mount;
pub mod util;

pub use config::Credentials;
pub use location::transport::{AccessMode, RemoteTransport, open_location};
pub use location::{Location, Protocol, TransportError};
pub use manifest::{Build, Manifest, ManifestError, NewBuild};
pub use mount::{SystemMounter, VolumeMounter};
