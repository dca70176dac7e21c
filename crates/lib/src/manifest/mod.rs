//! Build manifest document model.
//!
//! A manifest (`versioninfo.xml`) records what shipped in a release: one or
//! more builds with their product, version, build number and timestamp,
//! plus nested component builds, repositories, metadata and a file log.
//!
//! # Layout
//!
//! ```xml
//! <manifest version="2.0">
//!   <versioninfo>
//!     <build product=".." version=".." build=".." compilertarget=".." ...>
//!       <repository scheme=".." authority=".." path=".." query=".."/>
//!       <components>
//!         <build .../>
//!       </components>
//!       <directcomponents>
//!         <build .../>
//!       </directcomponents>
//!       <metadata>
//!         <item key=".." value=".."/>
//!       </metadata>
//!       <fileinfo>
//!         <file name=".." md5=".." size=".."/>
//!       </fileinfo>
//!     </build>
//!   </versioninfo>
//! </manifest>
//! ```
//!
//! A build's child elements may come in any order and may repeat. Parsed
//! builds keep that order, and it decides which `components` grouping
//! [`Manifest::prune_components`] keeps.

mod build;
mod document;
mod encoding;
mod error;
mod parse;
mod write;

pub use build::*;
pub use document::*;
pub use error::*;

/// Element and shared attribute names of the XML layout.
mod tags {
  pub const MANIFEST: &str = "manifest";
  pub const VERSIONINFO: &str = "versioninfo";
  pub const BUILD: &str = "build";
  pub const REPOSITORY: &str = "repository";
  pub const COMPONENTS: &str = "components";
  pub const DIRECT_COMPONENTS: &str = "directcomponents";
  pub const METADATA: &str = "metadata";
  pub const ITEM: &str = "item";
  pub const FILEINFO: &str = "fileinfo";
  pub const FILE: &str = "file";
  pub const VERSION: &str = "version";
}
