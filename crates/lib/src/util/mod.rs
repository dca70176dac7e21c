//! Shared utilities.
//!
//! Checksums for the file records a build carries.

pub mod hash;
