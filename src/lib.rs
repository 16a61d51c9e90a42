//! buildc - Dependency cache manager for C/C++ builds
//!
//! Mirrors prebuilt libraries from Subversion repositories into a local
//! cache, keyed by repository, library, version and platform variant, and
//! keeps those working copies in sync with the remote.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod registry;
pub mod tree;
pub mod ui;
pub mod vcs;

pub use error::{BuildcError, BuildcResult};
