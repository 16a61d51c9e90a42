//! Version control and shell abstractions
//!
//! The cache tree talks to the outside world only through these traits,
//! so tests can substitute recording fakes for the real subprocesses.

#[cfg(test)]
pub(crate) mod fake;
pub mod shell;
pub mod svn;

pub use shell::SystemShell;
pub use svn::SvnClient;

use crate::cache::payload::Revision;
use crate::config::Config;
use crate::error::BuildcResult;
use async_trait::async_trait;
use std::path::Path;

/// Version control client
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Revision of a remote URL or a local working copy.
    ///
    /// With `force` the client must ask the VCS again instead of reusing an
    /// answer it already obtained during this run.
    async fn query_revision(&self, target: &str, force: bool) -> BuildcResult<Revision>;

    /// Check out `remote` into `local`. With `ignore_errors` a failed
    /// checkout is logged and reported as success.
    async fn checkout(&self, remote: &str, local: &Path, ignore_errors: bool) -> BuildcResult<()>;

    /// Bring the working copy at `local` up to date
    async fn update(&self, local: &Path, ignore_errors: bool) -> BuildcResult<()>;

    /// Directory entries directly under `url`, without trailing separators
    async fn list(&self, url: &str) -> BuildcResult<Vec<String>>;

    /// Name of the metadata directory inside a working copy
    fn metadata_dir(&self) -> &'static str;
}

/// Runs external commands and reports their exit status
#[async_trait]
pub trait Shell: Send + Sync {
    /// Run `command` (program first) and return its exit status.
    /// Signal termination is reported as `-1`.
    async fn run_capturing_status(&self, command: &[String]) -> BuildcResult<i32>;
}

/// Create the VCS client named in the configuration
pub fn create_vcs(config: &Config) -> Box<dyn Vcs> {
    Box::new(SvnClient::new(config.vcs.program.clone()))
}
