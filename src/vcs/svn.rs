//! Subversion client driving the `svn` command line tool

use crate::cache::payload::Revision;
use crate::error::{BuildcError, BuildcResult};
use crate::vcs::Vcs;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// VCS client for Subversion repositories
pub struct SvnClient {
    program: String,
    /// Revisions already obtained during this run, keyed by target
    revisions: Mutex<HashMap<String, Revision>>,
}

impl SvnClient {
    /// Create a client invoking `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            revisions: Mutex::new(HashMap::new()),
        }
    }

    fn render(&self, args: &[&str]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    /// Execute an svn command and return the output
    async fn exec(&self, args: &[&str]) -> BuildcResult<std::process::Output> {
        debug!("Executing: {}", self.render(args));

        Command::new(&self.program)
            .arg("--non-interactive")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| BuildcError::command_failed(self.render(args), e))
    }

    /// Execute a command that changes a working copy
    async fn exec_checked(&self, args: &[&str], ignore_errors: bool) -> BuildcResult<()> {
        let output = self.exec(args).await?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if ignore_errors {
            warn!("Ignoring failure of {}: {}", self.render(args), stderr);
            Ok(())
        } else {
            Err(BuildcError::command_exec(self.render(args), stderr))
        }
    }

    fn remembered(&self, target: &str) -> Option<Revision> {
        self.revisions
            .lock()
            .ok()
            .and_then(|revisions| revisions.get(target).cloned())
    }

    fn remember(&self, target: &str, revision: &Revision) {
        if let Ok(mut revisions) = self.revisions.lock() {
            revisions.insert(target.to_string(), revision.clone());
        }
    }

    /// Drop the remembered revision of a working copy that just changed
    fn forget(&self, target: &str) {
        if let Ok(mut revisions) = self.revisions.lock() {
            revisions.remove(target);
        }
    }
}

#[async_trait]
impl Vcs for SvnClient {
    async fn query_revision(&self, target: &str, force: bool) -> BuildcResult<Revision> {
        if !force {
            if let Some(revision) = self.remembered(target) {
                debug!("Reusing revision {} for {}", revision, target);
                return Ok(revision);
            }
        }

        let args = ["info", "--show-item", "last-changed-revision", target];
        let output = self.exec(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildcError::command_exec(
                self.render(&args),
                stderr.trim(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let revision = Revision::new(stdout.into_owned())
            .ok_or_else(|| BuildcError::RevisionMissing(target.to_string()))?;

        self.remember(target, &revision);
        Ok(revision)
    }

    async fn checkout(&self, remote: &str, local: &Path, ignore_errors: bool) -> BuildcResult<()> {
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                BuildcError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }

        info!("Checkout [{}]...", remote);
        let local = local.to_string_lossy();
        self.forget(&local);
        self.exec_checked(&["checkout", remote, &*local], ignore_errors)
            .await
    }

    async fn update(&self, local: &Path, ignore_errors: bool) -> BuildcResult<()> {
        let local = local.to_string_lossy();
        info!("Update [{}]...", local);
        self.forget(&local);
        self.exec_checked(&["update", &*local], ignore_errors).await
    }

    async fn list(&self, url: &str) -> BuildcResult<Vec<String>> {
        let args = ["list", url];
        let output = self.exec(&args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildcError::command_exec(
                self.render(&args),
                stderr.trim(),
            ));
        }

        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }

    fn metadata_dir(&self) -> &'static str {
        ".svn"
    }
}

/// Directory entries of `svn list` output; files are skipped
fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_suffix('/'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
