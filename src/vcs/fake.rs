//! In-memory VCS and shell doubles for tests
//!
//! `FakeVcs` serves a set of remote variant URLs with revisions. A checkout
//! creates the working copy directory (with a metadata dir) and records the
//! checked-out revision in a `.rev` file, which is what local revision
//! queries read back.

use crate::cache::payload::Revision;
use crate::error::{BuildcError, BuildcResult};
use crate::vcs::{Shell, Vcs};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const REVISION_FILE: &str = ".rev";

#[derive(Default)]
struct FakeState {
    remote: BTreeMap<String, String>,
    /// working copy -> remote URL it was checked out from
    working_copies: BTreeMap<PathBuf, String>,
    calls: Vec<String>,
    fail_checkout: bool,
}

#[derive(Clone, Default)]
pub struct FakeVcs {
    state: Arc<Mutex<FakeState>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish (or bump) a remote variant URL at `revision`
    pub fn publish(&self, url: &str, revision: &str) {
        let mut state = self.state.lock().unwrap();
        state.remote.insert(url.to_string(), revision.to_string());
    }

    pub fn fail_checkouts(&self) {
        self.state.lock().unwrap().fail_checkout = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn remote_revision(&self, url: &str) -> BuildcResult<String> {
        self.state
            .lock()
            .unwrap()
            .remote
            .get(url)
            .cloned()
            .ok_or_else(|| BuildcError::command_exec(format!("info {}", url), "no such URL"))
    }

    fn materialize(&self, local: &Path, revision: &str) {
        std::fs::create_dir_all(local.join(".svn")).unwrap();
        std::fs::write(local.join(REVISION_FILE), revision).unwrap();
    }
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn query_revision(&self, target: &str, force: bool) -> BuildcResult<Revision> {
        self.record(format!("info {} force={}", target, force));
        let raw = if target.contains("://") {
            self.remote_revision(target)?
        } else {
            std::fs::read_to_string(Path::new(target).join(REVISION_FILE))
                .map_err(|e| BuildcError::io(format!("reading revision of {}", target), e))?
        };
        Revision::new(raw).ok_or_else(|| BuildcError::RevisionMissing(target.to_string()))
    }

    async fn checkout(&self, remote: &str, local: &Path, ignore_errors: bool) -> BuildcResult<()> {
        self.record(format!("checkout {} {}", remote, local.display()));
        if self.state.lock().unwrap().fail_checkout {
            return if ignore_errors {
                Ok(())
            } else {
                Err(BuildcError::command_exec("checkout", "refused"))
            };
        }

        let revision = self.remote_revision(remote)?;
        self.materialize(local, &revision);
        self.state
            .lock()
            .unwrap()
            .working_copies
            .insert(local.to_path_buf(), remote.to_string());
        Ok(())
    }

    async fn update(&self, local: &Path, _ignore_errors: bool) -> BuildcResult<()> {
        self.record(format!("update {}", local.display()));
        let remote = self
            .state
            .lock()
            .unwrap()
            .working_copies
            .get(local)
            .cloned()
            .ok_or_else(|| BuildcError::command_exec("update", "not a working copy"))?;
        let revision = self.remote_revision(&remote)?;
        self.materialize(local, &revision);
        Ok(())
    }

    async fn list(&self, url: &str) -> BuildcResult<Vec<String>> {
        self.record(format!("list {}", url));
        let prefix = format!("{}/", url);
        let state = self.state.lock().unwrap();
        let mut entries: Vec<String> = Vec::new();
        for remote in state.remote.keys() {
            if let Some(rest) = remote.strip_prefix(&prefix) {
                let entry = rest.split('/').next().unwrap_or_default().to_string();
                if !entry.is_empty() && !entries.contains(&entry) {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }

    fn metadata_dir(&self) -> &'static str {
        ".svn"
    }
}

/// Shell that records commands; `rm -rf` is carried out on the real filesystem
#[derive(Clone, Default)]
pub struct FakeShell {
    commands: Arc<Mutex<Vec<Vec<String>>>>,
    status: i32,
}

impl FakeShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shell whose commands all fail with `status` and touch nothing
    pub fn failing(status: i32) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl Shell for FakeShell {
    async fn run_capturing_status(&self, command: &[String]) -> BuildcResult<i32> {
        self.commands.lock().unwrap().push(command.to_vec());
        if self.status != 0 {
            return Ok(self.status);
        }
        if let [program, flag, targets @ ..] = command {
            if program == "rm" && flag == "-rf" {
                for target in targets {
                    let _ = std::fs::remove_dir_all(target);
                }
            }
        }
        Ok(0)
    }
}
