//! Cache tree: the libraries map bound to a registry and a VCS
//!
//! Leaves of the map are `repo-root | library | version | variant`
//! coordinates. The cache tree resolves each one to a working copy under
//! its repository's cache root and keeps that working copy in line with
//! the remote, or removes it and prunes the directories left empty.

use crate::cache::coordinate::{CacheLocation, Coordinate};
use crate::cache::leaves::Leaves;
use crate::cache::payload::{Payload, Revision};
use crate::cache::variant::{BuildMode, Platform};
use crate::error::{BuildcError, BuildcResult};
use crate::registry::Registry;
use crate::tree::{NodeId, Tree};
use crate::vcs::{Shell, Vcs};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Remediation printed after a failed consistency check
pub const UPGRADE_HINT: &str = "Please use [buildc cache upgrade] to update the libraries map.";

/// A cached library resolved for the build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLib {
    pub name: String,
    pub version: String,
    /// Cache root of the repository the library comes from
    pub cache_root: PathBuf,
}

/// Two repositories sharing one cache directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConflict {
    pub cache_path: PathBuf,
    pub previous_url: String,
    pub current_url: String,
}

impl fmt::Display for CacheConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} and {} both map to {}",
            self.previous_url,
            self.current_url,
            self.cache_path.display()
        )
    }
}

/// Outcome of comparing the libraries map with the declared repositories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Declared URLs with no root in the map
    pub missing: Vec<String>,
    /// Declared URLs listed more than once
    pub duplicated: Vec<String>,
    /// Distinct declared URLs present in the map
    pub declared: usize,
    /// Roots in the map
    pub discovered: usize,
    /// Whether the declared URLs do not appear in map order
    pub out_of_order: bool,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty()
            && self.duplicated.is_empty()
            && self.declared == self.discovered
            && !self.out_of_order
    }

    /// One line per violation; empty when consistent
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for url in &self.missing {
            lines.push(format!(
                "Error: repository {} does not exist in the libraries map.",
                url
            ));
        }
        for url in &self.duplicated {
            lines.push(format!(
                "Error: repository {} is repeated in the configuration.",
                url
            ));
        }
        if self.declared != self.discovered {
            lines.push(format!(
                "Error: the libraries map holds {} repositories but {} are declared; \
                 repositories had to be removed.",
                self.discovered, self.declared
            ));
        }
        if self.out_of_order {
            lines.push("Error: repositories had to be reordered in the configuration.".to_string());
        }
        lines
    }
}

/// Knobs of whole-tree synchronization
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Re-query revisions instead of reusing ones seen earlier in the run
    pub force_query: bool,
    /// Downgrade checkout/update failures to warnings
    pub ignore_errors: bool,
}

/// What synchronizing one leaf did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafSync {
    CheckedOut,
    Updated,
    Unchanged,
    /// Unforced single-library sync found a working copy and left it alone
    Skipped,
}

/// Counters of a whole-tree synchronization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub checked_out: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl SyncSummary {
    pub fn record(&mut self, outcome: LeafSync) {
        match outcome {
            LeafSync::CheckedOut => self.checked_out += 1,
            LeafSync::Updated => self.updated += 1,
            LeafSync::Unchanged | LeafSync::Skipped => self.unchanged += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.checked_out + self.updated + self.unchanged
    }
}

/// What removing one leaf did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeafRemoval {
    /// Whether a removal command ran for the working copy
    pub removed: bool,
    /// Empty ancestor directories deleted afterwards
    pub pruned: usize,
}

/// Counters of a whole-tree removal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveSummary {
    pub removed: usize,
    pub pruned: usize,
}

/// Libraries map plus everything needed to act on it
pub struct CacheTree {
    tree: Tree<Payload>,
    registry: Registry,
    vcs: Box<dyn Vcs>,
    shell: Box<dyn Shell>,
    platform: Platform,
}

impl CacheTree {
    pub fn new(
        tree: Tree<Payload>,
        registry: Registry,
        vcs: Box<dyn Vcs>,
        shell: Box<dyn Shell>,
        platform: Platform,
    ) -> Self {
        Self {
            tree,
            registry,
            vcs,
            shell,
            platform,
        }
    }

    pub fn tree(&self) -> &Tree<Payload> {
        &self.tree
    }

    /// Give back the libraries map, e.g. to persist it
    pub fn into_tree(self) -> Tree<Payload> {
        self.tree
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Leaves of `mode` below `start`, or below the root level
    pub fn leaves(&self, start: Option<NodeId>, mode: BuildMode) -> Leaves<'_, Payload> {
        Leaves::new(&self.tree, start, mode)
    }

    /// Coordinate and on-disk location of a leaf
    ///
    /// Fails if the leaf isn't four levels deep or its repository root has
    /// no cache root in the registry.
    pub fn resolve(&self, leaf: NodeId) -> BuildcResult<(Coordinate, CacheLocation)> {
        let segments = self.tree.path_segments(leaf);
        let coordinate =
            Coordinate::from_segments(&segments).ok_or_else(|| BuildcError::MalformedTree {
                key: self.tree.full_path(leaf, '|'),
            })?;
        let cache_root = self
            .registry
            .resolve_cache_root(&coordinate.repo_root)
            .ok_or_else(|| BuildcError::CacheRootNotFound {
                url: coordinate.repo_root.clone(),
            })?;
        let location = coordinate.locate(&cache_root);
        Ok((coordinate, location))
    }

    /// Cached libraries of `mode` below `start`, in map order
    pub fn cache_libs(&self, start: Option<NodeId>, mode: BuildMode) -> BuildcResult<Vec<CacheLib>> {
        self.leaves(start, mode)
            .map(|leaf| {
                let (coordinate, location) = self.resolve(leaf)?;
                Ok(CacheLib {
                    name: coordinate.library,
                    version: coordinate.version,
                    cache_root: location.cache_root,
                })
            })
            .collect()
    }

    /// Find declared repositories that share a cache directory
    ///
    /// Conflicts are logged and returned; they never fail the run.
    pub fn check_local_cache_conflict(&self) -> BuildcResult<Vec<CacheConflict>> {
        let mut roots: Tree<Option<String>> = Tree::new();
        let mut conflicts = Vec::new();

        for descriptor in self.registry.descriptors() {
            let cache_path = self.registry.cache_root_of(descriptor);
            let cache_path = std::path::absolute(&cache_path)
                .map(|path| normalize(&path))
                .map_err(|e| BuildcError::io(format!("resolving {}", cache_path.display()), e))?;
            let segments = path_segments(&cache_path);
            let segments = segments.iter().map(String::as_str);

            let Some(node) = roots.insert(segments) else {
                continue;
            };
            match roots.data(node).clone() {
                Some(previous) if previous != descriptor.url() => {
                    let conflict = CacheConflict {
                        cache_path,
                        previous_url: previous,
                        current_url: descriptor.url().to_string(),
                    };
                    warn!("Cache path conflict: {}", conflict);
                    conflicts.push(conflict);
                }
                Some(_) => {}
                None => *roots.data_mut(node) = Some(descriptor.url().to_string()),
            }
        }

        Ok(conflicts)
    }

    /// Compare the map's roots with the declared repositories
    pub fn check_consistency(&self) -> ConsistencyReport {
        let mut report = ConsistencyReport::default();
        let mut present: Vec<&str> = Vec::new();

        for url in self.registry.urls() {
            if !self.tree.roots().any(|root| self.tree.item_text(root) == url) {
                report.missing.push(url.to_string());
            } else if present.contains(&url) {
                report.duplicated.push(url.to_string());
            } else {
                present.push(url);
            }
        }

        let mut index = 0;
        for root in self.tree.roots() {
            report.discovered += 1;
            if present.get(index) == Some(&self.tree.item_text(root)) {
                index += 1;
            }
        }
        report.declared = present.len();
        report.out_of_order = index != present.len();

        for line in report.diagnostics() {
            debug!("{}", line);
        }
        report
    }

    /// Bring one leaf's working copy in line with the remote
    ///
    /// An uncached leaf gets any stale directory removed and a fresh
    /// checkout. A cached leaf is checked out again if its directory is
    /// gone, or updated when its revision differs from the remote. Either
    /// way the payload ends up at the remote revision.
    pub async fn sync_leaf(&mut self, leaf: NodeId, options: SyncOptions) -> BuildcResult<LeafSync> {
        let (coordinate, location) = self.resolve(leaf)?;
        let remote_url = coordinate.remote_url();
        let remote = self
            .vcs
            .query_revision(&remote_url, options.force_query)
            .await?;

        let outcome = if self.tree.data(leaf).is_cached() {
            self.refresh(&coordinate, &location, &remote, options).await?
        } else {
            if path_exists(&location.leaf_dir).await? {
                debug!("Removing stale {}", location.leaf_dir.display());
                self.remove_dir(&location.leaf_dir).await?;
            }
            self.checkout(&coordinate, &location, options.ignore_errors)
                .await?
        };

        *self.tree.data_mut(leaf) = Payload::Cached(remote);
        Ok(outcome)
    }

    /// Synchronize every leaf of `mode` below `start`
    pub async fn sync_tree(
        &mut self,
        start: Option<NodeId>,
        mode: BuildMode,
        options: SyncOptions,
    ) -> BuildcResult<SyncSummary> {
        let leaves: Vec<NodeId> = self.leaves(start, mode).collect();
        let mut summary = SyncSummary::default();
        for leaf in leaves {
            summary.record(self.sync_leaf(leaf, options).await?);
        }
        Ok(summary)
    }

    /// Synchronize one library version for the local platform
    ///
    /// The first repository root (in map order) holding the coordinate
    /// wins. Returns `false` if no root has it. With `force_update` off,
    /// an existing working copy is left untouched.
    pub async fn sync_dependency(
        &mut self,
        library: &str,
        version: &str,
        mode: BuildMode,
        force_update: bool,
    ) -> BuildcResult<bool> {
        let variant = self.platform.variant(mode);
        let found = self.tree.roots().find_map(|root| {
            let coordinate =
                Coordinate::new(self.tree.item_text(root), library, version, &variant);
            self.tree.find(coordinate.segments()).map(|leaf| (leaf, coordinate))
        });

        let Some((leaf, coordinate)) = found else {
            warn!(
                "Can not get [{} {} {}] to local library cache!",
                library, version, variant
            );
            warn!("Please make sure the library [{}] is available!", library);
            return Ok(false);
        };

        let cache_root = self
            .registry
            .resolve_cache_root(&coordinate.repo_root)
            .ok_or_else(|| BuildcError::CacheRootNotFound {
                url: coordinate.repo_root.clone(),
            })?;
        let location = coordinate.locate(&cache_root);
        let remote = self
            .vcs
            .query_revision(&coordinate.remote_url(), true)
            .await?;

        if !self.tree.data(leaf).is_cached() {
            self.checkout(&coordinate, &location, true).await?;
        } else if !force_update && path_exists(&location.leaf_dir).await? {
            info!(
                "Force update disabled, skipping update check of [{} {}]",
                library, version
            );
            return Ok(true);
        } else {
            let options = SyncOptions {
                force_query: true,
                ignore_errors: false,
            };
            self.refresh(&coordinate, &location, &remote, options)
                .await?;
        }

        *self.tree.data_mut(leaf) = Payload::Cached(remote);
        Ok(true)
    }

    /// Remove one leaf's working copy and prune emptied ancestors
    ///
    /// The payload is `Uncached` afterwards, so repeating the call is a
    /// no-op on disk.
    pub async fn remove_leaf(&mut self, leaf: NodeId) -> BuildcResult<LeafRemoval> {
        let (_, location) = self.resolve(leaf)?;

        let removed = match self.tree.data(leaf) {
            Payload::Uncached => path_exists(&location.leaf_dir).await?,
            Payload::Cached(_) => true,
        };
        if removed {
            self.remove_dir(&location.leaf_dir).await?;
            info!("Remove [{}] OK!", location.leaf_dir.display());
        }

        let pruned = prune_empty_ancestors(&location).await?;
        *self.tree.data_mut(leaf) = Payload::Uncached;
        Ok(LeafRemoval { removed, pruned })
    }

    /// Remove every leaf of `mode` below `start`
    pub async fn remove_tree(
        &mut self,
        start: Option<NodeId>,
        mode: BuildMode,
    ) -> BuildcResult<RemoveSummary> {
        let leaves: Vec<NodeId> = self.leaves(start, mode).collect();
        let mut summary = RemoveSummary::default();
        for leaf in leaves {
            let removal = self.remove_leaf(leaf).await?;
            summary.removed += usize::from(removal.removed);
            summary.pruned += removal.pruned;
        }
        Ok(summary)
    }

    async fn checkout(
        &self,
        coordinate: &Coordinate,
        location: &CacheLocation,
        ignore_errors: bool,
    ) -> BuildcResult<LeafSync> {
        info!(
            "library [{} {}] does not exist, checking out",
            coordinate.library, coordinate.version
        );
        self.vcs
            .checkout(&coordinate.remote_url(), &location.leaf_dir, ignore_errors)
            .await?;
        Ok(LeafSync::CheckedOut)
    }

    /// Check out a missing working copy or update an outdated one
    async fn refresh(
        &self,
        coordinate: &Coordinate,
        location: &CacheLocation,
        remote: &Revision,
        options: SyncOptions,
    ) -> BuildcResult<LeafSync> {
        if !path_exists(&location.leaf_dir).await? {
            return self
                .checkout(coordinate, location, options.ignore_errors)
                .await;
        }

        let local = self
            .vcs
            .query_revision(&location.leaf_dir.to_string_lossy(), options.force_query)
            .await?;
        if &local == remote {
            debug!("{} is at revision {}", coordinate, local);
            return Ok(LeafSync::Unchanged);
        }

        info!(
            "Update [{} {}] {} -> {}",
            coordinate.library, coordinate.version, local, remote
        );
        self.vcs
            .update(&location.leaf_dir, options.ignore_errors)
            .await?;
        Ok(LeafSync::Updated)
    }

    /// `rm -rf` a working copy, metadata first; any failure is fatal
    async fn remove_dir(&self, dir: &Path) -> BuildcResult<()> {
        let command = vec![
            "rm".to_string(),
            "-rf".to_string(),
            dir.join(self.vcs.metadata_dir()).to_string_lossy().into_owned(),
            dir.to_string_lossy().into_owned(),
        ];
        let status = self.shell.run_capturing_status(&command).await?;
        if status != 0 {
            return Err(BuildcError::RemoveFailed {
                path: dir.to_path_buf(),
                status,
            });
        }
        Ok(())
    }
}

/// Delete the version, name and cache root directories if they are empty
async fn prune_empty_ancestors(location: &CacheLocation) -> BuildcResult<usize> {
    let mut pruned = 0;
    for dir in location.prunable_ancestors() {
        if path_exists(dir).await? && is_empty_dir(dir).await? {
            tokio::fs::remove_dir(dir)
                .await
                .map_err(|e| BuildcError::io(format!("removing {}", dir.display()), e))?;
            debug!("Pruned empty directory {}", dir.display());
            pruned += 1;
        }
    }
    Ok(pruned)
}

async fn path_exists(path: &Path) -> BuildcResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| BuildcError::io(format!("checking {}", path.display()), e))
}

async fn is_empty_dir(dir: &Path) -> BuildcResult<bool> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| BuildcError::io(format!("listing {}", dir.display()), e))?;
    let first = entries
        .next_entry()
        .await
        .map_err(|e| BuildcError::io(format!("listing {}", dir.display()), e))?;
    Ok(first.is_none())
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Normal components of an absolute path, as tree segments
fn path_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
