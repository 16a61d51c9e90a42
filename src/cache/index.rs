//! Libraries index persistence
//!
//! The libraries map is stored as JSON between runs: one nested node per
//! tree node, with the checked-out revision on cached nodes.

use crate::cache::payload::{Payload, Revision};
use crate::error::{BuildcError, BuildcResult};
use crate::tree::{NodeId, Tree};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// One node of the stored map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexNode {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<Revision>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<IndexNode>,
}

/// Stored libraries map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrariesIndex {
    /// When the map was last written
    pub updated_at: DateTime<Utc>,

    /// Repository roots in map order
    pub repositories: Vec<IndexNode>,
}

impl LibrariesIndex {
    /// Snapshot a tree
    pub fn from_tree(tree: &Tree<Payload>) -> Self {
        Self {
            updated_at: Utc::now(),
            repositories: tree.roots().map(|root| snapshot(tree, root)).collect(),
        }
    }

    /// Rebuild the tree, sibling order preserved
    pub fn to_tree(&self) -> Tree<Payload> {
        let mut tree = Tree::new();
        let mut pending: Vec<(Option<NodeId>, &IndexNode)> =
            self.repositories.iter().rev().map(|node| (None, node)).collect();

        while let Some((parent, node)) = pending.pop() {
            let payload = Payload::from(node.revision.clone());
            let id = tree.append(parent, node.text.as_str(), payload);
            pending.extend(node.children.iter().rev().map(|child| (Some(id), child)));
        }
        tree
    }

    /// Load the index; `None` if the file does not exist
    pub async fn load(path: &Path) -> BuildcResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| BuildcError::io(format!("reading libraries index {}", path.display()), e))?;

        let index: LibrariesIndex = serde_json::from_str(&content)?;
        debug!("Loaded libraries index from {}", path.display());
        Ok(Some(index))
    }

    /// Load the index, failing if it has never been written
    pub async fn require(path: &Path) -> BuildcResult<Self> {
        Self::load(path)
            .await?
            .ok_or_else(|| BuildcError::IndexNotFound(path.to_path_buf()))
    }

    /// Save the index, creating parent directories
    pub async fn save(&self, path: &Path) -> BuildcResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildcError::io("creating libraries index directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| BuildcError::io(format!("writing libraries index {}", path.display()), e))?;

        debug!("Saved libraries index to {}", path.display());
        Ok(())
    }
}

fn snapshot(tree: &Tree<Payload>, id: NodeId) -> IndexNode {
    IndexNode {
        text: tree.item_text(id).to_string(),
        revision: tree.data(id).revision().cloned(),
        children: tree.children(id).map(|child| snapshot(tree, child)).collect(),
    }
}

/// Copy cached leaf payloads from `old` into `new` by logical key
///
/// Leaves of `old` missing from `new` are dropped. Returns the number of
/// payloads carried over.
pub fn carry_payloads(new: &mut Tree<Payload>, old: &Tree<Payload>) -> usize {
    let mut carried = 0;
    let mut stack: Vec<NodeId> = old.roots().collect();

    while let Some(id) = stack.pop() {
        stack.extend(old.children(id));
        if !old.is_leaf(id) || !old.data(id).is_cached() {
            continue;
        }
        if let Some(target) = new.find(old.path_segments(id)) {
            if new.is_leaf(target) {
                *new.data_mut(target) = old.data(id).clone();
                carried += 1;
            }
        }
    }
    carried
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY: &str = "https://host/repoA|libX|1.0|cpu1_re_linux";

    fn tree() -> Tree<Payload> {
        let mut tree = Tree::new();
        let leaf = tree.add_item(KEY, '|').unwrap();
        tree.add_item("https://host/repoA|libX|2.0|cpu1_re_linux", '|');
        tree.add_item("https://host/repoB|libY|0.1|cpu1_de_linux", '|');
        *tree.data_mut(leaf) = Payload::from(Revision::new("42"));
        tree
    }

    fn keys(tree: &Tree<Payload>) -> Vec<String> {
        let mut keys = Vec::new();
        let mut stack: Vec<NodeId> = tree.roots().collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            keys.push(format!("{}={}", tree.full_path(id, '|'), tree.data(id)));
            let children: Vec<NodeId> = tree.children(id).collect();
            stack.extend(children.into_iter().rev());
        }
        keys
    }

    #[tokio::test]
    async fn save_and_load_preserve_tree() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("libraries.json");
        let original = tree();

        LibrariesIndex::from_tree(&original).save(&path).await.unwrap();
        let loaded = LibrariesIndex::load(&path).await.unwrap().unwrap();

        assert_eq!(keys(&loaded.to_tree()), keys(&original));
    }

    #[tokio::test]
    async fn missing_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("libraries.json");

        assert!(LibrariesIndex::load(&path).await.unwrap().is_none());
        let err = LibrariesIndex::require(&path).await.unwrap_err();
        assert!(matches!(err, BuildcError::IndexNotFound(_)));
    }

    #[test]
    fn uncached_nodes_omit_revision() {
        let json = serde_json::to_string(&LibrariesIndex::from_tree(&tree())).unwrap();
        assert_eq!(json.matches("\"revision\"").count(), 1);
        assert!(json.contains("\"updated_at\""));
    }

    #[test]
    fn empty_revision_is_rejected() {
        let json = r#"{"updated_at":"2024-01-01T00:00:00Z","repositories":[{"text":"r","revision":" "}]}"#;
        assert!(serde_json::from_str::<LibrariesIndex>(json).is_err());
    }

    #[test]
    fn carry_payloads_matches_logical_keys() {
        let old = tree();
        let mut new = Tree::new();
        new.add_item("https://host/repoA|libX|1.0|cpu1_re_linux", '|');
        new.add_item("https://host/repoC|libZ|1.0|cpu1_re_linux", '|');

        assert_eq!(carry_payloads(&mut new, &old), 1);
        let leaf = new.find_item(KEY, '|').unwrap();
        assert_eq!(new.data(leaf).revision().map(Revision::as_str), Some("42"));
    }
}
