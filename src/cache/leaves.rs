//! Depth-first walk over the leaves of one build mode

use crate::cache::coordinate::DEPTH;
use crate::cache::variant::BuildMode;
use crate::tree::{NodeId, Tree};

/// Pre-order iterator over variant nodes whose text carries the mode marker
///
/// Only childless nodes exactly four levels deep are yielded; branches of the
/// map that stop short of the variant level are walked past. Starting below
/// `start` (or at the root level when `None`), each node is visited before
/// its first child's subtree, which is visited before the node's next
/// sibling. The start node itself is never yielded. A clone continues
/// independently from the same position.
#[derive(Clone)]
pub struct Leaves<'a, T> {
    tree: &'a Tree<T>,
    marker: String,
    stack: Vec<(NodeId, usize)>,
}

impl<'a, T> Leaves<'a, T> {
    pub fn new(tree: &'a Tree<T>, start: Option<NodeId>, mode: BuildMode) -> Self {
        let first = match start {
            Some(node) => tree
                .child_item(node)
                .map(|child| (child, tree.path_segments(node).len() + 1)),
            None => tree.root_item().map(|root| (root, 1)),
        };
        Self {
            tree,
            marker: mode.marker(),
            stack: first.into_iter().collect(),
        }
    }
}

impl<T> Iterator for Leaves<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some((node, depth)) = self.stack.pop() {
            if let Some(sibling) = self.tree.next_sibling_item(node) {
                self.stack.push((sibling, depth));
            }
            match self.tree.child_item(node) {
                Some(child) if depth < DEPTH => self.stack.push((child, depth + 1)),
                Some(_) => {}
                None if depth == DEPTH && self.tree.item_text(node).contains(&self.marker) => {
                    return Some(node)
                }
                None => {}
            }
        }
        None
    }
}
