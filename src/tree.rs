//! Ordered tree keyed by path segments
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Children keep
//! insertion order, so a tree built by walking a remote listing preserves
//! discovery order. Every node carries one mutable payload of type `T`.

/// Handle to a node inside a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node<T> {
    text: String,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    data: T,
}

/// Arena-backed ordered tree with any number of root-level nodes
#[derive(Debug, Clone)]
pub struct Tree<T> {
    nodes: Vec<Node<T>>,
    first_root: Option<NodeId>,
    last_root: Option<NodeId>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            first_root: None,
            last_root: None,
        }
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First root-level node
    pub fn root_item(&self) -> Option<NodeId> {
        self.first_root
    }

    /// First child of `id`
    pub fn child_item(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].first_child
    }

    /// Next sibling of `id` (root-level nodes are siblings of each other)
    pub fn next_sibling_item(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next_sibling
    }

    /// Parent of `id`, `None` for root-level nodes
    pub fn parent_item(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Text label of `id`
    pub fn item_text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    /// Whether `id` has no children
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].first_child.is_none()
    }

    /// Payload of `id`
    pub fn data(&self, id: NodeId) -> &T {
        &self.nodes[id.0].data
    }

    /// Mutable payload of `id`
    pub fn data_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.nodes[id.0].data
    }

    /// Iterate root-level nodes in order
    pub fn roots(&self) -> Siblings<'_, T> {
        Siblings {
            tree: self,
            next: self.first_root,
        }
    }

    /// Iterate the children of `id` in order
    pub fn children(&self, id: NodeId) -> Siblings<'_, T> {
        Siblings {
            tree: self,
            next: self.child_item(id),
        }
    }

    /// Labels from the root-level ancestor down to `id`
    pub fn path_segments(&self, id: NodeId) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            segments.push(self.item_text(node));
            current = self.parent_item(node);
        }
        segments.reverse();
        segments
    }

    /// Full path of `id`, labels joined with `delimiter`
    pub fn full_path(&self, id: NodeId, delimiter: char) -> String {
        let delimiter = delimiter.to_string();
        self.path_segments(id).join(delimiter.as_str())
    }

    /// Look up a node by segments, starting at the root level
    pub fn find<'a, I>(&self, segments: I) -> Option<NodeId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut level = self.first_root;
        let mut found = None;
        for segment in segments {
            let hit = self.sibling_with_text(level, segment)?;
            found = Some(hit);
            level = self.child_item(hit);
        }
        found
    }

    /// Look up a node by a `delimiter`-separated path; empty segments are skipped
    pub fn find_item(&self, path: &str, delimiter: char) -> Option<NodeId> {
        self.find(path.split(delimiter).filter(|s| !s.is_empty()))
    }

    fn sibling_with_text(&self, mut cursor: Option<NodeId>, text: &str) -> Option<NodeId> {
        while let Some(id) = cursor {
            if self.item_text(id) == text {
                return Some(id);
            }
            cursor = self.next_sibling_item(id);
        }
        None
    }

    /// Append a node under `parent` (or at the root level) and return its id
    pub fn append(&mut self, parent: Option<NodeId>, text: impl Into<String>, data: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            text: text.into(),
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            data,
        });

        let previous = match parent {
            Some(p) => self.nodes[p.0].last_child.replace(id),
            None => self.last_root.replace(id),
        };
        match previous {
            Some(prev) => self.nodes[prev.0].next_sibling = Some(id),
            None => match parent {
                Some(p) => self.nodes[p.0].first_child = Some(id),
                None => self.first_root = Some(id),
            },
        }
        id
    }
}

impl<T: Default> Tree<T> {
    /// Find or create the node for `segments`, creating missing ancestors
    /// with a default payload. Returns `None` for an empty path.
    pub fn insert<'a, I>(&mut self, segments: I) -> Option<NodeId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut parent: Option<NodeId> = None;
        for segment in segments {
            let level = match parent {
                Some(p) => self.child_item(p),
                None => self.first_root,
            };
            let next = match self.sibling_with_text(level, segment) {
                Some(existing) => existing,
                None => self.append(parent, segment, T::default()),
            };
            parent = Some(next);
        }
        parent
    }

    /// [`Tree::insert`] for a `delimiter`-separated path
    pub fn add_item(&mut self, path: &str, delimiter: char) -> Option<NodeId> {
        self.insert(path.split(delimiter).filter(|s| !s.is_empty()))
    }
}

/// Iterator over a run of sibling nodes
#[derive(Clone)]
pub struct Siblings<'a, T> {
    tree: &'a Tree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Siblings<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling_item(current);
        Some(current)
    }
}
