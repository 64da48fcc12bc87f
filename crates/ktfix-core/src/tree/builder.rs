//! Incremental construction of a [`Tree`] in document order.

use super::{NodeId, NodeKind, Tree};

/// Builds a tree top-down: open a node, add children, close it.
///
/// Unbalanced `finish_node` calls are ignored and nodes still open when
/// [`TreeBuilder::finish`] is called are closed implicitly.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: Tree,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    /// Starts a tree with the given root node.
    #[must_use]
    pub fn new(kind: NodeKind, grammar_kind: &'static str) -> Self {
        let tree = Tree::with_root(kind, grammar_kind);
        let root = tree.root;
        Self {
            tree,
            stack: vec![root],
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.tree.root)
    }

    fn attach(&mut self, id: NodeId) {
        let parent = self.current();
        self.tree.nodes[parent.0].children.push(id);
        self.tree.nodes[id.0].parent = Some(parent);
    }

    /// Opens a composite node as the next child of the current node.
    pub fn start_node(&mut self, kind: NodeKind, grammar_kind: &'static str) -> &mut Self {
        let id = self.tree.alloc(kind, grammar_kind, None);
        self.attach(id);
        self.stack.push(id);
        self
    }

    /// Closes the current composite node.
    pub fn finish_node(&mut self) -> &mut Self {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self
    }

    /// Adds a leaf to the current node.
    pub fn leaf(
        &mut self,
        kind: NodeKind,
        grammar_kind: &'static str,
        text: impl Into<String>,
    ) -> &mut Self {
        let id = self.tree.alloc(kind, grammar_kind, Some(text.into()));
        self.attach(id);
        self
    }

    /// Adds a fixed token whose text doubles as its grammar kind.
    pub fn token(&mut self, kind: NodeKind, text: &'static str) -> &mut Self {
        self.leaf(kind, text, text)
    }

    /// Adds a whitespace leaf.
    pub fn ws(&mut self, text: impl Into<String>) -> &mut Self {
        self.leaf(NodeKind::Whitespace, "whitespace", text)
    }

    /// Returns the node currently open.
    #[must_use]
    pub fn open_node(&self) -> NodeId {
        self.current()
    }

    /// Finishes the tree.
    #[must_use]
    pub fn finish(self) -> Tree {
        self.tree
    }
}
