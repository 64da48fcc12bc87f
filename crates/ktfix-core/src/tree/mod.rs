//! Arena-backed mutable syntax tree.
//!
//! Nodes live in a single growable arena and are addressed by [`NodeId`].
//! Structural edits only touch the parent's child list, so handles to
//! unrelated nodes stay valid. A removed node keeps its slot: the handle
//! reports [`Tree::is_alive`] `== false` instead of aliasing a newer node.
//!
//! Text, spans and the line index are derived data. They are computed on the
//! first position query after an edit and cached until the next edit.
//!
//! ```
//! use ktfix_core::tree::{NodeKind, TreeBuilder};
//!
//! let mut builder = TreeBuilder::new(NodeKind::File, "source_file");
//! builder
//!     .leaf(NodeKind::Keyword, "val", "val")
//!     .ws(" ")
//!     .leaf(NodeKind::Identifier, "identifier", "x");
//! let tree = builder.finish();
//!
//! assert_eq!(tree.text(), "val x");
//! ```

mod builder;
mod layout;

pub use builder::TreeBuilder;
pub use layout::Position;

use layout::Layout;
use std::cell::OnceCell;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Stable handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Syntactic category of a node.
///
/// The set is deliberately small: rules match on these categories, while the
/// parser's own node name is kept in [`Tree::grammar_kind`] for everything
/// that does not need a dedicated category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Root of a source file.
    File,
    /// `package a.b.c`
    PackageHeader,
    /// A single import directive.
    Import,
    /// Class or interface declaration.
    ClassDeclaration,
    /// Object or companion object declaration.
    ObjectDeclaration,
    /// Function declaration.
    FunctionDeclaration,
    /// Property declaration (`val` / `var`).
    PropertyDeclaration,
    /// Body of a class or object.
    ClassBody,
    /// Statement block.
    Block,
    /// Modifier list of a declaration.
    Modifiers,
    /// Annotation on a declaration or expression.
    Annotation,
    /// `@file:` annotation.
    FileAnnotation,
    /// `public`, `private`, `protected` or `internal`.
    VisibilityModifier,
    /// Identifier token.
    Identifier,
    /// String literal including its quotes.
    StringLiteral,
    /// Literal text inside a string.
    StringContent,
    /// `// ...`
    LineComment,
    /// `/* ... */`
    BlockComment,
    /// Whitespace including line breaks.
    Whitespace,
    /// Keyword token.
    Keyword,
    /// Operator or punctuation token.
    Punctuation,
    /// Region the parser could not make sense of.
    Error,
    /// Anything else.
    Other,
}

impl NodeKind {
    /// Returns true for line and block comments.
    #[must_use]
    pub fn is_comment(self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment)
    }

    /// Returns true for whitespace and comments.
    #[must_use]
    pub fn is_trivia(self) -> bool {
        self == Self::Whitespace || self.is_comment()
    }

    /// Returns true for nodes that can carry annotations and modifiers.
    #[must_use]
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            Self::ClassDeclaration
                | Self::ObjectDeclaration
                | Self::FunctionDeclaration
                | Self::PropertyDeclaration
        )
    }
}

/// Errors raised by tree mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The node was removed earlier.
    #[error("node {0} has been removed from the tree")]
    Stale(NodeId),

    /// Text can only be set on leaves.
    #[error("node {0} is not a leaf")]
    NotLeaf(NodeId),

    /// Leaves cannot have children.
    #[error("leaf {0} cannot have children")]
    NotComposite(NodeId),

    /// Only detached nodes can be inserted.
    #[error("node {0} is already attached, detach it first")]
    Attached(NodeId),

    /// Sibling insertion relative to a node without a parent.
    #[error("node {0} has no parent")]
    NoParent(NodeId),

    /// Inserting a node below itself.
    #[error("inserting {child} under {parent} would create a cycle")]
    Cycle {
        /// Requested parent.
        parent: NodeId,
        /// Node being inserted.
        child: NodeId,
    },

    /// The root cannot be moved or removed.
    #[error("the root node cannot be moved or removed")]
    Root,

    /// Child index past the end of the child list.
    #[error("index {index} is out of bounds for {parent} with {len} children")]
    OutOfBounds {
        /// Parent node.
        parent: NodeId,
        /// Requested index.
        index: usize,
        /// Current number of children.
        len: usize,
    },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    grammar_kind: &'static str,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    text: Option<String>,
    alive: bool,
}

/// Mutable syntax tree whose leaves concatenate to the source text.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
    revision: u64,
    layout: OnceCell<Layout>,
}

impl Tree {
    fn with_root(kind: NodeKind, grammar_kind: &'static str) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            revision: 0,
            layout: OnceCell::new(),
        };
        tree.root = tree.alloc(kind, grammar_kind, None);
        tree
    }

    fn alloc(&mut self, kind: NodeKind, grammar_kind: &'static str, text: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            grammar_kind,
            parent: None,
            children: Vec::new(),
            text,
            alive: true,
        });
        id
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn layout(&self) -> &Layout {
        self.layout.get_or_init(|| Layout::compute(self))
    }

    // --- navigation ---

    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the syntactic category of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.data(id).kind
    }

    /// Returns the parser's own name for the node (e.g. `class_declaration`).
    #[must_use]
    pub fn grammar_kind(&self, id: NodeId) -> &'static str {
        self.data(id).grammar_kind
    }

    /// Returns false once the node has been removed.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|n| n.alive)
    }

    /// Returns true if the node is alive and reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        id == self.root || self.ancestors(id).last() == Some(self.root)
    }

    /// Returns true if the node carries text.
    #[must_use]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.data(id).text.is_some()
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Returns the children of a node in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    /// Returns the first child.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Returns the last child.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Returns the position of a node in its parent's child list.
    #[must_use]
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Returns the next sibling.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Returns the previous sibling.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?.checked_sub(1)?;
        self.children(parent).get(index).copied()
    }

    /// Iterates over the ancestors of a node, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Iterates over a subtree in pre-order, starting with `id` itself.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Iterates over the leaves of a subtree in document order.
    pub fn leaves(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id).filter(move |&n| self.is_leaf(n))
    }

    /// Returns the first child of the given kind.
    #[must_use]
    pub fn find_child(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.kind(c) == kind)
    }

    /// Returns the nearest ancestor whose kind matches the predicate.
    pub fn find_ancestor(&self, id: NodeId, pred: impl Fn(NodeKind) -> bool) -> Option<NodeId> {
        self.ancestors(id).find(|&a| pred(self.kind(a)))
    }

    /// Returns the first node in pre-order that follows the subtree of `id`.
    #[must_use]
    pub fn following(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            if let Some(sibling) = self.next_sibling(current) {
                return Some(sibling);
            }
            current = self.parent(current)?;
        }
    }

    /// Returns the first leaf after the subtree of `id`.
    #[must_use]
    pub fn next_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.following(id)?;
        loop {
            if self.is_leaf(current) {
                return Some(current);
            }
            current = match self.first_child(current) {
                Some(child) => child,
                None => self.following(current)?,
            };
        }
    }

    /// Returns the last leaf before the subtree of `id`.
    #[must_use]
    pub fn prev_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let Some(mut candidate) = self.prev_sibling(current) else {
                current = self.parent(current)?;
                continue;
            };
            loop {
                if self.is_leaf(candidate) {
                    return Some(candidate);
                }
                match self.last_child(candidate) {
                    Some(child) => candidate = child,
                    None => break,
                }
            }
            current = candidate;
        }
    }

    // --- text and positions ---

    /// Returns the full document text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.layout().text
    }

    /// Returns the length of the document in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text().len()
    }

    /// Returns true if the document is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the text of a leaf as stored, attached or not.
    #[must_use]
    pub fn leaf_text(&self, id: NodeId) -> Option<&str> {
        self.data(id).text.as_deref()
    }

    /// Returns the byte range of an attached node in the current text.
    #[must_use]
    pub fn span(&self, id: NodeId) -> Option<Range<usize>> {
        self.layout().span(id)
    }

    /// Returns the start offset of a node, or 0 if it is detached.
    #[must_use]
    pub fn offset(&self, id: NodeId) -> usize {
        self.span(id).map_or(0, |s| s.start)
    }

    /// Returns the end offset of a node, or 0 if it is detached.
    #[must_use]
    pub fn end_offset(&self, id: NodeId) -> usize {
        self.span(id).map_or(0, |s| s.end)
    }

    /// Returns the text covered by an attached node.
    ///
    /// Detached nodes have no position in the document and yield `""`.
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> &str {
        match self.span(id) {
            Some(range) => &self.text()[range],
            None => "",
        }
    }

    /// Converts a byte offset into a 1-indexed line and column.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        self.layout().position(offset)
    }

    /// Returns the number of lines in the document.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.layout().line_count()
    }

    /// Returns the byte range of a 1-indexed line, excluding its line break.
    #[must_use]
    pub fn line_span(&self, line: usize) -> Range<usize> {
        self.layout().line_span(line)
    }

    /// Returns the leaf covering `offset`.
    ///
    /// Offsets at or past the end of the document resolve to the last
    /// non-empty leaf.
    #[must_use]
    pub fn leaf_at(&self, offset: usize) -> Option<NodeId> {
        let layout = self.layout();
        let len = layout.text.len();
        if len == 0 {
            return None;
        }
        let offset = offset.min(len - 1);
        let mut current = self.root;
        loop {
            if self.is_leaf(current) {
                return Some(current);
            }
            let children = self.children(current);
            let index =
                children.partition_point(|&c| layout.span(c).map_or(true, |s| s.end <= offset));
            current = *children.get(index)?;
        }
    }

    /// Returns a counter that changes on every edit of the attached tree.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- mutation ---

    /// Creates a detached leaf.
    pub fn new_leaf(
        &mut self,
        kind: NodeKind,
        grammar_kind: &'static str,
        text: impl Into<String>,
    ) -> NodeId {
        self.alloc(kind, grammar_kind, Some(text.into()))
    }

    /// Creates a detached composite node.
    pub fn new_node(&mut self, kind: NodeKind, grammar_kind: &'static str) -> NodeId {
        self.alloc(kind, grammar_kind, None)
    }

    fn check_alive(&self, id: NodeId) -> Result<(), TreeError> {
        if self.is_alive(id) {
            Ok(())
        } else {
            Err(TreeError::Stale(id))
        }
    }

    fn touch(&mut self, id: NodeId) {
        if self.is_attached(id) {
            self.revision += 1;
            self.layout.take();
        }
    }

    /// Inserts a detached node as the `index`-th child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if either node is stale, `child` is attached or an ancestor of
    /// `parent`, `parent` is a leaf, or `index` is out of bounds.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        self.check_alive(parent)?;
        self.check_alive(child)?;
        if self.is_leaf(parent) {
            return Err(TreeError::NotComposite(parent));
        }
        if child == self.root {
            return Err(TreeError::Root);
        }
        if self.parent(child).is_some() {
            return Err(TreeError::Attached(child));
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(TreeError::Cycle { parent, child });
        }
        let len = self.children(parent).len();
        if index > len {
            return Err(TreeError::OutOfBounds { parent, index, len });
        }
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        self.touch(parent);
        Ok(())
    }

    /// Appends a detached node as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// See [`Tree::insert_child`].
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_alive(parent)?;
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    /// Inserts a detached node right before `anchor`.
    ///
    /// # Errors
    ///
    /// Fails if `anchor` has no parent, or see [`Tree::insert_child`].
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.check_alive(anchor)?;
        let parent = self.parent(anchor).ok_or(TreeError::NoParent(anchor))?;
        let index = self
            .index_in_parent(anchor)
            .ok_or(TreeError::NoParent(anchor))?;
        self.insert_child(parent, index, node)
    }

    /// Inserts a detached node right after `anchor`.
    ///
    /// # Errors
    ///
    /// Fails if `anchor` has no parent, or see [`Tree::insert_child`].
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.check_alive(anchor)?;
        let parent = self.parent(anchor).ok_or(TreeError::NoParent(anchor))?;
        let index = self
            .index_in_parent(anchor)
            .ok_or(TreeError::NoParent(anchor))?;
        self.insert_child(parent, index + 1, node)
    }

    /// Unlinks a node from its parent, keeping the subtree alive for reuse.
    ///
    /// # Errors
    ///
    /// Fails for stale nodes and for the root.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check_alive(id)?;
        if id == self.root {
            return Err(TreeError::Root);
        }
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        let attached = self.is_attached(id);
        self.nodes[parent.0].children.retain(|&c| c != id);
        self.nodes[id.0].parent = None;
        if attached {
            self.revision += 1;
            self.layout.take();
        }
        Ok(())
    }

    /// Removes a node and destroys its subtree.
    ///
    /// # Errors
    ///
    /// Fails for stale nodes and for the root.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let data = &mut self.nodes[current.0];
            data.alive = false;
            stack.extend(data.children.iter().copied());
        }
        Ok(())
    }

    /// Puts a detached node in place of `old` and destroys `old`.
    ///
    /// # Errors
    ///
    /// See [`Tree::insert_before`] and [`Tree::remove`].
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        self.insert_before(old, new)?;
        self.remove(old)
    }

    /// Replaces the text of a leaf. Setting identical text is not an edit.
    ///
    /// # Errors
    ///
    /// Fails for stale nodes and composite nodes.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        self.check_alive(id)?;
        let text = text.into();
        let slot = self.nodes[id.0]
            .text
            .as_mut()
            .ok_or(TreeError::NotLeaf(id))?;
        if *slot == text {
            return Ok(());
        }
        *slot = text;
        self.touch(id);
        Ok(())
    }
}

/// Iterator over ancestors, see [`Tree::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Pre-order iterator, see [`Tree::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `class A {\n  val x\n}`
    fn sample() -> (Tree, NodeId, NodeId) {
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        b.start_node(NodeKind::ClassDeclaration, "class_declaration")
            .token(NodeKind::Keyword, "class")
            .ws(" ")
            .leaf(NodeKind::Identifier, "identifier", "A")
            .ws(" ")
            .start_node(NodeKind::ClassBody, "class_body")
            .token(NodeKind::Punctuation, "{")
            .ws("\n  ")
            .start_node(NodeKind::PropertyDeclaration, "property_declaration")
            .token(NodeKind::Keyword, "val")
            .ws(" ")
            .leaf(NodeKind::Identifier, "identifier", "x")
            .finish_node()
            .ws("\n")
            .token(NodeKind::Punctuation, "}")
            .finish_node()
            .finish_node();
        let tree = b.finish();
        let class = tree.children(tree.root())[0];
        let body = tree.find_child(class, NodeKind::ClassBody).expect("body");
        (tree, class, body)
    }

    // --- text and layout ---

    #[test]
    fn leaves_concatenate_to_text() {
        let (tree, class, body) = sample();
        assert_eq!(tree.text(), "class A {\n  val x\n}");
        assert_eq!(tree.node_text(body), "{\n  val x\n}");
        assert_eq!(tree.span(class), Some(0..19));
    }

    #[test]
    fn positions_are_one_indexed() {
        let (tree, _, _) = sample();
        assert_eq!(tree.position(0), Position { line: 1, column: 1 });
        assert_eq!(tree.position(12), Position { line: 2, column: 3 });
        assert_eq!(tree.position(18), Position { line: 3, column: 1 });
        assert_eq!(tree.line_count(), 3);
        assert_eq!(tree.line_span(2), 10..17);
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        b.leaf(NodeKind::StringLiteral, "string_literal", "\"føø\"")
            .ws(" ")
            .token(NodeKind::Punctuation, "+");
        let tree = b.finish();
        let plus = tree.text().find('+').expect("plus");
        assert_eq!(tree.position(plus).column, 7);
    }

    #[test]
    fn leaf_at_finds_covering_leaf() {
        let (tree, _, _) = sample();
        let leaf = tree.leaf_at(16).expect("leaf");
        assert_eq!(tree.leaf_text(leaf), Some("x"));
        let last = tree.leaf_at(1000).expect("last");
        assert_eq!(tree.leaf_text(last), Some("}"));
    }

    // --- navigation ---

    #[test]
    fn sibling_and_leaf_navigation() {
        let (tree, class, _) = sample();
        let name = tree.find_child(class, NodeKind::Identifier).expect("name");
        let next = tree.next_leaf(name).expect("next");
        assert_eq!(tree.leaf_text(next), Some(" "));
        let prev = tree.prev_leaf(name).expect("prev");
        assert_eq!(tree.leaf_text(prev), Some(" "));
        assert_eq!(tree.prev_sibling(prev), tree.first_child(class));
        assert_eq!(tree.following(class), None);
    }

    #[test]
    fn descendants_are_pre_order() {
        let (tree, _, body) = sample();
        let kinds: Vec<_> = tree.descendants(body).map(|n| tree.kind(n)).collect();
        assert_eq!(kinds[0], NodeKind::ClassBody);
        assert_eq!(kinds[1], NodeKind::Punctuation);
        assert_eq!(kinds[3], NodeKind::PropertyDeclaration);
    }

    // --- mutation ---

    #[test]
    fn edits_recompute_offsets_and_bump_revision() {
        let (mut tree, class, _) = sample();
        let name = tree.find_child(class, NodeKind::Identifier).expect("name");
        let before = tree.revision();
        tree.set_text(name, "LongName").expect("set_text");
        assert!(tree.revision() > before);
        assert_eq!(tree.text(), "class LongName {\n  val x\n}");
        assert_eq!(tree.position(tree.text().len() - 1).line, 3);
    }

    #[test]
    fn setting_same_text_is_not_an_edit() {
        let (mut tree, class, _) = sample();
        let name = tree.find_child(class, NodeKind::Identifier).expect("name");
        let before = tree.revision();
        tree.set_text(name, "A").expect("set_text");
        assert_eq!(tree.revision(), before);
    }

    #[test]
    fn removed_nodes_become_stale() {
        let (mut tree, _, body) = sample();
        let property = tree
            .find_child(body, NodeKind::PropertyDeclaration)
            .expect("property");
        let name = tree.children(property)[2];
        tree.remove(property).expect("remove");
        assert!(!tree.is_alive(property));
        assert!(!tree.is_alive(name));
        assert_eq!(tree.set_text(name, "y"), Err(TreeError::Stale(name)));
        assert_eq!(tree.text(), "class A {\n  \n}");
    }

    #[test]
    fn detached_edits_do_not_touch_revision() {
        let (mut tree, _, body) = sample();
        let before = tree.revision();
        let node = tree.new_node(NodeKind::Other, "x");
        let leaf = tree.new_leaf(NodeKind::Whitespace, "whitespace", " ");
        tree.append_child(node, leaf).expect("append");
        assert_eq!(tree.revision(), before);
        tree.insert_child(body, 1, node).expect("insert");
        assert!(tree.revision() > before);
        assert_eq!(tree.node_text(body), "{ \n  val x\n}");
    }

    #[test]
    fn invalid_insertions_are_rejected() {
        let (mut tree, class, body) = sample();
        let leaf = tree.children(class)[0];
        let fresh = tree.new_leaf(NodeKind::Whitespace, "whitespace", " ");
        assert_eq!(
            tree.append_child(leaf, fresh),
            Err(TreeError::NotComposite(leaf))
        );
        assert_eq!(tree.append_child(class, body), Err(TreeError::Attached(body)));
        assert_eq!(tree.remove(tree.root()), Err(TreeError::Root));

        tree.detach(class).expect("detach");
        assert_eq!(
            tree.append_child(body, class),
            Err(TreeError::Cycle {
                parent: body,
                child: class
            })
        );
    }

    #[test]
    fn replace_swaps_node_in_place() {
        let (mut tree, class, _) = sample();
        let keyword = tree.children(class)[0];
        let new = tree.new_leaf(NodeKind::Keyword, "interface", "interface");
        tree.replace(keyword, new).expect("replace");
        assert_eq!(tree.children(class)[0], new);
        assert!(tree.text().starts_with("interface A"));
    }
}
