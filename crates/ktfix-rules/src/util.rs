//! Tree helpers shared by the rules.

use ktfix_core::{NodeId, NodeKind, Tree, TreeError};

/// Returns true if the node is a whitespace leaf containing a line break.
pub(crate) fn is_newline(tree: &Tree, node: Option<NodeId>) -> bool {
    node.is_some_and(|n| {
        tree.kind(n) == NodeKind::Whitespace && tree.leaf_text(n).is_some_and(|t| t.contains('\n'))
    })
}

/// Returns the last leaf of a subtree, or the node itself if it is a leaf.
pub(crate) fn last_leaf(tree: &Tree, node: NodeId) -> NodeId {
    let mut current = node;
    while let Some(child) = tree.last_child(current) {
        current = child;
    }
    current
}

/// Returns the first leaf after `node` that is neither whitespace nor a
/// comment.
pub(crate) fn next_code_leaf(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let mut current = tree.next_leaf(node)?;
    while tree.kind(current).is_trivia() {
        current = tree.next_leaf(current)?;
    }
    Some(current)
}

/// Returns the leading whitespace of the line holding `offset`.
pub(crate) fn line_indent(tree: &Tree, offset: usize) -> String {
    let line = tree.line_span(tree.position(offset).line);
    tree.text()[line]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Returns true if only indentation precedes `node` on its line.
pub(crate) fn is_first_on_line(tree: &Tree, node: NodeId) -> bool {
    let offset = tree.offset(node);
    let line = tree.line_span(tree.position(offset).line);
    tree.text()[line.start..offset].trim().is_empty()
}

/// Returns true if the declaration's modifier list holds a token spelled
/// `word`.
pub(crate) fn has_modifier(tree: &Tree, declaration: NodeId, word: &str) -> bool {
    tree.find_child(declaration, NodeKind::Modifiers)
        .is_some_and(|modifiers| tree.leaves(modifiers).any(|l| tree.leaf_text(l) == Some(word)))
}

/// Returns the identifier naming a declaration.
///
/// Identifiers inside the modifier list, such as annotation names, are
/// skipped.
pub(crate) fn declaration_name(tree: &Tree, declaration: NodeId) -> Option<NodeId> {
    tree.descendants(declaration).find(|&n| {
        tree.kind(n) == NodeKind::Identifier
            && !tree
                .ancestors(n)
                .take_while(|&a| a != declaration)
                .any(|a| tree.kind(a) == NodeKind::Modifiers)
    })
}

/// Replaces the whitespace leaf `before` by `text`, or inserts a new
/// whitespace leaf before `anchor` when `before` is not whitespace.
pub(crate) fn upsert_whitespace_before(
    tree: &mut Tree,
    anchor: NodeId,
    text: &str,
) -> Result<(), TreeError> {
    match tree.prev_leaf(anchor).filter(|&l| tree.kind(l) == NodeKind::Whitespace) {
        Some(whitespace) => tree.set_text(whitespace, text),
        None => {
            let whitespace = tree.new_leaf(NodeKind::Whitespace, "whitespace", text);
            tree.insert_before(anchor, whitespace)
        }
    }
}
