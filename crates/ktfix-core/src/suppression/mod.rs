//! Suppression of violations by annotations, marker comments and formatter
//! tags.
//!
//! The index is built once per traversal pass. Scopes are anchored to node
//! handles and measured against the current layout when queried, so edits
//! made earlier in the same pass do not shift them.

pub mod directive;

use crate::config::{ConfigSnapshot, FORMATTER_OFF_TAG, FORMATTER_ON_TAG, FORMATTER_TAGS_ENABLED};
use crate::rule::{RuleId, RuleSetId};
use crate::tree::{NodeId, NodeKind, Tree};
use directive::{classify_argument, parse_marker, suppress_arguments, MarkerKind, SuppressTarget};
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone)]
enum Region {
    /// A node and its descendants.
    Subtree(NodeId),
    /// From `start` up to the end of `end`, or the end of `fallback` while
    /// no closing marker exists.
    Range {
        start: NodeId,
        end: Option<NodeId>,
        fallback: NodeId,
    },
    /// The line holding the comment.
    Line(NodeId),
}

#[derive(Debug, Clone)]
struct Scope {
    region: Region,
    targets: BTreeSet<SuppressTarget>,
}

/// Suppression scopes of one version of a tree.
#[derive(Debug, Clone, Default)]
pub struct SuppressionIndex {
    scopes: Vec<Scope>,
    unmatched_enables: Vec<NodeId>,
}

struct OpenMarker {
    comment: NodeId,
    parent: NodeId,
    targets: BTreeSet<SuppressTarget>,
    scope: usize,
}

impl SuppressionIndex {
    /// Scans a tree for suppression directives.
    ///
    /// `rule_sets` lists the loaded rule sets so that `"ktfix:<id>"` can be
    /// told apart from an unqualified rule id.
    #[must_use]
    pub fn build(tree: &Tree, config: &ConfigSnapshot, rule_sets: &BTreeSet<RuleSetId>) -> Self {
        let mut index = Self::default();
        let mut open: Vec<OpenMarker> = Vec::new();
        let tags = FormatterTags::from_config(config);
        let mut open_tag: Option<usize> = None;

        for node in tree.descendants(tree.root()) {
            match tree.kind(node) {
                NodeKind::Annotation | NodeKind::FileAnnotation => {
                    index.add_annotation(tree, node, rule_sets);
                }
                NodeKind::BlockComment => {
                    if let Some(marker) = parse_marker(tree.node_text(node)) {
                        index.add_block_marker(tree, node, marker.kind, marker.targets(), &mut open);
                    } else if let Some(tags) = &tags {
                        open_tag = index.add_formatter_tag(tree, node, tags, open_tag);
                    }
                }
                NodeKind::LineComment => {
                    if let Some(marker) = parse_marker(tree.node_text(node)) {
                        if marker.kind == MarkerKind::Disable {
                            index.scopes.push(Scope {
                                region: Region::Line(node),
                                targets: marker.targets(),
                            });
                        }
                    } else if let Some(tags) = &tags {
                        open_tag = index.add_formatter_tag(tree, node, tags, open_tag);
                    }
                }
                _ => {}
            }
        }

        debug!(
            "Suppression index: {} scope(s), {} unmatched enable(s)",
            index.scopes.len(),
            index.unmatched_enables.len()
        );
        index
    }

    fn add_annotation(&mut self, tree: &Tree, node: NodeId, rule_sets: &BTreeSet<RuleSetId>) {
        let Some(arguments) = suppress_arguments(tree, node) else {
            return;
        };
        let targets: BTreeSet<_> = arguments
            .iter()
            .filter_map(|a| classify_argument(&a.value, rule_sets))
            .collect();
        if targets.is_empty() {
            return;
        }
        let scope = if tree.kind(node) == NodeKind::FileAnnotation {
            tree.root()
        } else {
            tree.find_ancestor(node, NodeKind::is_declaration)
                .or_else(|| tree.parent(node))
                .unwrap_or_else(|| tree.root())
        };
        self.scopes.push(Scope {
            region: Region::Subtree(scope),
            targets,
        });
    }

    fn add_block_marker(
        &mut self,
        tree: &Tree,
        node: NodeId,
        kind: MarkerKind,
        targets: BTreeSet<SuppressTarget>,
        open: &mut Vec<OpenMarker>,
    ) {
        let parent = tree.parent(node).unwrap_or_else(|| tree.root());
        match kind {
            MarkerKind::Disable => {
                self.scopes.push(Scope {
                    region: Region::Range {
                        start: node,
                        end: None,
                        fallback: parent,
                    },
                    targets: targets.clone(),
                });
                open.push(OpenMarker {
                    comment: node,
                    parent,
                    targets,
                    scope: self.scopes.len() - 1,
                });
            }
            MarkerKind::Enable => {
                let matching = open
                    .iter()
                    .rposition(|m| m.parent == parent && m.targets == targets);
                match matching {
                    Some(position) => {
                        let marker = open.remove(position);
                        if let Region::Range { end, .. } = &mut self.scopes[marker.scope].region {
                            *end = Some(node);
                        }
                        debug!("Matched ktfix-enable {node} with ktfix-disable {}", marker.comment);
                    }
                    None => self.unmatched_enables.push(node),
                }
            }
        }
    }

    fn add_formatter_tag(
        &mut self,
        tree: &Tree,
        node: NodeId,
        tags: &FormatterTags,
        open_tag: Option<usize>,
    ) -> Option<usize> {
        let text = tree.node_text(node);
        if open_tag.is_none() && text.contains(&tags.off) {
            self.scopes.push(Scope {
                region: Region::Range {
                    start: node,
                    end: None,
                    fallback: tree.root(),
                },
                targets: BTreeSet::from([SuppressTarget::All]),
            });
            return Some(self.scopes.len() - 1);
        }
        if let Some(scope) = open_tag {
            if text.contains(&tags.on) {
                if let Region::Range { end, .. } = &mut self.scopes[scope].region {
                    *end = Some(node);
                }
                return None;
            }
        }
        open_tag
    }

    /// Returns true if a violation of `rule` at `offset` is suppressed.
    #[must_use]
    pub fn is_suppressed(&self, tree: &Tree, rule: &RuleId, offset: usize) -> bool {
        self.scopes
            .iter()
            .filter(|s| s.targets.iter().any(|t| t.covers(rule)))
            .any(|s| s.region.contains(tree, offset))
    }

    /// Returns `ktfix-enable` markers without a preceding matching disable.
    #[must_use]
    pub fn unmatched_enables(&self) -> &[NodeId] {
        &self.unmatched_enables
    }

    /// Returns the number of scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns true if nothing is suppressed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Region {
    fn contains(&self, tree: &Tree, offset: usize) -> bool {
        match *self {
            Self::Subtree(node) => {
                if !tree.is_attached(node) {
                    return false;
                }
                let Some(leaf) = tree.leaf_at(offset) else {
                    return node == tree.root();
                };
                leaf == node || tree.ancestors(leaf).any(|a| a == node)
            }
            Self::Range {
                start,
                end,
                fallback,
            } => {
                if !tree.is_attached(start) {
                    return false;
                }
                let from = tree.offset(start);
                let to = match end.filter(|&e| tree.is_attached(e)) {
                    Some(end) => tree.end_offset(end),
                    None if tree.is_attached(fallback) => tree.end_offset(fallback),
                    None => tree.len(),
                };
                from <= offset && (offset < to || (offset == to && to == tree.len()))
            }
            Self::Line(comment) => {
                if !tree.is_attached(comment) {
                    return false;
                }
                let line = tree.position(tree.offset(comment)).line;
                let span = tree.line_span(line);
                span.start <= offset && offset <= span.end
            }
        }
    }
}

struct FormatterTags {
    off: String,
    on: String,
}

impl FormatterTags {
    fn from_config(config: &ConfigSnapshot) -> Option<Self> {
        let enabled = config
            .resolve(FORMATTER_TAGS_ENABLED.name)
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !enabled {
            return None;
        }
        let tag = |name: &str, default: &str| {
            config
                .resolve(name)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| default.to_string())
        };
        Some(Self {
            off: tag(FORMATTER_OFF_TAG.name, FORMATTER_OFF_TAG.default),
            on: tag(FORMATTER_ON_TAG.name, FORMATTER_ON_TAG.default),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_properties, UserOverrides};
    use crate::tree::TreeBuilder;

    fn config(overrides: UserOverrides) -> ConfigSnapshot {
        ConfigSnapshot::new(builtin_properties(), overrides)
    }

    fn index(tree: &Tree) -> SuppressionIndex {
        SuppressionIndex::build(
            tree,
            &config(UserOverrides::new()),
            &BTreeSet::from([RuleSetId::standard()]),
        )
    }

    fn offset_of(tree: &Tree, needle: &str) -> usize {
        tree.text().find(needle).expect("needle in text")
    }

    fn rule(id: &'static str) -> RuleId {
        RuleId::standard(id)
    }

    /// `@Suppress("ktfix:standard:foo")\nclass A {\n  val x\n}\nval y\n`
    fn annotated_class(argument: &'static str) -> Tree {
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        b.start_node(NodeKind::ClassDeclaration, "class_declaration")
            .start_node(NodeKind::Modifiers, "modifiers")
            .start_node(NodeKind::Annotation, "annotation")
            .token(NodeKind::Punctuation, "@")
            .leaf(NodeKind::Identifier, "identifier", "Suppress")
            .token(NodeKind::Punctuation, "(")
            .start_node(NodeKind::StringLiteral, "string_literal")
            .token(NodeKind::Punctuation, "\"")
            .leaf(NodeKind::StringContent, "string_content", argument)
            .token(NodeKind::Punctuation, "\"")
            .finish_node()
            .token(NodeKind::Punctuation, ")")
            .finish_node()
            .finish_node()
            .ws("\n")
            .token(NodeKind::Keyword, "class")
            .ws(" ")
            .leaf(NodeKind::Identifier, "identifier", "A")
            .ws(" ")
            .start_node(NodeKind::ClassBody, "class_body")
            .token(NodeKind::Punctuation, "{")
            .ws("\n  ")
            .leaf(NodeKind::Other, "property", "val x")
            .ws("\n")
            .token(NodeKind::Punctuation, "}")
            .finish_node()
            .finish_node()
            .ws("\n")
            .leaf(NodeKind::Other, "property", "val y")
            .ws("\n");
        b.finish()
    }

    // --- annotations ---

    #[test]
    fn annotation_suppresses_declaration_subtree_only() {
        let tree = annotated_class("ktfix:standard:foo");
        let index = index(&tree);
        assert!(index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val x")));
        assert!(!index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val y")));
        assert!(!index.is_suppressed(&tree, &rule("bar"), offset_of(&tree, "val x")));
    }

    #[test]
    fn annotation_wildcard_and_rule_set() {
        let custom = RuleId::parse("custom:bar").expect("valid");

        let tree = annotated_class("ktfix");
        let index = index(&tree);
        assert!(index.is_suppressed(&tree, &rule("bar"), offset_of(&tree, "val x")));
        assert!(index.is_suppressed(&tree, &custom, offset_of(&tree, "val x")));

        let tree = annotated_class("ktfix:standard");
        let index = self::index(&tree);
        assert!(index.is_suppressed(&tree, &rule("bar"), offset_of(&tree, "val x")));
        assert!(!index.is_suppressed(&tree, &custom, offset_of(&tree, "val x")));
    }

    #[test]
    fn unqualified_annotation_argument_is_normalized() {
        let tree = annotated_class("ktfix:foo");
        let index = index(&tree);
        assert!(index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val x")));
    }

    // --- markers ---

    fn marker_tree(disable: &'static str, enable: Option<&'static str>) -> Tree {
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        b.leaf(NodeKind::Other, "property", "val a")
            .ws("\n")
            .leaf(NodeKind::BlockComment, "block_comment", disable)
            .ws("\n")
            .leaf(NodeKind::Other, "property", "val b")
            .ws("\n");
        if let Some(enable) = enable {
            b.leaf(NodeKind::BlockComment, "block_comment", enable).ws("\n");
        }
        b.leaf(NodeKind::Other, "property", "val c").ws("\n");
        b.finish()
    }

    #[test]
    fn block_markers_delimit_region() {
        let tree = marker_tree(
            "/* ktfix-disable standard:foo */",
            Some("/* ktfix-enable standard:foo */"),
        );
        let index = index(&tree);
        assert!(!index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val a")));
        assert!(index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val b")));
        assert!(!index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val c")));
        assert!(index.unmatched_enables().is_empty());
    }

    #[test]
    fn unclosed_disable_runs_to_end_of_parent() {
        let tree = marker_tree("/* ktfix-disable */", None);
        let index = index(&tree);
        assert!(index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val c")));
        assert!(index.is_suppressed(&tree, &rule("foo"), tree.len()));
    }

    #[test]
    fn enable_with_different_ids_does_not_close() {
        let tree = marker_tree(
            "/* ktfix-disable standard:foo */",
            Some("/* ktfix-enable standard:bar */"),
        );
        let index = index(&tree);
        assert!(index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val c")));
        assert_eq!(index.unmatched_enables().len(), 1);
    }

    #[test]
    fn unqualified_marker_ids_match_qualified_rules() {
        let tree = marker_tree("/* ktfix-disable foo */", Some("/* ktfix-enable foo */"));
        let index = index(&tree);
        assert!(index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val b")));
        assert!(index.unmatched_enables().is_empty());
    }

    #[test]
    fn end_of_line_comment_suppresses_its_line() {
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        b.leaf(NodeKind::Other, "property", "val a")
            .ws(" ")
            .leaf(NodeKind::LineComment, "line_comment", "// ktfix-disable standard:foo")
            .ws("\n")
            .leaf(NodeKind::Other, "property", "val b")
            .ws("\n");
        let tree = b.finish();
        let index = index(&tree);
        assert!(index.is_suppressed(&tree, &rule("foo"), 0));
        assert!(index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, " //")));
        assert!(!index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val b")));
    }

    // --- formatter tags ---

    #[test]
    fn formatter_tags_only_when_enabled() {
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        b.leaf(NodeKind::LineComment, "line_comment", "// @formatter:off")
            .ws("\n")
            .leaf(NodeKind::Other, "property", "val a")
            .ws("\n")
            .leaf(NodeKind::LineComment, "line_comment", "// @formatter:on")
            .ws("\n")
            .leaf(NodeKind::Other, "property", "val b")
            .ws("\n");
        let tree = b.finish();
        let sets = BTreeSet::from([RuleSetId::standard()]);

        let disabled = SuppressionIndex::build(&tree, &config(UserOverrides::new()), &sets);
        assert!(disabled.is_empty());

        let enabled = SuppressionIndex::build(
            &tree,
            &config(UserOverrides::new().with("ij_formatter_tags_enabled", "true")),
            &sets,
        );
        assert!(enabled.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val a")));
        assert!(!enabled.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val b")));
    }

    #[test]
    fn removed_directive_no_longer_suppresses() {
        let mut tree = marker_tree("/* ktfix-disable */", None);
        let index = index(&tree);
        let comment = tree
            .descendants(tree.root())
            .find(|&n| tree.kind(n) == NodeKind::BlockComment)
            .expect("comment");
        tree.remove(comment).expect("removed");
        assert!(!index.is_suppressed(&tree, &rule("foo"), offset_of(&tree, "val c")));
    }
}
