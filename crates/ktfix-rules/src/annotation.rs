//! Rule for the placement of annotations on declarations.
//!
//! # Rationale
//!
//! A single annotation without arguments may share the line with the
//! declaration it annotates:
//!
//! ```kotlin
//! @Test fun foo() {}
//! ```
//!
//! Several annotations, or an annotation with arguments, go on lines of
//! their own above the declaration:
//!
//! ```kotlin
//! @Foo @Bar
//! class FooBar {}
//!
//! @Suppress("unused")
//! val x = 1
//! ```
//!
//! Annotations are either all on one line or each on its own line, and file
//! annotations are separated from the rest of the file by a blank line.
//!
//! # Configuration
//!
//! - `ktfix_annotation_handle_annotations_with_parameters_same_as_annotations_without_parameters`:
//!   comma separated annotation names (without `@`) whose arguments do not
//!   force a wrap, or `*` for all (default: `unset`).

use crate::util::{
    is_first_on_line, is_newline, last_leaf, line_indent, next_code_leaf, upsert_whitespace_before,
};
use ktfix_core::config::PropertyType;
use ktfix_core::suppression::directive::annotation_name;
use ktfix_core::{
    NodeId, NodeKind, PropertyDef, Rule, RuleContext, RuleDescriptor, RuleError, RuleId,
    RuleProvider, Tree,
};
use tracing::debug;

/// Rule name for annotation.
pub const NAME: &str = "annotation";

/// Annotations whose arguments do not force a line break.
pub static ANNOTATIONS_WITH_PARAMETERS_NOT_TO_BE_WRAPPED: PropertyDef = PropertyDef {
    name: "ktfix_annotation_handle_annotations_with_parameters_same_as_annotations_without_parameters",
    description: "Comma separated annotation names, without '@', handled like annotations without parameters; '*' for all",
    kind: PropertyType::Text,
    default: "unset",
    style_defaults: &[],
    scopable: false,
};

const BEFORE_ANNOTATION: &str = "Expected newline before annotation";
const AFTER_LAST_ANNOTATION: &str = "Expected newline after last annotation";
const MIXED_LINES: &str =
    "All annotations should either be on a single line or all annotations should be on a separate line";
const FILE_ANNOTATIONS: &str =
    "File annotations should be separated from file contents with a blank line";

/// Returns the id of the rule.
#[must_use]
pub fn rule_id() -> RuleId {
    RuleId::standard(NAME)
}

/// Returns the provider of the rule.
#[must_use]
pub fn provider() -> RuleProvider {
    RuleProvider::new(
        RuleDescriptor::new(rule_id())
            .with_description("Multiple annotations or annotations with arguments go on separate lines")
            .with_property(&ANNOTATIONS_WITH_PARAMETERS_NOT_TO_BE_WRAPPED),
        || Box::new(AnnotationRule::new()),
    )
}

/// Checks the placement of annotations.
#[derive(Debug, Clone, Default)]
pub struct AnnotationRule {
    keep_inline: Vec<String>,
}

impl AnnotationRule {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotation with arguments that is not listed as exempt.
    fn wraps_arguments(&self, tree: &Tree, annotation: NodeId) -> bool {
        let text = tree.node_text(annotation);
        if !text.contains('(') {
            return false;
        }
        let name = annotation_name(text);
        !self.keep_inline.iter().any(|k| k == "*" || k == name)
    }

    fn is_preceded_by_plain_annotation_on_line(&self, tree: &Tree, annotation: NodeId) -> bool {
        let mut current = tree.prev_sibling(annotation);
        while let Some(sibling) = current {
            if is_newline(tree, Some(sibling)) || self.wraps_arguments(tree, sibling) {
                return false;
            }
            if tree.kind(sibling) == NodeKind::Annotation {
                return true;
            }
            current = tree.prev_sibling(sibling);
        }
        false
    }

    fn visit_annotation_list(&self, modifiers: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let tree = ctx.tree();
        let Some(declaration) = tree.parent(modifiers).filter(|&p| tree.kind(p).is_declaration())
        else {
            return Ok(());
        };
        let annotations: Vec<NodeId> = tree
            .children(modifiers)
            .iter()
            .copied()
            .filter(|&c| tree.kind(c) == NodeKind::Annotation)
            .collect();
        let Some(&last) = annotations.last() else {
            return Ok(());
        };
        let several_on_line = follows_annotation_on_line(tree, last);
        let with_arguments = annotations.iter().any(|&a| self.wraps_arguments(tree, a));
        if !several_on_line && !with_arguments {
            return Ok(());
        }

        let indent = format!("\n{}", line_indent(tree, tree.offset(declaration)));
        let starts_line: Vec<NodeId> = annotations
            .iter()
            .copied()
            .filter(|&a| {
                self.wraps_arguments(tree, a) || !self.is_preceded_by_plain_annotation_on_line(tree, a)
            })
            .collect();

        for annotation in starts_line {
            let tree = ctx.tree();
            let Some(prev) = tree.prev_leaf(annotation) else {
                continue;
            };
            if is_first_on_line(tree, annotation) {
                continue;
            }
            let offset = tree.offset(prev);
            if let Some(tree) = ctx.emit(offset, BEFORE_ANNOTATION, true) {
                upsert_whitespace_before(tree, annotation, &indent)?;
            }
        }

        let tree = ctx.tree();
        let Some(code) = next_code_leaf(tree, last_leaf(tree, last)) else {
            return Ok(());
        };
        let Some(prev) = tree.prev_leaf(code) else {
            return Ok(());
        };
        if is_first_on_line(tree, code) {
            return Ok(());
        }
        let offset = tree.offset(prev);
        if let Some(tree) = ctx.emit(offset, AFTER_LAST_ANNOTATION, true) {
            upsert_whitespace_before(tree, code, &indent)?;
        }
        Ok(())
    }

    fn visit_annotation_entry(&self, annotation: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let tree = ctx.tree();
        let Some(modifiers) = tree
            .parent(annotation)
            .filter(|&p| tree.kind(p) == NodeKind::Modifiers)
        else {
            return Ok(());
        };
        let Some(declaration) = tree.parent(modifiers).filter(|&p| tree.kind(p).is_declaration())
        else {
            return Ok(());
        };
        if !follows_annotation_on_line(tree, annotation) {
            return Ok(());
        }
        let first = tree.find_child(modifiers, NodeKind::Annotation);
        let mut current = tree.prev_sibling(annotation);
        let mut on_other_line = false;
        while let Some(sibling) = current.filter(|&s| Some(s) != first) {
            if is_newline(tree, Some(sibling)) {
                on_other_line = true;
                break;
            }
            current = tree.prev_sibling(sibling);
        }
        if !on_other_line {
            return Ok(());
        }

        let indent = format!("\n{}", line_indent(tree, tree.offset(declaration)));
        let offset = tree.offset(annotation);
        if let Some(tree) = ctx.emit(offset, MIXED_LINES, true) {
            upsert_whitespace_before(tree, annotation, &indent)?;
        }
        Ok(())
    }

    fn visit_file_annotation(&self, annotation: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let tree = ctx.tree();
        let Some(code) = next_code_leaf(tree, last_leaf(tree, annotation)) else {
            return Ok(());
        };
        if tree
            .find_ancestor(code, |k| k == NodeKind::FileAnnotation)
            .is_some()
        {
            return Ok(());
        }
        let breaks = tree
            .prev_leaf(code)
            .filter(|&l| tree.kind(l) == NodeKind::Whitespace)
            .and_then(|w| tree.leaf_text(w))
            .map_or(0, |t| t.matches('\n').count());
        if breaks >= 2 {
            return Ok(());
        }
        let offset = tree.offset(code);
        if let Some(tree) = ctx.emit(offset, FILE_ANNOTATIONS, true) {
            upsert_whitespace_before(tree, code, "\n\n")?;
        }
        Ok(())
    }
}

/// Returns true if another annotation precedes `node` on the same line.
fn follows_annotation_on_line(tree: &Tree, node: NodeId) -> bool {
    let mut current = tree.prev_sibling(node);
    while let Some(sibling) = current {
        if is_newline(tree, Some(sibling)) {
            return false;
        }
        if tree.kind(sibling) == NodeKind::Annotation {
            return true;
        }
        current = tree.prev_sibling(sibling);
    }
    false
}

impl Rule for AnnotationRule {
    fn before_first_node(&mut self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let value = ctx.config().get(&ANNOTATIONS_WITH_PARAMETERS_NOT_TO_BE_WRAPPED)?;
        self.keep_inline = value
            .as_str()
            .filter(|v| *v != "unset")
            .map(|v| {
                v.split(',')
                    .map(|name| name.trim().trim_start_matches('@').to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        debug!(keep_inline = ?self.keep_inline, "annotations with arguments kept inline");
        Ok(())
    }

    fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        match ctx.tree().kind(node) {
            NodeKind::Modifiers => self.visit_annotation_list(node, ctx),
            NodeKind::Annotation => self.visit_annotation_entry(node, ctx),
            NodeKind::FileAnnotation => self.visit_file_annotation(node, ctx),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::no_empty_block_whitespace;
    use crate::test_support::{format, format_with, lint};
    use ktfix_core::{TreeBuilder, UserOverrides};

    fn split_words(text: &str) -> Vec<&str> {
        let mut parts = Vec::new();
        let mut rest = text;
        while !rest.is_empty() {
            let blank = rest.starts_with(char::is_whitespace);
            let end = rest
                .find(|c: char| c.is_whitespace() != blank)
                .unwrap_or(rest.len());
            parts.push(&rest[..end]);
            rest = &rest[end..];
        }
        parts
    }

    fn annotation(b: &mut TreeBuilder, word: &str) {
        let (name, arguments) = match word.find('(') {
            Some(open) => (&word[1..open], &word[open..]),
            None => (&word[1..], ""),
        };
        b.start_node(NodeKind::Annotation, "annotation")
            .token(NodeKind::Punctuation, "@")
            .leaf(NodeKind::Identifier, "identifier", name);
        if !arguments.is_empty() {
            b.leaf(NodeKind::Other, "value_arguments", arguments);
        }
        b.finish_node();
    }

    /// One declaration: annotations and modifiers, a keyword, a name and an
    /// optional `{ }` body.
    fn declaration(source: &str) -> Tree {
        let parts = split_words(source);
        let keyword = parts
            .iter()
            .position(|p| matches!(*p, "class" | "fun" | "val"))
            .expect("keyword");
        let kind = match parts[keyword] {
            "class" => NodeKind::ClassDeclaration,
            "fun" => NodeKind::FunctionDeclaration,
            _ => NodeKind::PropertyDeclaration,
        };
        let first = parts.iter().position(|p| !p.trim().is_empty()).unwrap_or(0);
        let last_modifier = keyword.saturating_sub(2);

        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        if first > 0 {
            b.ws(parts[0]);
        }
        b.start_node(kind, "declaration");
        if keyword > first {
            b.start_node(NodeKind::Modifiers, "modifiers");
            for part in &parts[first..=last_modifier] {
                if part.trim().is_empty() {
                    b.ws(*part);
                } else if part.starts_with('@') {
                    annotation(&mut b, part);
                } else {
                    b.leaf(NodeKind::Keyword, "modifier", *part);
                }
            }
            b.finish_node();
            b.ws(parts[keyword - 1]);
        }
        b.leaf(NodeKind::Keyword, "keyword", parts[keyword]);
        let mut named = false;
        for part in &parts[keyword + 1..] {
            match *part {
                p if p.trim().is_empty() => {
                    b.ws(p);
                }
                "{" => {
                    let body = if kind == NodeKind::ClassDeclaration {
                        (NodeKind::ClassBody, "class_body")
                    } else {
                        (NodeKind::Block, "block")
                    };
                    b.start_node(body.0, body.1).token(NodeKind::Punctuation, "{");
                }
                "}" => {
                    b.token(NodeKind::Punctuation, "}").finish_node();
                }
                "{}" => {
                    b.start_node(NodeKind::Block, "block")
                        .token(NodeKind::Punctuation, "{")
                        .token(NodeKind::Punctuation, "}")
                        .finish_node();
                }
                p if !named => {
                    named = true;
                    b.leaf(NodeKind::Identifier, "identifier", p);
                }
                p => {
                    b.leaf(NodeKind::Other, "other", p);
                }
            }
        }
        b.finish()
    }

    fn positions(report: &ktfix_core::LintReport) -> Vec<(usize, usize, &str)> {
        report
            .violations
            .iter()
            .map(|v| (v.line, v.column, v.message.as_str()))
            .collect()
    }

    #[test]
    fn several_annotations_on_declaration_line() {
        let rules = || vec![provider(), no_empty_block_whitespace::provider()];
        let source = "@Foo @Bar class FooBar { }";

        let report = lint(declaration, source, rules());
        let found: Vec<_> = report.violations.iter().map(|v| (v.line, v.column)).collect();
        assert_eq!(found, [(1, 10), (1, 25)]);
        assert_eq!(report.violations[0].message, AFTER_LAST_ANNOTATION);

        let report = format(declaration, source, rules());
        assert_eq!(report.output, "@Foo @Bar\nclass FooBar {}");
        assert!(report.is_clean());
    }

    #[test]
    fn single_annotation_may_share_the_line() {
        assert!(lint(declaration, "@Test fun foo() {}", vec![provider()]).is_clean());
        assert!(lint(declaration, "@Foo\n@Bar\nclass A", vec![provider()]).is_clean());
    }

    #[test]
    fn annotation_with_arguments_is_wrapped() {
        let report = format(declaration, "@Suppress(\"unused\") val x", vec![provider()]);
        assert_eq!(report.output, "@Suppress(\"unused\")\nval x");

        let overrides = UserOverrides::new().with(
            ANNOTATIONS_WITH_PARAMETERS_NOT_TO_BE_WRAPPED.name,
            "Suppress",
        );
        let report = format_with(declaration, "@Suppress(\"unused\") val x", vec![provider()], &overrides);
        assert!(!report.changed);
    }

    #[test]
    fn annotation_after_one_with_arguments_starts_a_line() {
        let report = lint(declaration, "@Foo(1) @Bar\nfun f() {}", vec![provider()]);
        assert_eq!(positions(&report), [(1, 8, BEFORE_ANNOTATION)]);

        let report = format(declaration, "@Foo(1) @Bar\nfun f() {}", vec![provider()]);
        assert_eq!(report.output, "@Foo(1)\n@Bar\nfun f() {}");
    }

    #[test]
    fn keeps_declaration_indentation() {
        let report = format(declaration, "    @Foo @Bar fun f() {}", vec![provider()]);
        assert_eq!(report.output, "    @Foo @Bar\n    fun f() {}");
    }

    #[test]
    fn mixed_lines_are_split() {
        let source = "@Foo1\n@Foo2 @Foo3\nfun foo() {}";
        let report = lint(declaration, source, vec![provider()]);
        assert_eq!(positions(&report), [(2, 7, MIXED_LINES)]);

        let report = format(declaration, source, vec![provider()]);
        assert_eq!(report.output, "@Foo1\n@Foo2\n@Foo3\nfun foo() {}");
    }

    fn file_annotation(source: &str) -> Tree {
        let (annotation, rest) = source.split_once('\n').unwrap_or((source, ""));
        let blank = rest.len() - rest.trim_start_matches('\n').len();
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        b.start_node(NodeKind::FileAnnotation, "file_annotation")
            .leaf(NodeKind::Other, "text", annotation)
            .finish_node()
            .ws("\n".repeat(blank + 1))
            .start_node(NodeKind::PackageHeader, "package_header")
            .token(NodeKind::Keyword, "package")
            .ws(" ")
            .leaf(NodeKind::Identifier, "identifier", "foo")
            .finish_node()
            .ws("\n");
        b.finish()
    }

    #[test]
    fn file_annotations_need_a_blank_line() {
        let source = "@file:JvmName(\"Foo\")\npackage foo\n";
        let report = lint(file_annotation, source, vec![provider()]);
        assert_eq!(positions(&report), [(2, 1, FILE_ANNOTATIONS)]);

        let report = format(file_annotation, source, vec![provider()]);
        assert_eq!(report.output, "@file:JvmName(\"Foo\")\n\npackage foo\n");
    }
}
