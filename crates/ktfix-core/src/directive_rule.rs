//! Checks the suppression directives themselves.
//!
//! Reports `ktfix-enable` markers that close nothing, `ktfix-disable` line
//! comments with no code before them, rule ids written without their rule
//! set, and ids naming rules that are not loaded.

use crate::context::RuleContext;
use crate::rule::{Rule, RuleDescriptor, RuleError, RuleId, RuleProvider, STANDARD_RULE_SET};
use crate::suppression::directive::{
    classify_argument, parse_marker, suppress_arguments, MarkerKind, SuppressTarget,
    SUPPRESSION_PREFIX,
};
use crate::tree::{NodeId, NodeKind, Tree, TreeError};

const RULE: &str = "ktfix-suppression";

const OBSOLETE_ENABLE: &str =
    "Directive 'ktfix-enable' is obsolete as no matching 'ktfix-disable' precedes it";
const DANGLING_DISABLE: &str =
    "Directive 'ktfix-disable' in EOL comment is ignored as it is not preceded by a code element";
const UNQUALIFIED: &str = "Identifier to suppress rule must be fully qualified with the rule set id";

/// Returns the id of the directive rule, `standard:ktfix-suppression`.
#[must_use]
pub fn directive_rule_id() -> RuleId {
    RuleId::standard(RULE)
}

/// Returns the provider of the directive rule. Engines register it
/// implicitly.
#[must_use]
pub fn provider() -> RuleProvider {
    RuleProvider::new(
        RuleDescriptor::new(directive_rule_id())
            .with_description("Suppression directives must be matched, qualified and refer to loaded rules")
            .unsuppressible(),
        || Box::new(SuppressionDirectiveRule),
    )
}

struct SuppressionDirectiveRule;

impl Rule for SuppressionDirectiveRule {
    fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        match ctx.tree().kind(node) {
            NodeKind::BlockComment | NodeKind::LineComment => check_marker(node, ctx),
            NodeKind::Annotation | NodeKind::FileAnnotation => check_annotation(node, ctx),
            _ => Ok(()),
        }
    }
}

fn unknown(id: &RuleId) -> String {
    format!("Rule with id '{id}' is unknown or not loaded")
}

fn qualified(raw: &str) -> String {
    format!("{STANDARD_RULE_SET}:{raw}")
}

fn check_marker(node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
    let Some(marker) = parse_marker(ctx.tree().node_text(node)) else {
        return Ok(());
    };

    let tree = ctx.tree();
    if marker.kind == MarkerKind::Disable
        && tree.kind(node) == NodeKind::LineComment
        && is_first_on_line(tree, node)
    {
        let offset = tree.offset(node);
        if let Some(tree) = ctx.emit(offset, DANGLING_DISABLE, true) {
            remove_directive(tree, node)?;
        }
        return Ok(());
    }

    if ctx.suppressions().unmatched_enables().contains(&node) {
        let offset = ctx.tree().offset(node);
        if let Some(tree) = ctx.emit(offset, OBSOLETE_ENABLE, false) {
            remove_directive(tree, node)?;
            return Ok(());
        }
    }

    let mut shift = 0;
    for directive_id in &marker.ids {
        let Some(id) = &directive_id.id else {
            continue;
        };
        let offset = ctx.tree().offset(node) + directive_id.offset + shift;
        if directive_id.is_unqualified() {
            if let Some(tree) = ctx.emit(offset, UNQUALIFIED, true) {
                let text = tree.node_text(node).to_string();
                let at = directive_id.offset + shift;
                let fixed = format!(
                    "{}{}{}",
                    &text[..at],
                    qualified(&directive_id.raw),
                    &text[at + directive_id.raw.len()..]
                );
                tree.set_text(node, fixed)?;
                shift += STANDARD_RULE_SET.len() + 1;
            }
        }
        if !ctx.registered_rules().contains(id) {
            let message = unknown(id);
            ctx.emit(offset, message, false);
        }
    }
    Ok(())
}

fn check_annotation(node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
    let Some(arguments) = suppress_arguments(ctx.tree(), node) else {
        return Ok(());
    };

    let prefix = format!("{SUPPRESSION_PREFIX}:");
    let mut shift = 0;
    for argument in arguments {
        let Some(rest) = argument.value.strip_prefix(&prefix) else {
            continue;
        };
        let Some(SuppressTarget::Rule(id)) = classify_argument(&argument.value, ctx.rule_sets())
        else {
            continue;
        };
        let offset = argument.offset + shift + prefix.len();
        if !rest.contains(':') {
            if let Some(tree) = ctx.emit(offset, UNQUALIFIED, true) {
                let leaf = tree.leaf_at(offset).ok_or(TreeError::Stale(node))?;
                let text = tree.leaf_text(leaf).unwrap_or_default().to_string();
                let at = offset - tree.offset(leaf);
                let fixed = format!("{}{}{}", &text[..at], qualified(""), &text[at..]);
                tree.set_text(leaf, fixed)?;
                shift += STANDARD_RULE_SET.len() + 1;
            }
        }
        if !ctx.registered_rules().contains(&id) {
            ctx.emit(offset, unknown(&id), false);
        }
    }
    Ok(())
}

/// Returns true if only indentation precedes `node` on its line.
fn is_first_on_line(tree: &Tree, node: NodeId) -> bool {
    let offset = tree.offset(node);
    let line = tree.line_span(tree.position(offset).line);
    tree.text()[line.start..offset].trim().is_empty()
}

fn whitespace(tree: &Tree, node: Option<NodeId>) -> Option<NodeId> {
    node.filter(|&n| tree.kind(n) == NodeKind::Whitespace)
}

/// Removes a directive comment, together with its line when the comment is
/// alone on it.
fn remove_directive(tree: &mut Tree, comment: NodeId) -> Result<(), TreeError> {
    let prev_leaf = tree.prev_leaf(comment);
    let next_leaf = tree.next_leaf(comment);
    let prev = whitespace(tree, prev_leaf);
    let next = whitespace(tree, next_leaf);
    let prev_text = prev.and_then(|n| tree.leaf_text(n)).unwrap_or_default().to_string();
    let next_text = next.and_then(|n| tree.leaf_text(n)).unwrap_or_default().to_string();

    let starts_line = prev_leaf.is_none() || prev_text.contains('\n');
    let ends_line = next_leaf.is_none() || next_text.contains('\n');

    if starts_line && ends_line {
        match (prev, prev_text.rfind('\n')) {
            (Some(prev), Some(line_break)) => set_or_remove(tree, prev, &prev_text[..line_break])?,
            _ => {
                if let (Some(next), Some(line_break)) = (next, next_text.find('\n')) {
                    set_or_remove(tree, next, &next_text[line_break + 1..])?;
                }
            }
        }
    } else if let (Some(prev), false) = (prev, prev_text.contains('\n')) {
        tree.remove(prev)?;
    } else if let (Some(next), false) = (next, next_text.contains('\n')) {
        tree.remove(next)?;
    }
    tree.remove(comment)
}

fn set_or_remove(tree: &mut Tree, leaf: NodeId, text: &str) -> Result<(), TreeError> {
    if text.is_empty() {
        tree.remove(leaf)
    } else {
        tree.set_text(leaf, text)
    }
}
