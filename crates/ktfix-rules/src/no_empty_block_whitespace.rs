//! Rule to collapse empty blocks and class bodies to `{}`.
//!
//! A block holding only whitespace between its braces is written `{}`.
//! Blocks holding a comment are left alone.

use ktfix_core::{NodeId, NodeKind, Rule, RuleContext, RuleDescriptor, RuleError, RuleId, RuleProvider};

/// Rule name for no-empty-block-whitespace.
pub const NAME: &str = "no-empty-block-whitespace";

const MESSAGE: &str = "Unexpected whitespace in empty block";

/// Returns the id of the rule.
#[must_use]
pub fn rule_id() -> RuleId {
    RuleId::standard(NAME)
}

/// Returns the provider of the rule.
#[must_use]
pub fn provider() -> RuleProvider {
    RuleProvider::new(
        RuleDescriptor::new(rule_id()).with_description("Empty blocks must be written as {}"),
        || Box::new(NoEmptyBlockWhitespace::new()),
    )
}

/// Removes whitespace from empty blocks.
#[derive(Debug, Clone, Default)]
pub struct NoEmptyBlockWhitespace;

impl NoEmptyBlockWhitespace {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NoEmptyBlockWhitespace {
    fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let tree = ctx.tree();
        if !matches!(tree.kind(node), NodeKind::ClassBody | NodeKind::Block) {
            return Ok(());
        }
        let children = tree.children(node);
        let (Some(&open), Some(&close)) = (children.first(), children.last()) else {
            return Ok(());
        };
        if children.len() < 3 || tree.leaf_text(open) != Some("{") || tree.leaf_text(close) != Some("}") {
            return Ok(());
        }
        let inner: Vec<NodeId> = children[1..children.len() - 1].to_vec();
        if !inner.iter().all(|&c| tree.kind(c) == NodeKind::Whitespace) {
            return Ok(());
        }

        let offset = tree.end_offset(open);
        if let Some(tree) = ctx.emit(offset, MESSAGE, true) {
            for whitespace in inner {
                tree.remove(whitespace)?;
            }
        }
        Ok(())
    }
}
