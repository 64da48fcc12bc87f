//! Rule to enforce (or forbid) a line break at the end of the file.
//!
//! # Configuration
//!
//! - `insert_final_newline`: require the final line break (default: true).
//!   When false, a trailing line break is reported as redundant.

use ktfix_core::config::INSERT_FINAL_NEWLINE;
use ktfix_core::{
    NodeId, NodeKind, Rule, RuleContext, RuleDescriptor, RuleError, RuleId, RuleProvider,
};

/// Rule name for final-newline.
pub const NAME: &str = "final-newline";

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
            .with_description("Files end with exactly the configured final line break")
            .with_property(&INSERT_FINAL_NEWLINE),
        || Box::new(FinalNewline::new()),
    )
}

/// Checks the end of the file.
#[derive(Debug, Clone)]
pub struct FinalNewline {
    insert: bool,
}

impl Default for FinalNewline {
    fn default() -> Self {
        Self::new()
    }
}

impl FinalNewline {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self { insert: true }
    }
}

impl Rule for FinalNewline {
    fn before_first_node(&mut self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        self.insert = ctx
            .config()
            .get(&INSERT_FINAL_NEWLINE)?
            .as_bool()
            .unwrap_or(true);
        Ok(())
    }

    fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let tree = ctx.tree();
        if node != tree.root() || tree.is_empty() {
            return Ok(());
        }
        let Some(last) = tree.leaves(node).filter(|&l| !tree.node_text(l).is_empty()).last() else {
            return Ok(());
        };
        let is_whitespace = tree.kind(last) == NodeKind::Whitespace;
        let text = tree.leaf_text(last).unwrap_or_default().to_string();
        let ends_with_newline = text.ends_with('\n');
        let len = tree.len();

        if self.insert && !ends_with_newline {
            if let Some(tree) = ctx.emit(len.saturating_sub(1), "File must end with a newline (\\n)", true) {
                if is_whitespace {
                    tree.set_text(last, format!("{}\n", text.trim_end_matches([' ', '\t'])))?;
                } else {
                    let newline = tree.new_leaf(NodeKind::Whitespace, "whitespace", "\n");
                    tree.append_child(node, newline)?;
                }
            }
        } else if !self.insert && is_whitespace && text.contains('\n') {
            let offset = tree.offset(last);
            if let Some(tree) = ctx.emit(offset, "Redundant newline (\\n) at the end of file", true) {
                tree.remove(last)?;
            }
        }
        Ok(())
    }
}
