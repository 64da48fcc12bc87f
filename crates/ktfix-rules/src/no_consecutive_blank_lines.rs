//! Rule to forbid more than one blank line in a row.
//!
//! # Rationale
//!
//! A single blank line separates code; more only stretch the file.
//!
//! # Scope
//!
//! At the end of the file no blank line is allowed at all. Runs after
//! `no-trailing-spaces` so that lines holding only spaces already count as
//! blank.

use crate::no_trailing_spaces;
use ktfix_core::{
    NodeId, NodeKind, Rule, RuleContext, RuleDescriptor, RuleError, RuleId, RuleProvider,
    RunAfterMode,
};

/// Rule name for no-consecutive-blank-lines.
pub const NAME: &str = "no-consecutive-blank-lines";

const MESSAGE: &str = "Needless blank line(s)";

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
            .with_description("At most one consecutive blank line")
            .with_run_after(no_trailing_spaces::rule_id(), RunAfterMode::IfLoaded),
        || Box::new(NoConsecutiveBlankLines::new()),
    )
}

/// Collapses runs of blank lines.
#[derive(Debug, Clone, Default)]
pub struct NoConsecutiveBlankLines;

impl NoConsecutiveBlankLines {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NoConsecutiveBlankLines {
    fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        if ctx.tree().kind(node) != NodeKind::Whitespace {
            return Ok(());
        }
        let Some(text) = ctx.tree().leaf_text(node).map(str::to_string) else {
            return Ok(());
        };
        let allowed = if ctx.tree().next_leaf(node).is_none() { 1 } else { 2 };
        let breaks: Vec<usize> = text.match_indices('\n').map(|(i, _)| i).collect();
        if breaks.len() <= allowed {
            return Ok(());
        }

        let keep = breaks[allowed - 1] + 1;
        let offset = ctx.tree().offset(node) + keep;
        if let Some(tree) = ctx.emit(offset, MESSAGE, true) {
            let indent = text.rsplit('\n').next().unwrap_or_default();
            tree.set_text(node, format!("{}{indent}", &text[..keep]))?;
        }
        Ok(())
    }
}
