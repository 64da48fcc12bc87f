//! Rule to forbid spaces and tabs at the end of a line.
//!
//! # Rationale
//!
//! Trailing whitespace is invisible in most editors and produces noisy diffs.
//!
//! # Scope
//!
//! Whitespace and comments are checked. The last line of a whitespace leaf
//! is the indentation of the next token and is left alone, unless the leaf
//! ends the file.

use ktfix_core::{NodeId, NodeKind, Rule, RuleContext, RuleDescriptor, RuleError, RuleId, RuleProvider};

/// Rule name for no-trailing-spaces.
pub const NAME: &str = "no-trailing-spaces";

const MESSAGE: &str = "Trailing space(s)";

/// Returns the id of the rule.
#[must_use]
pub fn rule_id() -> RuleId {
    RuleId::standard(NAME)
}

/// Returns the provider of the rule.
#[must_use]
pub fn provider() -> RuleProvider {
    RuleProvider::new(
        RuleDescriptor::new(rule_id()).with_description("Lines must not end with spaces or tabs"),
        || Box::new(NoTrailingSpaces::new()),
    )
}

/// Forbids trailing spaces and tabs.
#[derive(Debug, Clone, Default)]
pub struct NoTrailingSpaces;

impl NoTrailingSpaces {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Byte ranges of trailing blanks in `text`.
fn trailing_blanks(text: &str, check_last_line: bool) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let lines: Vec<&str> = text.split('\n').collect();
    for (index, line) in lines.iter().enumerate() {
        let is_last = index + 1 == lines.len();
        if !is_last || check_last_line {
            let trimmed = line.trim_end_matches([' ', '\t']);
            if trimmed.len() < line.len() {
                ranges.push((start + trimmed.len(), start + line.len()));
            }
        }
        start += line.len() + 1;
    }
    ranges
}

impl Rule for NoTrailingSpaces {
    fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let kind = ctx.tree().kind(node);
        if !kind.is_trivia() {
            return Ok(());
        }
        let Some(text) = ctx.tree().leaf_text(node).map(str::to_string) else {
            return Ok(());
        };
        let check_last_line =
            kind == NodeKind::LineComment || ctx.tree().next_leaf(node).is_none();
        let start = ctx.tree().offset(node);

        let ranges = trailing_blanks(&text, check_last_line);
        let mut fixed = text;
        // Right to left: a fix never shifts the offset of the next report.
        for (from, to) in ranges.into_iter().rev() {
            if let Some(tree) = ctx.emit(start + from, MESSAGE, true) {
                fixed.replace_range(from..to, "");
                tree.set_text(node, fixed.as_str())?;
            }
        }
        Ok(())
    }
}
