//! Rule to limit the length of lines.
//!
//! # Configuration
//!
//! - `max_line_length`: maximum number of characters per line, or `off`.
//!   The default depends on the code style: 140 for `ktfix_official`, 100
//!   for `android_studio`, off for `intellij_idea`.
//! - `ktfix_ignore_back_ticked_identifier`: do not count backticked
//!   identifiers (default: false).
//!
//! Lines in package and import directives, raw multi-line strings and lines
//! holding only a comment are not checked. Nothing is fixed automatically.

use ktfix_core::config::{PropertyType, MAX_LINE_LENGTH};
use ktfix_core::{
    NodeId, NodeKind, PropertyDef, PropertyValue, Rule, RuleContext, RuleDescriptor, RuleError,
    RuleId, RuleProvider,
};

use crate::util::is_newline;
use tracing::debug;

/// Rule name for max-line-length.
pub const NAME: &str = "max-line-length";

/// Excludes backticked identifiers from the line length.
pub static IGNORE_BACK_TICKED_IDENTIFIER: PropertyDef = PropertyDef {
    name: "ktfix_ignore_back_ticked_identifier",
    description: "Defines whether backticked identifiers are excluded from the line length",
    kind: PropertyType::Boolean,
    default: "false",
    style_defaults: &[],
    scopable: false,
};

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
            .with_description("Lines must not exceed max_line_length")
            .with_property(&MAX_LINE_LENGTH)
            .with_property(&IGNORE_BACK_TICKED_IDENTIFIER)
            .run_last(),
        || Box::new(MaxLineLength::new()),
    )
}

/// Reports lines longer than `max_line_length`.
#[derive(Debug, Clone, Default)]
pub struct MaxLineLength {
    limit: Option<usize>,
    ignore_back_ticked: bool,
}

impl MaxLineLength {
    /// Creates the rule; the limit is read from the configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_back_ticked(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('`') && text.ends_with('`')
}

fn is_raw_multiline_string(ctx: &RuleContext<'_>, leaf: NodeId) -> bool {
    let tree = ctx.tree();
    tree.ancestors(leaf)
        .filter(|&a| tree.kind(a) == NodeKind::StringLiteral)
        .any(|s| tree.node_text(s).starts_with("\"\"\"") && tree.node_text(s).contains('\n'))
}

impl Rule for MaxLineLength {
    fn before_first_node(&mut self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let config = ctx.config();
        self.limit = match config.get(&MAX_LINE_LENGTH)? {
            PropertyValue::Integer(limit) => usize::try_from(limit).ok().filter(|l| *l > 0),
            _ => None,
        };
        self.ignore_back_ticked = config
            .get(&IGNORE_BACK_TICKED_IDENTIFIER)?
            .as_bool()
            .unwrap_or(false);
        debug!(limit = ?self.limit, ignore_back_ticked = self.ignore_back_ticked, "max line length");
        Ok(())
    }

    fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let tree = ctx.tree();
        if !tree.is_leaf(node) || tree.kind(node) == NodeKind::Whitespace {
            return Ok(());
        }
        let next = tree.next_leaf(node);
        if next.is_some() && !is_newline(tree, next) {
            return Ok(());
        }

        let end = tree.end_offset(node);
        let line = tree.position(end).line;
        let span = tree.line_span(line);
        let text = &tree.text()[span.clone()];
        let mut length = text.chars().count();
        if self.ignore_back_ticked {
            length -= tree
                .leaves(tree.root())
                .filter(|&l| tree.kind(l) == NodeKind::Identifier)
                .filter(|&l| span.contains(&tree.offset(l)))
                .filter_map(|l| tree.leaf_text(l))
                .filter(|t| is_back_ticked(t))
                .map(|t| t.chars().count())
                .sum::<usize>();
        }
        if length <= limit {
            return Ok(());
        }

        let excluded = tree.ancestors(node).any(|a| {
            matches!(tree.kind(a), NodeKind::PackageHeader | NodeKind::Import)
        });
        let comment_only = tree.kind(node).is_comment() && text.trim_start() == tree.node_text(node);
        if excluded || comment_only || is_raw_multiline_string(ctx, node) {
            return Ok(());
        }

        let offset = span.start + text.char_indices().nth(limit).map_or(0, |(i, _)| i);
        ctx.emit(offset, format!("Exceeded max line length ({limit})"), false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{lint, lint_with, tokens};
    use ktfix_core::{Tree, TreeBuilder, UserOverrides};

    fn limit(value: &str) -> UserOverrides {
        UserOverrides::new().with("max_line_length", value)
    }

    #[test]
    fn reports_long_line_at_first_excess_column() {
        let report = lint_with(tokens, "val short = 1\nval longer = 12\n", vec![provider()], &limit("14"));
        assert_eq!(report.violations.len(), 1);
        let violation = &report.violations[0];
        assert_eq!((violation.line, violation.column), (2, 15));
        assert_eq!(violation.message, "Exceeded max line length (14)");
        assert!(!violation.autocorrectable);
    }

    #[test]
    fn code_style_sets_the_default() {
        let long = format!("val a = \"{}\"\n", "x".repeat(120));
        assert_eq!(lint(tokens, &long, vec![provider()]).count(), 0);

        let android = UserOverrides::new().with("code_style", "android_studio");
        assert_eq!(lint_with(tokens, &long, vec![provider()], &android).count(), 1);

        let intellij = UserOverrides::new().with("code_style", "intellij_idea");
        let longest = format!("val a = \"{}\"\n", "x".repeat(200));
        assert_eq!(lint_with(tokens, &longest, vec![provider()], &intellij).count(), 0);
    }

    #[test]
    fn off_disables_the_check() {
        let long = format!("{}\n", "x".repeat(300));
        assert!(lint_with(tokens, &long, vec![provider()], &limit("off")).is_clean());
    }

    #[test]
    fn comment_only_lines_are_skipped() {
        let source = "// a comment that is far too long\nval a = 1 // trailing comment\n";
        let report = lint_with(tokens, source, vec![provider()], &limit("20"));
        let lines: Vec<_> = report.violations.iter().map(|v| v.line).collect();
        assert_eq!(lines, [2]);
    }

    #[test]
    fn back_ticked_identifiers_can_be_ignored() {
        let source = "fun `a very long test name`() = 1\n";
        let overrides = limit("20").with("ktfix_ignore_back_ticked_identifier", "true");
        assert_eq!(lint_with(tokens, source, vec![provider()], &limit("20")).count(), 1);
        assert!(lint_with(tokens_with_ticks, source, vec![provider()], &overrides).is_clean());
    }

    /// Like `tokens`, but keeps a backticked name in one leaf.
    fn tokens_with_ticks(source: &str) -> Tree {
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        let start = source.find('`').unwrap_or(0);
        let end = source.rfind('`').map_or(0, |e| e + 1);
        b.leaf(NodeKind::Keyword, "fun", &source[..start])
            .leaf(NodeKind::Identifier, "identifier", &source[start..end])
            .leaf(NodeKind::Other, "rest", source[end..].trim_end_matches('\n'))
            .ws("\n");
        b.finish()
    }

    #[test]
    fn imports_are_skipped() {
        fn import(source: &str) -> Tree {
            let mut b = TreeBuilder::new(NodeKind::File, "source_file");
            b.start_node(NodeKind::Import, "import")
                .leaf(NodeKind::Other, "text", source.trim_end())
                .finish_node()
                .ws("\n");
            b.finish()
        }
        let source = "import com.example.some.very.long.package.name.Type\n";
        assert!(lint_with(import, source, vec![provider()], &limit("20")).is_clean());
    }
}
