//! Engines and trees for rule tests.

use ktfix_core::{
    Code, Engine, FormatReport, LintReport, NodeKind, ParseError, RuleProvider, SourceParser,
    Tree, TreeBuilder, UserOverrides,
};

/// Parser backed by a tree-building function.
struct FnParser(fn(&str) -> Tree);

impl SourceParser for FnParser {
    fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        let tree = (self.0)(source);
        assert_eq!(tree.text(), source, "tree does not reproduce the source");
        Ok(tree)
    }
}

/// Flat tree of words, whitespace and comments.
pub(crate) fn tokens(source: &str) -> Tree {
    let mut b = TreeBuilder::new(NodeKind::File, "source_file");
    let mut rest = source;
    while !rest.is_empty() {
        let (kind, len) = if rest.starts_with("//") {
            (NodeKind::LineComment, rest.find('\n').unwrap_or(rest.len()))
        } else if rest.starts_with("/*") {
            (NodeKind::BlockComment, rest.find("*/").map_or(rest.len(), |e| e + 2))
        } else if rest.starts_with(char::is_whitespace) {
            (NodeKind::Whitespace, rest.len() - rest.trim_start().len())
        } else {
            (NodeKind::Identifier, rest.find(char::is_whitespace).unwrap_or(rest.len()))
        };
        b.leaf(kind, "token", &rest[..len]);
        rest = &rest[len..];
    }
    b.finish()
}

pub(crate) fn engine(build: fn(&str) -> Tree, providers: Vec<RuleProvider>) -> Engine {
    providers
        .into_iter()
        .fold(Engine::builder(FnParser(build)), |b, p| b.rule(p))
        .build()
}

pub(crate) fn lint(build: fn(&str) -> Tree, source: &str, providers: Vec<RuleProvider>) -> LintReport {
    engine(build, providers)
        .lint(&Code::from_snippet(source))
        .expect("lint")
}

pub(crate) fn lint_with(
    build: fn(&str) -> Tree,
    source: &str,
    providers: Vec<RuleProvider>,
    overrides: &UserOverrides,
) -> LintReport {
    engine(build, providers)
        .lint_with(&Code::from_snippet(source), overrides)
        .expect("lint")
}

pub(crate) fn format(build: fn(&str) -> Tree, source: &str, providers: Vec<RuleProvider>) -> FormatReport {
    engine(build, providers)
        .format(&Code::from_snippet(source))
        .expect("format")
}

pub(crate) fn format_with(
    build: fn(&str) -> Tree,
    source: &str,
    providers: Vec<RuleProvider>,
    overrides: &UserOverrides,
) -> FormatReport {
    engine(build, providers)
        .format_with(&Code::from_snippet(source), overrides)
        .expect("format")
}
