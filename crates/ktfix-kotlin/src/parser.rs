//! Kotlin parser using Tree-sitter.

use ktfix_core::{NodeKind, ParseError, SourceParser, Tree, TreeBuilder};
use tracing::{debug, trace};
use tree_sitter::{Language, Node, Parser};

use crate::kinds::{is_transparent, node_kind};

/// Parses Kotlin source files and scripts into ktfix trees.
///
/// Whitespace is not part of the grammar; it becomes whitespace leaves in
/// the lowest node whose children it separates, so the tree reproduces the
/// source byte for byte.
pub struct KotlinParser {
    language: Language,
}

impl KotlinParser {
    /// Creates a new Kotlin parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_kotlin_ng::LANGUAGE.into(),
        }
    }
}

impl Default for KotlinParser {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KotlinParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KotlinParser").finish_non_exhaustive()
    }
}

impl SourceParser for KotlinParser {
    fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::new(1, 1, format!("failed to load the Kotlin grammar: {e}")))?;
        let syntax = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::new(1, 1, "parsing was cancelled"))?;
        let root = syntax.root_node();

        if let Some(error) = first_error(root) {
            return Err(syntax_error(source, error));
        }

        let mut converter = Converter {
            source,
            builder: TreeBuilder::new(NodeKind::File, root.kind()),
            pos: 0,
        };
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            converter.node(child);
        }
        converter.gap(source.len());
        let tree = converter.builder.finish();
        debug!(bytes = source.len(), "parsed Kotlin source");
        Ok(tree)
    }
}

/// Returns the first error or missing node in pre-order.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    found
}

fn syntax_error(source: &str, node: Node<'_>) -> ParseError {
    let start = node.start_byte();
    let point = node.start_position();
    let line_start = start.saturating_sub(point.column);
    let column = source
        .get(line_start..start)
        .map_or(point.column, |prefix| prefix.chars().count())
        + 1;

    let message = if node.is_missing() {
        format!("missing '{}'", node.kind())
    } else {
        let text = source.get(start..node.end_byte()).unwrap_or_default();
        let snippet: String = text.lines().next().unwrap_or_default().chars().take(20).collect();
        if snippet.trim().is_empty() {
            "syntax error".to_string()
        } else {
            format!("unexpected '{}'", snippet.trim())
        }
    };
    trace!(line = point.row + 1, column, %message, "syntax error");
    ParseError::new(point.row + 1, column, message)
}

struct Converter<'s> {
    source: &'s str,
    builder: TreeBuilder,
    pos: usize,
}

impl Converter<'_> {
    /// Adds the text between the last token and `until` to the open node.
    fn gap(&mut self, until: usize) {
        if until <= self.pos {
            return;
        }
        let source = self.source;
        let mut rest = &source[self.pos..until];
        while !rest.is_empty() {
            let blank = rest.starts_with(char::is_whitespace);
            let end = rest
                .find(|c: char| c.is_whitespace() != blank)
                .unwrap_or(rest.len());
            if blank {
                self.builder.ws(&rest[..end]);
            } else {
                self.builder.leaf(NodeKind::Other, "text", &rest[..end]);
            }
            rest = &rest[end..];
        }
        self.pos = until;
    }

    fn node(&mut self, node: Node<'_>) {
        if node.child_count() == 0 {
            if node.end_byte() > node.start_byte() {
                self.gap(node.start_byte());
                let source = self.source;
                let text = &source[node.start_byte()..node.end_byte()];
                self.builder
                    .leaf(node_kind(node.kind(), node.is_named()), node.kind(), text);
                self.pos = node.end_byte();
            }
            return;
        }

        let transparent = is_transparent(node.kind());
        if !transparent {
            self.gap(node.start_byte());
            self.builder
                .start_node(node_kind(node.kind(), node.is_named()), node.kind());
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.node(child);
        }
        if !transparent {
            self.gap(node.end_byte());
            self.builder.finish_node();
        }
    }
}
