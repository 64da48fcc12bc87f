//! Section overrides from `ktfix-property` comments.
//!
//! ```text
//! // ktfix-property code_style=android_studio
//! ```
//!
//! The override applies from the comment to the end of the node containing
//! the comment. Only properties declared scopable are honored.

use super::{ConfigSnapshot, PropertyValue};
use crate::tree::{NodeId, Tree};
use tracing::warn;

const DIRECTIVE: &str = "ktfix-property";

#[derive(Debug, Clone)]
struct Entry {
    comment: NodeId,
    scope: NodeId,
    name: &'static str,
    value: PropertyValue,
}

/// Section overrides found in one version of the tree.
#[derive(Debug, Clone, Default)]
pub struct ScopedOverrides {
    entries: Vec<Entry>,
}

impl ScopedOverrides {
    /// Scans the comments of a tree for `ktfix-property` directives.
    #[must_use]
    pub fn build(tree: &Tree, config: &ConfigSnapshot) -> Self {
        let mut entries = Vec::new();

        for node in tree.descendants(tree.root()) {
            if !tree.kind(node).is_comment() {
                continue;
            }
            let Some(assignments) = parse(tree.node_text(node)) else {
                continue;
            };
            let scope = tree.parent(node).unwrap_or_else(|| tree.root());
            for (key, raw) in assignments {
                let Ok(def) = config.property(&key) else {
                    warn!("Ignoring {DIRECTIVE} for unknown property '{key}'");
                    continue;
                };
                if !def.scopable {
                    warn!("Property '{key}' cannot be overridden for a section");
                    continue;
                }
                match def.parse(&raw) {
                    Ok(value) => entries.push(Entry {
                        comment: node,
                        scope,
                        name: def.name,
                        value,
                    }),
                    Err(message) => warn!("Ignoring {DIRECTIVE} {key}: {message}"),
                }
            }
        }

        Self { entries }
    }

    /// Returns the innermost override of `name` covering `offset`.
    #[must_use]
    pub fn lookup(&self, tree: &Tree, name: &str, offset: usize) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.name == name && tree.is_attached(e.comment))
            .find(|e| tree.offset(e.comment) <= offset && offset < tree.end_offset(e.scope))
            .map(|e| &e.value)
    }

    /// Returns the number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no overrides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse(comment: &str) -> Option<Vec<(String, String)>> {
    let body = comment
        .strip_prefix("//")
        .or_else(|| comment.strip_prefix("/*").map(|c| c.trim_end_matches("*/")))?;
    let rest = body.trim().strip_prefix(DIRECTIVE)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(
        rest.split_whitespace()
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_properties, UserOverrides};
    use crate::tree::{NodeKind, TreeBuilder};

    fn config() -> ConfigSnapshot {
        ConfigSnapshot::new(builtin_properties(), UserOverrides::new())
    }

    #[test]
    fn parses_assignments() {
        assert_eq!(
            parse("// ktfix-property code_style=intellij_idea"),
            Some(vec![("code_style".to_string(), "intellij_idea".to_string())])
        );
        assert_eq!(parse("// ktfix-propertyx a=b"), None);
        assert_eq!(parse("// unrelated"), None);
    }

    #[test]
    fn override_covers_rest_of_enclosing_node() {
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        b.token(NodeKind::Keyword, "val")
            .ws("\n")
            .start_node(NodeKind::ClassBody, "class_body")
            .token(NodeKind::Punctuation, "{")
            .leaf(
                NodeKind::LineComment,
                "line_comment",
                "// ktfix-property code_style=android_studio",
            )
            .ws("\n")
            .token(NodeKind::Punctuation, "}")
            .finish_node()
            .ws("\n");
        let tree = b.finish();
        let scoped = ScopedOverrides::build(&tree, &config());
        assert_eq!(scoped.len(), 1);

        let comment_start = tree.text().find("//").expect("comment");
        let closing = tree.text().rfind('}').expect("brace");
        assert!(scoped.lookup(&tree, "code_style", comment_start - 1).is_none());
        assert_eq!(
            scoped.lookup(&tree, "code_style", closing),
            Some(&PropertyValue::Text("android_studio".to_string()))
        );
        assert!(scoped.lookup(&tree, "code_style", closing + 1).is_none());
    }

    #[test]
    fn non_scopable_properties_are_ignored() {
        let mut b = TreeBuilder::new(NodeKind::File, "source_file");
        b.leaf(
            NodeKind::LineComment,
            "line_comment",
            "// ktfix-property max_line_length=10",
        );
        let tree = b.finish();
        assert!(ScopedOverrides::build(&tree, &config()).is_empty());
    }
}
