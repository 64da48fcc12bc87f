//! Derived text, spans and line index of a tree.

use super::{NodeId, Tree};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// 1-indexed line and column; the column counts characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone)]
pub(super) struct Layout {
    pub(super) text: String,
    spans: Vec<Option<Range<usize>>>,
    line_starts: Vec<usize>,
}

impl Layout {
    pub(super) fn compute(tree: &Tree) -> Self {
        let mut text = String::new();
        let mut spans: Vec<Option<Range<usize>>> = vec![None; tree.nodes.len()];
        let mut stack = vec![(tree.root, false)];

        while let Some((id, exiting)) = stack.pop() {
            if exiting {
                if let Some(span) = &mut spans[id.0] {
                    span.end = text.len();
                }
                continue;
            }
            let data = &tree.nodes[id.0];
            let start = text.len();
            if let Some(leaf) = &data.text {
                text.push_str(leaf);
                spans[id.0] = Some(start..text.len());
                continue;
            }
            spans[id.0] = Some(start..start);
            stack.push((id, true));
            stack.extend(data.children.iter().rev().map(|&c| (c, false)));
        }

        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            text,
            spans,
            line_starts,
        }
    }

    pub(super) fn span(&self, id: NodeId) -> Option<Range<usize>> {
        self.spans.get(id.0).cloned().flatten()
    }

    pub(super) fn position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let start = self.line_starts[line - 1];
        Position {
            line,
            column: self.text[start..offset].chars().count() + 1,
        }
    }

    pub(super) fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub(super) fn line_span(&self, line: usize) -> Range<usize> {
        let len = self.text.len();
        let Some(&start) = self.line_starts.get(line.saturating_sub(1)) else {
            return len..len;
        };
        let end = self
            .line_starts
            .get(line)
            .map_or(len, |&next| next - 1);
        start..end
    }
}
