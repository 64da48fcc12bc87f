//! Parsing of suppression directives.
//!
//! Marker comments:
//!
//! ```text
//! /* ktfix-disable standard:max-line-length */
//! /* ktfix-enable standard:max-line-length */
//! val x = 1 // ktfix-disable no-trailing-spaces
//! ```
//!
//! Annotation arguments:
//!
//! ```text
//! @Suppress("ktfix")                       all rules
//! @Suppress("ktfix:standard")              all rules of a rule set
//! @Suppress("ktfix:standard:annotation")   a single rule
//! @Suppress("PropertyName")                well-known compiler warning names
//! ```

use crate::rule::{RuleId, RuleSetId, STANDARD_RULE_SET};
use crate::tree::{NodeId, NodeKind, Tree};
use std::collections::BTreeSet;

/// Prefix of suppression identifiers in annotations.
pub const SUPPRESSION_PREFIX: &str = "ktfix";

/// Marker disabling rules.
pub const DISABLE_MARKER: &str = "ktfix-disable";

/// Marker re-enabling rules.
pub const ENABLE_MARKER: &str = "ktfix-enable";

const SUPPRESS_ANNOTATIONS: &[&str] = &["Suppress", "SuppressWarnings"];

/// Compiler warning names that map onto standard rules.
const ANNOTATION_ALIASES: &[(&str, &str)] = &[
    ("ClassName", "class-naming"),
    ("EnumEntryName", "enum-entry-name-case"),
    ("FunctionName", "function-naming"),
    ("PackageName", "package-name"),
    ("PropertyName", "property-naming"),
    ("RemoveCurlyBracesFromTemplate", "string-template"),
];

/// What a directive suppresses.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SuppressTarget {
    /// Every suppressible rule.
    All,
    /// Every rule of a rule set.
    RuleSet(RuleSetId),
    /// One rule.
    Rule(RuleId),
}

impl SuppressTarget {
    /// Returns true if the target covers `rule`.
    #[must_use]
    pub fn covers(&self, rule: &RuleId) -> bool {
        match self {
            Self::All => true,
            Self::RuleSet(set) => set.as_str() == rule.rule_set(),
            Self::Rule(id) => id == rule,
        }
    }
}

/// Whether a marker opens or closes a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// `ktfix-disable`
    Disable,
    /// `ktfix-enable`
    Enable,
}

/// A rule identifier written in a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveId {
    /// Text as written.
    pub raw: String,
    /// Byte offset of `raw` relative to the start of the directive node.
    pub offset: usize,
    /// Normalized id, `None` if malformed.
    pub id: Option<RuleId>,
}

impl DirectiveId {
    /// Returns true if the id was written without its rule set.
    #[must_use]
    pub fn is_unqualified(&self) -> bool {
        !self.raw.contains(':')
    }
}

/// A parsed `ktfix-disable` / `ktfix-enable` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Disable or enable.
    pub kind: MarkerKind,
    /// Listed ids; empty means all rules.
    pub ids: Vec<DirectiveId>,
}

impl Marker {
    /// Returns the suppression targets of this marker.
    #[must_use]
    pub fn targets(&self) -> BTreeSet<SuppressTarget> {
        if self.ids.is_empty() {
            return BTreeSet::from([SuppressTarget::All]);
        }
        self.ids
            .iter()
            .filter_map(|d| d.id.clone())
            .map(SuppressTarget::Rule)
            .collect()
    }
}

/// Splits text into words with their byte offsets.
pub(crate) fn words(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push((s, &text[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((s, &text[s..]));
    }
    out
}

/// Parses a marker comment. Returns `None` for ordinary comments.
#[must_use]
pub fn parse_marker(comment: &str) -> Option<Marker> {
    let body = if let Some(rest) = comment.strip_prefix("/*") {
        rest.strip_suffix("*/").unwrap_or(rest)
    } else {
        comment.strip_prefix("//")?
    };
    let words = words(body);
    let (_, first) = words.first()?;
    let kind = match *first {
        DISABLE_MARKER => MarkerKind::Disable,
        ENABLE_MARKER => MarkerKind::Enable,
        _ => return None,
    };
    let ids = words[1..]
        .iter()
        .map(|&(offset, raw)| DirectiveId {
            raw: raw.to_string(),
            offset: offset + 2,
            id: RuleId::normalize(raw).ok(),
        })
        .collect();
    Some(Marker { kind, ids })
}

/// A string argument of a suppression annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressArgument {
    /// String content without quotes.
    pub value: String,
    /// Absolute offset of the content in the tree text.
    pub offset: usize,
}

/// Returns the name of an annotation without `@`, use-site target and
/// package qualifier.
#[must_use]
pub fn annotation_name(text: &str) -> &str {
    let text = text.trim_start_matches('@');
    let text = text.strip_prefix("file:").unwrap_or(text);
    let end = text
        .find(|c: char| c == '(' || c.is_whitespace())
        .unwrap_or(text.len());
    let qualified = &text[..end];
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Returns the string arguments of a `@Suppress` / `@SuppressWarnings`
/// annotation, or `None` for any other node.
#[must_use]
pub fn suppress_arguments(tree: &Tree, annotation: NodeId) -> Option<Vec<SuppressArgument>> {
    if !matches!(
        tree.kind(annotation),
        NodeKind::Annotation | NodeKind::FileAnnotation
    ) {
        return None;
    }
    let name = annotation_name(tree.node_text(annotation));
    if !SUPPRESS_ANNOTATIONS.contains(&name) {
        return None;
    }
    let arguments = tree
        .descendants(annotation)
        .filter(|&n| tree.kind(n) == NodeKind::StringLiteral)
        .filter_map(|n| {
            let text = tree.node_text(n);
            let value = text.strip_prefix('"')?.strip_suffix('"')?;
            Some(SuppressArgument {
                value: value.to_string(),
                offset: tree.offset(n) + 1,
            })
        })
        .collect();
    Some(arguments)
}

/// Classifies an annotation argument.
///
/// `ktfix:<x>` names a rule set when `x` is a loaded rule set id, and an
/// unqualified rule of the `standard` set otherwise.
#[must_use]
pub fn classify_argument(value: &str, rule_sets: &BTreeSet<RuleSetId>) -> Option<SuppressTarget> {
    if value == SUPPRESSION_PREFIX {
        return Some(SuppressTarget::All);
    }
    if let Some(rest) = value
        .strip_prefix(SUPPRESSION_PREFIX)
        .and_then(|r| r.strip_prefix(':'))
    {
        if rest.contains(':') {
            return RuleId::parse(rest).ok().map(SuppressTarget::Rule);
        }
        if rule_sets.iter().any(|s| s.as_str() == rest) {
            return RuleSetId::parse(rest).ok().map(SuppressTarget::RuleSet);
        }
        return RuleId::new(STANDARD_RULE_SET, rest)
            .ok()
            .map(SuppressTarget::Rule);
    }
    ANNOTATION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == value)
        .and_then(|(_, rule)| RuleId::new(STANDARD_RULE_SET, rule).ok())
        .map(SuppressTarget::Rule)
}
