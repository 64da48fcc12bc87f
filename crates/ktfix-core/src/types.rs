//! Violations and run reports.

use crate::rule::RuleId;
use crate::tree::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationStatus {
    /// Reported and left in place.
    Reported,
    /// Fixed while formatting.
    Corrected,
    /// Covered by a suppression directive.
    Suppressed,
}

impl fmt::Display for ViolationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reported => write!(f, "reported"),
            Self::Corrected => write!(f, "corrected"),
            Self::Suppressed => write!(f, "suppressed"),
        }
    }
}

/// A single finding of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule that reported the violation.
    pub rule: RuleId,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number in characters (1-indexed).
    pub column: usize,
    /// Byte offset in the text the rule saw.
    pub offset: usize,
    /// Human-readable message.
    pub message: String,
    /// Whether the rule can fix the violation.
    pub autocorrectable: bool,
    /// Outcome of the violation.
    pub status: ViolationStatus,
}

impl Violation {
    /// Creates a reported violation.
    #[must_use]
    pub fn new(
        rule: RuleId,
        position: Position,
        offset: usize,
        message: impl Into<String>,
        autocorrectable: bool,
    ) -> Self {
        Self {
            rule,
            line: position.line,
            column: position.column,
            offset,
            message: message.into(),
            autocorrectable,
            status: ViolationStatus::Reported,
        }
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: ViolationStatus) -> Self {
        self.status = status;
        self
    }

    /// Returns true if the violation was fixed.
    #[must_use]
    pub fn is_corrected(&self) -> bool {
        self.status == ViolationStatus::Corrected
    }

    /// Returns true if a directive suppressed the violation.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.status == ViolationStatus::Suppressed
    }

    fn sort_key(&self) -> (usize, usize, &RuleId) {
        (self.line, self.column, &self.rule)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} ({})",
            self.line, self.column, self.message, self.rule
        )?;
        if self.status != ViolationStatus::Reported {
            write!(f, " [{}]", self.status)?;
        }
        Ok(())
    }
}

/// A rule that failed while running. Distinct from a lint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCrash {
    /// Rule that failed.
    pub rule: RuleId,
    /// Line of the node being visited, 0 when not attributable.
    pub line: usize,
    /// Column of the node being visited, 0 when not attributable.
    pub column: usize,
    /// Failure message.
    pub message: String,
}

impl fmt::Display for RuleCrash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: rule '{}' crashed: {}",
            self.line, self.column, self.rule, self.message
        )
    }
}

pub(crate) fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// Result of linting one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    /// Violations left after suppression, ordered by line, column and rule.
    pub violations: Vec<Violation>,
    /// Violations discarded by suppression directives.
    pub suppressed: Vec<Violation>,
    /// Rules that failed.
    pub crashes: Vec<RuleCrash>,
}

impl LintReport {
    /// Returns the number of violations before suppression.
    #[must_use]
    pub fn raw_count(&self) -> usize {
        self.violations.len() + self.suppressed.len()
    }

    /// Returns the number of violations after suppression.
    #[must_use]
    pub fn count(&self) -> usize {
        self.violations.len()
    }

    /// Returns true when nothing was reported and no rule failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.crashes.is_empty()
    }
}

/// Result of formatting one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatReport {
    /// Formatted text.
    pub output: String,
    /// Whether the output differs from the input.
    pub changed: bool,
    /// Number of traversal passes run.
    pub passes: usize,
    /// Corrected violations of every pass followed by those remaining after
    /// the last one, ordered by line, column and rule.
    pub violations: Vec<Violation>,
    /// Violations discarded by suppression directives in the last pass.
    pub suppressed: Vec<Violation>,
    /// Rules that failed.
    pub crashes: Vec<RuleCrash>,
}

impl FormatReport {
    /// Returns the corrected violations.
    pub fn corrected(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_corrected())
    }

    /// Returns the violations that could not be fixed.
    pub fn remaining(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_corrected())
    }

    /// Returns the number of violations before suppression.
    #[must_use]
    pub fn raw_count(&self) -> usize {
        self.violations.len() + self.suppressed.len()
    }

    /// Returns the number of violations after suppression.
    #[must_use]
    pub fn count(&self) -> usize {
        self.violations.len()
    }

    /// Returns true when no violation remains and no rule failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.remaining().next().is_none() && self.crashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(line: usize, column: usize, rule: &'static str) -> Violation {
        Violation::new(
            RuleId::standard(rule),
            Position { line, column },
            0,
            "message",
            true,
        )
    }

    #[test]
    fn violations_sort_by_line_column_rule() {
        let mut violations = vec![
            violation(2, 1, "a"),
            violation(1, 5, "b"),
            violation(1, 5, "a"),
            violation(1, 2, "z"),
        ];
        sort_violations(&mut violations);
        let keys: Vec<_> = violations
            .iter()
            .map(|v| format!("{}:{}:{}", v.line, v.column, v.rule.rule()))
            .collect();
        assert_eq!(keys, ["1:2:z", "1:5:a", "1:5:b", "2:1:a"]);
    }

    #[test]
    fn display_marks_non_reported_status() {
        let v = violation(3, 4, "foo");
        assert_eq!(v.to_string(), "3:4: message (standard:foo)");
        let v = v.with_status(ViolationStatus::Corrected);
        assert_eq!(v.to_string(), "3:4: message (standard:foo) [corrected]");
    }

    #[test]
    fn lint_report_counts() {
        let report = LintReport {
            violations: vec![violation(1, 1, "a")],
            suppressed: vec![violation(2, 1, "a").with_status(ViolationStatus::Suppressed)],
            crashes: Vec::new(),
        };
        assert_eq!(report.raw_count(), 2);
        assert_eq!(report.count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn format_report_is_clean_when_everything_was_corrected() {
        let report = FormatReport {
            violations: vec![violation(1, 1, "a").with_status(ViolationStatus::Corrected)],
            ..FormatReport::default()
        };
        assert!(report.is_clean());
        assert_eq!(report.corrected().count(), 1);
    }

    #[test]
    fn violation_serializes_rule_as_string() {
        let json = serde_json::to_value(violation(1, 2, "foo")).expect("serializable");
        assert_eq!(json["rule"], "standard:foo");
        assert_eq!(json["status"], "reported");
    }
}
