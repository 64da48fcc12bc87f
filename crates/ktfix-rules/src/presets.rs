//! Rule presets for common configurations.

use crate::{
    annotation, backing_property_naming, final_newline, max_line_length, no_consecutive_blank_lines,
    no_empty_block_whitespace, no_trailing_spaces,
};
use ktfix_core::{RuleProvider, RuleSet, RuleSetId};

/// Preset selections of the standard rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Whitespace and layout rules that fix what they report.
    Recommended,
    /// Every standard rule.
    #[default]
    All,
}

impl Preset {
    /// Returns the providers of this preset.
    #[must_use]
    pub fn providers(self) -> Vec<RuleProvider> {
        match self {
            Self::Recommended => recommended_rules(),
            Self::All => all_rules(),
        }
    }

    /// Returns the preset as a rule set named `standard`.
    #[must_use]
    pub fn rule_set(self) -> RuleSet {
        self.providers()
            .into_iter()
            .fold(RuleSet::new(RuleSetId::standard()), RuleSet::with_provider)
    }
}

/// Returns the recommended rules.
///
/// Includes:
/// - `annotation`
/// - `final-newline`
/// - `no-consecutive-blank-lines`
/// - `no-empty-block-whitespace`
/// - `no-trailing-spaces`
#[must_use]
pub fn recommended_rules() -> Vec<RuleProvider> {
    vec![
        annotation::provider(),
        final_newline::provider(),
        no_consecutive_blank_lines::provider(),
        no_empty_block_whitespace::provider(),
        no_trailing_spaces::provider(),
    ]
}

/// Returns all standard rules.
#[must_use]
pub fn all_rules() -> Vec<RuleProvider> {
    let mut rules = recommended_rules();
    rules.push(backing_property_naming::provider());
    rules.push(max_line_length::provider());
    rules
}

/// Returns the `standard` rule set with every rule.
#[must_use]
pub fn standard_rule_set() -> RuleSet {
    Preset::All.rule_set()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(preset: Preset) -> String {
        let mut ids: Vec<String> = preset
            .providers()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        ids.sort();
        ids.join("\n")
    }

    #[test]
    fn all_rules_are_standard() {
        insta::assert_snapshot!(ids(Preset::All), @r"
        standard:annotation
        standard:backing-property-naming
        standard:final-newline
        standard:max-line-length
        standard:no-consecutive-blank-lines
        standard:no-empty-block-whitespace
        standard:no-trailing-spaces
        ");
    }

    #[test]
    fn recommended_is_a_subset() {
        let all = ids(Preset::All);
        for id in ids(Preset::Recommended).lines() {
            assert!(all.contains(id), "{id}");
        }
        assert_eq!(standard_rule_set().providers().len(), all_rules().len());
    }
}
