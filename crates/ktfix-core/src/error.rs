//! Fatal errors of an engine run.

use crate::config::ConfigError;
use crate::parser::ParseError;
use crate::rule::RuleId;
use miette::Diagnostic;
use std::time::Duration;
use thiserror::Error;

fn join(ids: &[RuleId], separator: &str) -> String {
    ids.iter()
        .map(RuleId::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Errors that abort a whole run. No partial output is produced.
#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    /// The source could not be parsed.
    #[error("parse error at {0}")]
    #[diagnostic(code(ktfix::parse))]
    Parse(#[from] ParseError),

    /// Ordering constraints form a cycle.
    #[error("cyclic rule dependency: {}", cycle_path(.cycle))]
    #[diagnostic(
        code(ktfix::cyclic_dependency),
        help("remove one of the run_after / run_before constraints in the cycle")
    )]
    CyclicRuleDependency {
        /// Rules of the cycle in execution order.
        cycle: Vec<RuleId>,
    },

    /// A rule declares an ordering constraint on itself.
    #[error("rule '{rule}' cannot run before or after itself")]
    #[diagnostic(code(ktfix::self_reference))]
    SelfReference {
        /// Offending rule.
        rule: RuleId,
    },

    /// A required rule is not registered.
    #[error("rule '{rule}' requires rule '{required}' which is not loaded")]
    #[diagnostic(
        code(ktfix::missing_required_rule),
        help("register the rule set that provides '{required}'")
    )]
    MissingRequiredRule {
        /// Rule declaring the requirement.
        rule: RuleId,
        /// Required rule.
        required: RuleId,
    },

    /// Invalid configuration.
    #[error(transparent)]
    #[diagnostic(code(ktfix::config))]
    Config(#[from] ConfigError),

    /// Formatting did not reach a fixed point.
    #[error(
        "formatting did not converge after {passes} passes, still changed by: {}",
        join(.rules, ", ")
    )]
    #[diagnostic(
        code(ktfix::max_passes_exceeded),
        help("two rules are likely rewriting the same text; raise --max-passes only if the rules are known to converge")
    )]
    MaxPassesExceeded {
        /// Number of passes run.
        passes: usize,
        /// Rules that changed the tree in the last pass.
        rules: Vec<RuleId>,
    },

    /// The run exceeded its deadline.
    #[error("timed out after {passes} pass(es) ({elapsed:?})")]
    #[diagnostic(code(ktfix::timeout))]
    Timeout {
        /// Passes completed.
        passes: usize,
        /// Time spent.
        elapsed: Duration,
    },
}

fn cycle_path(cycle: &[RuleId]) -> String {
    let mut path = join(cycle, " -> ");
    if let Some(first) = cycle.first() {
        path.push_str(" -> ");
        path.push_str(first.as_str());
    }
    path
}
