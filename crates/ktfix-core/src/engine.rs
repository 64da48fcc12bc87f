//! Orchestration of lint and format runs.
//!
//! A run goes through [`EngineState`]: the source is parsed once, the active
//! rules are selected and ordered, and the tree is traversed in pre-order
//! with every rule visiting each node before its children. In format mode
//! passes repeat until one leaves the tree untouched.

use crate::config::{ConfigSnapshot, PropertyDef, ScopedOverrides, UserOverrides, END_OF_LINE};
use crate::context::{Mode, PassShared, RuleContext};
use crate::directive_rule;
use crate::error::EngineError;
use crate::filter;
use crate::parser::{Code, LineSeparator, NormalizedSource, SourceParser};
use crate::registry::RuleRegistry;
use crate::rule::{RuleBox, RuleError, RuleId, RuleProvider, RuleSet, RuleSetId};
use crate::sorter;
use crate::suppression::SuppressionIndex;
use crate::tree::{NodeId, Tree};
use crate::types::{sort_violations, FormatReport, LintReport, RuleCrash, Violation};

use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default bound on format passes.
pub const DEFAULT_MAX_PASSES: usize = 10;

/// How many times one rule may revisit the same node within a pass.
pub const MAX_REVISITS: usize = 8;

/// Phase of a run, logged at debug level as the run progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing started yet.
    Idle,
    /// Walking the tree.
    Traversing {
        /// 1-based pass number.
        pass: usize,
    },
    /// Lint pass finished, violations collected.
    Collecting,
    /// Format pass changed the tree, another pass follows.
    Fixing {
        /// 1-based pass number.
        pass: usize,
    },
    /// A pass left the tree untouched.
    Converged {
        /// Passes run.
        passes: usize,
    },
    /// Passes kept changing the tree.
    MaxPassesExceeded,
    /// The deadline elapsed between passes.
    TimedOut,
    /// A fatal error stopped the run.
    Aborted,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Traversing { pass } => write!(f, "traversing (pass {pass})"),
            Self::Collecting => write!(f, "collecting"),
            Self::Fixing { pass } => write!(f, "fixing (pass {pass})"),
            Self::Converged { passes } => write!(f, "converged after {passes} pass(es)"),
            Self::MaxPassesExceeded => write!(f, "max passes exceeded"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Limits of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum number of format passes.
    pub max_passes: usize,
    /// Deadline per file, checked between passes.
    pub timeout: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            timeout: None,
        }
    }
}

/// Builder for an [`Engine`].
pub struct EngineBuilder {
    parser: Box<dyn SourceParser>,
    registry: RuleRegistry,
    overrides: UserOverrides,
    options: EngineOptions,
}

impl EngineBuilder {
    /// Adds every rule of a rule set.
    #[must_use]
    pub fn rule_set(mut self, rule_set: RuleSet) -> Self {
        self.registry.register_set(rule_set);
        self
    }

    /// Adds a single rule.
    #[must_use]
    pub fn rule(mut self, provider: RuleProvider) -> Self {
        self.registry.register(provider);
        self
    }

    /// Sets configuration values applied to every run.
    #[must_use]
    pub fn overrides(mut self, overrides: UserOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Sets a single configuration value applied to every run.
    #[must_use]
    pub fn property(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.overrides.set(key, value);
        self
    }

    /// Sets the maximum number of format passes.
    #[must_use]
    pub fn max_passes(mut self, max_passes: usize) -> Self {
        self.options.max_passes = max_passes.max(1);
        self
    }

    /// Sets a per-file deadline.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Builds the engine.
    #[must_use]
    pub fn build(self) -> Engine {
        let mut registry = RuleRegistry::new();
        registry.register(directive_rule::provider());
        for provider in self.registry.providers() {
            registry.register(provider.clone());
        }
        let properties = registry.properties();
        let rule_ids = registry.rule_ids();
        let rule_sets = registry.rule_sets();
        Engine {
            parser: self.parser,
            registry,
            properties,
            rule_ids,
            rule_sets,
            overrides: self.overrides,
            options: self.options,
        }
    }
}

/// Runs rules over source files.
///
/// An engine holds only immutable data and can be shared across threads;
/// every call to [`Engine::lint`] or [`Engine::format`] is an independent
/// run.
pub struct Engine {
    parser: Box<dyn SourceParser>,
    registry: RuleRegistry,
    properties: Vec<&'static PropertyDef>,
    rule_ids: BTreeSet<RuleId>,
    rule_sets: BTreeSet<RuleSetId>,
    overrides: UserOverrides,
    options: EngineOptions,
}

struct Run {
    source: NormalizedSource,
    tree: Tree,
    config: ConfigSnapshot,
    rules: Vec<RuleProvider>,
}

struct PassOutcome {
    violations: Vec<Violation>,
    changed_by: BTreeSet<RuleId>,
}

impl Engine {
    /// Creates a builder around a parser.
    #[must_use]
    pub fn builder(parser: impl SourceParser + 'static) -> EngineBuilder {
        EngineBuilder {
            parser: Box::new(parser),
            registry: RuleRegistry::new(),
            overrides: UserOverrides::new(),
            options: EngineOptions::default(),
        }
    }

    /// Returns the registered rules, including the directive rule.
    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Returns the run limits.
    #[must_use]
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Returns every property known to the engine.
    #[must_use]
    pub fn properties(&self) -> &[&'static PropertyDef] {
        &self.properties
    }

    /// Returns the rules that would run with `overrides`, in execution order.
    ///
    /// # Errors
    ///
    /// Fails on missing required rules and ordering conflicts.
    pub fn active_rules(&self, overrides: &UserOverrides) -> Result<Vec<RuleProvider>, EngineError> {
        let config = self.snapshot(overrides);
        sorter::sort(filter::select(&self.registry, &config)?)
    }

    /// Lints a source with the engine's configuration.
    ///
    /// # Errors
    ///
    /// See [`Engine::lint_with`].
    pub fn lint(&self, code: &Code) -> Result<LintReport, EngineError> {
        self.lint_with(code, &UserOverrides::new())
    }

    /// Lints a source; `overrides` win over the engine's configuration.
    ///
    /// # Errors
    ///
    /// Fails on parse errors, ordering conflicts, missing required rules and
    /// configuration errors raised before traversal.
    pub fn lint_with(&self, code: &Code, overrides: &UserOverrides) -> Result<LintReport, EngineError> {
        let mut run = self.prepare(code, overrides)?;
        let mut disabled = vec![false; run.rules.len()];
        let mut crashes = Vec::new();

        log_state(EngineState::Traversing { pass: 1 });
        let outcome = self
            .pass(&mut run, Mode::Lint, &mut disabled, &mut crashes)
            .map_err(abort)?;
        log_state(EngineState::Collecting);

        let (mut suppressed, mut violations): (Vec<_>, Vec<_>) = outcome
            .violations
            .into_iter()
            .partition(Violation::is_suppressed);
        sort_violations(&mut violations);
        sort_violations(&mut suppressed);

        info!(
            "Lint complete: {} violation(s), {} suppressed, {} crash(es)",
            violations.len(),
            suppressed.len(),
            crashes.len()
        );
        Ok(LintReport {
            violations,
            suppressed,
            crashes,
        })
    }

    /// Formats a source with the engine's configuration.
    ///
    /// # Errors
    ///
    /// See [`Engine::format_with`].
    pub fn format(&self, code: &Code) -> Result<FormatReport, EngineError> {
        self.format_with(code, &UserOverrides::new())
    }

    /// Formats a source; `overrides` win over the engine's configuration.
    ///
    /// # Errors
    ///
    /// Fails like [`Engine::lint_with`], and additionally when passes keep
    /// changing the tree after `max_passes` or the deadline elapses.
    pub fn format_with(&self, code: &Code, overrides: &UserOverrides) -> Result<FormatReport, EngineError> {
        let started = Instant::now();
        let mut run = self.prepare(code, overrides)?;
        let mut disabled = vec![false; run.rules.len()];
        let mut crashes = Vec::new();
        let mut corrected = Vec::new();
        let mut pass = 0;

        let last = loop {
            pass += 1;
            log_state(EngineState::Traversing { pass });
            let revision = run.tree.revision();
            let outcome = self
                .pass(&mut run, Mode::Format, &mut disabled, &mut crashes)
                .map_err(abort)?;

            if run.tree.revision() == revision {
                log_state(EngineState::Converged { passes: pass });
                break outcome;
            }
            log_state(EngineState::Fixing { pass });
            corrected.extend(outcome.violations.into_iter().filter(Violation::is_corrected));

            if pass >= self.options.max_passes {
                log_state(EngineState::MaxPassesExceeded);
                return Err(EngineError::MaxPassesExceeded {
                    passes: pass,
                    rules: outcome.changed_by.into_iter().collect(),
                });
            }
            if let Some(timeout) = self.options.timeout {
                let elapsed = started.elapsed();
                if elapsed > timeout {
                    log_state(EngineState::TimedOut);
                    return Err(EngineError::Timeout {
                        passes: pass,
                        elapsed,
                    });
                }
            }
        };

        let (mut suppressed, remaining): (Vec<_>, Vec<_>) = last
            .violations
            .into_iter()
            .partition(Violation::is_suppressed);
        let mut violations = corrected;
        violations.extend(remaining);
        sort_violations(&mut violations);
        sort_violations(&mut suppressed);

        let separator = match run.config.resolve(END_OF_LINE.name).ok().as_ref().and_then(|v| v.as_str()) {
            Some("lf") => LineSeparator::Lf,
            Some("crlf") => LineSeparator::Crlf,
            _ => run.source.separator,
        };
        let output = run.source.restore(run.tree.text(), separator);
        let changed = output != code.content();

        info!(
            "Format complete after {pass} pass(es): {} violation(s), changed: {changed}",
            violations.len()
        );
        Ok(FormatReport {
            output,
            changed,
            passes: pass,
            violations,
            suppressed,
            crashes,
        })
    }

    fn snapshot(&self, overrides: &UserOverrides) -> ConfigSnapshot {
        let mut merged = self.overrides.clone();
        merged.merge(overrides);
        ConfigSnapshot::new(self.properties.iter().copied(), merged)
    }

    fn prepare(&self, code: &Code, overrides: &UserOverrides) -> Result<Run, EngineError> {
        log_state(EngineState::Idle);
        if let Some(path) = code.path() {
            debug!("Preparing run for {}", path.display());
        }
        let config = self.snapshot(overrides);
        let rules = sorter::sort(filter::select(&self.registry, &config)?)?;
        let source = NormalizedSource::new(code.content());
        let tree = self.parser.parse(&source.text)?;
        debug!("{} active rule(s)", rules.len());
        Ok(Run {
            source,
            tree,
            config,
            rules,
        })
    }

    /// Runs one traversal pass with fresh rule instances.
    fn pass(
        &self,
        run: &mut Run,
        mode: Mode,
        disabled: &mut [bool],
        crashes: &mut Vec<RuleCrash>,
    ) -> Result<PassOutcome, EngineError> {
        let shared = PassShared {
            mode,
            config: &run.config,
            scoped: ScopedOverrides::build(&run.tree, &run.config),
            suppressions: SuppressionIndex::build(&run.tree, &run.config, &self.rule_sets),
            registered: &self.rule_ids,
            rule_sets: &self.rule_sets,
        };
        let mut state = PassState {
            tree: &mut run.tree,
            shared: &shared,
            rules: &run.rules,
            instances: run
                .rules
                .iter()
                .zip(disabled.iter())
                .map(|(p, &off)| (!off).then(|| p.create()))
                .collect(),
            violations: Vec::new(),
            changed_by: BTreeSet::new(),
            crashes,
        };

        for index in 0..state.instances.len() {
            state.call(index, None, Hook::Before)?;
        }
        state.walk();
        for index in 0..state.instances.len() {
            state.call(index, None, Hook::After)?;
        }

        for (flag, instance) in disabled.iter_mut().zip(&state.instances) {
            *flag = instance.is_none();
        }
        Ok(PassOutcome {
            violations: state.violations,
            changed_by: state.changed_by,
        })
    }
}

fn log_state(state: EngineState) {
    debug!("Engine state: {state}");
}

fn abort(error: EngineError) -> EngineError {
    log_state(EngineState::Aborted);
    error
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    Before,
    Visit,
    After,
}

struct PassState<'p, 'r> {
    tree: &'p mut Tree,
    shared: &'p PassShared<'r>,
    rules: &'p [RuleProvider],
    instances: Vec<Option<RuleBox>>,
    violations: Vec<Violation>,
    changed_by: BTreeSet<RuleId>,
    crashes: &'p mut Vec<RuleCrash>,
}

impl PassState<'_, '_> {
    /// Invokes one hook of one rule. Returns whether the rule asked to
    /// revisit the node.
    fn call(&mut self, index: usize, node: Option<NodeId>, hook: Hook) -> Result<bool, EngineError> {
        let Some(rule) = self.instances[index].as_mut() else {
            return Ok(false);
        };
        let descriptor = self.rules[index].descriptor();
        let revision = self.tree.revision();
        let mut ctx = RuleContext::new(self.tree, self.shared, descriptor, &mut self.violations);
        let result = match (hook, node) {
            (Hook::Before, _) => rule.before_first_node(&mut ctx),
            (Hook::Visit, Some(node)) => rule.visit(node, &mut ctx),
            (Hook::Visit, None) => Ok(()),
            (Hook::After, _) => rule.after_last_node(&mut ctx),
        };
        let revisit = ctx.finish();
        if self.tree.revision() != revision {
            self.changed_by.insert(descriptor.id.clone());
        }

        match result {
            Ok(()) => Ok(revisit),
            Err(RuleError::Config(error)) if hook == Hook::Before => Err(EngineError::Config(error)),
            Err(error) => {
                let position = node
                    .filter(|&n| self.tree.is_attached(n))
                    .map(|n| self.tree.position(self.tree.offset(n)));
                let crash = RuleCrash {
                    rule: descriptor.id.clone(),
                    line: position.map_or(0, |p| p.line),
                    column: position.map_or(0, |p| p.column),
                    message: error.to_string(),
                };
                warn!("{crash}");
                self.crashes.push(crash);
                self.instances[index] = None;
                Ok(false)
            }
        }
    }

    /// Visits `node` with every active rule, in rule order.
    fn visit(&mut self, node: NodeId) {
        for index in 0..self.instances.len() {
            let mut visits = 0;
            loop {
                if !self.tree.is_attached(node) {
                    return;
                }
                // Visit errors never abort the run.
                let revisit = self.call(index, Some(node), Hook::Visit).unwrap_or(false);
                if !revisit || visits >= MAX_REVISITS {
                    break;
                }
                visits += 1;
            }
        }
    }

    /// Pre-order walk that tolerates edits of the node being visited.
    ///
    /// The cursor is a stack of `(parent, index)` slots. A node removed or
    /// replaced during its visit leaves the slot to whatever now occupies
    /// it, which is visited next.
    fn walk(&mut self) {
        let root = self.tree.root();
        self.visit(root);
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];

        while let Some(&(parent, index)) = stack.last() {
            if !self.tree.is_attached(parent) {
                stack.pop();
                continue;
            }
            let Some(&node) = self.tree.children(parent).get(index) else {
                stack.pop();
                if let Some(top) = stack.last_mut() {
                    if self.tree.parent(parent) == Some(top.0) {
                        if let Some(position) = self.tree.index_in_parent(parent) {
                            top.1 = position + 1;
                        }
                    }
                }
                continue;
            };

            self.visit(node);

            if self.tree.is_attached(node) && self.tree.parent(node) == Some(parent) {
                let position = self.tree.index_in_parent(node).unwrap_or(index);
                if let Some(top) = stack.last_mut() {
                    top.1 = position;
                }
                if self.tree.children(node).is_empty() {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                } else {
                    stack.push((node, 0));
                }
            }
        }
    }
}
