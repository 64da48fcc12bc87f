//! Rule identifiers, descriptors and the rule plug-in contract.

use crate::config::{ConfigError, PropertyDef};
use crate::context::RuleContext;
use crate::tree::{NodeId, TreeError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Id of the rule set shipped with ktfix. Unqualified rule ids belong to it.
pub const STANDARD_RULE_SET: &str = "standard";

/// Error for malformed rule or rule set ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid rule id '{0}', expected '<rule-set>:<rule>' in lowercase letters, digits and dashes")]
pub struct RuleIdError(pub String);

pub(crate) fn is_valid_part(part: &str) -> bool {
    let mut chars = part.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Identifier of a rule set, e.g. `standard`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSetId(String);

impl RuleSetId {
    /// Parses a rule set id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is not lowercase kebab-case.
    pub fn parse(value: &str) -> Result<Self, RuleIdError> {
        if is_valid_part(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(RuleIdError(value.to_string()))
        }
    }

    /// The `standard` rule set.
    #[must_use]
    pub fn standard() -> Self {
        Self(STANDARD_RULE_SET.to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Qualified rule identifier `<rule-set>:<rule>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuleId {
    value: String,
    split: usize,
}

impl RuleId {
    /// Builds an id from its two parts.
    ///
    /// # Errors
    ///
    /// Returns an error if either part is not lowercase kebab-case.
    pub fn new(rule_set: &str, rule: &str) -> Result<Self, RuleIdError> {
        Self::parse(&format!("{rule_set}:{rule}"))
    }

    /// Parses a qualified id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unqualified or malformed.
    pub fn parse(value: &str) -> Result<Self, RuleIdError> {
        let (rule_set, rule) = value
            .split_once(':')
            .ok_or_else(|| RuleIdError(value.to_string()))?;
        if !is_valid_part(rule_set) || !is_valid_part(rule) {
            return Err(RuleIdError(value.to_string()));
        }
        Ok(Self {
            value: value.to_string(),
            split: rule_set.len(),
        })
    }

    /// Parses an id, qualifying it with the `standard` rule set when the
    /// rule set is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is malformed.
    pub fn normalize(value: &str) -> Result<Self, RuleIdError> {
        if value.contains(':') {
            Self::parse(value)
        } else {
            Self::new(STANDARD_RULE_SET, value)
        }
    }

    /// Builds an id of the `standard` rule set from a trusted literal.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `rule` is not valid kebab-case.
    #[must_use]
    pub fn standard(rule: &'static str) -> Self {
        debug_assert!(is_valid_part(rule), "invalid rule id: {rule}");
        Self {
            value: format!("{STANDARD_RULE_SET}:{rule}"),
            split: STANDARD_RULE_SET.len(),
        }
    }

    /// Returns the rule set part.
    #[must_use]
    pub fn rule_set(&self) -> &str {
        &self.value[..self.split]
    }

    /// Returns the rule part.
    #[must_use]
    pub fn rule(&self) -> &str {
        &self.value[self.split + 1..]
    }

    /// Returns the rule set as a [`RuleSetId`].
    #[must_use]
    pub fn rule_set_id(&self) -> RuleSetId {
        RuleSetId(self.rule_set().to_string())
    }

    /// Returns the qualified id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for RuleId {
    type Err = RuleIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RuleId {
    type Error = RuleIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RuleId> for String {
    fn from(id: RuleId) -> Self {
        id.value
    }
}

/// How strictly a `run_after` constraint binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunAfterMode {
    /// The other rule must be active. It is pulled in when registered.
    Required,
    /// Only orders the two rules when the other one happens to be active.
    IfLoaded,
}

/// A `run_after` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAfter {
    /// Rule that must run first.
    pub rule: RuleId,
    /// Whether the other rule is required.
    pub mode: RunAfterMode,
}

/// Default enablement of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enablement {
    /// Runs unless disabled by configuration.
    Enabled,
    /// Runs only when enabled by configuration.
    Disabled,
    /// Runs only when experimental rules are enabled.
    Experimental,
}

/// Static description of a rule: identity, ordering and configuration.
#[derive(Debug, Clone)]
pub struct RuleDescriptor {
    /// Qualified id.
    pub id: RuleId,
    /// One-line description for `list-rules`.
    pub description: &'static str,
    /// Rules that must run before this one.
    pub run_after: Vec<RunAfter>,
    /// Rules that must run after this one.
    pub run_before: Vec<RuleId>,
    /// Default enablement.
    pub enablement: Enablement,
    /// Scheduled after every rule without this flag when unconstrained.
    pub run_as_late_as_possible: bool,
    /// Whether suppression directives apply to this rule.
    pub suppressible: bool,
    /// Configuration properties the rule reads.
    pub properties: Vec<&'static PropertyDef>,
}

impl RuleDescriptor {
    /// Creates an enabled, suppressible descriptor without constraints.
    #[must_use]
    pub fn new(id: RuleId) -> Self {
        Self {
            id,
            description: "",
            run_after: Vec::new(),
            run_before: Vec::new(),
            enablement: Enablement::Enabled,
            run_as_late_as_possible: false,
            suppressible: true,
            properties: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Requires `rule` to run before this one.
    #[must_use]
    pub fn with_run_after(mut self, rule: RuleId, mode: RunAfterMode) -> Self {
        self.run_after.push(RunAfter { rule, mode });
        self
    }

    /// Requires `rule` to run after this one.
    #[must_use]
    pub fn with_run_before(mut self, rule: RuleId) -> Self {
        self.run_before.push(rule);
        self
    }

    /// Sets the default enablement.
    #[must_use]
    pub fn with_enablement(mut self, enablement: Enablement) -> Self {
        self.enablement = enablement;
        self
    }

    /// Schedules the rule as late as the constraints allow.
    #[must_use]
    pub fn run_last(mut self) -> Self {
        self.run_as_late_as_possible = true;
        self
    }

    /// Exempts the rule from suppression directives.
    #[must_use]
    pub fn unsuppressible(mut self) -> Self {
        self.suppressible = false;
        self
    }

    /// Declares a configuration property the rule reads.
    #[must_use]
    pub fn with_property(mut self, property: &'static PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Returns true if the rule declared the property.
    #[must_use]
    pub fn uses_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }
}

/// Failure raised from a rule hook.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Invalid tree operation.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Configuration lookup failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

impl RuleError {
    /// Creates a generic failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A rule pass over the tree.
///
/// A fresh instance is created for every traversal pass, so state kept in
/// `self` lives for exactly one pass over one file.
///
/// # Example
///
/// ```
/// use ktfix_core::{NodeId, NodeKind, Rule, RuleContext, RuleError};
///
/// struct NoTabs;
///
/// impl Rule for NoTabs {
///     fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
///         if ctx.tree().kind(node) != NodeKind::Whitespace {
///             return Ok(());
///         }
///         let text = ctx.tree().leaf_text(node).unwrap_or_default().to_string();
///         if text.contains('\t') {
///             let offset = ctx.tree().offset(node);
///             if let Some(tree) = ctx.emit(offset, "Unexpected tab character(s)", true) {
///                 tree.set_text(node, text.replace('\t', "    "))?;
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Rule {
    /// Called once per pass before the traversal starts.
    ///
    /// # Errors
    ///
    /// An error disables the rule for the rest of the file's run.
    fn before_first_node(&mut self, _ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        Ok(())
    }

    /// Called for every node in pre-order.
    ///
    /// # Errors
    ///
    /// An error disables the rule for the rest of the file's run.
    fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError>;

    /// Called once per pass after the traversal ends.
    ///
    /// # Errors
    ///
    /// An error disables the rule for the rest of the file's run.
    fn after_last_node(&mut self, _ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        Ok(())
    }
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

type RuleFactory = dyn Fn() -> RuleBox + Send + Sync;

/// Descriptor plus factory of a rule.
#[derive(Clone)]
pub struct RuleProvider {
    descriptor: RuleDescriptor,
    factory: Arc<RuleFactory>,
}

impl RuleProvider {
    /// Creates a provider.
    pub fn new<F>(descriptor: RuleDescriptor, factory: F) -> Self
    where
        F: Fn() -> RuleBox + Send + Sync + 'static,
    {
        Self {
            descriptor,
            factory: Arc::new(factory),
        }
    }

    /// Returns the descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    /// Returns the rule id.
    #[must_use]
    pub fn id(&self) -> &RuleId {
        &self.descriptor.id
    }

    /// Creates a fresh rule instance.
    #[must_use]
    pub fn create(&self) -> RuleBox {
        (self.factory)()
    }
}

impl fmt::Debug for RuleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleProvider")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A named group of rule providers.
#[derive(Debug, Clone)]
pub struct RuleSet {
    id: RuleSetId,
    providers: Vec<RuleProvider>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new(id: RuleSetId) -> Self {
        Self {
            id,
            providers: Vec::new(),
        }
    }

    /// Adds a provider.
    #[must_use]
    pub fn with_provider(mut self, provider: RuleProvider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Returns the rule set id.
    #[must_use]
    pub fn id(&self) -> &RuleSetId {
        &self.id
    }

    /// Returns the providers in registration order.
    #[must_use]
    pub fn providers(&self) -> &[RuleProvider] {
        &self.providers
    }

    /// Consumes the set, returning its providers.
    #[must_use]
    pub fn into_providers(self) -> Vec<RuleProvider> {
        self.providers
    }
}
