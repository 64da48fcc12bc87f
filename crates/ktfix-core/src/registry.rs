//! Statically built registry of rule providers.

use crate::config::{builtin_properties, PropertyDef};
use crate::rule::{RuleId, RuleProvider, RuleSet, RuleSetId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// All rule providers known to an engine, in registration order.
///
/// Registering an id twice keeps the first provider.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    providers: Vec<RuleProvider>,
    index: BTreeMap<RuleId, usize>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider.
    pub fn register(&mut self, provider: RuleProvider) {
        if self.index.contains_key(provider.id()) {
            warn!("Rule '{}' is registered twice, keeping the first", provider.id());
            return;
        }
        self.index.insert(provider.id().clone(), self.providers.len());
        self.providers.push(provider);
    }

    /// Registers every provider of a rule set.
    pub fn register_set(&mut self, rule_set: RuleSet) {
        for provider in rule_set.into_providers() {
            self.register(provider);
        }
    }

    /// Returns the provider of a rule.
    #[must_use]
    pub fn get(&self, id: &RuleId) -> Option<&RuleProvider> {
        self.index.get(id).map(|&i| &self.providers[i])
    }

    /// Returns all providers in registration order.
    #[must_use]
    pub fn providers(&self) -> &[RuleProvider] {
        &self.providers
    }

    /// Returns the ids of all registered rules.
    #[must_use]
    pub fn rule_ids(&self) -> BTreeSet<RuleId> {
        self.index.keys().cloned().collect()
    }

    /// Returns the ids of all rule sets with at least one rule.
    #[must_use]
    pub fn rule_sets(&self) -> BTreeSet<RuleSetId> {
        self.index.keys().map(RuleId::rule_set_id).collect()
    }

    /// Returns the built-in properties plus every property a rule declares.
    #[must_use]
    pub fn properties(&self) -> Vec<&'static PropertyDef> {
        let mut seen = BTreeSet::new();
        builtin_properties()
            .into_iter()
            .chain(
                self.providers
                    .iter()
                    .flat_map(|p| p.descriptor().properties.iter().copied()),
            )
            .filter(|p| seen.insert(p.name))
            .collect()
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no rule is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
