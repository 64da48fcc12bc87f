//! Selection of the rules that run for a file.
//!
//! Rule execution keys in the configuration:
//!
//! ```toml
//! ktfix_all = "disabled"                      # every rule off
//! ktfix_experimental = "enabled"              # experimental rules allowed
//! ktfix_standard = "disabled"                 # a whole rule set
//! ktfix_standard_max-line-length = "enabled"  # a single rule
//! ```

use crate::config::{ConfigSnapshot, RULE_EXECUTION_PREFIX};
use crate::directive_rule::directive_rule_id;
use crate::error::EngineError;
use crate::registry::RuleRegistry;
use crate::rule::{Enablement, RuleDescriptor, RuleId, RuleProvider, RunAfterMode};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Switch {
    Enabled,
    Disabled,
}

fn switch(config: &ConfigSnapshot, key: &str) -> Option<Switch> {
    let raw = config.raw(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "enabled" | "true" => Some(Switch::Enabled),
        "disabled" | "false" => Some(Switch::Disabled),
        other => {
            warn!("Ignoring {key} = '{other}', expected 'enabled' or 'disabled'");
            None
        }
    }
}

fn rule_key(id: &RuleId) -> String {
    format!("{RULE_EXECUTION_PREFIX}{}_{}", id.rule_set(), id.rule())
}

fn rule_set_key(id: &RuleId) -> String {
    format!("{RULE_EXECUTION_PREFIX}{}", id.rule_set())
}

/// Explicit per-rule setting, if any.
fn explicit(config: &ConfigSnapshot, id: &RuleId) -> Option<Switch> {
    switch(config, &rule_key(id))
}

/// Decides whether a rule runs, before dependencies are considered.
fn is_enabled(config: &ConfigSnapshot, descriptor: &RuleDescriptor) -> bool {
    if descriptor.id == directive_rule_id() {
        if explicit(config, &descriptor.id) == Some(Switch::Disabled) {
            warn!("Rule '{}' cannot be disabled", descriptor.id);
        }
        return true;
    }
    if let Some(setting) = explicit(config, &descriptor.id) {
        return setting == Switch::Enabled;
    }
    if switch(config, &format!("{RULE_EXECUTION_PREFIX}all")) == Some(Switch::Disabled) {
        return false;
    }
    let rule_set = switch(config, &rule_set_key(&descriptor.id));
    if descriptor.enablement == Enablement::Experimental {
        return switch(config, &format!("{RULE_EXECUTION_PREFIX}experimental"))
            == Some(Switch::Enabled)
            && rule_set != Some(Switch::Disabled);
    }
    match rule_set {
        Some(setting) => setting == Switch::Enabled,
        None => descriptor.enablement == Enablement::Enabled,
    }
}

/// Returns the providers that run for a file, including required rules.
///
/// Required rules that are registered but not enabled are pulled in, unless
/// the configuration disables them explicitly: then the dependent rule is
/// dropped instead.
///
/// # Errors
///
/// Returns [`EngineError::MissingRequiredRule`] when a required rule is not
/// registered.
pub fn select(
    registry: &RuleRegistry,
    config: &ConfigSnapshot,
) -> Result<Vec<RuleProvider>, EngineError> {
    let mut active: BTreeMap<RuleId, &RuleProvider> = registry
        .providers()
        .iter()
        .filter(|p| is_enabled(config, p.descriptor()))
        .map(|p| (p.id().clone(), p))
        .collect();

    // Pull in required rules until nothing changes.
    let mut queue: Vec<RuleId> = active.keys().cloned().collect();
    let mut dropped = BTreeSet::new();
    while let Some(id) = queue.pop() {
        let Some(provider) = active.get(&id).copied() else {
            continue;
        };
        for required in provider
            .descriptor()
            .run_after
            .iter()
            .filter(|r| r.mode == RunAfterMode::Required)
        {
            if active.contains_key(&required.rule) {
                continue;
            }
            let Some(dependency) = registry.get(&required.rule) else {
                return Err(EngineError::MissingRequiredRule {
                    rule: id.clone(),
                    required: required.rule.clone(),
                });
            };
            if explicit(config, &required.rule) == Some(Switch::Disabled) || dropped.contains(&required.rule) {
                warn!(
                    "Skipping rule '{id}': required rule '{}' is disabled",
                    required.rule
                );
                active.remove(&id);
                dropped.insert(id.clone());
                // Rules requiring the dropped one have to be revisited.
                queue.extend(active.keys().cloned());
                break;
            }
            debug!("Enabling rule '{}' required by '{id}'", required.rule);
            active.insert(required.rule.clone(), dependency);
            queue.push(required.rule.clone());
        }
    }

    Ok(registry
        .providers()
        .iter()
        .filter(|p| active.contains_key(p.id()))
        .cloned()
        .collect())
}
