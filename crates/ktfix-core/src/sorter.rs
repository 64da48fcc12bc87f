//! Deterministic execution order of rules.
//!
//! Kahn's topological sort over the `run_after` / `run_before` constraints.
//! Among rules that are ready at the same time the order is: the suppression
//! directive rule, then rules not flagged to run as late as possible, then
//! the `standard` rule set, then the rule id.

use crate::directive_rule::directive_rule_id;
use crate::error::EngineError;
use crate::rule::{RuleId, RuleProvider, STANDARD_RULE_SET};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

type TieKey = (bool, bool, bool, RuleId);

fn tie_key(provider: &RuleProvider) -> TieKey {
    let descriptor = provider.descriptor();
    (
        descriptor.id != directive_rule_id(),
        descriptor.run_as_late_as_possible,
        descriptor.id.rule_set() != STANDARD_RULE_SET,
        descriptor.id.clone(),
    )
}

/// Orders rules so that every constraint between two present rules holds.
///
/// Duplicate ids are collapsed, keeping the first provider. Constraints that
/// name absent rules are ignored; the execution filter has already decided
/// which of those are fatal.
///
/// # Errors
///
/// Returns [`EngineError::SelfReference`] for a rule constrained against
/// itself and [`EngineError::CyclicRuleDependency`] when no order exists.
pub fn sort(providers: Vec<RuleProvider>) -> Result<Vec<RuleProvider>, EngineError> {
    let mut by_id: BTreeMap<RuleId, RuleProvider> = BTreeMap::new();
    for provider in providers {
        by_id.entry(provider.id().clone()).or_insert(provider);
    }

    // predecessor -> successors
    let mut successors: BTreeMap<RuleId, BTreeSet<RuleId>> = BTreeMap::new();
    let mut in_degree: BTreeMap<RuleId, usize> = by_id.keys().map(|id| (id.clone(), 0)).collect();
    let mut add_edge = |before: &RuleId, after: &RuleId| {
        if successors
            .entry(before.clone())
            .or_default()
            .insert(after.clone())
        {
            *in_degree.entry(after.clone()).or_default() += 1;
        }
    };

    for (id, provider) in &by_id {
        let descriptor = provider.descriptor();
        let referenced = descriptor
            .run_after
            .iter()
            .map(|r| &r.rule)
            .chain(&descriptor.run_before);
        if referenced.clone().any(|r| r == id) {
            return Err(EngineError::SelfReference { rule: id.clone() });
        }
        for after in &descriptor.run_after {
            if by_id.contains_key(&after.rule) {
                add_edge(&after.rule, id);
            }
        }
        for before in &descriptor.run_before {
            if by_id.contains_key(before) {
                add_edge(id, before);
            }
        }
    }

    let mut ready: BTreeSet<TieKey> = by_id
        .iter()
        .filter(|(id, _)| in_degree[*id] == 0)
        .map(|(_, p)| tie_key(p))
        .collect();
    let mut ordered = Vec::with_capacity(by_id.len());

    while let Some(key) = ready.pop_first() {
        let id = key.3;
        if let Some(next) = successors.get(&id) {
            for successor in next {
                if let Some(degree) = in_degree.get_mut(successor) {
                    *degree -= 1;
                    if *degree == 0 {
                        if let Some(provider) = by_id.get(successor) {
                            ready.insert(tie_key(provider));
                        }
                    }
                }
            }
        }
        ordered.push(id);
    }

    if ordered.len() < by_id.len() {
        let placed: BTreeSet<&RuleId> = ordered.iter().collect();
        let remaining: BTreeSet<&RuleId> = by_id.keys().filter(|id| !placed.contains(id)).collect();
        return Err(EngineError::CyclicRuleDependency {
            cycle: find_cycle(&remaining, &successors),
        });
    }

    debug!(
        "Rule order: {}",
        ordered
            .iter()
            .map(RuleId::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(ordered
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .collect())
}

/// Walks predecessors inside the unsorted remainder until a rule repeats.
///
/// Every remaining rule has a remaining predecessor, so the walk always
/// closes a loop. The cycle is returned in execution order, starting at its
/// smallest id.
fn find_cycle(
    remaining: &BTreeSet<&RuleId>,
    successors: &BTreeMap<RuleId, BTreeSet<RuleId>>,
) -> Vec<RuleId> {
    let predecessor = |id: &RuleId| {
        remaining
            .iter()
            .copied()
            .find(|candidate| successors.get(*candidate).is_some_and(|s| s.contains(id)))
    };

    let mut path: Vec<&RuleId> = Vec::new();
    let mut current = remaining.first().copied();
    while let Some(id) = current {
        if let Some(start) = path.iter().position(|p| *p == id) {
            let mut cycle: Vec<RuleId> = path[start..].iter().rev().map(|id| (*id).clone()).collect();
            if let Some(min) = cycle.iter().enumerate().min_by_key(|(_, id)| *id).map(|(i, _)| i) {
                cycle.rotate_left(min);
            }
            return cycle;
        }
        path.push(id);
        current = predecessor(id);
    }
    path.into_iter().cloned().collect()
}
