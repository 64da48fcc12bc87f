//! Per-call view of a run handed to rules.

use crate::config::{
    CodeStyle, ConfigError, ConfigSnapshot, PropertyDef, PropertyValue, ScopedOverrides, CODE_STYLE,
};
use crate::rule::{RuleDescriptor, RuleId, RuleSetId};
use crate::suppression::SuppressionIndex;
use crate::tree::{NodeId, Tree};
use crate::types::{Violation, ViolationStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::trace;

/// Whether the engine only reports or also fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Collect violations without touching the tree.
    Lint,
    /// Collect violations and let rules fix them.
    Format,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lint => write!(f, "lint"),
            Self::Format => write!(f, "format"),
        }
    }
}

/// Data shared by every rule call of one traversal pass.
pub(crate) struct PassShared<'a> {
    pub(crate) mode: Mode,
    pub(crate) config: &'a ConfigSnapshot,
    pub(crate) scoped: ScopedOverrides,
    pub(crate) suppressions: SuppressionIndex,
    pub(crate) registered: &'a BTreeSet<RuleId>,
    pub(crate) rule_sets: &'a BTreeSet<RuleSetId>,
}

/// What a rule sees while one of its hooks runs.
///
/// Read access to the tree is always available. Mutable access is handed out
/// by [`RuleContext::emit`], and only in [`Mode::Format`] for violations that
/// are not suppressed.
pub struct RuleContext<'a> {
    tree: &'a mut Tree,
    shared: &'a PassShared<'a>,
    rule: &'a RuleDescriptor,
    sink: &'a mut Vec<Violation>,
    pending: Option<(usize, u64)>,
    revisit: bool,
}

impl<'a> RuleContext<'a> {
    pub(crate) fn new(
        tree: &'a mut Tree,
        shared: &'a PassShared<'a>,
        rule: &'a RuleDescriptor,
        sink: &'a mut Vec<Violation>,
    ) -> Self {
        Self {
            tree,
            shared,
            rule,
            sink,
            pending: None,
            revisit: false,
        }
    }

    /// Returns the tree.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        self.tree
    }

    /// Returns the run mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.shared.mode
    }

    /// Returns the id of the running rule.
    #[must_use]
    pub fn rule_id(&self) -> &RuleId {
        &self.rule.id
    }

    /// Returns the configuration restricted to the rule's declared properties.
    #[must_use]
    pub fn config(&self) -> RuleConfig<'_> {
        RuleConfig {
            snapshot: self.shared.config,
            scoped: &self.shared.scoped,
            tree: self.tree,
            rule: self.rule,
        }
    }

    /// Returns the suppression index of the current pass.
    #[must_use]
    pub fn suppressions(&self) -> &SuppressionIndex {
        &self.shared.suppressions
    }

    /// Returns the ids of every registered rule.
    #[must_use]
    pub fn registered_rules(&self) -> &BTreeSet<RuleId> {
        self.shared.registered
    }

    /// Returns the ids of the loaded rule sets.
    #[must_use]
    pub fn rule_sets(&self) -> &BTreeSet<RuleSetId> {
        self.shared.rule_sets
    }

    /// Returns true if a violation of the running rule at `offset` would be
    /// suppressed.
    #[must_use]
    pub fn is_suppressed(&self, offset: usize) -> bool {
        self.rule.suppressible
            && self
                .shared
                .suppressions
                .is_suppressed(self.tree, &self.rule.id, offset)
    }

    /// Reports a violation at a byte offset of the current text.
    ///
    /// Returns mutable tree access when the violation may be fixed right
    /// away: in format mode, for violations that are not suppressed. A
    /// violation is recorded as corrected when it is autocorrectable or when
    /// the rule changed the tree before its next report.
    pub fn emit(
        &mut self,
        offset: usize,
        message: impl Into<String>,
        autocorrectable: bool,
    ) -> Option<&mut Tree> {
        self.settle();

        let offset = offset.min(self.tree.len());
        let position = self.tree.position(offset);
        let suppressed = self.is_suppressed(offset);
        let fixable = self.shared.mode == Mode::Format && !suppressed;
        let status = if suppressed {
            ViolationStatus::Suppressed
        } else if fixable && autocorrectable {
            ViolationStatus::Corrected
        } else {
            ViolationStatus::Reported
        };
        let violation = Violation::new(self.rule.id.clone(), position, offset, message, autocorrectable)
            .with_status(status);
        trace!("{violation}");
        self.sink.push(violation);

        if !fixable {
            return None;
        }
        self.pending = Some((self.sink.len() - 1, self.tree.revision()));
        Some(&mut *self.tree)
    }

    /// Asks the engine to call the rule again on the current node once the
    /// current visit returns.
    pub fn revisit(&mut self) {
        self.revisit = true;
    }

    fn settle(&mut self) {
        if let Some((index, revision)) = self.pending.take() {
            if self.tree.revision() != revision {
                self.sink[index].status = ViolationStatus::Corrected;
            }
        }
    }

    /// Settles the last report and returns whether a revisit was requested.
    pub(crate) fn finish(mut self) -> bool {
        self.settle();
        self.revisit
    }
}

/// Configuration lookups of one rule.
///
/// Only properties listed in the rule's descriptor can be read.
#[derive(Clone, Copy)]
pub struct RuleConfig<'a> {
    snapshot: &'a ConfigSnapshot,
    scoped: &'a ScopedOverrides,
    tree: &'a Tree,
    rule: &'a RuleDescriptor,
}

impl RuleConfig<'_> {
    fn check(&self, def: &PropertyDef) -> Result<(), ConfigError> {
        if self.rule.uses_property(def.name) {
            Ok(())
        } else {
            Err(ConfigError::UndeclaredProperty {
                rule: self.rule.id.clone(),
                property: def.name.to_string(),
            })
        }
    }

    /// Resolves a property for the whole file.
    ///
    /// # Errors
    ///
    /// Fails if the rule did not declare the property.
    pub fn get(&self, def: &PropertyDef) -> Result<PropertyValue, ConfigError> {
        self.check(def)?;
        self.snapshot.resolve(def.name)
    }

    /// Resolves a property at a node, honoring section overrides.
    ///
    /// # Errors
    ///
    /// Fails if the rule did not declare the property.
    pub fn get_at(&self, def: &PropertyDef, node: NodeId) -> Result<PropertyValue, ConfigError> {
        self.check(def)?;
        let offset = self.tree.offset(node);
        self.snapshot.resolve_with(def.name, |name| {
            self.scoped.lookup(self.tree, name, offset).cloned()
        })
    }

    /// Returns the code style in effect at a node.
    ///
    /// # Errors
    ///
    /// Fails if the rule did not declare `code_style`.
    pub fn code_style_at(&self, node: NodeId) -> Result<CodeStyle, ConfigError> {
        let value = self.get_at(&CODE_STYLE, node)?;
        Ok(value.as_str().and_then(|s| s.parse().ok()).unwrap_or_default())
    }
}

impl fmt::Debug for RuleConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleConfig")
            .field("rule", &self.rule.id)
            .finish_non_exhaustive()
    }
}
