//! Configuration resolution.
//!
//! A property resolves, highest priority first, from
//!
//! 1. user overrides (property files and caller-supplied values),
//! 2. a `// ktfix-property name=value` comment enclosing the node (scopable
//!    properties only),
//! 3. the active code style's default,
//! 4. the property's own default.

pub mod loader;
mod property;
mod scoped;

pub use property::{
    builtin_properties, CodeStyle, PropertyDef, PropertyType, PropertyValue, CODE_STYLE,
    END_OF_LINE, FORMATTER_OFF_TAG, FORMATTER_ON_TAG, FORMATTER_TAGS_ENABLED,
    INSERT_FINAL_NEWLINE, MAX_LINE_LENGTH,
};
pub use scoped::ScopedOverrides;

use crate::rule::{is_valid_part, RuleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix of keys that enable or disable rules instead of naming a property.
pub const RULE_EXECUTION_PREFIX: &str = "ktfix_";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No loaded rule or the engine registers this property.
    #[error("unknown configuration property '{0}'")]
    UnknownProperty(String),

    /// A rule read a property it did not declare.
    #[error("rule '{rule}' reads property '{property}' without declaring it")]
    UndeclaredProperty {
        /// Offending rule.
        rule: RuleId,
        /// Property name.
        property: String,
    },

    /// IO error reading a property file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Property file is not valid.
    #[error("invalid property file: {message}")]
    Parse {
        /// Error message.
        message: String,
    },

    /// Malformed `key=value` override.
    #[error("invalid property override '{0}', expected key=value")]
    InvalidOverride(String),
}

/// Raw user-supplied property values keyed by lowercase property name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserOverrides {
    values: BTreeMap<String, String>,
}

impl UserOverrides {
    /// Creates an empty set of overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing an earlier one.
    pub fn set(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(key.as_ref().trim().to_ascii_lowercase(), value.into());
    }

    /// Builder form of [`UserOverrides::set`].
    #[must_use]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Parses and sets a `key=value` pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair has no `=` or an empty key.
    pub fn set_pair(&mut self, pair: &str) -> Result<(), ConfigError> {
        let (key, value) = pair
            .split_once('=')
            .filter(|(k, _)| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidOverride(pair.to_string()))?;
        self.set(key, value.trim());
        Ok(())
    }

    /// Returns the raw value of a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Applies `other` on top of `self`; values in `other` win.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Iterates over all key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Returns true for `ktfix_<rule-set>` and `ktfix_<rule-set>_<rule>` keys,
/// `ktfix_all` and `ktfix_experimental` included.
fn is_rule_execution_key(key: &str) -> bool {
    let Some(rest) = key.strip_prefix(RULE_EXECUTION_PREFIX) else {
        return false;
    };
    match rest.split_once('_') {
        Some((rule_set, rule)) => is_valid_part(rule_set) && is_valid_part(rule),
        None => is_valid_part(rest),
    }
}

/// Configuration resolved for one run.
///
/// User values are validated once when the snapshot is built. Invalid values
/// are logged and ignored so the next source in the cascade applies.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    properties: BTreeMap<&'static str, &'static PropertyDef>,
    values: BTreeMap<&'static str, PropertyValue>,
    raw: UserOverrides,
}

impl ConfigSnapshot {
    /// Builds a snapshot for the registered properties.
    pub fn new(
        properties: impl IntoIterator<Item = &'static PropertyDef>,
        overrides: UserOverrides,
    ) -> Self {
        let properties: BTreeMap<_, _> = properties.into_iter().map(|p| (p.name, p)).collect();
        let mut values = BTreeMap::new();

        for (key, raw) in overrides.iter() {
            if let Some(def) = properties.get(key) {
                match def.parse(raw) {
                    Ok(value) => {
                        values.insert(def.name, value);
                    }
                    Err(message) => warn!("Ignoring {key}: {message}"),
                }
            } else if key != loader::ROOT_KEY && !is_rule_execution_key(key) {
                debug!("Ignoring unknown property '{key}'");
            }
        }

        Self {
            properties,
            values,
            raw: overrides,
        }
    }

    /// Returns the definition of a registered property.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProperty`] if it is not registered.
    pub fn property(&self, name: &str) -> Result<&'static PropertyDef, ConfigError> {
        self.properties
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownProperty(name.to_string()))
    }

    /// Returns all registered properties in name order.
    pub fn properties(&self) -> impl Iterator<Item = &'static PropertyDef> + '_ {
        self.properties.values().copied()
    }

    /// Returns a raw user value, including rule execution keys.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.raw.get(key)
    }

    /// Returns the user overrides the snapshot was built from.
    #[must_use]
    pub fn overrides(&self) -> &UserOverrides {
        &self.raw
    }

    /// Resolves a property for the whole file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProperty`] if it is not registered.
    pub fn resolve(&self, name: &str) -> Result<PropertyValue, ConfigError> {
        self.resolve_with(name, |_| None)
    }

    /// Resolves a property, consulting `local` for section overrides first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProperty`] if it is not registered.
    pub fn resolve_with<F>(&self, name: &str, local: F) -> Result<PropertyValue, ConfigError>
    where
        F: Fn(&str) -> Option<PropertyValue>,
    {
        let def = self.property(name)?;
        Ok(self.resolve_def(def, &local))
    }

    /// Returns the code style for the whole file.
    #[must_use]
    pub fn code_style(&self) -> CodeStyle {
        self.code_style_with(&|_| None)
    }

    fn code_style_with(&self, local: &dyn Fn(&str) -> Option<PropertyValue>) -> CodeStyle {
        self.resolve_def(&CODE_STYLE, local)
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    fn resolve_def(
        &self,
        def: &'static PropertyDef,
        local: &dyn Fn(&str) -> Option<PropertyValue>,
    ) -> PropertyValue {
        if let Some(value) = self.values.get(def.name) {
            return value.clone();
        }
        if def.scopable {
            if let Some(value) = local(def.name) {
                return value;
            }
        }
        if def.name != CODE_STYLE.name {
            let style = self.code_style_with(local);
            if let Some(value) = def.style_default(style).and_then(|raw| def.parse(raw).ok()) {
                return value;
            }
        }
        def.parse(def.default)
            .unwrap_or_else(|_| PropertyValue::Text(def.default.to_string()))
    }
}
